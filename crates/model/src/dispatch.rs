//! `Dispatcher`: named generators tried in priority order until one
//! produces output.

use crate::{
    Provider,
    config::{Credentials, ModelsConfig, ProviderKind},
    local::InferenceSession,
    provider::build_provider,
};
use compact_str::CompactString;
use futures_util::{StreamExt, future, stream};
use parking_lot::RwLock;
use pcore::{Error, ErrorKind, Generation, Generator, Request, Result, join_worker, non_empty};
use reqwest::Client;
use std::{collections::BTreeMap, sync::Arc};

/// Outcome of invoking one generator.
#[derive(Debug)]
pub enum Attempt {
    /// The generator produced a non-empty first fragment.
    Ready(Generation),
    /// The generator failed in a way that should fall through to the next.
    Recoverable(Error),
    /// The generator is misconfigured. It is skipped for this request and
    /// the loop still advances.
    Fatal(Error),
}

impl Attempt {
    /// Classify an error by kind.
    pub fn failed(error: Error) -> Self {
        match error.kind() {
            ErrorKind::Config => Self::Fatal(error),
            _ => Self::Recoverable(error),
        }
    }
}

/// Index of the first available name at or after `from`.
pub fn next_candidate(
    priority: &[CompactString],
    from: usize,
    is_available: impl Fn(&str) -> bool,
) -> Option<usize> {
    (from..priority.len()).find(|&index| is_available(&priority[index]))
}

/// Manages a set of named generators and the fallback order over them.
///
/// All methods that read or mutate the inner state acquire the `RwLock`.
/// Generators are cloned out before any call, so the lock is never held
/// across an await.
pub struct Dispatcher<G = Provider> {
    inner: Arc<RwLock<Inner<G>>>,
}

struct Inner<G> {
    /// Generators keyed by model name.
    providers: BTreeMap<CompactString, G>,
    /// Fallback order. May name models that were never registered.
    priority: Vec<CompactString>,
}

/// Info about a single registered generator returned by `list()`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderEntry {
    /// Model name (key).
    pub name: CompactString,
    /// Whether the generator reports itself available.
    pub available: bool,
}

impl<G: Generator + Clone> Dispatcher<G> {
    /// Create an empty dispatcher with the given fallback order.
    pub fn new(priority: Vec<CompactString>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Inner {
                providers: BTreeMap::new(),
                priority,
            })),
        }
    }

    /// Register a generator under `name`, replacing any previous one.
    pub fn register(&self, name: impl Into<CompactString>, generator: G) {
        self.inner.write().providers.insert(name.into(), generator);
    }

    /// Remove a generator by name.
    pub fn remove(&self, name: &str) -> Option<G> {
        self.inner.write().providers.remove(name)
    }

    /// Replace the fallback order.
    pub fn set_priority(&self, priority: Vec<CompactString>) {
        self.inner.write().priority = priority;
    }

    /// The current fallback order.
    pub fn priority(&self) -> Vec<CompactString> {
        self.inner.read().priority.clone()
    }

    /// List registered generators with their availability.
    pub fn list(&self) -> Vec<ProviderEntry> {
        self.inner
            .read()
            .providers
            .iter()
            .map(|(name, generator)| ProviderEntry {
                name: name.clone(),
                available: generator.is_available(),
            })
            .collect()
    }

    /// Whether `name` is registered and available. Unknown names are not.
    pub fn is_available(&self, name: &str) -> bool {
        self.inner
            .read()
            .providers
            .get(name)
            .is_some_and(Generator::is_available)
    }

    /// Get a clone of a registered generator.
    pub fn get(&self, name: &str) -> Option<G> {
        self.inner.read().providers.get(name).cloned()
    }

    /// Generate with the first provider in priority order that yields a
    /// non-empty first fragment.
    ///
    /// Returns the last failure wrapped with "all models failed", or
    /// [`ErrorKind::NoModelAvailable`] when nothing was attempted.
    pub async fn generate(&self, request: &Request) -> Result<Generation> {
        let priority = self.priority();
        let mut last = None;
        let mut from = 0;

        while let Some(index) = next_candidate(&priority, from, |name| self.is_available(name)) {
            from = index + 1;
            let name = &priority[index];
            let Some(generator) = self.get(name) else {
                continue;
            };

            tracing::info!("trying model {name}");
            match attempt(&generator, request).await {
                Attempt::Ready(generation) => {
                    tracing::info!("model {name} is responding");
                    return Ok(generation);
                }
                Attempt::Recoverable(e) => {
                    tracing::warn!("model {name} failed ({}): {e}", e.kind());
                    last = Some(e);
                }
                Attempt::Fatal(e) => {
                    tracing::error!("model {name} is misconfigured: {e}");
                    last = Some(e);
                }
            }
        }

        Err(match last {
            Some(e) => e.context("all models failed"),
            None => Error::new(ErrorKind::NoModelAvailable, "no model available"),
        })
    }

    /// Generate with one named provider and no fallback.
    pub async fn generate_with(&self, name: &str, request: &Request) -> Result<Generation> {
        let generator = self
            .get(name)
            .filter(Generator::is_available)
            .ok_or_else(|| {
                Error::new(
                    ErrorKind::NoModelAvailable,
                    format!("model {name} is not available"),
                )
            })?;

        match attempt(&generator, request).await {
            Attempt::Ready(generation) => Ok(generation),
            Attempt::Recoverable(e) | Attempt::Fatal(e) => Err(e),
        }
    }
}

impl Dispatcher<Provider> {
    /// Build one provider per kind and order them by `config.priority`.
    ///
    /// Names in the priority list that match no kind are kept; they are
    /// never available.
    pub fn from_config(
        config: &ModelsConfig,
        credentials: &Credentials,
        session: Option<Arc<dyn InferenceSession>>,
        client: Client,
    ) -> Result<Self> {
        let dispatcher = Self::new(config.priority.clone());
        for kind in ProviderKind::ALL {
            let provider =
                build_provider(kind, config, credentials, session.clone(), client.clone())?;
            dispatcher.register(kind.as_str(), provider);
        }

        for name in &config.priority {
            if name.parse::<ProviderKind>().is_err() {
                tracing::warn!("priority list names unknown model {name}");
            }
        }
        Ok(dispatcher)
    }
}

/// Invoke one generator and pull its first non-empty fragment.
///
/// On success the fragment is chained back in front of the rest of the
/// stream. On failure the worker, if any, is joined in the background.
pub async fn attempt<G: Generator>(generator: &G, request: &Request) -> Attempt {
    let generation = match generator.generate(request).await {
        Ok(generation) => generation,
        Err(e) => return Attempt::failed(e),
    };

    let (worker, fragments) = generation.into_parts();
    let mut fragments = Box::pin(non_empty(fragments));
    let error = match fragments.next().await {
        Some(Ok(first)) => {
            let mut generation =
                Generation::new(stream::once(future::ready(Ok(first))).chain(fragments));
            generation.worker = worker;
            return Attempt::Ready(generation);
        }
        Some(Err(e)) => e,
        None => Error::new(ErrorKind::Empty, "model returned an empty response"),
    };

    drop(fragments);
    tokio::spawn(join_worker(worker));
    Attempt::failed(error)
}

impl<G> Clone for Dispatcher<G> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<G> std::fmt::Debug for Dispatcher<G> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.read();
        f.debug_struct("Dispatcher")
            .field("priority", &inner.priority)
            .field("count", &inner.providers.len())
            .finish()
    }
}
