//! In-process local model provider.
//!
//! Inference runs on a dedicated worker thread behind the
//! [`InferenceSession`] seam. Tokens flow to the consumer over a bounded
//! channel; the worker drops its sink when done, which ends the stream.
//! With the `local` feature, [`MistralSession`] backs the seam with
//! `mistralrs`.

use pcore::Message;
use std::sync::Arc;

#[cfg(feature = "local")]
pub use mistral::MistralSession;

#[cfg(feature = "local")]
mod mistral;
mod provider;

/// Maximum new tokens per reply.
pub const MAX_NEW_TOKENS: usize = 8192;
/// Sampling temperature.
pub const TEMPERATURE: f64 = 0.6;
/// Nucleus sampling threshold.
pub const TOP_P: f64 = 0.9;

/// Sampling parameters passed to a session.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sampling {
    /// Maximum new tokens.
    pub max_new_tokens: usize,
    /// Sampling temperature.
    pub temperature: f64,
    /// Nucleus sampling threshold.
    pub top_p: f64,
    /// Sample instead of greedy decoding.
    pub do_sample: bool,
}

impl Default for Sampling {
    fn default() -> Self {
        Self {
            max_new_tokens: MAX_NEW_TOKENS,
            temperature: TEMPERATURE,
            top_p: TOP_P,
            do_sample: true,
        }
    }
}

/// A loaded local model.
///
/// `generate` runs synchronously on the worker thread and feeds decoded
/// text to `sink` as it is produced. A `false` return from `sink` means
/// the consumer went away; implementations should stop early.
pub trait InferenceSession: Send + Sync {
    /// Chat-template `messages` and decode a reply.
    fn generate(
        &self,
        messages: &[Message],
        sampling: &Sampling,
        sink: &mut dyn FnMut(String) -> bool,
    ) -> pcore::Result<()>;
}

/// Local provider wrapping an optional inference session.
///
/// Without a session the provider reports itself unavailable.
#[derive(Clone, Default)]
pub struct Local {
    session: Option<Arc<dyn InferenceSession>>,
    sampling: Sampling,
}

impl Local {
    /// Wrap a loaded session.
    pub fn new(session: Arc<dyn InferenceSession>) -> Self {
        Self {
            session: Some(session),
            sampling: Sampling::default(),
        }
    }

    /// A provider with no session loaded.
    pub fn unloaded() -> Self {
        Self::default()
    }

    /// Override the sampling parameters.
    pub fn with_sampling(mut self, sampling: Sampling) -> Self {
        self.sampling = sampling;
        self
    }

    /// The sampling parameters in use.
    pub fn sampling(&self) -> &Sampling {
        &self.sampling
    }
}

impl std::fmt::Debug for Local {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Local")
            .field("loaded", &self.session.is_some())
            .field("sampling", &self.sampling)
            .finish()
    }
}
