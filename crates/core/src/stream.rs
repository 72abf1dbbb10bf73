//! Fragment streams and the generation handle.
//!
//! Every backend hands back the same shape: an optional worker thread plus
//! a lazy, single-pass stream of text fragments. Remote providers produce
//! the stream natively from SSE; local inference produces tokens on a
//! worker thread into a bounded channel created by [`token_channel`].

use crate::{Error, Result};
use futures_core::Stream;
use futures_util::{TryStreamExt, future};
use std::{pin::Pin, thread::JoinHandle};
use tokio::sync::mpsc;

/// Capacity of the channel between a local worker and its consumer.
pub const STREAM_BUFFER: usize = 64;

/// A boxed, forward-only stream of text fragments.
pub type FragmentStream = Pin<Box<dyn Stream<Item = Result<String>> + Send>>;

/// The result of invoking a generator.
pub struct Generation {
    /// Background worker producing the fragments, if any.
    pub worker: Option<JoinHandle<()>>,
    /// The fragments, in production order.
    pub fragments: FragmentStream,
}

impl Generation {
    /// Wrap a stream that has no background worker.
    pub fn new(fragments: impl Stream<Item = Result<String>> + Send + 'static) -> Self {
        Self {
            worker: None,
            fragments: Box::pin(fragments),
        }
    }

    /// Attach the worker thread feeding this stream.
    pub fn with_worker(mut self, worker: JoinHandle<()>) -> Self {
        self.worker = Some(worker);
        self
    }

    /// Split into the worker handle and the fragment stream.
    pub fn into_parts(self) -> (Option<JoinHandle<()>>, FragmentStream) {
        (self.worker, self.fragments)
    }
}

impl std::fmt::Debug for Generation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Generation")
            .field("worker", &self.worker.is_some())
            .finish_non_exhaustive()
    }
}

/// Drop empty fragments; errors pass through untouched.
pub fn non_empty<S>(stream: S) -> impl Stream<Item = Result<String>> + Send
where
    S: Stream<Item = Result<String>> + Send,
{
    stream.try_filter(|fragment| future::ready(!fragment.is_empty()))
}

/// Producer half of a token channel, used from a blocking worker thread.
///
/// Completion is signalled by dropping the sink, which closes the channel.
pub struct TokenSink {
    tx: mpsc::Sender<Result<String>>,
}

impl TokenSink {
    /// Push one token, blocking while the channel is full.
    ///
    /// Returns `false` once the consumer has gone away; producers should
    /// stop generating at that point. Must not be called from inside an
    /// async context.
    pub fn push(&self, token: impl Into<String>) -> bool {
        self.tx.blocking_send(Ok(token.into())).is_ok()
    }

    /// Report a failure to the consumer and close the channel.
    pub fn fail(self, error: Error) {
        let _ = self.tx.blocking_send(Err(error));
    }
}

/// Create a bounded token channel.
///
/// The stream ends when the [`TokenSink`] is dropped.
pub fn token_channel(capacity: usize) -> (TokenSink, impl Stream<Item = Result<String>> + Send) {
    let (tx, mut rx) = mpsc::channel(capacity);
    let stream = async_stream::stream! {
        while let Some(item) = rx.recv().await {
            yield item;
        }
    };
    (TokenSink { tx }, stream)
}

/// Join a worker thread without blocking the async runtime.
///
/// A panicked worker is logged, not propagated.
pub async fn join_worker(worker: Option<JoinHandle<()>>) {
    let Some(worker) = worker else {
        return;
    };

    match tokio::task::spawn_blocking(move || worker.join()).await {
        Ok(Ok(())) => {}
        Ok(Err(_)) => tracing::error!("generation worker panicked"),
        Err(e) => tracing::error!("failed to join generation worker: {e}"),
    }
}
