//! Text embedding seam used by channel memory.

use crate::Result;
use std::future::Future;

/// Turns text into a dense vector for nearest-neighbour search.
///
/// Every vector produced by one embedder must have the same dimension.
/// Failures carry [`ErrorKind::Embedding`](crate::ErrorKind::Embedding).
pub trait Embedder: Send + Sync {
    /// Embed one text.
    fn embed(&self, text: &str) -> impl Future<Output = Result<Vec<f32>>> + Send;
}

#[cfg(test)]
mod tests {
    use crate::{Embedder, Error, ErrorKind, Result};

    /// Embeds by byte length; refuses empty input.
    struct Length;

    impl Embedder for Length {
        async fn embed(&self, text: &str) -> Result<Vec<f32>> {
            if text.is_empty() {
                return Err(Error::new(ErrorKind::Embedding, "empty input"));
            }
            Ok(vec![text.len() as f32])
        }
    }

    #[tokio::test]
    async fn failures_are_classified() {
        assert_eq!(Length.embed("abc").await.unwrap(), [3.0]);
        let err = Length.embed("").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Embedding);
    }
}
