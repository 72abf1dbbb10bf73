//! Generator implementation for the Claude provider.

use super::{Claude, request::Body, stream};
use futures_util::{TryStreamExt, future};
use pcore::{Error, ErrorKind, Generation, Generator, Request, Result};

impl Generator for Claude {
    fn is_available(&self) -> bool {
        self.keyed
    }

    async fn generate(&self, request: &Request) -> Result<Generation> {
        if !self.keyed {
            return Err(Error::new(
                ErrorKind::Credential,
                "Anthropic API key is not configured",
            ));
        }

        let body = serde_json::to_value(Body::new(&self.model, request))
            .map_err(|e| Error::new(ErrorKind::Decode, e.to_string()))?;
        let fragments = self
            .http
            .clone()
            .stream_sse(body)
            .try_filter_map(|data| future::ready(stream::parse(&data)));
        Ok(Generation::new(fragments))
    }
}
