//! OpenAI-compatible embeddings client.

use compact_str::CompactString;
use model::{Client, HttpProvider};
use pcore::{Embedder, Error, ErrorKind, Result};
use serde::Deserialize;
use serde_json::json;

/// The OpenAI embeddings endpoint.
pub const ENDPOINT: &str = "https://api.openai.com/v1/embeddings";

/// Default embedding model.
pub const DEFAULT_MODEL: &str = "text-embedding-3-small";

/// Embedder calling a `/v1/embeddings` endpoint.
#[derive(Clone)]
pub struct HttpEmbedder {
    http: HttpProvider,
    model: CompactString,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

impl HttpEmbedder {
    /// Create an embedder for the OpenAI API.
    pub fn openai(client: Client, key: &str, model: &str) -> Result<Self> {
        Self::custom(client, Some(key), ENDPOINT, model)
    }

    /// Create an embedder for a compatible server, e.g. a local
    /// text-embeddings-inference instance that needs no key.
    pub fn custom(client: Client, key: Option<&str>, endpoint: &str, model: &str) -> Result<Self> {
        let http = match key {
            Some(key) => HttpProvider::bearer(client, key, endpoint)?,
            None => HttpProvider::no_auth(client, endpoint),
        };
        Ok(Self {
            http,
            model: model.into(),
        })
    }
}

impl Embedder for HttpEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let body = json!({ "model": self.model, "input": text });
        let response: EmbeddingResponse = self
            .http
            .send(&body)
            .await
            .map_err(|e| Error::new(ErrorKind::Embedding, format!("embedding failed: {e}")))?;

        response
            .data
            .into_iter()
            .next()
            .map(|data| data.embedding)
            .ok_or_else(|| Error::new(ErrorKind::Embedding, "embedding response has no data"))
    }
}
