//! OpenAI chat completions provider.
//!
//! Streams `chat.completion.chunk` events and yields each choice's
//! `delta.content`. Also used for OpenAI-compatible servers through a
//! custom endpoint.

use crate::http::HttpProvider;
use compact_str::CompactString;
use pcore::Result;
use reqwest::Client;

mod provider;

/// The OpenAI chat completions endpoint.
pub const ENDPOINT: &str = "https://api.openai.com/v1/chat/completions";

/// The OpenAI provider.
#[derive(Clone)]
pub struct OpenAI {
    /// Shared HTTP transport (bearer auth).
    http: HttpProvider,
    /// Model identifier sent with every request.
    model: CompactString,
    /// Whether an API key was supplied.
    keyed: bool,
}

impl OpenAI {
    /// Create a provider targeting the OpenAI API.
    ///
    /// A missing key yields a provider that reports itself unavailable.
    pub fn api(client: Client, key: Option<&str>, model: &str) -> Result<Self> {
        Self::custom(client, key, ENDPOINT, model)
    }

    /// Create a provider targeting an OpenAI-compatible endpoint.
    pub fn custom(client: Client, key: Option<&str>, endpoint: &str, model: &str) -> Result<Self> {
        let http = match key {
            Some(key) => HttpProvider::bearer(client, key, endpoint)?,
            None => HttpProvider::no_auth(client, endpoint),
        };
        Ok(Self {
            http,
            model: model.into(),
            keyed: key.is_some(),
        })
    }

    /// The configured model identifier.
    pub fn model(&self) -> &str {
        &self.model
    }

    /// The request endpoint.
    pub fn endpoint(&self) -> &str {
        self.http.endpoint()
    }
}
