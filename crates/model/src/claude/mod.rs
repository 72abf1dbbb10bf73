//! Claude (Anthropic) provider.
//!
//! Implements the Anthropic Messages API, which differs from the OpenAI
//! chat completions format in message structure and streaming events.

use crate::http::HttpProvider;
use compact_str::CompactString;
use pcore::Result;
use reqwest::Client;

mod provider;
mod request;
mod stream;

/// The Anthropic Messages API endpoint.
pub const ENDPOINT: &str = "https://api.anthropic.com/v1/messages";

/// The Anthropic API version header value.
const API_VERSION: &str = "2023-06-01";

/// Upper bound on generated tokens per reply.
const MAX_TOKENS: usize = 4096;

/// The Claude provider.
#[derive(Clone)]
pub struct Claude {
    /// Shared HTTP transport (x-api-key, anthropic-version).
    http: HttpProvider,
    /// Model identifier sent with every request.
    model: CompactString,
    /// Whether an API key was supplied.
    keyed: bool,
}

impl Claude {
    /// Create a provider targeting the Anthropic API.
    pub fn anthropic(client: Client, key: Option<&str>, model: &str) -> Result<Self> {
        Self::custom(client, key, ENDPOINT, model)
    }

    /// Create a provider targeting a custom Anthropic-compatible endpoint.
    pub fn custom(client: Client, key: Option<&str>, endpoint: &str, model: &str) -> Result<Self> {
        let http =
            HttpProvider::no_auth(client, endpoint).with_header("anthropic-version", API_VERSION)?;
        let http = match key {
            Some(key) => http.with_header("x-api-key", key)?,
            None => http,
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
