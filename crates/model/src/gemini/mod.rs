//! Google Gemini provider.
//!
//! Uses `streamGenerateContent` with `alt=sse`. The conversation is sent as
//! a single user turn holding the plain-text transcript, with safety
//! filtering disabled for every harm category.

use crate::http::HttpProvider;
use compact_str::CompactString;
use pcore::Result;
use reqwest::Client;

mod provider;

/// Base URL of the Gemini API.
pub const BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// The Gemini provider.
#[derive(Clone)]
pub struct Gemini {
    /// Shared HTTP transport (x-goog-api-key).
    http: HttpProvider,
    /// Model identifier, part of the endpoint path.
    model: CompactString,
    /// Whether an API key was supplied.
    keyed: bool,
}

impl Gemini {
    /// Create a provider targeting the public Gemini API.
    pub fn api(client: Client, key: Option<&str>, model: &str) -> Result<Self> {
        Self::custom(client, key, BASE_URL, model)
    }

    /// Create a provider targeting a custom base URL.
    pub fn custom(client: Client, key: Option<&str>, base_url: &str, model: &str) -> Result<Self> {
        let endpoint = endpoint(base_url, model);
        let http = match key {
            Some(key) => HttpProvider::custom_header(client, "x-goog-api-key", key, &endpoint)?,
            None => HttpProvider::no_auth(client, &endpoint),
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

/// Streaming endpoint for a model under `base_url`.
fn endpoint(base_url: &str, model: &str) -> String {
    format!(
        "{}/models/{model}:streamGenerateContent?alt=sse",
        base_url.trim_end_matches('/')
    )
}
