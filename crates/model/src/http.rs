//! Shared HTTP transport for the remote providers.
//!
//! `HttpProvider` wraps a `reqwest::Client` with pre-configured headers and
//! endpoint URL. Provides `send()` for plain JSON calls and `stream_sse()`
//! for Server-Sent Events streaming. The SSE stream yields raw `data:`
//! payloads; each provider decodes its own event format on top.

use async_stream::try_stream;
use futures_core::Stream;
use futures_util::StreamExt;
use pcore::{Error, ErrorKind, Result};
use reqwest::{
    Client, Method, StatusCode,
    header::{self, HeaderMap, HeaderName, HeaderValue},
};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;

/// Shared HTTP transport for remote providers.
///
/// Holds a `reqwest::Client`, pre-built headers (auth + content-type),
/// and the target endpoint URL.
#[derive(Clone)]
pub struct HttpProvider {
    client: Client,
    headers: HeaderMap,
    endpoint: String,
}

impl HttpProvider {
    /// Create a provider without authentication headers.
    pub fn no_auth(client: Client, endpoint: &str) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        Self {
            client,
            headers,
            endpoint: endpoint.to_owned(),
        }
    }

    /// Create a provider with Bearer token authentication.
    pub fn bearer(client: Client, key: &str, endpoint: &str) -> Result<Self> {
        Self::no_auth(client, endpoint).with_header("authorization", &format!("Bearer {key}"))
    }

    /// Create a provider with a custom header for authentication.
    ///
    /// Used by providers that don't use Bearer tokens (Anthropic uses
    /// `x-api-key`, Gemini uses `x-goog-api-key`).
    pub fn custom_header(
        client: Client,
        header_name: &str,
        header_value: &str,
        endpoint: &str,
    ) -> Result<Self> {
        Self::no_auth(client, endpoint).with_header(header_name, header_value)
    }

    /// Add one more header.
    pub fn with_header(mut self, name: &str, value: &str) -> Result<Self> {
        let name = name
            .parse::<HeaderName>()
            .map_err(|e| Error::config(format!("invalid header name '{name}': {e}")))?;
        let value = value
            .parse::<HeaderValue>()
            .map_err(|e| Error::config(format!("invalid value for header '{name}': {e}")))?;
        self.headers.insert(name, value);
        Ok(self)
    }

    /// Send a non-streaming request and deserialize the JSON response.
    pub async fn send<T: DeserializeOwned>(&self, body: &(impl Serialize + Sync)) -> Result<T> {
        let response = self
            .client
            .request(Method::POST, &self.endpoint)
            .headers(self.headers.clone())
            .json(body)
            .send()
            .await
            .map_err(network)?;

        let status = response.status();
        let text = response.text().await.map_err(network)?;
        tracing::trace!("response: {text}");
        if !status.is_success() {
            return Err(status_error(status, &text));
        }

        serde_json::from_str(&text)
            .map_err(|e| Error::new(ErrorKind::Decode, format!("invalid response body: {e}")))
    }

    /// Stream an SSE response, yielding each event's `data` payload.
    ///
    /// Takes the transport by value so the stream owns everything it
    /// needs. The `[DONE]` sentinel is skipped. Non-success statuses
    /// become a classified error before any payload is yielded.
    pub fn stream_sse(self, body: Value) -> impl Stream<Item = Result<String>> + Send {
        tracing::trace!("request: {body}");
        let request = self
            .client
            .request(Method::POST, &self.endpoint)
            .headers(self.headers)
            .json(&body);

        try_stream! {
            let response = request.send().await.map_err(network)?;
            let status = response.status();
            if !status.is_success() {
                let text = response.text().await.unwrap_or_default();
                let never: std::convert::Infallible = Err(status_error(status, &text))?;
                match never {}
            }

            let mut stream = response.bytes_stream();
            let mut events = SseBuffer::default();
            while let Some(next) = stream.next().await {
                let bytes = next.map_err(network)?;
                tracing::trace!("chunk: {}", String::from_utf8_lossy(&bytes));
                for data in events.push(&bytes) {
                    yield data;
                }
            }
            if let Some(data) = events.finish() {
                yield data;
            }
        }
    }

    /// Get the endpoint URL.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Get a reference to the headers.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }
}

/// Incremental SSE event splitter.
///
/// Buffers raw bytes so multi-byte characters split across network chunks
/// are decoded intact. Events are separated by a blank line; `\r` is
/// ignored.
#[derive(Debug, Default)]
pub struct SseBuffer {
    buf: Vec<u8>,
}

impl SseBuffer {
    /// Feed bytes and return the data payloads of every completed event.
    pub fn push(&mut self, bytes: &[u8]) -> Vec<String> {
        self.buf.extend(bytes.iter().copied().filter(|b| *b != b'\r'));

        let mut out = Vec::new();
        while let Some(pos) = self.buf.windows(2).position(|w| w == b"\n\n") {
            let block = self.buf.drain(..pos + 2).collect::<Vec<_>>();
            if let Some(data) = parse_block(&String::from_utf8_lossy(&block)) {
                out.push(data);
            }
        }
        out
    }

    /// Flush a trailing event that was not terminated by a blank line.
    pub fn finish(&mut self) -> Option<String> {
        let block = std::mem::take(&mut self.buf);
        parse_block(&String::from_utf8_lossy(&block))
    }
}

/// Extract the `data` payload of one SSE block.
fn parse_block(block: &str) -> Option<String> {
    let data = block
        .lines()
        .filter_map(|line| line.strip_prefix("data:"))
        .map(|d| d.strip_prefix(' ').unwrap_or(d))
        .collect::<Vec<_>>();
    if data.is_empty() {
        return None;
    }

    let data = data.join("\n");
    let trimmed = data.trim();
    if trimmed.is_empty() || trimmed == "[DONE]" {
        return None;
    }
    Some(trimmed.to_owned())
}

/// Classify a failed response by status and body text.
///
/// Gemini reports its failure class in the body (`PERMISSION_DENIED`,
/// `QUOTA_EXCEEDED`, ...), which takes precedence over the status code.
pub fn classify(status: StatusCode, body: &str) -> ErrorKind {
    if body.contains("RESOURCE_PROJECT_INVALID") {
        return ErrorKind::Project;
    }
    if body.contains("PERMISSION_DENIED") || body.contains("API_KEY_INVALID") {
        return ErrorKind::Credential;
    }
    if body.contains("QUOTA_EXCEEDED") || body.contains("RESOURCE_EXHAUSTED") {
        return ErrorKind::Quota;
    }

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ErrorKind::Credential,
        StatusCode::TOO_MANY_REQUESTS => ErrorKind::Quota,
        StatusCode::REQUEST_TIMEOUT | StatusCode::BAD_GATEWAY | StatusCode::GATEWAY_TIMEOUT => {
            ErrorKind::Network
        }
        _ => ErrorKind::Api,
    }
}

/// Build a classified error for a failed response.
pub fn status_error(status: StatusCode, body: &str) -> Error {
    Error::new(
        classify(status, body),
        format!("request failed with status {status}: {}", body.trim()),
    )
}

/// Map a transport failure.
pub(crate) fn network(e: reqwest::Error) -> Error {
    Error::new(ErrorKind::Network, e.to_string())
}
