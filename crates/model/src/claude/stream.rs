//! SSE event parsing for the Anthropic streaming Messages API.
//!
//! Anthropic streaming events differ from OpenAI's format:
//! - `content_block_start` begins a content block
//! - `content_block_delta` carries incremental text
//! - `error` reports a mid-stream failure
//!
//! Everything else (`message_start`, `message_delta`, `ping`, stops) carries
//! no text and is skipped.

use pcore::{Error, ErrorKind};
use serde::Deserialize;

/// A raw SSE event from the Anthropic streaming API.
#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    /// Begin a content block.
    #[serde(rename = "content_block_start")]
    ContentBlockStart { content_block: ContentBlock },
    /// Incremental content within a block.
    #[serde(rename = "content_block_delta")]
    ContentBlockDelta { delta: BlockDelta },
    /// Mid-stream failure.
    #[serde(rename = "error")]
    Error { error: ApiError },
    /// Catch-all for events without text.
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
pub enum ContentBlock {
    #[serde(rename = "text")]
    Text { text: String },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
pub enum BlockDelta {
    #[serde(rename = "text_delta")]
    TextDelta { text: String },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
pub struct ApiError {
    #[serde(rename = "type")]
    pub kind: String,
    pub message: String,
}

impl Event {
    /// The text carried by this event, or the error it reports.
    pub fn into_text(self) -> Result<Option<String>, Error> {
        match self {
            Self::ContentBlockStart {
                content_block: ContentBlock::Text { text },
            }
            | Self::ContentBlockDelta {
                delta: BlockDelta::TextDelta { text },
            } => Ok(Some(text)),
            Self::Error { error } => {
                let kind = match error.kind.as_str() {
                    "authentication_error" | "permission_error" => ErrorKind::Credential,
                    "rate_limit_error" => ErrorKind::Quota,
                    _ => ErrorKind::Api,
                };
                Err(Error::new(kind, error.message))
            }
            _ => Ok(None),
        }
    }
}

/// Decode one SSE payload into an optional text fragment.
pub fn parse(data: &str) -> Result<Option<String>, Error> {
    match serde_json::from_str::<Event>(data) {
        Ok(event) => event.into_text(),
        Err(e) => {
            tracing::warn!("failed to parse anthropic event: {e}, data: {data}");
            Ok(None)
        }
    }
}
