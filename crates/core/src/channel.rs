//! Chat platform abstraction.
//!
//! The response pipeline only needs a handful of operations from the chat
//! platform: read recent history, send and edit messages, and download
//! attachments. Platform adapters implement [`ChatChannel`].

use compact_str::CompactString;
use std::future::Future;

/// A message read from channel history.
#[derive(Debug, Clone, Default)]
pub struct ChatMessage {
    /// Author identifier on the platform.
    pub author: CompactString,
    /// Whether the bot itself wrote this message.
    pub from_bot: bool,
    /// Message text content.
    pub content: String,
    /// Attached files.
    pub attachments: Vec<Attachment>,
}

/// A file attached to a chat message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    /// Original file name, used for format detection.
    pub filename: String,
    /// Download URL.
    pub url: String,
}

impl Attachment {
    /// Create an attachment from a file name and URL.
    pub fn new(filename: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            url: url.into(),
        }
    }
}

/// One chat channel on a messaging platform.
///
/// Methods use RPITIT for async without boxing.
pub trait ChatChannel: Send + Sync {
    /// Handle to a message previously sent by the bot.
    type Handle: Clone + Send + Sync;

    /// Stable channel identifier, used to key per-channel state.
    fn id(&self) -> CompactString;

    /// The most recent `limit` messages, newest first.
    fn history(
        &self,
        limit: usize,
    ) -> impl Future<Output = anyhow::Result<Vec<ChatMessage>>> + Send;

    /// Send a new message and return its handle.
    fn send(&self, content: &str) -> impl Future<Output = anyhow::Result<Self::Handle>> + Send;

    /// Replace the content of a message the bot sent earlier.
    fn edit(
        &self,
        message: &Self::Handle,
        content: &str,
    ) -> impl Future<Output = anyhow::Result<()>> + Send;

    /// Download the bytes of an attachment.
    fn download(
        &self,
        attachment: &Attachment,
    ) -> impl Future<Output = anyhow::Result<Vec<u8>>> + Send;
}
