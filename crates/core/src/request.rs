//! Generation request shared by every provider.

use crate::Message;
use base64::{Engine, engine::general_purpose::STANDARD};
use compact_str::CompactString;

/// Encoded image passed alongside the instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Image {
    /// Encoded image bytes (PNG, JPEG, ...).
    pub bytes: Vec<u8>,
    /// MIME type of `bytes`, e.g. `image/png`.
    pub mime: CompactString,
}

impl Image {
    /// Wrap PNG-encoded bytes.
    pub fn png(bytes: Vec<u8>) -> Self {
        Self {
            bytes,
            mime: CompactString::const_new("image/png"),
        }
    }

    /// Base64 payload of the image bytes.
    pub fn base64(&self) -> String {
        STANDARD.encode(&self.bytes)
    }

    /// `data:` URL form used by OpenAI-compatible APIs.
    pub fn data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime, self.base64())
    }
}

/// A single generation request.
#[derive(Debug, Clone, Default)]
pub struct Request {
    /// The instruction for this turn.
    ///
    /// Empty means the conversation ends on the last history turn, which
    /// is then sent with its own role.
    pub instruction: String,
    /// The system prompt.
    pub system_prompt: String,
    /// Prior dialogue turns, oldest first.
    pub history: Vec<Message>,
    /// Optional image input.
    pub image: Option<Image>,
}

impl Request {
    /// Create a request from an instruction and a system prompt.
    pub fn new(instruction: impl Into<String>, system_prompt: impl Into<String>) -> Self {
        Self {
            instruction: instruction.into(),
            system_prompt: system_prompt.into(),
            history: Vec::new(),
            image: None,
        }
    }

    /// Attach prior dialogue turns.
    pub fn history(mut self, history: Vec<Message>) -> Self {
        self.history = history;
        self
    }

    /// Attach an image.
    pub fn image(mut self, image: Image) -> Self {
        self.image = Some(image);
        self
    }

    /// Whether a trailing user turn is sent after the history.
    pub fn has_instruction(&self) -> bool {
        !self.instruction.is_empty() || self.image.is_some()
    }

    /// Flatten into the chat-template order: system, history, instruction.
    pub fn messages(&self) -> Vec<Message> {
        let mut messages = Vec::with_capacity(self.history.len() + 2);
        messages.push(Message::system(&self.system_prompt));
        messages.extend(self.history.iter().cloned());
        if self.has_instruction() {
            messages.push(Message::user(&self.instruction));
        }
        messages
    }

    /// Render as one plain-text prompt for single-turn APIs.
    ///
    /// `system\nrole: content\n...\nUser: instruction`, or
    /// `system\ninstruction` when there is no history. Without an
    /// instruction the transcript ends on the last history turn.
    pub fn transcript(&self) -> String {
        if self.history.is_empty() {
            return format!("{}\n{}", self.system_prompt, self.instruction);
        }

        let mut lines = Vec::with_capacity(self.history.len() + 2);
        lines.push(self.system_prompt.clone());
        lines.extend(
            self.history
                .iter()
                .map(|m| format!("{}: {}", m.role.as_str(), m.content)),
        );
        if self.has_instruction() {
            lines.push(format!("User: {}", self.instruction));
        }
        lines.join("\n")
    }
}
