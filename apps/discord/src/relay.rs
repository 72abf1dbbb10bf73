//! Relaying a fragment stream into chat messages.
//!
//! Fragments are buffered and flushed as edits of one message. When a
//! flush would push that message past [`MESSAGE_CEILING`], a new message
//! is opened and accumulation restarts there; a flush longer than the
//! ceiling on its own is split over several messages. Character counts
//! are Unicode scalar values.

use crate::{convert::ScriptConverter, utils::split_message};
use futures_util::StreamExt;
use pcore::{ChatChannel, FragmentStream};
use std::mem;

/// Minimum buffered characters before an edit is issued.
pub const EDIT_BUFFER: usize = 40;

/// Maximum characters accumulated in one chat message.
pub const MESSAGE_CEILING: usize = 1900;

/// Text of a freshly opened overflow message.
pub const CONTINUING: &str = "Continuing...";

/// End-of-turn marker some local models leak into their output.
pub const EOT_MARKER: &str = "<|eot_id|>";

/// A chat update due after a fragment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Flush {
    /// Replace the current message with this text.
    Edit(String),
    /// Open a new message, then set it to this text.
    Continue(String),
}

/// The chat update due once the stream ends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Finish {
    /// Replace the current message with this text.
    Edit(String),
    /// Send the overflowing remainder as a new message.
    Send(String),
}

/// Buffering state of one relayed reply.
#[derive(Debug, Default)]
pub struct Relay {
    pending: String,
    pending_chars: usize,
    shown: String,
    shown_chars: usize,
    full: String,
}

impl Relay {
    /// Take one fragment; returns the updates to apply, in order.
    pub fn push(&mut self, fragment: &str) -> Vec<Flush> {
        self.full.push_str(fragment);
        self.pending.push_str(fragment);
        self.pending_chars += fragment.chars().count();
        if self.pending_chars < EDIT_BUFFER {
            return Vec::new();
        }

        self.place()
            .into_iter()
            .map(|(opened, text)| {
                if opened {
                    Flush::Continue(text)
                } else {
                    Flush::Edit(text)
                }
            })
            .collect()
    }

    /// Flush the remainder. Returns the final updates and the full reply.
    pub fn finish(mut self) -> (Vec<Finish>, String) {
        let full = strip_marker(&self.full);
        let finish = self
            .place()
            .into_iter()
            .map(|(opened, text)| {
                if opened {
                    Finish::Send(text)
                } else {
                    Finish::Edit(text)
                }
            })
            .collect();
        (finish, full)
    }

    /// Move pending text into messages, one `(opens a message, text)` per
    /// message touched.
    ///
    /// Text that does not fit the current message starts a new one, and
    /// text longer than [`MESSAGE_CEILING`] is split across several.
    fn place(&mut self) -> Vec<(bool, String)> {
        let pending = mem::take(&mut self.pending);
        self.pending_chars = 0;
        if pending.is_empty() {
            return Vec::new();
        }

        let joined = strip_marker(&format!("{}{pending}", self.shown));
        let joined_chars = joined.chars().count();
        if joined_chars <= MESSAGE_CEILING {
            if joined == self.shown || joined.is_empty() {
                return Vec::new();
            }
            self.shown = joined;
            self.shown_chars = joined_chars;
            return vec![(false, self.shown.clone())];
        }

        let mut opened = self.shown_chars > 0;
        let mut updates = Vec::new();
        for part in split_message(&strip_marker(&pending), MESSAGE_CEILING) {
            self.shown_chars = part.chars().count();
            self.shown = part.clone();
            updates.push((opened, part));
            opened = true;
        }
        updates
    }
}

impl Finish {
    /// The text carried by the update.
    pub fn text(&self) -> &str {
        match self {
            Self::Edit(text) | Self::Send(text) => text,
        }
    }
}

/// Remove every end-of-turn marker.
pub fn strip_marker(text: &str) -> String {
    text.replace(EOT_MARKER, "")
}

/// Stream `fragments` into `placeholder`, converting every shown text.
///
/// Returns the full reply with end-of-turn markers removed. A failing
/// fragment or chat call aborts the relay.
pub async fn relay<C, S>(
    channel: &C,
    placeholder: &C::Handle,
    mut fragments: FragmentStream,
    converter: &S,
) -> anyhow::Result<String>
where
    C: ChatChannel,
    S: ScriptConverter + ?Sized,
{
    let mut relay = Relay::default();
    let mut current = placeholder.clone();

    while let Some(fragment) = fragments.next().await {
        for flush in relay.push(&fragment?) {
            match flush {
                Flush::Edit(text) => {
                    channel.edit(&current, &converter.convert(&text)).await?;
                }
                Flush::Continue(text) => {
                    current = channel.send(CONTINUING).await?;
                    channel.edit(&current, &converter.convert(&text)).await?;
                }
            }
        }
    }

    let (finish, full) = relay.finish();
    for update in finish {
        match update {
            Finish::Edit(text) => channel.edit(&current, &converter.convert(&text)).await?,
            Finish::Send(text) => current = channel.send(&converter.convert(&text)).await?,
        }
    }
    Ok(full)
}
