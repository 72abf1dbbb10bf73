//! Shared fakes for the reply path tests.
#![allow(dead_code)]

use compact_str::CompactString;
use futures_util::stream;
use pcore::{
    Attachment, ChatChannel, ChatMessage, Embedder, Error, ErrorKind, Generation, Generator,
    Request, Result,
};
use std::{
    collections::VecDeque,
    sync::{
        Arc, Mutex,
        atomic::{AtomicU64, Ordering},
    },
};

/// A chat-side effect recorded by [`Recorder`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Send(u64, String),
    Edit(u64, String),
}

/// Channel that records every send and edit.
#[derive(Default)]
pub struct Recorder {
    pub history: Vec<ChatMessage>,
    pub events: Mutex<Vec<Event>>,
    next: AtomicU64,
}

impl Recorder {
    pub fn with_history(history: Vec<ChatMessage>) -> Self {
        Self {
            history,
            ..Self::default()
        }
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }

    /// Text of the last edit or send targeting `handle`.
    pub fn text_of(&self, handle: u64) -> Option<String> {
        self.events().into_iter().rev().find_map(|event| match event {
            Event::Send(id, text) | Event::Edit(id, text) if id == handle => Some(text),
            _ => None,
        })
    }
}

impl ChatChannel for Recorder {
    type Handle = u64;

    fn id(&self) -> CompactString {
        CompactString::const_new("4242")
    }

    async fn history(&self, limit: usize) -> anyhow::Result<Vec<ChatMessage>> {
        Ok(self.history.iter().take(limit).cloned().collect())
    }

    async fn send(&self, content: &str) -> anyhow::Result<u64> {
        let id = self.next.fetch_add(1, Ordering::SeqCst) + 100;
        self.events
            .lock()
            .unwrap()
            .push(Event::Send(id, content.to_owned()));
        Ok(id)
    }

    async fn edit(&self, message: &u64, content: &str) -> anyhow::Result<()> {
        self.events
            .lock()
            .unwrap()
            .push(Event::Edit(*message, content.to_owned()));
        Ok(())
    }

    async fn download(&self, attachment: &Attachment) -> anyhow::Result<Vec<u8>> {
        anyhow::bail!("no file at {}", attachment.url)
    }
}

pub fn said(author: &str, from_bot: bool, content: &str) -> ChatMessage {
    ChatMessage {
        author: author.into(),
        from_bot,
        content: content.to_owned(),
        attachments: Vec::new(),
    }
}

/// One scripted generator response.
#[derive(Clone)]
pub enum Reply {
    /// Yield these fragments.
    Text(Vec<String>),
    /// Fail before streaming.
    Refuse(ErrorKind),
    /// Yield one fragment, then fail.
    Break(&'static str),
}

impl Reply {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(vec![text.into()])
    }
}

/// Generator answering from a queue and recording each request.
#[derive(Clone, Default)]
pub struct Scripted {
    replies: Arc<Mutex<VecDeque<Reply>>>,
    pub requests: Arc<Mutex<Vec<Request>>>,
}

impl Scripted {
    pub fn new(replies: impl IntoIterator<Item = Reply>) -> Self {
        Self {
            replies: Arc::new(Mutex::new(replies.into_iter().collect())),
            requests: Arc::default(),
        }
    }

    pub fn requests(&self) -> Vec<Request> {
        self.requests.lock().unwrap().clone()
    }
}

impl Generator for Scripted {
    fn is_available(&self) -> bool {
        true
    }

    async fn generate(&self, request: &Request) -> Result<Generation> {
        self.requests.lock().unwrap().push(request.clone());
        let reply = self.replies.lock().unwrap().pop_front();
        match reply {
            Some(Reply::Text(parts)) => Ok(Generation::new(stream::iter(
                parts.into_iter().map(Ok).collect::<Vec<_>>(),
            ))),
            Some(Reply::Refuse(kind)) => Err(Error::new(kind, "scripted refusal")),
            Some(Reply::Break(first)) => Ok(Generation::new(stream::iter(vec![
                Ok(first.to_owned()),
                Err(Error::new(ErrorKind::Network, "connection reset")),
            ]))),
            None => Err(Error::new(ErrorKind::Empty, "script exhausted")),
        }
    }
}

/// Embeds text as its length and vowel count.
pub struct Shape;

impl Embedder for Shape {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let vowels = text.chars().filter(|c| "aeiou".contains(*c)).count();
        Ok(vec![text.chars().count() as f32, vowels as f32])
    }
}
