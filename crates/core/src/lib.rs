//! Core abstractions for the Piggy response pipeline.
//!
//! Shared by every backend crate: chat messages, generation requests, the
//! fragment stream a generator hands back, the error taxonomy used for
//! provider fallback, and the traits at the seams to external
//! collaborators (generators, embedders, chat platforms).

pub use {
    channel::{Attachment, ChatChannel, ChatMessage},
    embedder::Embedder,
    error::{Error, ErrorKind, Result},
    generator::Generator,
    message::{Message, Role},
    request::{Image, Request},
    stream::{
        FragmentStream, Generation, STREAM_BUFFER, TokenSink, join_worker, non_empty,
        token_channel,
    },
};

mod channel;
mod embedder;
mod error;
mod generator;
mod message;
mod request;
mod stream;
