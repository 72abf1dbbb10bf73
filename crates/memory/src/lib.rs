//! Per-channel similarity memory.
//!
//! Memory is a nearest-neighbour index over the user messages seen in each
//! chat channel. Before a reply is generated, the messages most similar to
//! the new prompt are retrieved and injected into it as a numbered list.
//!
//! # Architecture
//!
//! [`FlatIndex`] is a plain, synchronous brute-force L2 index. It knows
//! nothing about embeddings or channels. [`ChannelMemory`] owns one index
//! per channel, each behind its own async mutex, and an [`Embedder`] to
//! turn text into vectors. Indexes are populated from a dialogue history
//! file at startup and from [`ChannelMemory::observe`] as messages arrive,
//! and can be persisted with [`ChannelMemory::save`] / [`ChannelMemory::load`].
//!
//! [`Embedder`]: pcore::Embedder

pub use {
    embedder::{DEFAULT_MODEL, ENDPOINT, HttpEmbedder},
    index::{Entry, FlatIndex, l2_distance},
    memory::{ChannelMemory, NEIGHBOURS, artifact_path, format_related},
};

mod embedder;
mod index;
mod memory;
