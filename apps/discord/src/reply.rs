//! The chat reply flow.

use crate::{
    convert::ScriptConverter,
    prompt::{APOLOGY, SYSTEM_PROMPT},
    relay::relay,
};
use memory::ChannelMemory;
use model::{Dispatcher, Provider};
use pcore::{ChatChannel, ChatMessage, Embedder, Generator, Message, Request, join_worker};
use std::sync::Arc;

/// Messages read from the channel for context, including the trigger and
/// the placeholder.
pub const HISTORY_WINDOW: usize = 5;

/// Generates replies with memory-augmented prompts and relays them.
pub struct Responder<E, S, G = Provider> {
    dispatcher: Dispatcher<G>,
    memory: Arc<ChannelMemory<E>>,
    converter: S,
    system_prompt: String,
}

impl<E, S, G> Responder<E, S, G>
where
    E: Embedder,
    S: ScriptConverter,
    G: Generator + Clone,
{
    /// Create a responder with the default system prompt.
    pub fn new(dispatcher: Dispatcher<G>, memory: Arc<ChannelMemory<E>>, converter: S) -> Self {
        Self {
            dispatcher,
            memory,
            converter,
            system_prompt: SYSTEM_PROMPT.to_owned(),
        }
    }

    /// Replace the system prompt.
    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    /// The dispatcher replies are generated with.
    pub fn dispatcher(&self) -> &Dispatcher<G> {
        &self.dispatcher
    }

    /// The channel memory prompts are augmented from.
    pub fn memory(&self) -> &Arc<ChannelMemory<E>> {
        &self.memory
    }

    /// Answer `prompt` in `channel` by editing `placeholder`.
    ///
    /// Returns the full reply, or `None` after replacing the placeholder
    /// with [`APOLOGY`].
    pub async fn gpt_message<C: ChatChannel>(
        &self,
        channel: &C,
        placeholder: &C::Handle,
        prompt: &str,
    ) -> Option<String> {
        let channel_id = channel.id();
        let related = self.memory.search(&channel_id, prompt).await;
        let history = match channel.history(HISTORY_WINDOW).await {
            Ok(messages) => dialogue(messages),
            Err(e) => {
                tracing::warn!("failed to read history of {channel_id}: {e:#}");
                Vec::new()
            }
        };

        let request = Request::new(augment(&related, prompt), &self.system_prompt).history(history);
        let generation = match self.dispatcher.generate(&request).await {
            Ok(generation) => generation,
            Err(e) => {
                tracing::error!("no reply for {channel_id}: {e}");
                apologize(channel, placeholder).await;
                return None;
            }
        };

        let (worker, fragments) = generation.into_parts();
        let result = relay(channel, placeholder, fragments, &self.converter).await;
        join_worker(worker).await;

        match result {
            Ok(reply) => {
                if let Err(e) = self.memory.observe(&channel_id, prompt).await {
                    tracing::warn!("failed to remember prompt in {channel_id}: {e}");
                }
                Some(reply)
            }
            Err(e) => {
                tracing::error!("relay failed in {channel_id}: {e:#}");
                apologize(channel, placeholder).await;
                None
            }
        }
    }
}

/// Prompt with the related memory prepended.
pub fn augment(related: &str, prompt: &str) -> String {
    format!("information:<<{related}>>user: {prompt}")
}

/// Turn newest-first channel history into chronological dialogue, dropping
/// the two newest messages (the trigger and the placeholder).
pub fn dialogue(mut messages: Vec<ChatMessage>) -> Vec<Message> {
    messages.reverse();
    let keep = messages.len().saturating_sub(2);
    messages.truncate(keep);
    messages
        .into_iter()
        .map(|message| {
            if message.from_bot {
                Message::assistant(message.content)
            } else {
                Message::user(message.content)
            }
        })
        .collect()
}

async fn apologize<C: ChatChannel>(channel: &C, placeholder: &C::Handle) {
    if let Err(e) = channel.edit(placeholder, APOLOGY).await {
        tracing::warn!("failed to post apology: {e:#}");
    }
}
