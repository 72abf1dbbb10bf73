//! Discord front end for Piggy.
//!
//! Turns a mention into a reply: channel memory and recent history are
//! folded into the prompt, the model dispatcher picks a provider, and the
//! resulting fragment stream is relayed into chat through a
//! [`ScriptConverter`]. Attachments go through visual question answering
//! first, and `!cot` runs step-by-step reasoning instead.
//!
//! Everything except the serenity adapter works against the
//! [`ChatChannel`] trait.
//!
//! [`ChatChannel`]: pcore::ChatChannel

pub use {
    config::{Config, DISCORD_TOKEN, DataConfig, DiscordConfig, EmbeddingConfig, VisionConfig},
    convert::{Identity, ScriptConverter, TaiwanTraditional},
    cot::{
        FINAL_TITLE, MAX_STEPS, NextAction, Step, Steps, Tier, Timed, chain_of_thought,
        extract_json, parse_step,
    },
    prompt::{APOLOGY, FINAL_ANSWER_REQUEST, REASONING_PRIMER, REASONING_PROMPT, SYSTEM_PROMPT},
    relay::{
        CONTINUING, EDIT_BUFFER, EOT_MARKER, Finish, Flush, MESSAGE_CEILING, Relay, relay,
        strip_marker,
    },
    reply::{HISTORY_WINDOW, Responder, augment, dialogue},
    utils::{expand_env_vars, split_message, strip_mention},
};

#[cfg(feature = "cli")]
pub use cli::Cli;
#[cfg(feature = "discord")]
pub use discord::{Bot, DiscordChannel, REASONING_COMMAND, THINKING, run};

#[cfg(feature = "cli")]
mod cli;
mod config;
mod convert;
pub mod cot;
#[cfg(feature = "discord")]
mod discord;
mod prompt;
mod relay;
mod reply;
mod utils;

/// Install a `tracing` subscriber honouring `RUST_LOG`, defaulting to
/// `info`.
#[cfg(feature = "cli")]
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}
