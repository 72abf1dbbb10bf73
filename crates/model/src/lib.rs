//! Model backends for the Piggy response pipeline.
//!
//! Three remote providers (OpenAI, Gemini, Claude) over a shared SSE
//! transport, an in-process local provider behind [`InferenceSession`], the
//! [`Provider`] enum that unifies them, and the [`Dispatcher`] that tries
//! them in priority order.

pub use {
    claude::Claude,
    config::{
        ANTHROPIC_API_KEY, Credentials, GEMINI_API_KEY, ModelsConfig, OPENAI_API_KEY,
        ProviderConfig, ProviderKind,
    },
    dispatch::{Attempt, Dispatcher, ProviderEntry, attempt, next_candidate},
    gemini::Gemini,
    http::{HttpProvider, SseBuffer, classify, status_error},
    local::{InferenceSession, Local, Sampling},
    openai::OpenAI,
    provider::{Provider, build_provider},
    reqwest::Client,
};

#[cfg(feature = "local")]
pub use local::MistralSession;

pub mod claude;
pub mod config;
pub mod gemini;
pub mod local;
pub mod openai;

mod dispatch;
mod http;
mod provider;
