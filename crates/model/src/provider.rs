//! Provider implementation.
//!
//! Unified `Provider` enum with enum dispatch over concrete backends.
//! `build_provider()` matches on `ProviderKind`.

use crate::{
    claude::Claude,
    config::{Credentials, ModelsConfig, ProviderKind},
    gemini::Gemini,
    local::{InferenceSession, Local},
    openai::OpenAI,
};
use pcore::{Generation, Generator, Request, Result};
use reqwest::Client;
use std::sync::Arc;

/// Unified provider enum.
///
/// The dispatcher is monomorphized on `Provider`; each variant wraps one
/// backend.
#[derive(Clone)]
pub enum Provider {
    /// OpenAI chat completions API.
    OpenAI(OpenAI),
    /// Google Gemini API.
    Gemini(Gemini),
    /// Anthropic Messages API.
    Claude(Claude),
    /// In-process inference session.
    Local(Local),
}

impl Provider {
    /// The backend kind of this provider.
    pub fn kind(&self) -> ProviderKind {
        match self {
            Self::OpenAI(_) => ProviderKind::OpenAI,
            Self::Gemini(_) => ProviderKind::Gemini,
            Self::Claude(_) => ProviderKind::Claude,
            Self::Local(_) => ProviderKind::Local,
        }
    }
}

/// Construct a `Provider` from config, credentials and a shared HTTP client.
///
/// Remote providers are always built; a missing key only makes them
/// report themselves unavailable. The local provider wraps `session` when
/// one is given.
pub fn build_provider(
    kind: ProviderKind,
    config: &ModelsConfig,
    credentials: &Credentials,
    session: Option<Arc<dyn InferenceSession>>,
    client: Client,
) -> Result<Provider> {
    let Some(overrides) = config.provider(kind) else {
        return Ok(Provider::Local(match session {
            Some(session) => Local::new(session),
            None => Local::unloaded(),
        }));
    };

    let model = overrides.model_for(kind);
    let key = overrides.api_key.as_deref().or(credentials.key(kind));
    let base_url = overrides.base_url.as_deref();

    let provider = match kind {
        ProviderKind::OpenAI => Provider::OpenAI(match base_url {
            Some(url) => OpenAI::custom(client, key, url, &model)?,
            None => OpenAI::api(client, key, &model)?,
        }),
        ProviderKind::Gemini => Provider::Gemini(match base_url {
            Some(url) => Gemini::custom(client, key, url, &model)?,
            None => Gemini::api(client, key, &model)?,
        }),
        ProviderKind::Claude => Provider::Claude(match base_url {
            Some(url) => Claude::custom(client, key, url, &model)?,
            None => Claude::anthropic(client, key, &model)?,
        }),
        ProviderKind::Local => Provider::Local(Local::unloaded()),
    };
    Ok(provider)
}

impl Generator for Provider {
    fn is_available(&self) -> bool {
        match self {
            Self::OpenAI(p) => p.is_available(),
            Self::Gemini(p) => p.is_available(),
            Self::Claude(p) => p.is_available(),
            Self::Local(p) => p.is_available(),
        }
    }

    async fn generate(&self, request: &Request) -> Result<Generation> {
        match self {
            Self::OpenAI(p) => p.generate(request).await,
            Self::Gemini(p) => p.generate(request).await,
            Self::Claude(p) => p.generate(request).await,
            Self::Local(p) => p.generate(request).await,
        }
    }
}
