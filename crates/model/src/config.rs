//! Provider configuration and credentials.

use compact_str::CompactString;
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// Environment variable holding the OpenAI API key.
pub const OPENAI_API_KEY: &str = "OPENAI_API_KEY";
/// Environment variable holding the Gemini API key.
pub const GEMINI_API_KEY: &str = "GEMINI_API_KEY";
/// Environment variable holding the Anthropic API key.
pub const ANTHROPIC_API_KEY: &str = "ANTHROPIC_API_KEY";

/// The fixed set of backends a priority list can name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// OpenAI chat completions API.
    OpenAI,
    /// Google Gemini API.
    Gemini,
    /// Anthropic Messages API.
    Claude,
    /// In-process local model.
    Local,
}

impl ProviderKind {
    /// All kinds, in the default priority order.
    pub const ALL: [ProviderKind; 4] = [Self::OpenAI, Self::Gemini, Self::Claude, Self::Local];

    /// The name used in priority lists.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OpenAI => "openai",
            Self::Gemini => "gemini",
            Self::Claude => "claude",
            Self::Local => "local",
        }
    }

    /// Default model identifier for remote kinds.
    pub fn default_model(&self) -> &'static str {
        match self {
            Self::OpenAI => "gpt-4o",
            Self::Gemini => "gemini-1.5-flash",
            Self::Claude => "claude-3-5-sonnet-latest",
            Self::Local => "local",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = pcore::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| pcore::Error::config(format!("unknown model '{s}'")))
    }
}

/// API keys for the remote providers.
///
/// A key that is `None` makes the corresponding provider unavailable.
#[derive(Debug, Clone, Default)]
pub struct Credentials {
    /// OpenAI API key.
    pub openai: Option<String>,
    /// Gemini API key.
    pub gemini: Option<String>,
    /// Anthropic API key.
    pub anthropic: Option<String>,
}

impl Credentials {
    /// Read keys from `OPENAI_API_KEY`, `GEMINI_API_KEY` and
    /// `ANTHROPIC_API_KEY`. Empty values count as absent.
    pub fn from_env() -> Self {
        let read = |name: &str| std::env::var(name).ok().filter(|v| !v.is_empty());
        Self {
            openai: read(OPENAI_API_KEY),
            gemini: read(GEMINI_API_KEY),
            anthropic: read(ANTHROPIC_API_KEY),
        }
    }

    /// The key for a remote kind. Always `None` for [`ProviderKind::Local`].
    pub fn key(&self, kind: ProviderKind) -> Option<&str> {
        match kind {
            ProviderKind::OpenAI => self.openai.as_deref(),
            ProviderKind::Gemini => self.gemini.as_deref(),
            ProviderKind::Claude => self.anthropic.as_deref(),
            ProviderKind::Local => None,
        }
    }

    /// Whether a key for the kind is present.
    pub fn is_set(&self, kind: ProviderKind) -> bool {
        self.key(kind).is_some()
    }
}

/// Per-provider overrides.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// Model identifier. Defaults to [`ProviderKind::default_model`].
    pub model: Option<CompactString>,
    /// Endpoint override for proxies and compatible servers.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    /// API key override; takes precedence over [`Credentials`].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

impl ProviderConfig {
    /// The model to use for `kind`.
    pub fn model_for(&self, kind: ProviderKind) -> CompactString {
        self.model
            .clone()
            .unwrap_or_else(|| CompactString::const_new(kind.default_model()))
    }
}

/// Model selection configuration: the priority list plus per-provider
/// overrides.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelsConfig {
    /// Fallback order. Unknown names are kept and treated as unavailable.
    pub priority: Vec<CompactString>,
    /// OpenAI overrides.
    pub openai: ProviderConfig,
    /// Gemini overrides.
    pub gemini: ProviderConfig,
    /// Claude overrides.
    pub claude: ProviderConfig,
}

impl ModelsConfig {
    /// Overrides for a remote kind.
    pub fn provider(&self, kind: ProviderKind) -> Option<&ProviderConfig> {
        match kind {
            ProviderKind::OpenAI => Some(&self.openai),
            ProviderKind::Gemini => Some(&self.gemini),
            ProviderKind::Claude => Some(&self.claude),
            ProviderKind::Local => None,
        }
    }
}

impl Default for ModelsConfig {
    fn default() -> Self {
        Self {
            priority: ProviderKind::ALL
                .iter()
                .map(|k| CompactString::const_new(k.as_str()))
                .collect(),
            openai: ProviderConfig::default(),
            gemini: ProviderConfig::default(),
            claude: ProviderConfig::default(),
        }
    }
}
