//! Bot configuration loaded from TOML.

use compact_str::CompactString;
use memory::ChannelMemory;
use model::{ModelsConfig, ProviderConfig};
use pcore::Embedder;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable holding the Discord bot token.
pub const DISCORD_TOKEN: &str = "DISCORD_TOKEN";

/// Top-level bot configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Fallback order over `openai`, `gemini`, `claude` and `local`.
    pub model_priority: Vec<CompactString>,
    /// OpenAI overrides.
    pub openai: ProviderConfig,
    /// Gemini overrides.
    pub gemini: ProviderConfig,
    /// Claude overrides.
    pub claude: ProviderConfig,
    /// Persisted state locations.
    pub data: DataConfig,
    /// Embedding endpoint for channel memory.
    pub embedding: EmbeddingConfig,
    /// Vision-language model endpoint.
    pub vision: VisionConfig,
    /// Discord connection.
    pub discord: DiscordConfig,
}

impl Default for Config {
    fn default() -> Self {
        let models = ModelsConfig::default();
        Self {
            model_priority: models.priority,
            openai: models.openai,
            gemini: models.gemini,
            claude: models.claude,
            data: DataConfig::default(),
            embedding: EmbeddingConfig::default(),
            vision: VisionConfig::default(),
            discord: DiscordConfig::default(),
        }
    }
}

impl Config {
    /// Parse a TOML string, expanding `${VAR}` references first.
    pub fn from_toml(toml_str: &str) -> anyhow::Result<Self> {
        let expanded = crate::utils::expand_env_vars(toml_str);
        let config: Self = toml::from_str(&expanded)?;
        Ok(config)
    }

    /// Load configuration from a file path.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// The model selection part of the configuration.
    pub fn models(&self) -> ModelsConfig {
        ModelsConfig {
            priority: self.model_priority.clone(),
            openai: self.openai.clone(),
            gemini: self.gemini.clone(),
            claude: self.claude.clone(),
        }
    }
}

/// Locations of the dialogue history and index artifacts.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    /// Dialogue history JSON loaded into memory at startup.
    pub dialogue_history: PathBuf,
    /// Base path of the per-channel index artifacts.
    pub vector_store: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            dialogue_history: PathBuf::from("data/dialogue_history.json"),
            vector_store: PathBuf::from("data/vector_store"),
        }
    }
}

impl DataConfig {
    /// Restore saved indexes, then index the dialogue history on top.
    ///
    /// Failures are logged; memory starts empty rather than failing.
    pub async fn restore<E: Embedder>(&self, memory: &ChannelMemory<E>) -> usize {
        match memory.load(&self.vector_store).await {
            Ok(channels) => tracing::info!("restored {channels} channel indexes"),
            Err(e) => tracing::warn!("failed to restore indexes: {e}"),
        }
        match memory.load_dialogue_history(&self.dialogue_history).await {
            Ok(texts) => {
                tracing::info!("indexed {texts} messages from dialogue history");
                texts
            }
            Err(e) => {
                tracing::warn!("failed to index dialogue history: {e}");
                0
            }
        }
    }
}

/// Embedding service settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// Endpoint override; defaults to the OpenAI embeddings API.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    /// Embedding model name.
    pub model: String,
    /// API key; falls back to the OpenAI credential.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            model: memory::DEFAULT_MODEL.to_owned(),
            api_key: None,
        }
    }
}

/// Vision-language model settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VisionConfig {
    /// OpenAI-compatible chat completions endpoint.
    pub endpoint: String,
    /// Model name.
    pub model: String,
    /// Optional bearer key.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

impl Default for VisionConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:8000/v1/chat/completions".to_owned(),
            model: "openbmb/MiniCPM-V-2_6".to_owned(),
            api_key: None,
        }
    }
}

/// Discord connection settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscordConfig {
    /// Bot token (supports `${ENV_VAR}` expansion).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

impl DiscordConfig {
    /// The configured token, else `DISCORD_TOKEN` from the environment.
    pub fn token(&self) -> Option<String> {
        self.token
            .clone()
            .or_else(|| std::env::var(DISCORD_TOKEN).ok())
            .filter(|token| !token.is_empty())
    }
}
