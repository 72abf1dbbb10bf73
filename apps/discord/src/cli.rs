//! Command-line entry point for the bot.

use crate::{Config, init_tracing};
use clap::Parser;
use model::InferenceSession;
use std::{path::PathBuf, sync::Arc};

/// Piggy Discord chatbot.
#[derive(Parser, Debug)]
#[command(name = "piggy", about = "Piggy Discord chatbot")]
pub struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long, default_value = "piggy.toml")]
    pub config: PathBuf,

    /// HuggingFace id of a model to serve as the local provider.
    #[arg(long)]
    pub local_model: Option<String>,
}

impl Cli {
    /// Load the configuration and serve until interrupted.
    pub async fn run(self) -> anyhow::Result<()> {
        init_tracing();
        let config = Config::load(&self.config)?;
        tracing::info!("loaded config from {}", self.config.display());
        let session = self.session().await?;
        crate::run(config, session).await
    }

    #[cfg(feature = "local")]
    async fn session(&self) -> anyhow::Result<Option<Arc<dyn InferenceSession>>> {
        let Some(id) = &self.local_model else {
            return Ok(None);
        };
        let session = model::MistralSession::from_text(id).await?;
        Ok(Some(Arc::new(session)))
    }

    #[cfg(not(feature = "local"))]
    async fn session(&self) -> anyhow::Result<Option<Arc<dyn InferenceSession>>> {
        if let Some(id) = &self.local_model {
            tracing::warn!("built without the local feature, ignoring --local-model {id}");
        }
        Ok(None)
    }
}
