//! `mistralrs`-backed inference session.

use super::{InferenceSession, Sampling};
use pcore::{Error, Message, Role};
use std::{path::PathBuf, sync::Arc};
use tokio::runtime::Handle;

/// A session wrapping a loaded `mistralrs::Model`.
///
/// `mistralrs` is async; the session drives it from the worker thread
/// through a runtime handle captured at load time.
#[derive(Clone)]
pub struct MistralSession {
    model: Arc<mistralrs::Model>,
    runtime: Handle,
}

impl MistralSession {
    /// Wrap a pre-built model. Must be called inside a tokio runtime.
    pub fn from_model(model: mistralrs::Model) -> Self {
        Self {
            model: Arc::new(model),
            runtime: Handle::current(),
        }
    }

    /// Load a HuggingFace text model into the local cache directory.
    pub async fn from_text(model_id: &str) -> pcore::Result<Self> {
        let mut builder = mistralrs::TextModelBuilder::new(model_id).with_logging();
        if let Some(dir) = cache_dir() {
            builder = builder.from_hf_cache_pathf(dir);
        }
        let model = builder
            .build()
            .await
            .map_err(|e| Error::config(format!("failed to load local model '{model_id}': {e}")))?;
        tracing::info!("loaded local model {model_id}");
        Ok(Self::from_model(model))
    }
}

impl InferenceSession for MistralSession {
    fn generate(
        &self,
        messages: &[Message],
        sampling: &Sampling,
        sink: &mut dyn FnMut(String) -> bool,
    ) -> pcore::Result<()> {
        let request = build_request(messages, sampling);
        let mut stream = self
            .runtime
            .block_on(self.model.stream_chat_request(request))
            .map_err(|e| Error::generation(e.to_string()))?;

        // Each item is awaited separately so the sink never runs inside
        // `block_on`; it blocks on a full channel.
        while let Some(response) = self.runtime.block_on(stream.next()) {
            match response {
                mistralrs::Response::Chunk(chunk) => {
                    for choice in chunk.choices {
                        if let Some(text) = choice.delta.content
                            && !sink(text)
                        {
                            return Ok(());
                        }
                    }
                }
                mistralrs::Response::Done(_) => break,
                mistralrs::Response::InternalError(e) | mistralrs::Response::ValidationError(e) => {
                    return Err(Error::generation(e.to_string()));
                }
                mistralrs::Response::ModelError(msg, _) => {
                    return Err(Error::generation(format!("model error: {msg}")));
                }
                _ => {}
            }
        }
        Ok(())
    }
}

/// Build a `mistralrs` request from chat messages and sampling parameters.
fn build_request(messages: &[Message], sampling: &Sampling) -> mistralrs::RequestBuilder {
    let mut builder = mistralrs::RequestBuilder::new();
    for msg in messages {
        let role = match msg.role {
            Role::System => mistralrs::TextMessageRole::System,
            Role::User => mistralrs::TextMessageRole::User,
            Role::Assistant => mistralrs::TextMessageRole::Assistant,
        };
        builder = builder.add_message(role, &msg.content);
    }

    let builder = builder.set_sampler_max_len(sampling.max_new_tokens);
    if sampling.do_sample {
        builder
            .set_sampler_temperature(sampling.temperature)
            .set_sampler_topp(sampling.top_p)
    } else {
        builder.set_deterministic_sampler()
    }
}

/// Model cache directory: `~/.cache/piggy/models/`.
fn cache_dir() -> Option<PathBuf> {
    dirs::cache_dir().map(|dir| dir.join("piggy").join("models"))
}
