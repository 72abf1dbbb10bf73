//! Vision-language model seam and an OpenAI-compatible client.

use model::{Client, HttpProvider};
use pcore::{Error, ErrorKind, Image, Result};
use serde::Deserialize;
use serde_json::{Value, json};
use std::future::Future;

/// Sampling temperature for visual answers.
pub const TEMPERATURE: f64 = 0.5;

/// Nucleus sampling threshold for visual answers.
pub const TOP_P: f64 = 0.8;

/// Top-k cutoff for visual answers.
pub const TOP_K: u32 = 100;

/// Repetition penalty for visual answers.
pub const REPETITION_PENALTY: f64 = 1.05;

/// Answers a question about a set of images.
pub trait VisionModel: Send + Sync {
    /// Answer `prompt` given PNG-encoded `images`, all at the target size.
    fn answer(&self, prompt: &str, images: &[Image]) -> impl Future<Output = Result<String>> + Send;
}

/// Non-streaming client for an OpenAI-compatible multimodal chat endpoint.
#[derive(Clone)]
pub struct OpenAIVision {
    http: HttpProvider,
    model: String,
}

impl OpenAIVision {
    /// Client for `endpoint`, with an optional bearer key.
    pub fn new(client: Client, key: Option<&str>, endpoint: &str, model: &str) -> Result<Self> {
        let http = match key {
            Some(key) => HttpProvider::bearer(client, key, endpoint)?,
            None => HttpProvider::no_auth(client, endpoint),
        };
        Ok(Self {
            http,
            model: model.to_owned(),
        })
    }

    /// Model name sent with each request.
    pub fn model(&self) -> &str {
        &self.model
    }
}

impl VisionModel for OpenAIVision {
    async fn answer(&self, prompt: &str, images: &[Image]) -> Result<String> {
        let body = body(&self.model, prompt, images);
        tracing::trace!("vision request with {} images", images.len());
        let response: Response = self.http.send(&body).await?;
        response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or_else(|| Error::new(ErrorKind::Empty, "vision model returned no answer"))
    }
}

/// Images first, then the question, in one user turn.
pub fn body(model: &str, prompt: &str, images: &[Image]) -> Value {
    let mut content = images
        .iter()
        .map(|image| json!({ "type": "image_url", "image_url": { "url": image.data_url() } }))
        .collect::<Vec<_>>();
    content.push(json!({ "type": "text", "text": prompt }));
    json!({
        "model": model,
        "messages": [{ "role": "user", "content": content }],
        "temperature": TEMPERATURE,
        "top_p": TOP_P,
        "top_k": TOP_K,
        "repetition_penalty": REPETITION_PENALTY,
    })
}

#[derive(Deserialize)]
struct Response {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn images_precede_prompt() {
        let images = [Image::png(vec![1]), Image::png(vec![2])];
        let body = body("vlm", "what is this?", &images);
        let content = body["messages"][0]["content"].as_array().unwrap();
        assert_eq!(content.len(), 3);
        assert_eq!(content[0]["type"], "image_url");
        assert!(
            content[0]["image_url"]["url"]
                .as_str()
                .unwrap()
                .starts_with("data:image/png;base64,")
        );
        assert_eq!(content[2]["text"], "what is this?");
        assert_eq!(body["top_k"], 100);
    }
}
