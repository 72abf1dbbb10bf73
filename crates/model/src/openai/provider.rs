//! Generator implementation for the OpenAI provider.

use super::OpenAI;
use futures_util::{TryStreamExt, future};
use pcore::{Error, ErrorKind, Generation, Generator, Message, Request, Result};
use serde::Deserialize;
use serde_json::{Value, json};

impl Generator for OpenAI {
    fn is_available(&self) -> bool {
        self.keyed
    }

    async fn generate(&self, request: &Request) -> Result<Generation> {
        if !self.keyed {
            return Err(Error::new(
                ErrorKind::Credential,
                "OpenAI API key is not configured",
            ));
        }

        let body = body(&self.model, request);
        let fragments = self
            .http
            .clone()
            .stream_sse(body)
            .try_filter_map(|data| future::ready(parse_chunk(&data)));
        Ok(Generation::new(fragments))
    }
}

/// Build the streaming chat completions body.
///
/// An image rides on the final user message as an `image_url` part.
fn body(model: &str, request: &Request) -> Value {
    let mut messages = request.messages().iter().map(to_json).collect::<Vec<_>>();

    if let Some(image) = &request.image
        && let Some(last) = messages.last_mut()
    {
        last["content"] = json!([
            { "type": "text", "text": request.instruction },
            { "type": "image_url", "image_url": { "url": image.data_url() } },
        ]);
    }

    json!({
        "model": model,
        "messages": messages,
        "stream": true,
    })
}

fn to_json(message: &Message) -> Value {
    json!({
        "role": message.role.as_str(),
        "content": message.content,
    })
}

#[derive(Deserialize)]
struct Chunk {
    #[serde(default)]
    choices: Vec<Choice>,
    error: Option<ApiError>,
}

#[derive(Deserialize)]
struct Choice {
    #[serde(default)]
    delta: Delta,
}

#[derive(Default, Deserialize)]
struct Delta {
    content: Option<String>,
}

#[derive(Deserialize)]
struct ApiError {
    message: String,
    #[serde(rename = "type", default)]
    kind: Option<String>,
}

/// Decode one SSE payload into an optional text fragment.
fn parse_chunk(data: &str) -> Result<Option<String>> {
    let chunk: Chunk = match serde_json::from_str(data) {
        Ok(chunk) => chunk,
        Err(e) => {
            tracing::warn!("failed to parse openai chunk: {e}, data: {data}");
            return Ok(None);
        }
    };

    if let Some(error) = chunk.error {
        let kind = match error.kind.as_deref() {
            Some("insufficient_quota" | "rate_limit_exceeded") => ErrorKind::Quota,
            Some("invalid_api_key" | "authentication_error") => ErrorKind::Credential,
            _ => ErrorKind::Api,
        };
        return Err(Error::new(kind, error.message));
    }

    Ok(chunk
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.delta.content))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn image_rides_on_last_user_message() {
        let request = Request::new("what is this", "be brief").image(pcore::Image::png(vec![1]));
        let body = body("gpt-4o", &request);
        let messages = body["messages"].as_array().unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0]["role"], "system");
        assert_eq!(messages[1]["content"][0]["text"], "what is this");
        assert_eq!(
            messages[1]["content"][1]["image_url"]["url"],
            "data:image/png;base64,AQ=="
        );
    }

    #[test]
    fn history_keeps_roles() {
        let request = Request::new("next", "sys")
            .history(vec![Message::user("hi"), Message::assistant("yo")]);
        let body = body("gpt-4o", &request);
        let roles = body["messages"]
            .as_array()
            .unwrap()
            .iter()
            .map(|m| m["role"].as_str().unwrap().to_owned())
            .collect::<Vec<_>>();
        assert_eq!(roles, ["system", "user", "assistant", "user"]);
        assert_eq!(body["stream"], true);
        assert_eq!(body["model"], "gpt-4o");
    }

    #[test]
    fn parses_delta_and_errors() {
        let data = r#"{"choices":[{"delta":{"content":"Hel"}}]}"#;
        assert_eq!(parse_chunk(data).unwrap().as_deref(), Some("Hel"));

        let data = r#"{"choices":[{"delta":{"role":"assistant"}}]}"#;
        assert_eq!(parse_chunk(data).unwrap(), None);

        let data = r#"{"error":{"message":"slow down","type":"insufficient_quota"}}"#;
        let err = parse_chunk(data).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Quota);
        assert_eq!(err.message(), "slow down");
    }
}
