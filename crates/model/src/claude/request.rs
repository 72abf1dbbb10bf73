//! Request body for the Anthropic Messages API.

use super::MAX_TOKENS;
use pcore::{Request, Role};
use serde::Serialize;
use serde_json::{Value, json};

/// The request body for the Anthropic Messages API.
#[derive(Debug, Clone, Serialize)]
pub struct Body {
    /// The model identifier.
    pub model: String,
    /// Maximum tokens to generate.
    pub max_tokens: usize,
    /// System prompt (top-level, not in messages array).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
    /// The messages array (Anthropic content block format).
    pub messages: Vec<Value>,
    /// Always streamed.
    pub stream: bool,
}

impl Body {
    /// Convert a request into the Anthropic message layout.
    ///
    /// System turns in the history are folded into the top-level system
    /// prompt. An image is sent as a base64 block ahead of the final
    /// instruction text.
    pub fn new(model: &str, request: &Request) -> Self {
        let mut system = vec![request.system_prompt.clone()];
        let mut messages = Vec::with_capacity(request.history.len() + 1);

        for msg in &request.history {
            match msg.role {
                Role::System => system.push(msg.content.clone()),
                Role::User | Role::Assistant => messages.push(json!({
                    "role": msg.role.as_str(),
                    "content": msg.content,
                })),
            }
        }

        if request.has_instruction() {
            let content = match &request.image {
                Some(image) => json!([
                    {
                        "type": "image",
                        "source": {
                            "type": "base64",
                            "media_type": image.mime.as_str(),
                            "data": image.base64(),
                        },
                    },
                    { "type": "text", "text": request.instruction },
                ]),
                None => json!(request.instruction),
            };
            messages.push(json!({ "role": "user", "content": content }));
        }

        let system = system
            .into_iter()
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join("\n");
        Self {
            model: model.to_owned(),
            max_tokens: MAX_TOKENS,
            system: (!system.is_empty()).then_some(system),
            messages,
            stream: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pcore::{Image, Message};

    #[test]
    fn system_is_top_level() {
        let request = Request::new("hi", "be nice")
            .history(vec![Message::user("a"), Message::assistant("b")]);
        let body = serde_json::to_value(Body::new("claude", &request)).unwrap();
        assert_eq!(body["system"], "be nice");
        assert_eq!(body["max_tokens"], 4096);
        assert_eq!(body["stream"], true);
        let messages = body["messages"].as_array().unwrap();
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[1]["role"], "assistant");
        assert_eq!(messages[2]["content"], "hi");
    }

    #[test]
    fn image_block_precedes_text() {
        let request = Request::new("describe", "").image(Image::png(vec![1, 2]));
        let body = serde_json::to_value(Body::new("claude", &request)).unwrap();
        assert!(body.get("system").is_none());
        let content = &body["messages"][0]["content"];
        assert_eq!(content[0]["source"]["media_type"], "image/png");
        assert_eq!(content[1]["text"], "describe");
    }

    #[test]
    fn trailing_assistant_turn_is_kept() {
        let request = Request::new("", "sys")
            .history(vec![Message::user("q"), Message::assistant("thinking")]);
        let body = serde_json::to_value(Body::new("claude", &request)).unwrap();
        let messages = body["messages"].as_array().unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[1]["role"], "assistant");
    }
}
