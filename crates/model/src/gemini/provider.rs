//! Generator implementation for the Gemini provider.

use super::Gemini;
use crate::http::classify;
use futures_util::{TryStreamExt, future};
use pcore::{Error, ErrorKind, Generation, Generator, Request, Result};
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::{Value, json};

/// Harm categories whose filters are switched off.
const HARM_CATEGORIES: [&str; 4] = [
    "HARM_CATEGORY_HARASSMENT",
    "HARM_CATEGORY_HATE_SPEECH",
    "HARM_CATEGORY_SEXUALLY_EXPLICIT",
    "HARM_CATEGORY_DANGEROUS_CONTENT",
];

impl Generator for Gemini {
    fn is_available(&self) -> bool {
        self.keyed
    }

    async fn generate(&self, request: &Request) -> Result<Generation> {
        if !self.keyed {
            return Err(Error::new(
                ErrorKind::Credential,
                "Gemini API key is not configured",
            ));
        }

        let fragments = self
            .http
            .clone()
            .stream_sse(body(request))
            .try_filter_map(|data| future::ready(parse_chunk(&data)));
        Ok(Generation::new(fragments))
    }
}

/// Build the `streamGenerateContent` body.
fn body(request: &Request) -> Value {
    let mut parts = vec![json!({ "text": request.transcript() })];
    if let Some(image) = &request.image {
        parts.push(json!({
            "inline_data": {
                "mime_type": image.mime.as_str(),
                "data": image.base64(),
            }
        }));
    }

    let safety = HARM_CATEGORIES
        .iter()
        .map(|category| json!({ "category": category, "threshold": "BLOCK_NONE" }))
        .collect::<Vec<_>>();

    json!({
        "contents": [{ "role": "user", "parts": parts }],
        "safetySettings": safety,
    })
}

#[derive(Deserialize)]
struct Chunk {
    #[serde(default)]
    candidates: Vec<Candidate>,
    error: Option<ApiError>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Deserialize)]
struct Part {
    text: Option<String>,
}

#[derive(Deserialize)]
struct ApiError {
    #[serde(default)]
    code: u16,
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: String,
}

/// Decode one SSE payload into an optional text fragment.
///
/// All text parts of the first candidate are concatenated.
fn parse_chunk(data: &str) -> Result<Option<String>> {
    let chunk: Chunk = match serde_json::from_str(data) {
        Ok(chunk) => chunk,
        Err(e) => {
            tracing::warn!("failed to parse gemini chunk: {e}, data: {data}");
            return Ok(None);
        }
    };

    if let Some(error) = chunk.error {
        let status = StatusCode::from_u16(error.code).unwrap_or(StatusCode::BAD_REQUEST);
        let kind = classify(status, &error.status);
        return Err(Error::new(kind, format!("{}: {}", error.status, error.message)));
    }

    let text = chunk
        .candidates
        .into_iter()
        .next()
        .and_then(|candidate| candidate.content)
        .map(|content| {
            content
                .parts
                .into_iter()
                .filter_map(|part| part.text)
                .collect::<String>()
        });
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pcore::{Image, Message};

    #[test]
    fn body_sends_transcript_and_disables_filters() {
        let request = Request::new("and now?", "sys").history(vec![Message::user("hello")]);
        let body = body(&request);
        assert_eq!(
            body["contents"][0]["parts"][0]["text"],
            "sys\nuser: hello\nUser: and now?"
        );
        let safety = body["safetySettings"].as_array().unwrap();
        assert_eq!(safety.len(), 4);
        assert!(safety.iter().all(|s| s["threshold"] == "BLOCK_NONE"));
    }

    #[test]
    fn image_becomes_inline_data() {
        let request = Request::new("look", "sys").image(Image::png(vec![0xff]));
        let body = body(&request);
        let parts = body["contents"][0]["parts"].as_array().unwrap();
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[1]["inline_data"]["mime_type"], "image/png");
        assert_eq!(parts[1]["inline_data"]["data"], "/w==");
    }

    #[test]
    fn parses_parts_and_errors() {
        let data = serde_json::json!({
            "candidates": [{
                "content": { "parts": [{ "text": "a" }, { "text": "b" }], "role": "model" },
            }],
        })
        .to_string();
        assert_eq!(parse_chunk(&data).unwrap().as_deref(), Some("ab"));

        let data = r#"{"candidates":[{"finishReason":"STOP"}]}"#;
        assert_eq!(parse_chunk(data).unwrap(), None);

        let data = r#"{"error":{"code":429,"message":"quota","status":"RESOURCE_EXHAUSTED"}}"#;
        assert_eq!(parse_chunk(data).unwrap_err().kind(), ErrorKind::Quota);

        let data = r#"{"error":{"code":403,"message":"denied","status":"PERMISSION_DENIED"}}"#;
        assert_eq!(parse_chunk(data).unwrap_err().kind(), ErrorKind::Credential);
    }
}
