use serde::Serialize;
use serde_json::Value;

use crate::request::GenerationRequest;

/// Body of a streamed `POST /v1/responses` call.
#[derive(Debug, Clone, Serialize)]
pub struct CreateResponseBody<'a> {
    pub model: &'a str,
    pub stream: bool,
    pub input: Vec<InputMessage<'a>>,
    pub max_output_tokens: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct InputMessage<'a> {
    pub role: Role,
    pub content: Vec<InputContent<'a>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InputContent<'a> {
    Text { text: &'a str },
}

impl<'a> From<&'a GenerationRequest> for CreateResponseBody<'a> {
    fn from(request: &'a GenerationRequest) -> Self {
        Self {
            model: &request.model,
            stream: true,
            input: vec![
                InputMessage::text(Role::System, &request.system_text),
                InputMessage::text(Role::User, &request.user_text),
            ],
            max_output_tokens: request.max_output_tokens,
        }
    }
}

impl<'a> InputMessage<'a> {
    fn text(role: Role, text: &'a str) -> Self {
        Self {
            role,
            content: vec![InputContent::Text { text }],
        }
    }
}

/// Pull the text fragment out of one event payload.
///
/// Only `output_text.delta` is read. Anything else, including unparseable
/// JSON and empty fragments, yields `None`.
pub fn extract_text_delta(payload: &str) -> Option<String> {
    let value: Value = serde_json::from_str(payload).ok()?;
    value
        .pointer("/output_text/delta")?
        .as_str()
        .filter(|text| !text.is_empty())
        .map(str::to_string)
}
