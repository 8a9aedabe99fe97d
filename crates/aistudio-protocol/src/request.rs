use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

pub const SYSTEM_TEXT_LIMIT: usize = 6000;
pub const DEFAULT_MODEL: &str = "gpt-4.1";
pub const DEFAULT_MAX_OUTPUT_TOKENS: u32 = 1200;

/// Inbound `POST /api/ai` payload before defaults are applied.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawGenerationInput {
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub system: Option<String>,
    #[serde(default)]
    pub prompt: Option<String>,
}

#[derive(Debug, Clone)]
pub struct RequestDefaults {
    pub model: String,
    pub max_output_tokens: u32,
}

impl Default for RequestDefaults {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            max_output_tokens: DEFAULT_MAX_OUTPUT_TOKENS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    pub model: String,
    pub system_text: String,
    pub user_text: String,
    pub max_output_tokens: u32,
}

#[derive(Debug, Error)]
pub enum BuildError {
    #[error("request body is not valid JSON: {0}")]
    Malformed(serde_json::Error),
    #[error("request body must be a JSON object")]
    NotAnObject,
    #[error("invalid request field: {0}")]
    InvalidField(serde_json::Error),
}

impl GenerationRequest {
    /// System text longer than [`SYSTEM_TEXT_LIMIT`] characters is cut, not rejected.
    pub fn new(
        model: impl Into<String>,
        system_text: impl Into<String>,
        user_text: impl Into<String>,
        max_output_tokens: u32,
    ) -> Self {
        Self {
            model: model.into(),
            system_text: truncate_chars(system_text.into(), SYSTEM_TEXT_LIMIT),
            user_text: user_text.into(),
            max_output_tokens,
        }
    }

    pub fn from_input(input: RawGenerationInput, defaults: &RequestDefaults) -> Self {
        Self::new(
            input.model.unwrap_or_else(|| defaults.model.clone()),
            input.system.unwrap_or_default(),
            input.prompt.unwrap_or_default(),
            defaults.max_output_tokens,
        )
    }

    /// Build from a raw request body. An empty body counts as `{}`.
    pub fn build(body: &[u8], defaults: &RequestDefaults) -> Result<Self, BuildError> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self::from_input(RawGenerationInput::default(), defaults));
        }
        let value: Value = serde_json::from_slice(body).map_err(BuildError::Malformed)?;
        if !value.is_object() {
            return Err(BuildError::NotAnObject);
        }
        let input: RawGenerationInput =
            serde_json::from_value(value).map_err(BuildError::InvalidField)?;
        Ok(Self::from_input(input, defaults))
    }
}

fn truncate_chars(text: String, limit: usize) -> String {
    match text.char_indices().nth(limit) {
        Some((cut, _)) => text[..cut].to_string(),
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn applies_defaults() {
        let request = GenerationRequest::build(b"{}", &RequestDefaults::default()).unwrap();
        assert_eq!(
            request,
            GenerationRequest {
                model: DEFAULT_MODEL.to_string(),
                system_text: String::new(),
                user_text: String::new(),
                max_output_tokens: DEFAULT_MAX_OUTPUT_TOKENS,
            }
        );
    }

    #[test]
    fn empty_body_is_empty_object() {
        let request = GenerationRequest::build(b"  ", &RequestDefaults::default()).unwrap();
        assert_eq!(request.model, DEFAULT_MODEL);
    }

    #[test]
    fn null_fields_fall_back_to_defaults() {
        let body = br#"{"model":null,"system":null,"prompt":"hi"}"#;
        let request = GenerationRequest::build(body, &RequestDefaults::default()).unwrap();
        assert_eq!(request.model, DEFAULT_MODEL);
        assert_eq!(request.user_text, "hi");
    }

    #[test]
    fn uses_configured_defaults() {
        let defaults = RequestDefaults {
            model: "gpt-4.1-mini".to_string(),
            max_output_tokens: 64,
        };
        let request = GenerationRequest::build(br#"{"prompt":"x"}"#, &defaults).unwrap();
        assert_eq!(request.model, "gpt-4.1-mini");
        assert_eq!(request.max_output_tokens, 64);
    }

    #[test]
    fn truncates_system_text_silently() {
        let system = "é".repeat(SYSTEM_TEXT_LIMIT + 25);
        let body = serde_json::json!({ "system": system, "prompt": "p" }).to_string();
        let request =
            GenerationRequest::build(body.as_bytes(), &RequestDefaults::default()).unwrap();
        assert_eq!(request.system_text.chars().count(), SYSTEM_TEXT_LIMIT);
        assert_eq!(request.system_text, "é".repeat(SYSTEM_TEXT_LIMIT));
    }

    #[test]
    fn short_system_text_is_untouched() {
        let request = GenerationRequest::new("m", "short", "u", 1);
        assert_eq!(request.system_text, "short");
    }

    #[test]
    fn rejects_non_object_payloads() {
        let defaults = RequestDefaults::default();
        assert!(matches!(
            GenerationRequest::build(b"[1,2]", &defaults),
            Err(BuildError::NotAnObject)
        ));
        assert!(matches!(
            GenerationRequest::build(b"prompt=hi", &defaults),
            Err(BuildError::Malformed(_))
        ));
        assert!(matches!(
            GenerationRequest::build(br#"{"prompt":5}"#, &defaults),
            Err(BuildError::InvalidField(_))
        ));
    }
}
