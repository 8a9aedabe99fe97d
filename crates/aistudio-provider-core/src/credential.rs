use std::fmt;

use thiserror::Error;

pub const KEY_PREFIX: &str = "sk-";
pub const MIN_KEY_BODY_LEN: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CredentialError {
    #[error("Invalid API key")]
    InvalidShape,
}

/// Provider bearer token. `Debug` never prints the secret.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    /// Accepts `sk-` followed by at least ten `[A-Za-z0-9_-]` characters.
    /// Characters after that run are not inspected.
    pub fn parse(raw: &str) -> Result<Self, CredentialError> {
        let Some(body) = raw.strip_prefix(KEY_PREFIX) else {
            return Err(CredentialError::InvalidShape);
        };
        let run = body
            .chars()
            .take_while(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '-')
            .count();
        if run < MIN_KEY_BODY_LEN {
            return Err(CredentialError::InvalidShape);
        }
        Ok(Self(raw.to_string()))
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn authorization(&self) -> String {
        format!("Bearer {}", self.0)
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(<redacted>)")
    }
}
