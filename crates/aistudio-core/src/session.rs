use std::time::{Duration, Instant};

use dashmap::DashMap;
use http::header::COOKIE;
use http::HeaderMap;
use uuid::Uuid;

use aistudio_provider_core::Credential;

use crate::error::ApiError;

pub const SESSION_COOKIE: &str = "studiokey";
pub const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(60 * 60 * 8);

/// Per-user credential records keyed by an opaque session id.
pub trait SessionGate: Send + Sync {
    /// Attach a credential under a fresh session id and return that id.
    fn attach(&self, credential: Credential) -> String;

    fn clear(&self, session_id: &str);

    fn credential(&self, session_id: &str) -> Option<Credential>;

    fn is_attached(&self, session_id: &str) -> bool {
        self.credential(session_id).is_some()
    }
}

#[derive(Debug)]
struct SessionEntry {
    credential: Credential,
    expires_at: Instant,
}

#[derive(Debug)]
pub struct MemorySessions {
    entries: DashMap<String, SessionEntry>,
    ttl: Duration,
}

impl MemorySessions {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop expired sessions; returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.expires_at > now);
        before.saturating_sub(self.entries.len())
    }
}

impl Default for MemorySessions {
    fn default() -> Self {
        Self::new(DEFAULT_SESSION_TTL)
    }
}

impl SessionGate for MemorySessions {
    fn attach(&self, credential: Credential) -> String {
        let session_id = Uuid::new_v4().simple().to_string();
        self.entries.insert(
            session_id.clone(),
            SessionEntry {
                credential,
                expires_at: Instant::now() + self.ttl,
            },
        );
        session_id
    }

    fn clear(&self, session_id: &str) {
        self.entries.remove(session_id);
    }

    fn credential(&self, session_id: &str) -> Option<Credential> {
        let now = Instant::now();
        {
            let entry = self.entries.get(session_id)?;
            if entry.expires_at > now {
                return Some(entry.credential.clone());
            }
        }
        self.entries
            .remove_if(session_id, |_, entry| entry.expires_at <= now);
        None
    }
}

/// Session id from the request's `Cookie` headers.
pub fn session_id(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, value)| *name == SESSION_COOKIE && !value.is_empty())
        .map(|(_, value)| value.to_string())
}

/// Hard precondition for any relay work.
pub fn require_credential(
    sessions: &dyn SessionGate,
    headers: &HeaderMap,
) -> Result<Credential, ApiError> {
    session_id(headers)
        .and_then(|id| sessions.credential(&id))
        .ok_or(ApiError::NotAuthenticated)
}

/// First eight characters, enough to correlate log lines.
pub(crate) fn short_id(session_id: &str) -> &str {
    session_id.get(..8).unwrap_or(session_id)
}
