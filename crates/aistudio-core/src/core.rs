use std::sync::Arc;
use std::time::Duration;

use axum::routing::{get, post};
use axum::Router;

use aistudio_protocol::RequestDefaults;
use aistudio_provider_core::Provider;

use crate::handler::{ai_handler, login_handler, logout_handler, session_handler};
use crate::session::{SessionGate, DEFAULT_SESSION_TTL, SESSION_COOKIE};

#[derive(Debug, Clone)]
pub struct CookieSettings {
    pub secure: bool,
    pub max_age: Duration,
}

impl Default for CookieSettings {
    fn default() -> Self {
        Self {
            secure: false,
            max_age: DEFAULT_SESSION_TTL,
        }
    }
}

impl CookieSettings {
    pub fn issue(&self, session_id: &str) -> String {
        self.render(session_id, self.max_age.as_secs())
    }

    pub fn expire(&self) -> String {
        self.render("", 0)
    }

    fn render(&self, value: &str, max_age: u64) -> String {
        let secure = if self.secure { "; Secure" } else { "" };
        format!("{SESSION_COOKIE}={value}; Path=/; HttpOnly; SameSite=Lax; Max-Age={max_age}{secure}")
    }
}

pub struct CoreState {
    pub provider: Arc<dyn Provider>,
    pub sessions: Arc<dyn SessionGate>,
    pub defaults: RequestDefaults,
    pub cookie: CookieSettings,
}

pub struct Core {
    state: Arc<CoreState>,
}

impl Core {
    pub fn new(
        provider: Arc<dyn Provider>,
        sessions: Arc<dyn SessionGate>,
        defaults: RequestDefaults,
        cookie: CookieSettings,
    ) -> Self {
        Self {
            state: Arc::new(CoreState {
                provider,
                sessions,
                defaults,
                cookie,
            }),
        }
    }

    pub fn router(&self) -> Router {
        Router::new()
            .route("/api/login", post(login_handler))
            .route("/api/logout", post(logout_handler))
            .route("/api/session", get(session_handler))
            .route("/api/ai", post(ai_handler))
            .with_state(self.state.clone())
    }
}
