mod core;
mod error;
mod handler;
pub mod relay;
pub mod session;

pub use crate::core::{Core, CoreState, CookieSettings};
pub use error::ApiError;
pub use relay::{relay, RelayOutcome, RelaySession};
pub use session::{MemorySessions, SessionGate, SESSION_COOKIE};
