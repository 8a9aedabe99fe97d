use clap::Parser;

use aistudio_protocol::request::{DEFAULT_MAX_OUTPUT_TOKENS, DEFAULT_MODEL};
use aistudio_provider_impl::provider::openai::DEFAULT_BASE_URL;

#[derive(Debug, Clone, Parser)]
#[command(name = "aistudio", version, about = "Session-gated streaming relay for model generation")]
pub(crate) struct Cli {
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    pub host: String,

    #[arg(long, env = "PORT", default_value_t = 8787)]
    pub port: u16,

    /// Provider base URL; `/v1/responses` is appended.
    #[arg(long, env = "UPSTREAM_BASE", default_value = DEFAULT_BASE_URL)]
    pub upstream_base: String,

    #[arg(long, env = "UPSTREAM_PROXY")]
    pub proxy: Option<String>,

    #[arg(long, env = "DEFAULT_MODEL", default_value = DEFAULT_MODEL)]
    pub default_model: String,

    #[arg(long, env = "MAX_OUTPUT_TOKENS", default_value_t = DEFAULT_MAX_OUTPUT_TOKENS)]
    pub max_output_tokens: u32,

    #[arg(long, env = "SESSION_TTL_SECS", default_value_t = 8 * 60 * 60)]
    pub session_ttl_secs: u64,

    /// Mark the session cookie `Secure`; enable behind HTTPS.
    #[arg(long, env = "COOKIE_SECURE")]
    pub cookie_secure: bool,

    /// Inbound request body limit in bytes.
    #[arg(long, env = "BODY_LIMIT", default_value_t = 1024 * 1024)]
    pub body_limit: usize,
}
