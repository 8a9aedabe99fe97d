use std::error::Error;
use std::sync::Arc;
use std::time::Duration;

use axum::http::header::CONTENT_TYPE;
use axum::http::Method;
use clap::Parser;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use tracing::{debug, info, warn};

use aistudio_core::{CookieSettings, Core, MemorySessions};
use aistudio_protocol::RequestDefaults;
use aistudio_provider_impl::OpenAIProvider;

mod cli;

use crate::cli::Cli;

const SESSION_SWEEP_INTERVAL: Duration = Duration::from_secs(300);

#[tokio::main]
async fn main() {
    let dotenv = dotenvy::dotenv();
    init_tracing();
    if let Ok(path) = dotenv {
        info!(path = %path.display(), "loaded .env");
    }
    if let Err(err) = run().await {
        eprintln!("aistudio failed: {err}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn Error + Send + Sync>> {
    let cli = Cli::parse();
    info!(
        host = %cli.host,
        port = cli.port,
        upstream = %cli.upstream_base,
        proxy = cli.proxy.is_some(),
        default_model = %cli.default_model,
        max_output_tokens = cli.max_output_tokens,
        session_ttl_secs = cli.session_ttl_secs,
        "config loaded"
    );

    let provider = Arc::new(OpenAIProvider::new(
        &cli.upstream_base,
        cli.proxy.as_deref(),
    )?);
    info!(endpoint = %provider.endpoint(), "provider ready");

    let ttl = Duration::from_secs(cli.session_ttl_secs);
    let sessions = Arc::new(MemorySessions::new(ttl));
    spawn_session_sweeper(sessions.clone());

    let core = Core::new(
        provider,
        sessions,
        RequestDefaults {
            model: cli.default_model.clone(),
            max_output_tokens: cli.max_output_tokens,
        },
        CookieSettings {
            secure: cli.cookie_secure,
            max_age: ttl,
        },
    );
    let app = core
        .router()
        .layer(RequestBodyLimitLayer::new(cli.body_limit))
        .layer(cors_layer())
        .layer(TraceLayer::new_for_http());

    let bind = format!("{}:{}", cli.host, cli.port);
    let listener = tokio::net::TcpListener::bind(&bind).await?;
    info!(addr = %bind, "listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        tracing_subscriber::EnvFilter::new(
            "aistudio=info,aistudio_core=info,aistudio_provider_impl=info,tower_http=info",
        )
    });
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// The browser client may live on another origin and sends the session cookie.
fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(AllowOrigin::mirror_request())
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([CONTENT_TYPE])
}

fn spawn_session_sweeper(sessions: Arc<MemorySessions>) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(SESSION_SWEEP_INTERVAL);
        loop {
            ticker.tick().await;
            let removed = sessions.purge_expired();
            if removed > 0 {
                debug!(removed, remaining = sessions.len(), "expired sessions purged");
            }
        }
    });
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutting down");
}
