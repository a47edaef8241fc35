mod error;
mod model;
mod prompt;
mod routes;
mod server_config;
mod triage;

use std::sync::Arc;

use axum::extract::FromRef;
use mimalloc::MiMalloc;
use tokio::signal;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use routes::AppRouter;
use server_config::{cfg, gemini_api_key};
use triage::TriageContext;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

pub type HttpClient = reqwest::Client;

#[derive(Clone, FromRef)]
pub struct ServerState {
    pub http_client: HttpClient,
    pub triage: Arc<TriageContext>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with(tracing_subscriber::fmt::Layer::default().with_ansi(false))
        .init();

    // Missing artifacts are fatal; refuse to serve rather than limp along.
    let triage = Arc::new(TriageContext::load()?);
    tracing::info!("Fitted artifacts loaded");

    if gemini_api_key().is_none() {
        tracing::warn!("GEMINI_API_KEY is not set; fallback path will degrade to safe defaults");
    }

    let http_client = reqwest::ClientBuilder::new().use_rustls_tls().build()?;

    let state = ServerState {
        http_client,
        triage,
    };

    let router = AppRouter::create(state);

    let listener = tokio::net::TcpListener::bind(&cfg.http.listen_addr).await?;
    tracing::info!("Listening on {}", cfg.http.listen_addr);
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    signal::ctrl_c()
        .await
        .expect("Failed to install Ctrl+C handler");
    tracing::info!("Shutdown signal received");
}
