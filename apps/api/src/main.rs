mod analytics;
mod artifacts;
mod config;
mod context;
mod documents;
mod errors;
mod evaluation;
mod interviews;
mod jobs;
mod llm_client;
mod routes;
mod scheduling;
mod state;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::context::ContextStore;
use crate::llm_client::{Backend, BackendSettings, LlmGateway};
use crate::routes::build_router;
use crate::scheduling::{CalendlyProvider, SchedulingService};
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("recruit_api={}", &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Recruit API v{}", env!("CARGO_PKG_VERSION"));

    // Context store (single writer task)
    let store = ContextStore::open(config.context_path()).await?;

    // LLM gateway
    let llm = LlmGateway::new(
        BackendSettings {
            url: config.llama_api_url.clone(),
            api_key: config.llama_api_key.clone(),
        },
        BackendSettings {
            url: config.gemini_api_url.clone(),
            api_key: config.gemini_api_key.clone(),
        },
        Duration::from_secs(config.llm_timeout_secs),
    )?;
    for backend in [Backend::Llama, Backend::Gemini] {
        if !llm.has_credential(backend) {
            warn!("No API key for {backend}; calls to it will fail until one is configured");
        }
    }

    // Scheduling link cache
    let provider = CalendlyProvider::new(
        config.calendly_api_url.clone(),
        config.calendly_api_key.clone(),
    )?;
    let scheduling = SchedulingService::new(
        Arc::new(provider),
        Duration::from_secs(config.scheduling_link_ttl_hours * 3600),
    );
    info!(
        "Scheduling link TTL: {}h",
        config.scheduling_link_ttl_hours
    );

    let state = AppState {
        store,
        llm: Arc::new(llm),
        scheduling: Arc::new(scheduling),
        config: config.clone(),
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: restrict origins once the dashboard host is fixed

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
