mod analysis;
mod assistant_client;
mod config;
mod errors;
mod routes;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::analysis::orchestrator::AnalysisService;
use crate::assistant_client::OpenAiAssistantClient;
use crate::config::Config;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails only on malformed tuning values)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}={}",
                env!("CARGO_PKG_NAME").replace('-', "_"),
                &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Screening API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize assistant client. Built even without credentials: the
    // analysis service never calls it while in fallback mode.
    let client = OpenAiAssistantClient::new(
        &config.assistant_api_base,
        config.assistant.api_key.clone().unwrap_or_default(),
        config.assistant.organization_id.clone().unwrap_or_default(),
        config.request_timeout,
    )?;
    info!("Assistant client initialized (base: {})", config.assistant_api_base);

    // Two-phase init: construct, then validate + probe
    let analysis = Arc::new(AnalysisService::new(
        config.assistant.clone(),
        Arc::new(client),
        config.analysis,
    ));
    let assistant_status = analysis.initialize().await;
    info!(
        "Analysis service ready: mode={:?}, reachable={}",
        assistant_status.mode, assistant_status.reachable
    );

    let state = AppState {
        analysis,
        assistant_status,
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: restrict CORS origins to the submission frontend

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
