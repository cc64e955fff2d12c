// Donor Network - Web Server
// REST API serving the network graph to the renderer

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::get,
    Router,
};
use clap::Parser;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use donor_network::{snapshot_from_sources, EngineConfig, GraphSnapshot, GraphSummary, TableSources};

/// Command-line arguments for network-server
#[derive(Parser, Debug)]
#[command(name = "network-server")]
#[command(about = "Serve the donor network graph over HTTP")]
#[command(version)]
struct Args {
    /// Port to listen on
    #[arg(short, long, default_value = "3000", env = "DONOR_NETWORK_PORT")]
    port: u16,

    /// Primary contribution ledger (CSV)
    #[arg(long, env = "DONOR_NETWORK_DONATIONS")]
    donations: PathBuf,

    /// Secondary ledger (CSV)
    #[arg(long, env = "DONOR_NETWORK_INVESTORS")]
    investors: Option<PathBuf>,

    /// Beneficiary table (CSV)
    #[arg(long, env = "DONOR_NETWORK_BENEFICIARIES")]
    beneficiaries: PathBuf,

    /// Engine configuration (TOML)
    #[arg(long, env = "DONOR_NETWORK_CONFIG")]
    config: Option<PathBuf>,
}

/// Shared application state
#[derive(Clone)]
struct AppState {
    sources: Arc<TableSources>,
    config: Arc<EngineConfig>,
}

/// API Response wrapper
#[derive(Serialize)]
struct ApiResponse<T> {
    success: bool,
    data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T> ApiResponse<T> {
    fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
            error: None,
        }
    }
}

// ============================================================================
// API Handlers
// ============================================================================

/// GET /api/health - Health check
async fn health_check() -> impl IntoResponse {
    Json(ApiResponse::ok("OK"))
}

/// Tables are re-read on every request; the build runs off the async runtime
async fn fresh_snapshot(state: &AppState) -> GraphSnapshot {
    let sources = Arc::clone(&state.sources);
    let config = Arc::clone(&state.config);

    match tokio::task::spawn_blocking(move || snapshot_from_sources(&sources, &config)).await {
        Ok(snapshot) => snapshot,
        Err(e) => {
            error!(error = %e, "graph build task failed");
            GraphSnapshot::empty()
        }
    }
}

/// GET /api/graph - Full snapshot (nodes, edges, connection count)
async fn get_graph(State(state): State<AppState>) -> impl IntoResponse {
    let snapshot = fresh_snapshot(&state).await;
    (StatusCode::OK, Json(ApiResponse::ok(snapshot)))
}

/// GET /api/summary - Connection totals
async fn get_summary(State(state): State<AppState>) -> impl IntoResponse {
    let summary: GraphSummary = fresh_snapshot(&state).await.summary();
    info!("{}", summary.describe());
    (StatusCode::OK, Json(ApiResponse::ok(summary)))
}

// ============================================================================
// Main Server
// ============================================================================

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "donor_network=info,network_server=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    let config = match &args.config {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::default(),
    };

    let mut sources = TableSources::new(&args.donations, &args.beneficiaries);
    if let Some(path) = &args.investors {
        sources = sources.with_investors(path);
    }

    let state = AppState {
        sources: Arc::new(sources),
        config: Arc::new(config),
    };

    // Build API routes
    let api_routes = Router::new()
        .route("/health", get(health_check))
        .route("/graph", get(get_graph))
        .route("/summary", get(get_summary))
        .with_state(state);

    let app = Router::new()
        .nest("/api", api_routes)
        .layer(CorsLayer::permissive());

    let addr = format!("0.0.0.0:{}", args.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!("🚀 Server running on http://localhost:{}", args.port);
    info!("   API: http://localhost:{}/api/graph", args.port);

    axum::serve(listener, app).await?;

    Ok(())
}
