//! HTTP front end: one aggregate cycle per `/all-train-data` request.

use std::net::SocketAddr;
use std::path::Path;

use anyhow::Result;
use axum::Router;
use axum::extract::State;
use axum::response::Json;
use axum::routing::get;
use serde::Serialize;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tracing::info;

use crate::aggregate::{AggregateResponse, Aggregator};

pub const BANNER: &str = "MTA Train Tracker Backend is Running!";

/// Whether a source has an endpoint. URLs are withheld since they may carry keys.
#[derive(Debug, Serialize)]
pub struct SourceStatus {
    pub name: String,
    pub configured: bool,
}

async fn index() -> &'static str {
    BANNER
}

async fn all_train_data(State(aggregator): State<Aggregator>) -> Json<AggregateResponse> {
    info!("Received request for /all-train-data");
    Json(aggregator.run().await)
}

async fn sources(State(aggregator): State<Aggregator>) -> Json<Vec<SourceStatus>> {
    let statuses = aggregator
        .registry()
        .iter()
        .map(|s| SourceStatus {
            name: s.name.clone(),
            configured: s.is_configured(),
        })
        .collect();
    Json(statuses)
}

/// Builds the router. Files under `static_dir`, if given, are served for any
/// path no route claims.
pub fn build_router(aggregator: Aggregator, static_dir: Option<&Path>) -> Router {
    let app = Router::new()
        .route("/", get(index))
        .route("/all-train-data", get(all_train_data))
        .route("/sources", get(sources))
        .with_state(aggregator);

    let app = match static_dir {
        Some(dir) => app.fallback_service(ServeDir::new(dir)),
        None => app,
    };

    app.layer(CorsLayer::permissive())
}

/// Binds `addr` and serves until the process is stopped.
pub async fn serve(addr: SocketAddr, router: Router) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(addr = %listener.local_addr()?, "Server running");
    axum::serve(listener, router).await?;
    Ok(())
}
