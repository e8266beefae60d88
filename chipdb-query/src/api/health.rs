//! Health check endpoint
//!
//! The service itself is healthy whenever it answers. Store reachability is
//! reported alongside so a missing or half-written store is visible without
//! hitting `/report`.

use axum::{extract::State, routing::get, Json, Router};
use chipdb_common::ComponentFilter;
use serde::Serialize;
use tracing::debug;

use crate::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub module: &'static str,
    pub version: &'static str,
    pub store: StoreHealth,
}

#[derive(Debug, Serialize)]
pub struct StoreHealth {
    pub location: String,
    pub reachable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub components: Option<i64>,
}

/// GET /health
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let components = match state.store().await {
        Ok(store) => store.count(&ComponentFilter::all()).await,
        Err(e) => Err(e),
    };

    let components = match components {
        Ok(count) => Some(count),
        Err(e) => {
            debug!("Store not reachable for health check: {}", e);
            None
        }
    };

    Json(HealthResponse {
        status: "ok",
        module: "chipdb-query",
        version: env!("CARGO_PKG_VERSION"),
        store: StoreHealth {
            location: state.db_path.display().to_string(),
            reachable: components.is_some(),
            components,
        },
    })
}

pub fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
