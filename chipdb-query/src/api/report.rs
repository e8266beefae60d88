//! Component report endpoint

use axum::{extract::State, routing::get, Json, Router};
use chipdb_common::report::{json_report, ReportEntry};
use tracing::debug;

use crate::error::ApiResult;
use crate::AppState;

/// GET /report
///
/// Every stored component as `{"Type": ..., "Name": ...}`, in insertion
/// order. One scan per request.
pub async fn get_report(State(state): State<AppState>) -> ApiResult<Json<Vec<ReportEntry>>> {
    let store = state.store().await?;
    let entries = json_report(store).await?;
    debug!(count = entries.len(), "Serving component report");
    Ok(Json(entries))
}

pub fn report_routes() -> Router<AppState> {
    Router::new().route("/report", get(get_report))
}
