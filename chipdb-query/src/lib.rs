//! chipdb-query library - read-only HTTP view of the component store
//!
//! The service never resets or writes the store. It opens the store
//! lazily on the first request so it can start before any ingestion run
//! has created the file.

use axum::Router;
use chipdb_common::ComponentStore;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::OnceCell;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;

pub mod api;
pub mod error;

pub use error::ApiError;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    pub(crate) db_path: Arc<PathBuf>,
    store: Arc<OnceCell<ComponentStore>>,
}

impl AppState {
    /// State that opens the store at `db_path` on first use
    pub fn new(db_path: impl Into<PathBuf>) -> Self {
        Self {
            db_path: Arc::new(db_path.into()),
            store: Arc::new(OnceCell::new()),
        }
    }

    /// Read-only store handle. A failed open is not cached; the next
    /// request tries again.
    pub async fn store(&self) -> chipdb_common::Result<&ComponentStore> {
        self.store
            .get_or_try_init(|| async {
                let store = ComponentStore::open_read_only(&self.db_path).await?;
                info!("Opened component store (read-only): {}", self.db_path.display());
                Ok::<_, chipdb_common::Error>(store)
            })
            .await
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(api::report_routes())
        .merge(api::health_routes())
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
