use std::sync::Arc;

use competency_engine::CompetencyEngine;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (the engine shares its store behind an `Arc`).
#[derive(Clone)]
pub struct AppState {
    /// Reconciliation engine over the configured backing store.
    pub engine: CompetencyEngine,
    /// Server configuration (read by the auth extractor).
    pub config: Arc<ServerConfig>,
}
