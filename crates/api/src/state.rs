use std::sync::Arc;

use chorus_jobs::{Catalog, JobRegistry};

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc`).
#[derive(Clone)]
pub struct AppState {
    /// In-memory store of import job snapshots.
    pub registry: Arc<JobRegistry>,
    /// The choir catalog imports resolve against.
    pub catalog: Arc<dyn Catalog>,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
}
