//! Route definitions for the `/import` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::import;
use crate::state::AppState;

/// Routes mounted at `/import`.
///
/// ```text
/// POST /events/preview             -> preview_events
/// POST /events                     -> start_events
/// POST /collections/{id}/preview   -> preview_collection
/// POST /collections/{id}           -> start_collection
/// GET  /status/{job_id}            -> job_status
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/events/preview", post(import::preview_events))
        .route("/events", post(import::start_events))
        .route("/collections/{id}/preview", post(import::preview_collection))
        .route("/collections/{id}", post(import::start_collection))
        .route("/status/{job_id}", get(import::job_status))
}
