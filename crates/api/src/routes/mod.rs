pub mod health;
pub mod import;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /import/events/preview              preview event sheet (POST, multipart)
/// /import/events                      start event import (POST, multipart)
/// /import/collections/{id}/preview    preview collection sheet (POST, multipart)
/// /import/collections/{id}            start collection import (POST, multipart)
/// /import/status/{job_id}             poll job status (GET)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new().nest("/import", import::router())
}
