use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use chorus_core::rows::ParseError;
use chorus_jobs::CatalogError;

/// Application-level error type for HTTP handlers.
///
/// Implements [`IntoResponse`] to produce the error body clients parse:
/// `{message, detail?, hint?}`. The `message` strings are stable; the
/// web client displays them verbatim.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// The uploaded sheet could not be read as CSV.
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// A malformed request (missing upload part, bad query value).
    #[error("{0}")]
    BadRequest(String),

    /// Unknown or expired job id.
    #[error("Job not found.")]
    JobNotFound,

    /// Unknown collection id.
    #[error("Collection not found.")]
    CollectionNotFound,

    /// A catalog lookup failed.
    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

/// Wire shape of every error response.
#[derive(Serialize)]
struct ErrorBody {
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    detail: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    hint: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, detail, hint) = match &self {
            AppError::Parse(err) => (
                StatusCode::BAD_REQUEST,
                Some(err.detail()),
                Some(String::from(
                    "Expected a semicolon-delimited UTF-8 CSV sheet with a header line.",
                )),
            ),
            AppError::BadRequest(_) => (StatusCode::BAD_REQUEST, None, None),
            AppError::JobNotFound | AppError::CollectionNotFound => {
                (StatusCode::NOT_FOUND, None, None)
            }
            // CatalogError only has not-found variants.
            AppError::Catalog(_) => (StatusCode::NOT_FOUND, None, None),
        };

        let body = ErrorBody {
            message: self.to_string(),
            detail,
            hint,
        };
        (status, axum::Json(body)).into_response()
    }
}

// ── Tests ────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_errors_map_to_404() {
        let response = AppError::JobNotFound.into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = AppError::CollectionNotFound.into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_bad_request_maps_to_400() {
        let response = AppError::BadRequest("No CSV file uploaded.".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_parse_error_carries_detail() {
        let err = chorus_core::rows::parse_event_rows(b"reference;date\nX1;a;b;c\nbroken")
            .unwrap_err();
        let response = AppError::from(err).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
