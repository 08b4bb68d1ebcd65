//! REST API client for the import HTTP endpoints.
//!
//! Wraps the import API (sheet preview, job submission, status
//! polling) using [`reqwest`]. Sheets travel as `multipart/form-data`
//! with the CSV bytes in a `csvfile` part, matching what the server
//! expects.

use serde::Deserialize;

use chorus_core::rows::{CollectionRow, EventRow};
use chorus_core::{EventKind, ImportJob, JobId};

/// HTTP client for a single import API server.
pub struct ImportApi {
    client: reqwest::Client,
    base_url: String,
}

/// Response returned by the submit endpoints after a job has been
/// accepted for background execution.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct JobAccepted {
    job_id: JobId,
}

/// JSON error payload the server attaches to non-2xx responses.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
    #[serde(default)]
    detail: Option<String>,
    #[serde(default)]
    hint: Option<String>,
}

/// Errors from the import REST API layer.
#[derive(Debug, thiserror::Error)]
pub enum ImportApiError {
    /// The HTTP request itself failed (network, DNS, TLS, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The server returned a non-2xx status code.
    #[error("API error ({status}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Server-provided error message.
        message: String,
        /// Underlying diagnostics, e.g. CSV parser output.
        detail: Option<String>,
        /// Suggestion for fixing the upload.
        hint: Option<String>,
    },
}

impl ImportApi {
    /// Create a new API client for an import server.
    ///
    /// * `base_url` - Base HTTP URL, e.g. `http://localhost:3000`.
    pub fn new(base_url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url,
        }
    }

    /// Create an API client reusing an existing [`reqwest::Client`].
    pub fn with_client(client: reqwest::Client, base_url: String) -> Self {
        Self { client, base_url }
    }

    /// Parse an event sheet on the server and return the preview rows.
    ///
    /// Nothing is imported and no job is created.
    pub async fn preview_events(
        &self,
        kind: EventKind,
        sheet: Vec<u8>,
    ) -> Result<Vec<EventRow>, ImportApiError> {
        let response = self
            .client
            .post(format!(
                "{}/api/v1/import/events/preview?type={kind}",
                self.base_url
            ))
            .multipart(sheet_form(sheet)?)
            .send()
            .await?;

        Self::parse_response(response).await
    }

    /// Submit an event sheet for background import.
    ///
    /// Returns the server-assigned job id to poll.
    pub async fn start_event_import(
        &self,
        kind: EventKind,
        sheet: Vec<u8>,
    ) -> Result<JobId, ImportApiError> {
        let response = self
            .client
            .post(format!("{}/api/v1/import/events?type={kind}", self.base_url))
            .multipart(sheet_form(sheet)?)
            .send()
            .await?;

        let accepted: JobAccepted = Self::parse_response(response).await?;
        Ok(accepted.job_id)
    }

    /// Parse a collection sheet on the server and return the preview rows.
    pub async fn preview_collection(
        &self,
        collection_id: i64,
        sheet: Vec<u8>,
    ) -> Result<Vec<CollectionRow>, ImportApiError> {
        let response = self
            .client
            .post(format!(
                "{}/api/v1/import/collections/{collection_id}/preview",
                self.base_url
            ))
            .multipart(sheet_form(sheet)?)
            .send()
            .await?;

        Self::parse_response(response).await
    }

    /// Submit a collection sheet for background import.
    ///
    /// `resolutions` is an optional JSON object keyed by row index with
    /// user answers for ambiguous matches; it is forwarded verbatim.
    pub async fn start_collection_import(
        &self,
        collection_id: i64,
        sheet: Vec<u8>,
        resolutions: Option<String>,
    ) -> Result<JobId, ImportApiError> {
        let mut form = sheet_form(sheet)?;
        if let Some(json) = resolutions {
            form = form.text("resolutions", json);
        }

        let response = self
            .client
            .post(format!(
                "{}/api/v1/import/collections/{collection_id}",
                self.base_url
            ))
            .multipart(form)
            .send()
            .await?;

        let accepted: JobAccepted = Self::parse_response(response).await?;
        Ok(accepted.job_id)
    }

    /// Fetch the current snapshot of an import job.
    ///
    /// Unknown and expired job ids surface as a 404 [`ImportApiError::Api`].
    pub async fn job_status(&self, job_id: &str) -> Result<ImportJob, ImportApiError> {
        let response = self
            .client
            .get(format!(
                "{}/api/v1/import/status/{job_id}",
                self.base_url
            ))
            .send()
            .await?;

        Self::parse_response(response).await
    }

    // ---- private helpers ----

    /// Ensure the response has a success status code. Returns the
    /// response unchanged on success, or an [`ImportApiError::Api`]
    /// built from the server's error payload on failure.
    async fn ensure_success(
        response: reqwest::Response,
    ) -> Result<reqwest::Response, ImportApiError> {
        let status = response.status();
        if !status.is_success() {
            let text = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(match serde_json::from_str::<ErrorBody>(&text) {
                Ok(body) => ImportApiError::Api {
                    status: status.as_u16(),
                    message: body.message,
                    detail: body.detail,
                    hint: body.hint,
                },
                // Not our JSON shape; keep the raw body as the message.
                Err(_) => ImportApiError::Api {
                    status: status.as_u16(),
                    message: text,
                    detail: None,
                    hint: None,
                },
            });
        }
        Ok(response)
    }

    /// Parse a successful JSON response body into the expected type.
    async fn parse_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, ImportApiError> {
        let response = Self::ensure_success(response).await?;
        Ok(response.json::<T>().await?)
    }
}

/// Build a multipart form with the sheet bytes in the `csvfile` part.
fn sheet_form(sheet: Vec<u8>) -> Result<reqwest::multipart::Form, ImportApiError> {
    let part = reqwest::multipart::Part::bytes(sheet)
        .file_name("sheet.csv")
        .mime_str("text/csv")?;
    Ok(reqwest::multipart::Form::new().part("csvfile", part))
}
