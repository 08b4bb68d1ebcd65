//! Import dialog flow: select a sheet, preview it, submit, poll, finish.
//!
//! [`ImportWorkflow`] is the state machine behind an import dialog. It
//! moves `Idle -> Previewing -> Ready -> Submitting -> Polling` and
//! ends in `Done` (job completed, dialog closes) or `Failed` (job
//! failed or polling broke; the dialog stays open and a new sheet may
//! be selected). User-visible notices keep the wording of the web
//! client, German included.

use tokio_util::sync::CancellationToken;

use chorus_core::rows::{CollectionRow, EventRow};
use chorus_core::{EventKind, ImportResult, JobId};

use crate::api::{ImportApi, ImportApiError};
use crate::poller::{self, PollOutcome};

const IMPORT_STARTING: &str = "Importvorgang wird gestartet...";
const IMPORT_COMPLETED: &str = "Import erfolgreich abgeschlossen!";
const POLL_FAILED: &str = "Fehler beim Abrufen des Importstatus.";
const UNKNOWN_ERROR: &str = "Unbekannter Fehler";

/// Where an import workflow sends its sheet.
#[derive(Debug, Clone)]
pub enum ImportTarget {
    /// Event sheet creating rehearsals or services.
    Events { kind: EventKind },
    /// Piece sheet for an existing collection. `resolutions` is an
    /// optional JSON object with pre-answered match resolutions,
    /// forwarded to the server verbatim.
    Collection {
        collection_id: i64,
        resolutions: Option<String>,
    },
}

/// Parsed preview rows, shaped by the target.
#[derive(Debug, Clone)]
pub enum Preview {
    Events(Vec<EventRow>),
    Collection(Vec<CollectionRow>),
}

impl Preview {
    pub fn len(&self) -> usize {
        match self {
            Self::Events(rows) => rows.len(),
            Self::Collection(rows) => rows.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Where the dialog currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// No usable sheet selected yet.
    Idle,
    /// Preview request in flight.
    Previewing,
    /// Preview shown; waiting for the user to start the import.
    Ready,
    /// Submit request in flight.
    Submitting,
    /// Job accepted; polling its status.
    Polling,
    /// Job completed. The workflow is finished.
    Done,
    /// Job failed or polling broke. Selecting a new sheet (or
    /// resubmitting the current one) starts over.
    Failed,
}

/// State machine for one import dialog.
pub struct ImportWorkflow {
    api: ImportApi,
    target: ImportTarget,
    phase: Phase,
    sheet: Option<Vec<u8>>,
    preview: Option<Preview>,
    job_id: Option<JobId>,
    logs: Vec<String>,
    percent: u8,
    notices: Vec<String>,
    cancel: CancellationToken,
}

impl ImportWorkflow {
    pub fn new(api: ImportApi, target: ImportTarget) -> Self {
        Self {
            api,
            target,
            phase: Phase::Idle,
            sheet: None,
            preview: None,
            job_id: None,
            logs: Vec::new(),
            percent: 0,
            notices: Vec::new(),
            cancel: CancellationToken::new(),
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn preview(&self) -> Option<&Preview> {
        self.preview.as_ref()
    }

    /// Log lines as last replaced by a status snapshot.
    pub fn logs(&self) -> &[String] {
        &self.logs
    }

    pub fn percent(&self) -> u8 {
        self.percent
    }

    /// Clone of the teardown token, for wiring into Ctrl-C handlers.
    /// Cancelling it stops an in-flight poll loop; dropping the
    /// workflow cancels it as well.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Drain the accumulated user notices (snack-bar equivalents).
    pub fn take_notices(&mut self) -> Vec<String> {
        std::mem::take(&mut self.notices)
    }

    /// Select a sheet and fetch its preview.
    ///
    /// On success the workflow is `Ready` and [`Self::preview`] holds
    /// the rows. On failure a notice is queued, no job exists, and the
    /// selection stays editable (`Idle`). Selecting a sheet from
    /// `Failed` discards the previous attempt.
    pub async fn select_file(&mut self, sheet: Vec<u8>) -> bool {
        if self.phase == Phase::Done {
            tracing::debug!("Sheet selected after completion, ignoring");
            return false;
        }

        self.preview = None;
        self.job_id = None;
        self.phase = Phase::Previewing;

        let fetched = match &self.target {
            ImportTarget::Events { kind } => self
                .api
                .preview_events(*kind, sheet.clone())
                .await
                .map(Preview::Events),
            ImportTarget::Collection { collection_id, .. } => self
                .api
                .preview_collection(*collection_id, sheet.clone())
                .await
                .map(Preview::Collection),
        };

        match fetched {
            Ok(preview) => {
                self.sheet = Some(sheet);
                self.preview = Some(preview);
                self.phase = Phase::Ready;
                true
            }
            Err(e) => {
                self.notices
                    .push(format!("Fehler beim Laden der Vorschau: {}", notice_text(&e)));
                self.sheet = None;
                self.phase = Phase::Idle;
                false
            }
        }
    }

    /// Submit the selected sheet for import.
    ///
    /// On acceptance the workflow is `Polling`. On failure a notice is
    /// queued, no polling starts, and the workflow returns to `Ready`
    /// so the same sheet can be resubmitted.
    pub async fn submit(&mut self) -> bool {
        if !matches!(self.phase, Phase::Ready | Phase::Failed) {
            return false;
        }
        let Some(sheet) = self.sheet.clone() else {
            return false;
        };

        self.phase = Phase::Submitting;
        self.logs = vec![IMPORT_STARTING.to_string()];
        self.percent = 0;

        let started = match &self.target {
            ImportTarget::Events { kind } => self.api.start_event_import(*kind, sheet).await,
            ImportTarget::Collection {
                collection_id,
                resolutions,
            } => {
                self.api
                    .start_collection_import(*collection_id, sheet, resolutions.clone())
                    .await
            }
        };

        match started {
            Ok(job_id) => {
                tracing::info!(job_id = %job_id, "Import job accepted");
                self.job_id = Some(job_id);
                self.phase = Phase::Polling;
                true
            }
            Err(e) => {
                self.notices.push(format!(
                    "Import konnte nicht gestartet werden: {}",
                    notice_text(&e)
                ));
                self.phase = Phase::Ready;
                false
            }
        }
    }

    /// Poll the accepted job to its terminal state.
    ///
    /// `on_update` runs once per snapshot with the percentage and the
    /// replaced log lines, after the workflow's own copies are updated.
    /// Returns the resulting phase: `Done` on completion, `Failed` on
    /// job failure or a broken status request. Cancellation leaves the
    /// workflow untouched mid-`Polling`.
    pub async fn poll_to_end(&mut self, mut on_update: impl FnMut(u8, &[String])) -> Phase {
        if self.phase != Phase::Polling {
            return self.phase;
        }
        let Some(job_id) = self.job_id.clone() else {
            return self.phase;
        };

        let api = &self.api;
        let logs = &mut self.logs;
        let percent = &mut self.percent;

        let outcome = poller::poll_until_terminal(api, &job_id, &self.cancel, |p, lines| {
            *percent = p;
            *logs = lines.to_vec();
            on_update(p, lines);
        })
        .await;

        match outcome {
            PollOutcome::Completed(result) => {
                self.notices.push(completion_notice(result.as_ref()));
                self.phase = Phase::Done;
            }
            PollOutcome::Failed(error) => {
                let error = error
                    .filter(|e| !e.is_empty())
                    .unwrap_or_else(|| UNKNOWN_ERROR.to_string());
                self.logs.push(format!("ERROR: {error}"));
                self.notices.push(format!("Import fehlgeschlagen: {error}"));
                self.phase = Phase::Failed;
            }
            PollOutcome::TransportError(_) => {
                self.notices.push(POLL_FAILED.to_string());
                self.phase = Phase::Failed;
            }
            PollOutcome::Cancelled => {}
        }

        self.phase
    }
}

impl Drop for ImportWorkflow {
    fn drop(&mut self) {
        // Teardown: any clone of the token (Ctrl-C handler, display
        // task) observes the cancellation and stops.
        self.cancel.cancel();
    }
}

/// Final notice for a completed job: the server's result message with
/// an error count appended when row errors occurred.
fn completion_notice(result: Option<&ImportResult>) -> String {
    let mut notice = match result {
        Some(r) if !r.message.is_empty() => r.message.clone(),
        _ => IMPORT_COMPLETED.to_string(),
    };
    if let Some(r) = result {
        if !r.errors.is_empty() {
            notice.push_str(&format!(" ({} Fehler aufgetreten)", r.errors.len()));
        }
    }
    notice
}

/// Render an API error the way the web client does: server message,
/// then ` - detail` and ` (hint)` when present.
fn notice_text(err: &ImportApiError) -> String {
    match err {
        ImportApiError::Api {
            message,
            detail,
            hint,
            ..
        } => {
            let mut text = if message.is_empty() {
                UNKNOWN_ERROR.to_string()
            } else {
                message.clone()
            };
            if let Some(detail) = detail {
                text.push_str(&format!(" - {detail}"));
            }
            if let Some(hint) = hint {
                text.push_str(&format!(" ({hint})"));
            }
            text
        }
        ImportApiError::Request(_) => UNKNOWN_ERROR.to_string(),
    }
}
