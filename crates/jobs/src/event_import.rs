//! Executor for event sheet imports.
//!
//! Walks parsed event rows, resolving each piece reference against the
//! catalog and filing the piece into the event for that date. Rows
//! sharing a date produce one event, and a piece joins a program at
//! most once, so re-uploading an overlapping sheet cannot duplicate
//! anything. A row with an unresolvable reference is reported and
//! skipped; an unparseable date fails the whole job, since it usually
//! means the wrong file or column was uploaded.

use chorus_core::rows::EventRow;
use chorus_core::{dates, EventKind, ImportResult};

use crate::catalog::{Catalog, CatalogError};
use crate::registry::JobRegistry;

#[derive(Debug, thiserror::Error)]
enum RowError {
    #[error("Missing reference")]
    MissingReference,
    #[error("No piece found for reference \"{0}\"")]
    UnknownReference(String),
    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

/// Run an event import job to its terminal state.
pub async fn run(
    registry: &JobRegistry,
    catalog: &dyn Catalog,
    job_id: &str,
    kind: EventKind,
    rows: Vec<EventRow>,
) {
    let total = rows.len() as u32;
    registry.update_progress(job_id, 0, total).await;

    let mut imported = 0u32;
    let mut errors: Vec<String> = Vec::new();

    for (index, row) in rows.iter().enumerate() {
        let row_no = index + 1;

        let Some(date) = dates::parse_german_date(&row.date) else {
            registry
                .fail(job_id, &format!("Invalid date in row {row_no}"))
                .await;
            return;
        };

        match import_row(registry, catalog, job_id, kind, row, row_no, date).await {
            Ok(()) => imported += 1,
            Err(e) => {
                let message = format!("Error on row {row_no}: {e}");
                errors.push(message.clone());
                registry.append_log(job_id, &message).await;
            }
        }
        registry.update_progress(job_id, row_no as u32, total).await;
    }

    let result = ImportResult {
        message: format!("Imported {imported} rows"),
        added_count: imported,
        errors,
    };
    registry.complete(job_id, result).await;
}

async fn import_row(
    registry: &JobRegistry,
    catalog: &dyn Catalog,
    job_id: &str,
    kind: EventKind,
    row: &EventRow,
    row_no: usize,
    date: chrono::NaiveDate,
) -> Result<(), RowError> {
    let reference = row.reference.trim();
    if reference.is_empty() {
        return Err(RowError::MissingReference);
    }

    registry
        .append_log(job_id, &format!("Processing row {row_no}: \"{reference}\"..."))
        .await;

    let piece = catalog
        .resolve_reference(reference)
        .await?
        .ok_or_else(|| RowError::UnknownReference(reference.to_string()))?;

    let date_label = dates::german_date_string(date);
    let (event_id, created) = catalog.find_or_create_event(date, kind).await?;
    if created {
        registry
            .append_log(job_id, &format!("{kind} on {date_label} created."))
            .await;
    }

    let linked = catalog.link_piece_to_event(event_id, piece.id).await?;
    if linked {
        registry
            .append_log(
                job_id,
                &format!("-> Linked \"{}\" to the {kind} on {date_label}.", piece.title),
            )
            .await;
    } else {
        registry
            .append_log(
                job_id,
                &format!("-> \"{}\" is already on the program.", piece.title),
            )
            .await;
    }
    Ok(())
}

// ── Tests ────────────────────────────────────────────────────────────
