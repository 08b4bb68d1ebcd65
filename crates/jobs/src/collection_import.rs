//! Executor for collection sheet imports.
//!
//! Each row names a piece by number, title and composer. Composers and
//! pieces are found by fuzzy matching against the catalog and created
//! when nothing matches; a match the scorer cannot settle becomes a row
//! error asking for a user resolution. Resolutions are keyed by row
//! index and either pin an existing catalog id or force a create.
//!
//! Row problems are collected and the job still completes; only losing
//! the target collection fails it.

use std::collections::HashMap;

use chorus_core::matching::{self, MatchOutcome};
use chorus_core::naming::format_person_name;
use chorus_core::rows::CollectionRow;
use chorus_core::ImportResult;
use serde::Deserialize;

use crate::catalog::{Catalog, CatalogError, CatalogId, Composer, Piece};
use crate::registry::JobRegistry;

/// Voicing written to created pieces when the sheet leaves it empty.
const DEFAULT_VOICING: &str = "SATB";

/// A user's answer for one row the matcher could not settle on its own.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Resolution {
    /// Use this composer instead of matching by name.
    #[serde(default)]
    pub composer_id: Option<CatalogId>,
    /// Use this piece instead of matching by title.
    #[serde(default)]
    pub piece_id: Option<CatalogId>,
    /// Create a new composer even when candidates exist.
    #[serde(default)]
    pub create_new_composer: bool,
    /// Create a new piece even when candidates exist.
    #[serde(default)]
    pub create_new_piece: bool,
}

/// Resolutions keyed by zero-based row index.
pub type Resolutions = HashMap<usize, Resolution>;

#[derive(Debug, thiserror::Error)]
enum RowError {
    #[error("Skipping row due to missing data: {0}")]
    MissingData(String),
    #[error("Ambiguous composer match for \"{0}\". A resolution is required.")]
    AmbiguousComposer(String),
    #[error("Ambiguous piece match for \"{0}\". A resolution is required.")]
    AmbiguousPiece(String),
    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

/// Run a collection import job to its terminal state.
pub async fn run(
    registry: &JobRegistry,
    catalog: &dyn Catalog,
    job_id: &str,
    collection_id: CatalogId,
    rows: Vec<CollectionRow>,
    resolutions: Resolutions,
) {
    let collection = match catalog.collection(collection_id).await {
        Ok(Some(collection)) => collection,
        Ok(None) => {
            registry.fail(job_id, "Collection not found.").await;
            return;
        }
        Err(e) => {
            registry.fail(job_id, &e.to_string()).await;
            return;
        }
    };

    let total = rows.len() as u32;
    registry.update_progress(job_id, 0, total).await;

    let mut added = 0u32;
    let mut errors: Vec<String> = Vec::new();

    for (index, row) in rows.iter().enumerate() {
        let row_no = index + 1;
        let resolution = resolutions.get(&index);

        match import_row(registry, catalog, job_id, collection.id, row, row_no, resolution).await
        {
            Ok(()) => added += 1,
            Err(e) => {
                let message = format!("Error on row {row_no}: {e}");
                errors.push(message.clone());
                registry.append_log(job_id, &message).await;
            }
        }
        registry.update_progress(job_id, row_no as u32, total).await;
    }

    let result = ImportResult {
        message: format!("Import complete. {added} pieces processed."),
        added_count: added,
        errors,
    };
    registry.complete(job_id, result).await;
}

async fn import_row(
    registry: &JobRegistry,
    catalog: &dyn Catalog,
    job_id: &str,
    collection_id: CatalogId,
    row: &CollectionRow,
    row_no: usize,
    resolution: Option<&Resolution>,
) -> Result<(), RowError> {
    let (Some(number), Some(title), Some(composer_name)) = (
        non_empty(row.number.as_deref()),
        non_empty(row.title.as_deref()),
        non_empty(row.composer.as_deref()),
    ) else {
        let json = serde_json::to_string(row).unwrap_or_else(|_| String::from("{}"));
        return Err(RowError::MissingData(json));
    };

    registry
        .append_log(job_id, &format!("Processing row {row_no}: \"{title}\"..."))
        .await;

    let composer = resolve_composer(registry, catalog, job_id, composer_name, resolution).await?;
    let piece = resolve_piece(registry, catalog, job_id, &composer, title, row, resolution).await?;

    catalog
        .link_piece_to_collection(collection_id, piece.id, number)
        .await?;
    registry
        .append_log(
            job_id,
            &format!("-> Linked to collection with number {number}."),
        )
        .await;
    Ok(())
}

fn non_empty(field: Option<&str>) -> Option<&str> {
    field.map(str::trim).filter(|s| !s.is_empty())
}

/// Pick the composer for a row: an explicit resolution wins, then a
/// settled fuzzy match, then a freshly created entry.
async fn resolve_composer(
    registry: &JobRegistry,
    catalog: &dyn Catalog,
    job_id: &str,
    name: &str,
    resolution: Option<&Resolution>,
) -> Result<Composer, RowError> {
    if let Some(resolution) = resolution {
        if let Some(id) = resolution.composer_id {
            let composer = catalog
                .composer(id)
                .await?
                .ok_or(CatalogError::ComposerNotFound)?;
            return Ok(composer);
        }
        if resolution.create_new_composer {
            return create_composer(registry, catalog, job_id, name).await;
        }
    }

    let candidates = catalog.composers().await?;
    match matching::best_match(name, &candidates, |c| c.name.as_str()) {
        MatchOutcome::Unique(composer) => Ok(composer.clone()),
        MatchOutcome::NoMatch => create_composer(registry, catalog, job_id, name).await,
        MatchOutcome::Ambiguous(_) => Err(RowError::AmbiguousComposer(name.to_string())),
    }
}

async fn create_composer(
    registry: &JobRegistry,
    catalog: &dyn Catalog,
    job_id: &str,
    name: &str,
) -> Result<Composer, RowError> {
    let composer = catalog.create_composer(&format_person_name(name)).await?;
    registry
        .append_log(job_id, &format!("Composer \"{}\" created.", composer.name))
        .await;
    Ok(composer)
}

/// Pick the piece for a row, scoped to the resolved composer's works.
async fn resolve_piece(
    registry: &JobRegistry,
    catalog: &dyn Catalog,
    job_id: &str,
    composer: &Composer,
    title: &str,
    row: &CollectionRow,
    resolution: Option<&Resolution>,
) -> Result<Piece, RowError> {
    if let Some(resolution) = resolution {
        if let Some(id) = resolution.piece_id {
            let piece = catalog.piece(id).await?.ok_or(CatalogError::PieceNotFound)?;
            return Ok(piece);
        }
        if resolution.create_new_piece {
            return create_piece(registry, catalog, job_id, composer, title, row).await;
        }
    }

    let candidates = catalog.pieces_by_composer(composer.id).await?;
    match matching::best_match(title, &candidates, |p| p.title.as_str()) {
        MatchOutcome::Unique(piece) => {
            registry
                .append_log(job_id, &format!("Piece \"{}\" already exists.", piece.title))
                .await;
            Ok(piece.clone())
        }
        MatchOutcome::NoMatch => create_piece(registry, catalog, job_id, composer, title, row).await,
        MatchOutcome::Ambiguous(_) => Err(RowError::AmbiguousPiece(title.to_string())),
    }
}

async fn create_piece(
    registry: &JobRegistry,
    catalog: &dyn Catalog,
    job_id: &str,
    composer: &Composer,
    title: &str,
    row: &CollectionRow,
) -> Result<Piece, RowError> {
    let voicing = non_empty(row.voicing.as_deref()).unwrap_or(DEFAULT_VOICING);
    let piece = catalog
        .create_piece(title, composer.id, non_empty(row.category.as_deref()), voicing)
        .await?;
    registry
        .append_log(job_id, &format!("Piece \"{}\" created.", piece.title))
        .await;
    Ok(piece)
}

// ── Tests ────────────────────────────────────────────────────────────
