//! CSV sheet parsing for import uploads.
//!
//! Sheets are semicolon-delimited UTF-8 with a header line. Headers are
//! matched case-insensitively and accept both German and English
//! spellings (serde aliases). Fields are trimmed; blank lines are
//! skipped; a ragged or undecodable file fails as a whole.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Rows shown in a non-committing preview.
pub const PREVIEW_ROW_LIMIT: usize = 10;

/// One parsed line of an event import sheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRow {
    /// Piece reference: collection prefix + number, e.g. `X1`.
    #[serde(alias = "referenz")]
    pub reference: String,
    /// Display title carried in the sheet; informational only.
    #[serde(default, alias = "titel")]
    pub title: Option<String>,
    /// Event date in `DD.MM.YYYY`.
    #[serde(alias = "datum")]
    pub date: String,
}

/// One parsed line of a collection import sheet.
///
/// Every column is optional at parse time; the importer reports rows
/// with missing mandatory data individually instead of rejecting the
/// whole sheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionRow {
    /// Number of the piece within the collection.
    #[serde(default, alias = "nummer")]
    pub number: Option<String>,
    #[serde(default, alias = "titel")]
    pub title: Option<String>,
    /// Composer name as written in the sheet.
    #[serde(default, alias = "komponist")]
    pub composer: Option<String>,
    #[serde(default, alias = "kategorie", alias = "rubrik")]
    pub category: Option<String>,
    /// Voice arrangement; the importer falls back to `SATB`.
    #[serde(default)]
    pub voicing: Option<String>,
}

/// The sheet could not be read as CSV at all.
///
/// The message is the stable client-facing wording; `detail` carries
/// the underlying parser diagnostics.
#[derive(Debug, thiserror::Error)]
#[error("Could not parse CSV file.")]
pub struct ParseError(#[from] csv::Error);

impl ParseError {
    pub fn detail(&self) -> String {
        self.0.to_string()
    }
}

/// Parse an event sheet into rows.
pub fn parse_event_rows(data: &[u8]) -> Result<Vec<EventRow>, ParseError> {
    parse_rows(data)
}

/// Parse a collection sheet into rows.
pub fn parse_collection_rows(data: &[u8]) -> Result<Vec<CollectionRow>, ParseError> {
    parse_rows(data)
}

fn parse_rows<T: DeserializeOwned>(data: &[u8]) -> Result<Vec<T>, ParseError> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b';')
        .trim(csv::Trim::All)
        .from_reader(data);

    // Header matching is case-insensitive: "Nummer" and "nummer" name
    // the same column.
    let lowered: csv::StringRecord = reader.headers()?.iter().map(str::to_lowercase).collect();
    reader.set_headers(lowered);

    let rows = reader.deserialize().collect::<Result<Vec<T>, _>>()?;
    Ok(rows)
}

// ── Tests ────────────────────────────────────────────────────────────
