//! German-format date handling for import sheets.

use chrono::NaiveDate;

/// Parse a `DD.MM.YYYY` date as written in uploaded sheets.
///
/// Returns `None` for anything else, including ISO dates and
/// out-of-range day/month combinations.
pub fn parse_german_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%d.%m.%Y").ok()
}

/// Format a date back to `DD.MM.YYYY` for log lines.
pub fn german_date_string(date: NaiveDate) -> String {
    date.format("%d.%m.%Y").to_string()
}

// ── Tests ────────────────────────────────────────────────────────────
