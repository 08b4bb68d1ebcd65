//! Person name formatting for catalog entries.

/// Convert a free-form person name to the catalog's `Last, First` form.
///
/// Names already containing a comma pass through untouched, as does a
/// single bare token. Only the final token becomes the last name:
///
/// ```
/// use chorus_core::naming::format_person_name;
///
/// assert_eq!(format_person_name("Antonio Vivaldi"), "Vivaldi, Antonio");
/// assert_eq!(format_person_name("Bach, Johann Sebastian"), "Bach, Johann Sebastian");
/// assert_eq!(format_person_name("Bach"), "Bach");
/// ```
pub fn format_person_name(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.contains(',') {
        return trimmed.to_string();
    }
    let tokens: Vec<&str> = trimmed.split_whitespace().collect();
    match tokens.as_slice() {
        [] | [_] => trimmed.to_string(),
        [given @ .., last] => format!("{}, {}", last, given.join(" ")),
    }
}

// ── Tests ────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inverts_first_last_order() {
        assert_eq!(format_person_name("Antonio Vivaldi"), "Vivaldi, Antonio");
        assert_eq!(
            format_person_name("Johann Sebastian Bach"),
            "Bach, Johann Sebastian"
        );
    }

    #[test]
    fn test_keeps_comma_form_and_single_tokens() {
        assert_eq!(format_person_name("Rutter, John"), "Rutter, John");
        assert_eq!(format_person_name("Bach"), "Bach");
        assert_eq!(format_person_name(""), "");
    }

    #[test]
    fn test_trims_surrounding_whitespace() {
        assert_eq!(format_person_name("  Antonio Vivaldi "), "Vivaldi, Antonio");
    }
}
