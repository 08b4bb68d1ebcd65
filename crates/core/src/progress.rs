//! Progress percentage arithmetic for status displays.

/// Integer percent for a progress/total pair.
///
/// `round(100 * progress / total)`, clamped to `0..=100`. A zero total
/// reads as 0 percent (indeterminate) rather than a division error.
pub fn percent_complete(progress: u32, total: u32) -> u8 {
    if total == 0 {
        return 0;
    }
    let pct = (f64::from(progress) / f64::from(total) * 100.0).round();
    pct.clamp(0.0, 100.0) as u8
}

// ── Tests ────────────────────────────────────────────────────────────
