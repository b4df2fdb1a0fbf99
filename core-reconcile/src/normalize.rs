//! String canonicalization and small display helpers.
//!
//! Normalization makes tag values comparable across catalogs: case and
//! surrounding whitespace carry no signal, and reissue noise like
//! `" - remastered"` would otherwise drag down similarity scores for what is
//! the same recording.

use chrono::Datelike;
use tracing::debug;

/// Noise substrings stripped during normalization.
///
/// Matched against the lowercased input, so a single lowercase spelling per
/// variant is enough.
const NOISE_SUBSTRINGS: &[&str] = &[" - remastered", " (remaster)"];

/// Canonicalizes a string for comparison.
///
/// Lowercases, strips the known noise substrings, and trims surrounding
/// whitespace. Trimming happens after stripping so that noise removal cannot
/// expose new edge whitespace; this makes the function idempotent:
/// `normalize(normalize(x)) == normalize(x)` for all inputs.
///
/// An empty input stays empty.
pub fn normalize(s: &str) -> String {
    if s.is_empty() {
        return String::new();
    }

    let mut out = s.to_lowercase();
    for noise in NOISE_SUBSTRINGS {
        out = out.replace(noise, "");
    }
    out.trim().to_string()
}

/// Extracts the release year from an ISO-8601 release timestamp.
///
/// Catalogs report full timestamps (e.g. `1969-09-26T07:00:00Z`); only the
/// year is kept in tags. Unparseable input yields `None`.
pub fn year_from_release_date(raw: &str) -> Option<i32> {
    if raw.trim().is_empty() {
        return None;
    }

    match chrono::DateTime::parse_from_rfc3339(raw) {
        Ok(dt) => Some(dt.year()),
        Err(e) => {
            debug!(raw = %raw, error = %e, "Unparseable release date");
            None
        }
    }
}

/// Renders a millisecond duration as `m:ss` for display.
pub fn format_duration(ms: u64) -> String {
    let seconds = ms / 1000;
    format!("{}:{:02}", seconds / 60, seconds % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_lowercases_and_trims() {
        assert_eq!(normalize("  Hey Jude  "), "hey jude");
    }

    #[test]
    fn test_normalize_strips_remaster_noise() {
        assert_eq!(normalize("A - Remastered"), "a");
        assert_eq!(normalize("Let It Be (Remaster)"), "let it be");
        assert_eq!(normalize("A - Remastered"), normalize("a"));
    }

    #[test]
    fn test_normalize_empty() {
        assert_eq!(normalize(""), "");
    }

    #[test]
    fn test_normalize_is_idempotent() {
        for input in [
            "A - Remastered",
            "  Spaced  ",
            "x  (remaster)",
            "plain title",
            "",
        ] {
            let once = normalize(input);
            assert_eq!(normalize(&once), once, "not idempotent for {:?}", input);
        }
    }

    #[test]
    fn test_normalize_strip_exposes_no_edge_whitespace() {
        // Stripping " (remaster)" out of "x  (remaster)" leaves "x " behind;
        // the final trim has to take care of it.
        assert_eq!(normalize("x  (remaster)"), "x");
    }

    #[test]
    fn test_year_from_release_date() {
        assert_eq!(year_from_release_date("1969-09-26T07:00:00Z"), Some(1969));
        assert_eq!(year_from_release_date("2001-01-01T00:00:00+02:00"), Some(2001));
        assert_eq!(year_from_release_date(""), None);
        assert_eq!(year_from_release_date("not a date"), None);
        assert_eq!(year_from_release_date("1969"), None);
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(0), "0:00");
        assert_eq!(format_duration(83_000), "1:23");
        assert_eq!(format_duration(600_000), "10:00");
        assert_eq!(format_duration(59_999), "0:59");
    }
}
