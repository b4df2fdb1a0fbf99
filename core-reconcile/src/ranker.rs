//! Candidate ordering by duration proximity.

use crate::models::CandidateTrack;

/// Maximum number of candidates kept per search.
///
/// The cap is applied before any scoring happens, bounding per-search cost
/// regardless of how many records the catalog returns.
pub const MAX_CANDIDATES: usize = 50;

/// Orders candidates by proximity to a target duration and caps the working
/// set to [`MAX_CANDIDATES`].
///
/// With a target, candidates are sorted ascending by the absolute difference
/// between their duration and the target; a candidate without a duration is
/// treated as maximally distant and sorts last. The sort is stable, so
/// candidates with equal difference keep their original relative order.
/// Without a target, the input order is preserved (the cap still applies).
pub fn rank_by_duration(
    mut candidates: Vec<CandidateTrack>,
    target_duration_ms: Option<u64>,
) -> Vec<CandidateTrack> {
    if let Some(target) = target_duration_ms {
        candidates.sort_by_key(|c| c.duration_ms.map_or(u64::MAX, |d| d.abs_diff(target)));
    }
    candidates.truncate(MAX_CANDIDATES);
    candidates
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(id: &str, duration_ms: Option<u64>) -> CandidateTrack {
        CandidateTrack {
            catalog_id: id.to_string(),
            title: String::new(),
            artist: String::new(),
            album: String::new(),
            year: None,
            genre: None,
            track_number: None,
            duration_ms,
            artwork_url: None,
            confidence: None,
        }
    }

    fn ids(candidates: &[CandidateTrack]) -> Vec<&str> {
        candidates.iter().map(|c| c.catalog_id.as_str()).collect()
    }

    #[test]
    fn test_rank_sorts_by_duration_difference() {
        let input = vec![
            candidate("a", Some(500_000)),
            candidate("b", Some(100_000)),
            candidate("c", Some(300_000)),
        ];

        // Differences to 300_000: a=200_000, b=200_000, c=0.
        // c first; a and b tie and keep their input order.
        let ranked = rank_by_duration(input, Some(300_000));
        assert_eq!(ids(&ranked), vec!["c", "a", "b"]);
    }

    #[test]
    fn test_rank_missing_duration_sorts_last() {
        let input = vec![
            candidate("a", None),
            candidate("b", Some(310_000)),
            candidate("c", Some(300_000)),
        ];

        let ranked = rank_by_duration(input, Some(300_000));
        assert_eq!(ids(&ranked), vec!["c", "b", "a"]);
    }

    #[test]
    fn test_rank_without_target_keeps_input_order() {
        let input = vec![
            candidate("a", Some(500_000)),
            candidate("b", Some(100_000)),
            candidate("c", Some(300_000)),
        ];

        let ranked = rank_by_duration(input, None);
        assert_eq!(ids(&ranked), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_rank_caps_working_set() {
        let input: Vec<CandidateTrack> = (0..120)
            .map(|i| candidate(&i.to_string(), Some(100_000 + i)))
            .collect();

        let ranked = rank_by_duration(input.clone(), Some(100_000));
        assert_eq!(ranked.len(), MAX_CANDIDATES);

        let unranked = rank_by_duration(input, None);
        assert_eq!(unranked.len(), MAX_CANDIDATES);
    }

    #[test]
    fn test_rank_empty_input() {
        assert!(rank_by_duration(Vec::new(), Some(300_000)).is_empty());
    }
}
