//! Match-quality scoring: text similarity, duration proximity, and the
//! weighted confidence aggregate.
//!
//! All scores are integers in `[0, 100]`. Per-field similarity scores
//! truncate their underlying ratio; only the final weighted total is rounded
//! (half away from zero). That split is applied uniformly everywhere a score
//! is computed.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::models::{CandidateTrack, LocalTrack};
use crate::normalize::normalize;

/// Weight of the duration sub-score in the confidence total.
pub const WEIGHT_DURATION: f64 = 0.40;
/// Weight of the title sub-score in the confidence total.
pub const WEIGHT_TITLE: f64 = 0.30;
/// Weight of the artist sub-score in the confidence total.
pub const WEIGHT_ARTIST: f64 = 0.20;
/// Weight of the album sub-score in the confidence total.
pub const WEIGHT_ALBUM: f64 = 0.10;

/// Default tolerance band for duration scoring, in milliseconds.
pub const DEFAULT_DURATION_TOLERANCE_MS: u64 = 5000;

/// Text similarity between two tag values, in `[0, 100]`.
///
/// Both inputs are normalized first. Two empty normalized strings are a
/// perfect match (a field absent on both sides carries no disagreement);
/// exactly one empty side scores zero. Otherwise the Sørensen–Dice bigram
/// coefficient is scaled by 100 and truncated.
///
/// Sørensen–Dice is symmetric, so `similarity(a, b) == similarity(b, a)` for
/// all inputs; callers may pass arguments in either order.
pub fn similarity(a: &str, b: &str) -> u8 {
    let a = normalize(a);
    let b = normalize(b);

    if a.is_empty() && b.is_empty() {
        return 100;
    }
    if a.is_empty() || b.is_empty() {
        return 0;
    }

    (strsim::sorensen_dice(&a, &b) * 100.0) as u8
}

/// Duration proximity score in `[0, 100]`.
///
/// A missing or zero duration on either side scores zero. Differences up to
/// one second are a perfect match; within the tolerance band the score falls
/// off linearly (`100 - floor(diff / tolerance * 100)`); beyond it, zero.
pub fn duration_score(local_ms: Option<u64>, candidate_ms: Option<u64>, tolerance_ms: u64) -> u8 {
    let (local, candidate) = match (local_ms, candidate_ms) {
        (Some(a), Some(b)) if a > 0 && b > 0 => (a, b),
        _ => return 0,
    };

    let diff = local.abs_diff(candidate);
    if diff <= 1000 {
        100
    } else if diff <= tolerance_ms {
        (100 - diff * 100 / tolerance_ms) as u8
    } else {
        0
    }
}

/// Per-field confidence breakdown plus the weighted total.
///
/// Sub-scores and total are integers in `[0, 100]`. The total is the weighted
/// sum of the sub-scores (weights: duration 0.40, title 0.30, artist 0.20,
/// album 0.10) rounded half away from zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfidenceBreakdown {
    /// Duration proximity sub-score.
    pub duration: u8,
    /// Title similarity sub-score.
    pub title: u8,
    /// Artist similarity sub-score.
    pub artist: u8,
    /// Album similarity sub-score.
    pub album: u8,
    /// Weighted total.
    pub total: u8,
}

/// Scores a candidate record against a local track.
///
/// Pure and deterministic: the same pair always produces the same breakdown.
/// The only side effect is a `tracing` debug record of the breakdown.
#[derive(Debug, Clone, Copy)]
pub struct ConfidenceScorer {
    tolerance_ms: u64,
}

impl ConfidenceScorer {
    /// Create a scorer with the default duration tolerance (5000 ms).
    pub fn new() -> Self {
        Self {
            tolerance_ms: DEFAULT_DURATION_TOLERANCE_MS,
        }
    }

    /// Create a scorer with a custom duration tolerance.
    pub fn with_tolerance(tolerance_ms: u64) -> Self {
        Self { tolerance_ms }
    }

    /// Score `candidate` against `local`.
    pub fn score(&self, local: &LocalTrack, candidate: &CandidateTrack) -> ConfidenceBreakdown {
        let duration = duration_score(local.duration(), candidate.duration_ms, self.tolerance_ms);
        let title = similarity(local.title.as_deref().unwrap_or(""), &candidate.title);
        let artist = similarity(local.artist.as_deref().unwrap_or(""), &candidate.artist);
        let album = similarity(local.album.as_deref().unwrap_or(""), &candidate.album);

        let weighted = f64::from(duration) * WEIGHT_DURATION
            + f64::from(title) * WEIGHT_TITLE
            + f64::from(artist) * WEIGHT_ARTIST
            + f64::from(album) * WEIGHT_ALBUM;
        let total = weighted.round() as u8;

        debug!(
            catalog_id = %candidate.catalog_id,
            duration,
            title,
            artist,
            album,
            total,
            "Confidence breakdown"
        );

        ConfidenceBreakdown {
            duration,
            title,
            artist,
            album,
            total,
        }
    }
}

impl Default for ConfidenceScorer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn local(duration_ms: u64) -> LocalTrack {
        LocalTrack {
            file_path: PathBuf::from("/music/track.mp3"),
            title: Some("Come Together".to_string()),
            artist: Some("The Beatles".to_string()),
            album: Some("Abbey Road".to_string()),
            year: Some(1969),
            genre: Some("Rock".to_string()),
            track_number: Some(1),
            duration_ms,
            artwork: None,
        }
    }

    fn candidate(duration_ms: Option<u64>) -> CandidateTrack {
        CandidateTrack {
            catalog_id: "1441164495".to_string(),
            title: "Come Together".to_string(),
            artist: "The Beatles".to_string(),
            album: "Abbey Road".to_string(),
            year: Some(1969),
            genre: Some("Rock".to_string()),
            track_number: Some(1),
            duration_ms,
            artwork_url: None,
            confidence: None,
        }
    }

    #[test]
    fn test_similarity_identity() {
        assert_eq!(similarity("Come Together", "Come Together"), 100);
        assert_eq!(similarity("Come Together", "come together"), 100);
    }

    #[test]
    fn test_similarity_empty_rules() {
        assert_eq!(similarity("", ""), 100);
        assert_eq!(similarity("x", ""), 0);
        assert_eq!(similarity("", "x"), 0);
        // Noise-only input normalizes to empty
        assert_eq!(similarity(" - Remastered", ""), 100);
    }

    #[test]
    fn test_similarity_normalizes_before_comparing() {
        assert_eq!(similarity("Hey Jude - Remastered", "hey jude"), 100);
    }

    #[test]
    fn test_similarity_is_symmetric() {
        let pairs = [
            ("The Beatles", "Beatles"),
            ("Abbey Road", "Abby Road"),
            ("Come Together", "Here Comes the Sun"),
            ("a", "b"),
        ];
        for (a, b) in pairs {
            assert_eq!(similarity(a, b), similarity(b, a), "asymmetric for {:?}", (a, b));
        }
    }

    #[test]
    fn test_similarity_partial_match_in_range() {
        let score = similarity("The Beatles", "Beatles");
        assert!(score > 0 && score < 100);
    }

    #[test]
    fn test_duration_score_exact_and_near() {
        assert_eq!(duration_score(Some(200_000), Some(200_000), 5000), 100);
        assert_eq!(duration_score(Some(200_000), Some(201_000), 5000), 100);
    }

    #[test]
    fn test_duration_score_within_tolerance() {
        // 100 - floor(3000 / 5000 * 100) = 40
        assert_eq!(duration_score(Some(200_000), Some(203_000), 5000), 40);
        // 100 - floor(2500 / 5000 * 100) = 50
        assert_eq!(duration_score(Some(200_000), Some(197_500), 5000), 50);
        assert_eq!(duration_score(Some(200_000), Some(205_000), 5000), 0);
    }

    #[test]
    fn test_duration_score_beyond_tolerance() {
        assert_eq!(duration_score(Some(200_000), Some(206_000), 5000), 0);
    }

    #[test]
    fn test_duration_score_missing_or_zero() {
        assert_eq!(duration_score(None, Some(200_000), 5000), 0);
        assert_eq!(duration_score(Some(200_000), None, 5000), 0);
        assert_eq!(duration_score(Some(0), Some(200_000), 5000), 0);
        assert_eq!(duration_score(Some(200_000), Some(0), 5000), 0);
    }

    #[test]
    fn test_weights_sum_to_one() {
        let sum = WEIGHT_DURATION + WEIGHT_TITLE + WEIGHT_ARTIST + WEIGHT_ALBUM;
        assert!((sum - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_score_perfect_match() {
        let scorer = ConfidenceScorer::new();
        let breakdown = scorer.score(&local(200_000), &candidate(Some(200_000)));
        assert_eq!(breakdown.total, 100);
        assert_eq!(breakdown.duration, 100);
        assert_eq!(breakdown.title, 100);
        assert_eq!(breakdown.artist, 100);
        assert_eq!(breakdown.album, 100);
    }

    #[test]
    fn test_score_duration_outside_tolerance() {
        // Identical text fields, duration off by 6000 ms with tolerance 5000:
        // round(0.40 * 0 + 0.30 * 100 + 0.20 * 100 + 0.10 * 100) = 60
        let scorer = ConfidenceScorer::with_tolerance(5000);
        let breakdown = scorer.score(&local(200_000), &candidate(Some(206_000)));
        assert_eq!(breakdown.duration, 0);
        assert_eq!(breakdown.total, 60);
    }

    #[test]
    fn test_score_is_deterministic() {
        let scorer = ConfidenceScorer::new();
        let loc = local(200_000);
        let cand = candidate(Some(203_000));
        assert_eq!(scorer.score(&loc, &cand), scorer.score(&loc, &cand));
    }

    #[test]
    fn test_score_missing_candidate_duration() {
        let scorer = ConfidenceScorer::new();
        let breakdown = scorer.score(&local(200_000), &candidate(None));
        assert_eq!(breakdown.duration, 0);
        assert_eq!(breakdown.total, 60);
    }
}
