//! Track metadata records exchanged between the engine and its collaborators.
//!
//! Both variants are read-only snapshots: a [`LocalTrack`] is created once per
//! file read and a [`CandidateTrack`] once per catalog fetch, and neither is
//! mutated afterwards. Result lists built from them are fresh snapshots too,
//! referenced by index rather than edited in place.

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::normalize::format_duration;

/// Artwork embedded in a local file's tag.
#[derive(Debug, Clone)]
pub struct EmbeddedArtwork {
    /// Raw image bytes (JPEG, PNG, ...).
    pub data: Bytes,
    /// MIME type of the image data.
    pub mime_type: String,
}

/// Metadata read from a local audio file's embedded tag.
#[derive(Debug, Clone, Default)]
pub struct LocalTrack {
    /// Path of the file the tag was read from.
    pub file_path: PathBuf,
    /// Track title.
    pub title: Option<String>,
    /// Primary artist.
    pub artist: Option<String>,
    /// Album name.
    pub album: Option<String>,
    /// Release year.
    pub year: Option<i32>,
    /// Genre classification.
    pub genre: Option<String>,
    /// Track number on album.
    pub track_number: Option<u32>,
    /// Duration in milliseconds (0 when the container reports none).
    pub duration_ms: u64,
    /// Front-cover artwork embedded in the tag, if any.
    pub artwork: Option<EmbeddedArtwork>,
}

impl LocalTrack {
    /// Duration as an optional value: `None` when the file reports none.
    pub fn duration(&self) -> Option<u64> {
        (self.duration_ms > 0).then_some(self.duration_ms)
    }
}

/// A candidate record retrieved from a remote catalog, competing to replace
/// the local tag values.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CandidateTrack {
    /// Identifier of the record in the remote catalog.
    pub catalog_id: String,
    /// Track title.
    pub title: String,
    /// Primary artist.
    pub artist: String,
    /// Album name.
    pub album: String,
    /// Release year.
    pub year: Option<i32>,
    /// Genre classification.
    pub genre: Option<String>,
    /// Track number on album.
    pub track_number: Option<u32>,
    /// Duration in milliseconds, when the catalog reports one.
    pub duration_ms: Option<u64>,
    /// Location of the candidate's artwork.
    pub artwork_url: Option<String>,
    /// Confidence score assigned when the candidate was scored against a
    /// local record; set once at creation, never recomputed in place.
    pub confidence: Option<u8>,
}

/// One field whose local and candidate values disagree.
///
/// Produced for presentation adapters that highlight mismatching fields.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FieldDiff {
    /// Field name ("title", "artist", "album", "year", "genre", "track",
    /// "duration").
    pub field: &'static str,
    /// Local display value.
    pub local: String,
    /// Candidate display value.
    pub candidate: String,
}

/// Compares the displayed fields of a local track and a selected candidate,
/// returning the fields whose values differ.
///
/// Comparison is case-insensitive after trimming surrounding whitespace;
/// a missing value compares as the empty string. Durations are compared in
/// their `m:ss` display form.
pub fn field_mismatches(local: &LocalTrack, candidate: &CandidateTrack) -> Vec<FieldDiff> {
    let pairs: [(&'static str, String, String); 7] = [
        (
            "title",
            local.title.clone().unwrap_or_default(),
            candidate.title.clone(),
        ),
        (
            "artist",
            local.artist.clone().unwrap_or_default(),
            candidate.artist.clone(),
        ),
        (
            "album",
            local.album.clone().unwrap_or_default(),
            candidate.album.clone(),
        ),
        (
            "year",
            local.year.map(|y| y.to_string()).unwrap_or_default(),
            candidate.year.map(|y| y.to_string()).unwrap_or_default(),
        ),
        (
            "genre",
            local.genre.clone().unwrap_or_default(),
            candidate.genre.clone().unwrap_or_default(),
        ),
        (
            "track",
            local.track_number.map(|t| t.to_string()).unwrap_or_default(),
            candidate
                .track_number
                .map(|t| t.to_string())
                .unwrap_or_default(),
        ),
        (
            "duration",
            format_duration(local.duration_ms),
            format_duration(candidate.duration_ms.unwrap_or(0)),
        ),
    ];

    pairs
        .into_iter()
        .filter(|(_, a, b)| a.trim().to_lowercase() != b.trim().to_lowercase())
        .map(|(field, local, candidate)| FieldDiff {
            field,
            local,
            candidate,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn local() -> LocalTrack {
        LocalTrack {
            file_path: PathBuf::from("/music/track.mp3"),
            title: Some("Come Together".to_string()),
            artist: Some("The Beatles".to_string()),
            album: Some("Abbey Road".to_string()),
            year: Some(1969),
            genre: Some("Rock".to_string()),
            track_number: Some(1),
            duration_ms: 259_000,
            artwork: None,
        }
    }

    fn candidate() -> CandidateTrack {
        CandidateTrack {
            catalog_id: "1441164495".to_string(),
            title: "Come Together".to_string(),
            artist: "The Beatles".to_string(),
            album: "Abbey Road".to_string(),
            year: Some(1969),
            genre: Some("Rock".to_string()),
            track_number: Some(1),
            duration_ms: Some(259_000),
            artwork_url: None,
            confidence: None,
        }
    }

    #[test]
    fn test_no_mismatches_for_identical_fields() {
        assert!(field_mismatches(&local(), &candidate()).is_empty());
    }

    #[test]
    fn test_mismatch_detection_is_case_insensitive() {
        let mut cand = candidate();
        cand.title = "COME TOGETHER".to_string();
        cand.artist = "  The Beatles  ".to_string();
        assert!(field_mismatches(&local(), &cand).is_empty());
    }

    #[test]
    fn test_mismatched_fields_are_reported() {
        let mut cand = candidate();
        cand.album = "Let It Be".to_string();
        cand.year = Some(1970);

        let diffs = field_mismatches(&local(), &cand);
        let fields: Vec<&str> = diffs.iter().map(|d| d.field).collect();
        assert_eq!(fields, vec!["album", "year"]);
        assert_eq!(diffs[0].local, "Abbey Road");
        assert_eq!(diffs[0].candidate, "Let It Be");
    }

    #[test]
    fn test_missing_local_value_compares_as_empty() {
        let mut loc = local();
        loc.genre = None;

        let diffs = field_mismatches(&loc, &candidate());
        assert_eq!(diffs.len(), 1);
        assert_eq!(diffs[0].field, "genre");
        assert_eq!(diffs[0].local, "");
    }

    #[test]
    fn test_duration_compared_in_display_form() {
        let mut cand = candidate();
        // 259_000 and 259_400 both render as 4:19
        cand.duration_ms = Some(259_400);
        assert!(field_mismatches(&local(), &cand).is_empty());

        cand.duration_ms = Some(200_000);
        let diffs = field_mismatches(&local(), &cand);
        assert_eq!(diffs.len(), 1);
        assert_eq!(diffs[0].field, "duration");
    }

    #[test]
    fn test_local_duration_helper() {
        assert_eq!(local().duration(), Some(259_000));

        let mut silent = local();
        silent.duration_ms = 0;
        assert_eq!(silent.duration(), None);
    }
}
