//! Collaborator traits: the seams between the engine and the outside world.
//!
//! The engine never touches files or the network directly; it goes through
//! these traits. Hosts may swap any implementation (and tests substitute
//! mocks) without the pipeline noticing.

use async_trait::async_trait;
use std::path::Path;

use crate::error::Result;
use crate::models::{CandidateTrack, LocalTrack};

/// Reads local tag metadata from an audio file.
#[async_trait]
pub trait TagReader: Send + Sync {
    /// Read the embedded tag of the file at `path`.
    ///
    /// # Errors
    /// Returns error if the file is missing, unreadable, or not a supported
    /// audio container. A failure here is fatal only to the pipeline of the
    /// one file being read.
    async fn read_local(&self, path: &Path) -> Result<LocalTrack>;
}

/// Persists candidate metadata (and artwork) back to an audio file.
#[async_trait]
pub trait TagWriter: Send + Sync {
    /// Replace the file's tag values with the candidate's.
    ///
    /// On success any previously embedded artwork is superseded by the
    /// candidate's artwork.
    ///
    /// # Errors
    /// Returns error if the write or the artwork retrieval fails. Callers in
    /// the batch pipeline treat any error as that item's failure and never
    /// propagate it further.
    async fn apply_update(&self, path: &Path, candidate: &CandidateTrack) -> Result<()>;
}

/// Searches a remote catalog for candidate records.
#[async_trait]
pub trait CatalogSearch: Send + Sync {
    /// Query the catalog for records matching `title` and `artist`.
    ///
    /// Never fails outward: any internal failure (network, parse) yields an
    /// empty list. When `local` is provided, implementations use it as the
    /// comparison basis to annotate each candidate with a confidence score;
    /// without it they substitute a minimal stand-in built from the given
    /// title, artist, and duration (empty album, genre, and track number).
    async fn search(
        &self,
        title: &str,
        artist: &str,
        duration_ms: Option<u64>,
        local: Option<&LocalTrack>,
    ) -> Vec<CandidateTrack>;
}
