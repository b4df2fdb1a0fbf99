//! # Reconciliation Engine
//!
//! Reconciles metadata read from local audio files against candidate records
//! fetched from a remote catalog, scores each candidate for match quality,
//! and in batch mode decides autonomously whether to apply an update.
//!
//! ## Overview
//!
//! This crate handles:
//! - String normalization and similarity scoring
//! - Duration proximity scoring with a tolerance band
//! - Weighted confidence aggregation with a per-field breakdown
//! - Candidate ranking by duration proximity
//! - A bounded-concurrency batch pipeline with per-file failure isolation
//! - Default collaborators: lofty-backed tag reader/writer and an iTunes
//!   Search API catalog client
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────┐          ┌─────────────────┐
//! │ ReconcileService │          │    BatchJob     │
//! │ (single file)    │          │ (many files)    │
//! └────────┬─────────┘          └────────┬────────┘
//!          │                             │
//!          ├──> CatalogSearch (fetch candidates)
//!          ├──> rank_by_duration (order candidates)
//!          ├──> ConfidenceScorer (score candidates)
//!          │                             │
//!          │                             ├──> TagReader (read local tags)
//!          │                             └──> TagWriter (apply updates)
//! ```
//!
//! The collaborator traits ([`TagReader`](collaborators::TagReader),
//! [`TagWriter`](collaborators::TagWriter),
//! [`CatalogSearch`](collaborators::CatalogSearch)) are the seams between the
//! engine and the outside world; hosts may swap any of them.

pub mod batch;
pub mod collaborators;
pub mod error;
pub mod extractor;
pub mod models;
pub mod normalize;
pub mod providers;
pub mod ranker;
pub mod reconcile;
pub mod scoring;
pub mod writer;

pub use batch::{BatchConfig, BatchItemOutcome, BatchJob, BatchProgress, BatchReport};
pub use collaborators::{CatalogSearch, TagReader, TagWriter};
pub use error::{ReconcileError, Result};
pub use models::{CandidateTrack, EmbeddedArtwork, FieldDiff, LocalTrack};
pub use reconcile::{ReconcileService, ScoredCandidate};
pub use scoring::{ConfidenceBreakdown, ConfidenceScorer};

/// Builds a [`core_runtime::CoreConfig`] wired to the desktop HTTP bridge.
///
/// Convenience for desktop hosts that don't inject their own bridges:
///
/// ```ignore
/// let config = core_reconcile::desktop_config()?;
/// let events = std::sync::Arc::new(core_runtime::events::EventBus::default());
/// let job = core_reconcile::BatchJob::from_config(&config, events);
/// ```
#[cfg(feature = "desktop-shims")]
pub fn desktop_config() -> core_runtime::Result<core_runtime::CoreConfig> {
    core_runtime::CoreConfig::builder()
        .http_client(std::sync::Arc::new(bridge_desktop::ReqwestHttpClient::new()))
        .build()
}
