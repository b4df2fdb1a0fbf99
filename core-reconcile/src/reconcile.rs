//! # Reconcile Service
//!
//! Single-file service API: fetch candidates for one local track, rank them
//! by duration proximity, and score every ranked candidate for display.
//!
//! ## Overview
//!
//! The `ReconcileService` is the interactive counterpart to the batch
//! pipeline: where [`BatchJob`](crate::batch::BatchJob) scores only the top
//! candidate and decides autonomously, this service scores the whole ranked
//! list so a presentation adapter can show the alternatives side by side.
//!
//! Each call returns a fresh, immutable snapshot; adapters reference entries
//! by index and never mutate them in place.
//!
//! ## Usage
//!
//! ```ignore
//! use core_reconcile::reconcile::ReconcileService;
//! use core_runtime::events::EventBus;
//! use std::sync::Arc;
//!
//! # async fn example(config: &core_runtime::CoreConfig, local: core_reconcile::LocalTrack) {
//! let events = Arc::new(EventBus::default());
//! let service = ReconcileService::from_config(config, events);
//!
//! let scored = service.search_candidates(&local).await;
//! if let Some(best) = scored.first() {
//!     println!("best match: {} ({}%)", best.candidate.title, best.breakdown.total);
//! }
//! # }
//! ```

use std::sync::Arc;
use tracing::{debug, instrument};

use core_runtime::events::{CoreEvent, EventBus, ReconcileEvent};
use core_runtime::CoreConfig;

use crate::collaborators::CatalogSearch;
use crate::models::{CandidateTrack, LocalTrack};
use crate::providers::ItunesCatalog;
use crate::ranker::rank_by_duration;
use crate::scoring::{ConfidenceBreakdown, ConfidenceScorer};

/// One ranked candidate with its confidence breakdown.
#[derive(Debug, Clone)]
pub struct ScoredCandidate {
    /// The candidate record.
    pub candidate: CandidateTrack,
    /// Per-field scores and weighted total against the local track.
    pub breakdown: ConfidenceBreakdown,
}

/// Reconciles one local track against the catalog, producing a scored,
/// ranked candidate snapshot.
pub struct ReconcileService {
    catalog: Arc<dyn CatalogSearch>,
    scorer: ConfidenceScorer,
    events: Arc<EventBus>,
}

impl ReconcileService {
    /// Create a service with the default scorer.
    pub fn new(catalog: Arc<dyn CatalogSearch>, events: Arc<EventBus>) -> Self {
        Self {
            catalog,
            scorer: ConfidenceScorer::new(),
            events,
        }
    }

    /// Create a service with a custom scorer.
    pub fn with_scorer(
        catalog: Arc<dyn CatalogSearch>,
        scorer: ConfidenceScorer,
        events: Arc<EventBus>,
    ) -> Self {
        Self {
            catalog,
            scorer,
            events,
        }
    }

    /// Assemble a service from the runtime configuration, using the iTunes
    /// catalog client.
    pub fn from_config(config: &CoreConfig, events: Arc<EventBus>) -> Self {
        Self::new(Arc::new(ItunesCatalog::from_config(config)), events)
    }

    /// Fetch, rank, and score candidates for `local`.
    ///
    /// The catalog absorbs its own failures, so the result is simply empty
    /// when the search fails or finds nothing.
    #[instrument(skip(self, local), fields(file = %local.file_path.display()))]
    pub async fn search_candidates(&self, local: &LocalTrack) -> Vec<ScoredCandidate> {
        let title = local.title.clone().unwrap_or_default();
        let artist = local.artist.clone().unwrap_or_default();

        self.events
            .emit(CoreEvent::Reconcile(ReconcileEvent::SearchStarted {
                title: title.clone(),
                artist: artist.clone(),
            }))
            .ok();

        let candidates = self
            .catalog
            .search(&title, &artist, local.duration(), Some(local))
            .await;

        let ranked = rank_by_duration(candidates, local.duration());

        let scored: Vec<ScoredCandidate> = ranked
            .into_iter()
            .map(|candidate| {
                let breakdown = self.scorer.score(local, &candidate);
                self.events
                    .emit(CoreEvent::Reconcile(ReconcileEvent::CandidateScored {
                        catalog_id: candidate.catalog_id.clone(),
                        total: breakdown.total,
                    }))
                    .ok();
                ScoredCandidate {
                    candidate,
                    breakdown,
                }
            })
            .collect();

        self.events
            .emit(CoreEvent::Reconcile(ReconcileEvent::SearchCompleted {
                candidates: scored.len(),
            }))
            .ok();

        debug!(candidates = scored.len(), "Candidate snapshot built");

        scored
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::path::PathBuf;

    struct StubCatalog {
        candidates: Vec<CandidateTrack>,
    }

    #[async_trait]
    impl CatalogSearch for StubCatalog {
        async fn search(
            &self,
            _title: &str,
            _artist: &str,
            _duration_ms: Option<u64>,
            _local: Option<&LocalTrack>,
        ) -> Vec<CandidateTrack> {
            self.candidates.clone()
        }
    }

    fn local() -> LocalTrack {
        LocalTrack {
            file_path: PathBuf::from("/music/track.mp3"),
            title: Some("Come Together".to_string()),
            artist: Some("The Beatles".to_string()),
            album: Some("Abbey Road".to_string()),
            duration_ms: 259_000,
            ..LocalTrack::default()
        }
    }

    fn candidate(id: &str, duration_ms: Option<u64>) -> CandidateTrack {
        CandidateTrack {
            catalog_id: id.to_string(),
            title: "Come Together".to_string(),
            artist: "The Beatles".to_string(),
            album: "Abbey Road".to_string(),
            year: None,
            genre: None,
            track_number: None,
            duration_ms,
            artwork_url: None,
            confidence: None,
        }
    }

    #[tokio::test]
    async fn test_snapshot_is_ranked_and_scored() {
        let catalog = StubCatalog {
            candidates: vec![
                candidate("far", Some(400_000)),
                candidate("near", Some(259_500)),
            ],
        };
        let service = ReconcileService::new(Arc::new(catalog), Arc::new(EventBus::default()));

        let scored = service.search_candidates(&local()).await;

        assert_eq!(scored.len(), 2);
        assert_eq!(scored[0].candidate.catalog_id, "near");
        assert_eq!(scored[0].breakdown.total, 100);
        assert_eq!(scored[1].candidate.catalog_id, "far");
        // Identical text fields, duration far outside tolerance.
        assert_eq!(scored[1].breakdown.total, 60);
    }

    #[tokio::test]
    async fn test_empty_catalog_yields_empty_snapshot() {
        let service = ReconcileService::new(
            Arc::new(StubCatalog { candidates: vec![] }),
            Arc::new(EventBus::default()),
        );

        let scored = service.search_candidates(&local()).await;
        assert!(scored.is_empty());
    }

    #[tokio::test]
    async fn test_events_are_emitted() {
        let events = Arc::new(EventBus::new(16));
        let mut rx = events.subscribe();

        let service = ReconcileService::new(
            Arc::new(StubCatalog {
                candidates: vec![candidate("c1", Some(259_000))],
            }),
            events,
        );
        service.search_candidates(&local()).await;

        let mut seen = Vec::new();
        while let Ok(event) = rx.try_recv() {
            seen.push(event);
        }

        assert!(matches!(
            seen.first(),
            Some(CoreEvent::Reconcile(ReconcileEvent::SearchStarted { .. }))
        ));
        assert!(seen.iter().any(|e| matches!(
            e,
            CoreEvent::Reconcile(ReconcileEvent::CandidateScored { total: 100, .. })
        )));
        assert!(matches!(
            seen.last(),
            Some(CoreEvent::Reconcile(ReconcileEvent::SearchCompleted { candidates: 1 }))
        ));
    }
}
