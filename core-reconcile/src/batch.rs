//! # Batch Reconciliation Pipeline
//!
//! Drives many independent per-file reconciliations concurrently, each
//! consisting of read → fetch → rank → score → decide → (optionally) apply,
//! and collects one terminal outcome per submitted file.
//!
//! ## Overview
//!
//! Every file moves through the phase sequence
//! `Pending → Fetching → Ranking → Scoring → Deciding → Terminal`. A
//! fixed-width worker pool (a semaphore over spawned tasks) bounds how many
//! pipelines run at once; all files are enqueued immediately and worker
//! width is the only throttle. Failures are isolated per file: whatever goes
//! wrong inside one pipeline is converted into that file's `Error` outcome
//! and never disturbs its neighbors. The batch as a whole has no abort
//! condition, no cancellation, and no retries.
//!
//! Completions are delivered over a channel to a single consumer, so the
//! growing outcome collection has exactly one writer and a fast item is
//! never held up behind a slow one.
//!
//! ## Usage
//!
//! ```ignore
//! use core_reconcile::batch::{BatchConfig, BatchJob};
//! use core_runtime::events::EventBus;
//! use std::sync::Arc;
//!
//! # async fn example(config: &core_runtime::CoreConfig, files: Vec<std::path::PathBuf>) {
//! let events = Arc::new(EventBus::default());
//! let job = BatchJob::from_config(config, events);
//!
//! let report = job.run(files).await;
//! println!("updated {} of {}", report.progress.updated, report.progress.total);
//! # }
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::{mpsc, Semaphore};
use tracing::{info, instrument, warn};

use core_runtime::events::{BatchEvent, CoreEvent, EventBus, ItemPhase};
use core_runtime::CoreConfig;

use crate::collaborators::{CatalogSearch, TagReader, TagWriter};
use crate::error::Result;
use crate::extractor::LoftyTagReader;
use crate::providers::ItunesCatalog;
use crate::ranker::rank_by_duration;
use crate::scoring::{ConfidenceScorer, DEFAULT_DURATION_TOLERANCE_MS};
use crate::writer::TagFileWriter;

/// Minimum confidence total at which an update is applied automatically.
const DEFAULT_APPLY_THRESHOLD: u8 = 85;

/// Default worker pool width.
const DEFAULT_CONCURRENCY: usize = 4;

// =============================================================================
// Configuration
// =============================================================================

/// Configuration for a batch run.
#[derive(Debug, Clone)]
pub struct BatchConfig {
    /// Worker pool width: how many file pipelines run concurrently.
    pub concurrency: usize,

    /// Confidence total at or above which the update is applied.
    pub apply_threshold: u8,

    /// Tolerance band for duration scoring, in milliseconds.
    pub duration_tolerance_ms: u64,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
            apply_threshold: DEFAULT_APPLY_THRESHOLD,
            duration_tolerance_ms: DEFAULT_DURATION_TOLERANCE_MS,
        }
    }
}

impl BatchConfig {
    /// Set the worker pool width.
    pub fn with_concurrency(mut self, width: usize) -> Self {
        self.concurrency = width;
        self
    }

    /// Set the auto-apply threshold.
    pub fn with_apply_threshold(mut self, threshold: u8) -> Self {
        self.apply_threshold = threshold;
        self
    }

    /// Set the duration scoring tolerance.
    pub fn with_duration_tolerance_ms(mut self, tolerance_ms: u64) -> Self {
        self.duration_tolerance_ms = tolerance_ms;
        self
    }
}

// =============================================================================
// Outcomes and Progress
// =============================================================================

/// Terminal outcome of one file's reconciliation attempt.
///
/// Created exactly once, when the file's pipeline reaches a terminal state,
/// and immutable afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome")]
pub enum BatchItemOutcome {
    /// The top candidate met the threshold and the update was applied.
    Updated {
        /// Confidence total of the applied candidate.
        score: u8,
    },
    /// The top candidate scored below the threshold; nothing was written.
    Skipped {
        /// Confidence total of the rejected candidate.
        score: u8,
    },
    /// The catalog returned no candidates.
    NoMatch,
    /// The top candidate met the threshold but the write failed.
    Failed,
    /// The pipeline failed before reaching a decision.
    Error {
        /// Human-readable failure description.
        reason: String,
    },
}

impl BatchItemOutcome {
    /// Stable label for event payloads and display.
    pub fn label(&self) -> &'static str {
        match self {
            BatchItemOutcome::Updated { .. } => "updated",
            BatchItemOutcome::Skipped { .. } => "skipped",
            BatchItemOutcome::NoMatch => "no_match",
            BatchItemOutcome::Failed => "failed",
            BatchItemOutcome::Error { .. } => "error",
        }
    }

    /// Confidence score, when the outcome carries one.
    pub fn score(&self) -> Option<u8> {
        match self {
            BatchItemOutcome::Updated { score } | BatchItemOutcome::Skipped { score } => {
                Some(*score)
            }
            _ => None,
        }
    }
}

/// Progress statistics for a batch run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchProgress {
    /// Files submitted.
    pub total: usize,
    /// Files that reached a terminal outcome so far.
    pub processed: usize,
    /// Files updated.
    pub updated: usize,
    /// Files skipped below the threshold.
    pub skipped: usize,
    /// Files with no catalog match.
    pub no_match: usize,
    /// Files whose update write failed.
    pub failed: usize,
    /// Files that errored before a decision.
    pub errored: usize,
    /// Completion percentage (0-100).
    pub percent_complete: u8,
}

impl BatchProgress {
    /// Fresh progress for a batch of `total` files.
    pub fn new(total: usize) -> Self {
        Self {
            total,
            ..Self::default()
        }
    }

    /// Tally one terminal outcome.
    fn record(&mut self, outcome: &BatchItemOutcome) {
        self.processed += 1;
        match outcome {
            BatchItemOutcome::Updated { .. } => self.updated += 1,
            BatchItemOutcome::Skipped { .. } => self.skipped += 1,
            BatchItemOutcome::NoMatch => self.no_match += 1,
            BatchItemOutcome::Failed => self.failed += 1,
            BatchItemOutcome::Error { .. } => self.errored += 1,
        }
        self.update();
    }

    fn update(&mut self) {
        self.percent_complete = if self.total > 0 {
            ((self.processed as f64 / self.total as f64) * 100.0).min(100.0) as u8
        } else {
            0
        };
    }
}

/// Result of a completed batch run.
#[derive(Debug)]
pub struct BatchReport {
    /// One `(file, outcome)` pair per submitted file, in completion order.
    pub outcomes: Vec<(PathBuf, BatchItemOutcome)>,
    /// Final tallies.
    pub progress: BatchProgress,
}

// =============================================================================
// Batch Job
// =============================================================================

/// Bounded-concurrency batch orchestrator.
#[derive(Clone)]
pub struct BatchJob {
    config: BatchConfig,
    reader: Arc<dyn TagReader>,
    writer: Arc<dyn TagWriter>,
    catalog: Arc<dyn CatalogSearch>,
    scorer: ConfidenceScorer,
    events: Arc<EventBus>,
}

impl BatchJob {
    /// Create a batch job over the given collaborators.
    pub fn new(
        config: BatchConfig,
        reader: Arc<dyn TagReader>,
        writer: Arc<dyn TagWriter>,
        catalog: Arc<dyn CatalogSearch>,
        events: Arc<EventBus>,
    ) -> Self {
        let scorer = ConfidenceScorer::with_tolerance(config.duration_tolerance_ms);
        Self {
            config,
            reader,
            writer,
            catalog,
            scorer,
            events,
        }
    }

    /// Assemble a batch job from the runtime configuration, using the
    /// default collaborators (lofty reader/writer, iTunes catalog).
    pub fn from_config(core: &CoreConfig, events: Arc<EventBus>) -> Self {
        let config = BatchConfig::default().with_concurrency(core.batch_concurrency);
        Self::new(
            config,
            Arc::new(LoftyTagReader::new()),
            Arc::new(TagFileWriter::with_timeout(
                core.http_client.clone(),
                core.artwork_timeout,
            )),
            Arc::new(ItunesCatalog::from_config(core)),
            events,
        )
    }

    /// Run the batch over `files`, returning one outcome per file.
    ///
    /// All files are enqueued immediately; at most `concurrency` pipelines
    /// run at once. Outcomes arrive in completion order.
    #[instrument(skip(self, files), name = "batch_run", fields(total = files.len()))]
    pub async fn run(&self, files: Vec<PathBuf>) -> BatchReport {
        let total = files.len();
        info!(total, concurrency = self.config.concurrency, "Starting batch run");
        self.emit(BatchEvent::Started { total });

        let semaphore = Arc::new(Semaphore::new(self.config.concurrency));
        let (tx, mut rx) = mpsc::unbounded_channel::<(PathBuf, BatchItemOutcome)>();

        for path in files {
            self.emit_phase(&path, ItemPhase::Pending);

            let job = self.clone();
            let semaphore = Arc::clone(&semaphore);
            let tx = tx.clone();
            tokio::spawn(async move {
                // The semaphore is never closed; acquire_owned only fails then.
                let _permit = semaphore.acquire_owned().await.unwrap();
                let outcome = job.process_file(&path).await;
                // The receiver outlives every worker of this run.
                let _ = tx.send((path, outcome));
            });
        }
        drop(tx);

        let mut progress = BatchProgress::new(total);
        let mut outcomes = Vec::with_capacity(total);
        while let Some((path, outcome)) = rx.recv().await {
            progress.record(&outcome);
            self.emit(BatchEvent::ItemCompleted {
                file: path.display().to_string(),
                outcome: outcome.label().to_string(),
                score: outcome.score(),
            });
            outcomes.push((path, outcome));
        }

        self.emit(BatchEvent::Completed {
            processed: progress.processed,
            updated: progress.updated,
            skipped: progress.skipped,
            no_match: progress.no_match,
            failed: progress.failed,
            errored: progress.errored,
        });

        info!(
            processed = progress.processed,
            updated = progress.updated,
            skipped = progress.skipped,
            no_match = progress.no_match,
            failed = progress.failed,
            errored = progress.errored,
            "Batch run completed"
        );

        BatchReport { outcomes, progress }
    }

    /// Run one file's pipeline to a terminal outcome.
    ///
    /// This is the isolation boundary: any error escaping the pipeline is
    /// converted into that file's `Error` outcome here.
    async fn process_file(&self, path: &Path) -> BatchItemOutcome {
        match self.run_pipeline(path).await {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(file = %path.display(), error = %e, "Batch item failed");
                BatchItemOutcome::Error {
                    reason: e.to_string(),
                }
            }
        }
    }

    async fn run_pipeline(&self, path: &Path) -> Result<BatchItemOutcome> {
        self.emit_phase(path, ItemPhase::Fetching);
        let local = self.reader.read_local(path).await?;

        let title = local.title.clone().unwrap_or_default();
        let artist = local.artist.clone().unwrap_or_default();
        let candidates = self
            .catalog
            .search(&title, &artist, local.duration(), Some(&local))
            .await;

        self.emit_phase(path, ItemPhase::Ranking);
        let ranked = rank_by_duration(candidates, local.duration());

        let outcome = match ranked.first() {
            None => {
                self.emit_phase(path, ItemPhase::Deciding);
                BatchItemOutcome::NoMatch
            }
            Some(best) => {
                self.emit_phase(path, ItemPhase::Scoring);
                let breakdown = self.scorer.score(&local, best);

                self.emit_phase(path, ItemPhase::Deciding);
                let score = breakdown.total;
                if score >= self.config.apply_threshold {
                    match self.writer.apply_update(path, best).await {
                        Ok(()) => BatchItemOutcome::Updated { score },
                        Err(e) => {
                            warn!(file = %path.display(), error = %e, "Update failed");
                            BatchItemOutcome::Failed
                        }
                    }
                } else {
                    BatchItemOutcome::Skipped { score }
                }
            }
        };

        self.emit_phase(path, ItemPhase::Terminal);
        Ok(outcome)
    }

    fn emit(&self, event: BatchEvent) {
        self.events.emit(CoreEvent::Batch(event)).ok();
    }

    fn emit_phase(&self, path: &Path, phase: ItemPhase) {
        self.emit(BatchEvent::ItemStateChanged {
            file: path.display().to_string(),
            phase,
        });
    }
}
