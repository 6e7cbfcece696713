//! Chunked bulk save with progress and a saved / exists / failed tally.
//!
//! Chunks are saved strictly in sequence, one batched store call each.
//! Progress is published on a watch channel after every chunk and cleared
//! when the run ends. Only one run may be active; re-entry is a no-op.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::{error, info, instrument, warn};

use crate::domain::Video;
use crate::library::{LibraryStore, SaveStatus};

use super::error::SearchError;

/// Default number of videos per batched save
pub const DEFAULT_CHUNK_SIZE: usize = 10;

/// Outcome counts for one bulk run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkTally {
    pub saved: usize,
    pub already_exists: usize,
    pub failed: usize,
}

impl BulkTally {
    /// Items accounted for so far
    pub fn processed(&self) -> usize {
        self.saved + self.already_exists + self.failed
    }

    pub fn record(&mut self, result: &Result<SaveStatus, String>) {
        match result {
            Ok(SaveStatus::Saved) => self.saved += 1,
            Ok(SaveStatus::Exists) => self.already_exists += 1,
            Err(_) => self.failed += 1,
        }
    }

    /// Final message; always reports all three counts
    pub fn summary(&self) -> String {
        format!(
            "Saved {}, already in library {}, failed {}.",
            self.saved, self.already_exists, self.failed
        )
    }

    /// The tally as a partial-failure error, if anything failed
    pub fn partial_failure(&self) -> Option<SearchError> {
        (self.failed > 0).then(|| SearchError::PartialBulkFailure {
            failed: self.failed,
            total: self.processed(),
        })
    }
}

/// Transient state of the active run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkProgress {
    pub total_items: usize,
    pub processed_items: usize,
    pub tally: BulkTally,
    pub label: String,
}

impl BulkProgress {
    fn new(total_items: usize) -> Self {
        let mut progress = Self {
            total_items,
            processed_items: 0,
            tally: BulkTally::default(),
            label: String::new(),
        };
        progress.relabel();
        progress
    }

    fn relabel(&mut self) {
        self.label = format!("Saving {}/{}...", self.processed_items, self.total_items);
    }
}

/// Result of `BulkOrchestrator::run`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BulkRun {
    /// Another run was active
    Skipped,
    Completed(BulkTally),
}

/// Marks a run active; clears progress and the running flag on drop, including
/// when the run's future is cancelled
struct RunGuard<'a>(&'a BulkOrchestrator);

impl<'a> RunGuard<'a> {
    fn acquire(orchestrator: &'a BulkOrchestrator) -> Option<Self> {
        orchestrator
            .running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| RunGuard(orchestrator))
    }
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.0.progress_tx.send_replace(None);
        self.0.running.store(false, Ordering::Release);
    }
}

/// Runs chunked bulk saves against a library store
pub struct BulkOrchestrator {
    chunk_size: usize,
    running: AtomicBool,
    progress_tx: watch::Sender<Option<BulkProgress>>,
}

impl Default for BulkOrchestrator {
    fn default() -> Self {
        Self::new(DEFAULT_CHUNK_SIZE)
    }
}

impl BulkOrchestrator {
    /// Create an orchestrator. A chunk size of zero is treated as one.
    pub fn new(chunk_size: usize) -> Self {
        let (progress_tx, _) = watch::channel(None);
        Self {
            chunk_size: chunk_size.max(1),
            running: AtomicBool::new(false),
            progress_tx,
        }
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Progress of the active run; `None` when idle
    pub fn subscribe(&self) -> watch::Receiver<Option<BulkProgress>> {
        self.progress_tx.subscribe()
    }

    /// Save `videos` in chunks.
    ///
    /// Per-item failures and ids missing from a chunk response are tallied
    /// as failed. A chunk whose save call fails outright aborts the run; the
    /// error carries the tally of the chunks completed before it.
    #[instrument(skip(self, videos, store), fields(total = videos.len(), chunk_size = self.chunk_size))]
    pub async fn run<S: LibraryStore + ?Sized>(
        &self,
        videos: &[Video],
        store: &S,
    ) -> Result<BulkRun, SearchError> {
        let Some(guard) = RunGuard::acquire(self) else {
            warn!("Bulk save already running");
            return Ok(BulkRun::Skipped);
        };

        let result = self.run_chunks(videos, store).await;
        drop(guard);

        match &result {
            Ok(tally) => info!(
                saved = tally.saved,
                exists = tally.already_exists,
                failed = tally.failed,
                "Bulk save finished"
            ),
            Err(e) => error!(error = %e, "Bulk save aborted"),
        }
        result.map(BulkRun::Completed)
    }

    async fn run_chunks<S: LibraryStore + ?Sized>(
        &self,
        videos: &[Video],
        store: &S,
    ) -> Result<BulkTally, SearchError> {
        let mut progress = BulkProgress::new(videos.len());
        self.progress_tx.send_replace(Some(progress.clone()));

        for chunk in videos.chunks(self.chunk_size) {
            let outcomes = store
                .save_many(chunk)
                .await
                .map_err(|e| SearchError::BulkAborted {
                    partial: progress.tally,
                    reason: format!("{:#}", e),
                })?;

            let by_id: HashMap<&str, &Result<SaveStatus, String>> = outcomes
                .iter()
                .map(|o| (o.id.as_str(), &o.result))
                .collect();

            for video in chunk {
                match by_id.get(video.id.as_str()) {
                    Some(result) => progress.tally.record(result),
                    None => progress.tally.failed += 1,
                }
            }

            progress.processed_items += chunk.len();
            progress.relabel();
            self.progress_tx.send_replace(Some(progress.clone()));
        }

        Ok(progress.tally)
    }
}
