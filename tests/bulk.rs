//! Bulk Save Integration Tests
//!
//! Tests for chunking, tallying, progress and abort behavior.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::Notify;
use tokio_test::{assert_err, assert_ok};

use kinesis::core::{BulkOrchestrator, BulkRun, BulkTally, SearchError};
use kinesis::domain::Video;
use kinesis::library::{LibraryStore, SaveOutcome, SaveStatus};

/// In-memory store that records every batch it receives
#[derive(Default)]
struct RecordingStore {
    saved: Mutex<HashSet<String>>,
    batches: Mutex<Vec<usize>>,
    /// Ids reported as per-item failures
    broken: HashSet<String>,
    /// Ids silently left out of the batch response
    dropped: HashSet<String>,
    /// Batch number (1-based) that fails outright
    fail_batch: Option<usize>,
    /// When set, each batch signals `entered` and waits for `release`
    gate: Option<(Arc<Notify>, Arc<Notify>)>,
}

impl RecordingStore {
    fn with_existing(self, ids: &[&str]) -> Self {
        self.saved
            .lock()
            .unwrap()
            .extend(ids.iter().map(|id| id.to_string()));
        self
    }

    fn batches(&self) -> Vec<usize> {
        self.batches.lock().unwrap().clone()
    }
}

#[async_trait]
impl LibraryStore for RecordingStore {
    async fn save_one(&self, video: &Video) -> Result<SaveStatus> {
        let inserted = self.saved.lock().unwrap().insert(video.id.clone());
        Ok(if inserted {
            SaveStatus::Saved
        } else {
            SaveStatus::Exists
        })
    }

    async fn save_many(&self, videos: &[Video]) -> Result<Vec<SaveOutcome>> {
        if let Some((entered, release)) = &self.gate {
            entered.notify_one();
            release.notified().await;
        }

        let batch = {
            let mut batches = self.batches.lock().unwrap();
            batches.push(videos.len());
            batches.len()
        };
        if self.fail_batch == Some(batch) {
            anyhow::bail!("database is locked");
        }

        let mut saved = self.saved.lock().unwrap();
        Ok(videos
            .iter()
            .filter(|v| !self.dropped.contains(&v.id))
            .map(|v| {
                if self.broken.contains(&v.id) {
                    SaveOutcome::failed(&v.id, "constraint violation")
                } else if saved.insert(v.id.clone()) {
                    SaveOutcome::ok(&v.id, SaveStatus::Saved)
                } else {
                    SaveOutcome::ok(&v.id, SaveStatus::Exists)
                }
            })
            .collect())
    }

    async fn delete_one(&self, id: &str) -> Result<bool> {
        Ok(self.saved.lock().unwrap().remove(id))
    }

    async fn exists(&self, id: &str) -> Result<bool> {
        Ok(self.saved.lock().unwrap().contains(id))
    }

    async fn list_saved(&self) -> Result<Vec<Video>> {
        Ok(Vec::new())
    }
}

fn videos(count: usize) -> Vec<Video> {
    (0..count)
        .map(|i| Video::new(format!("vid{:08}", i), format!("Video {}", i)))
        .collect()
}

fn completed(run: BulkRun) -> BulkTally {
    match run {
        BulkRun::Completed(tally) => tally,
        BulkRun::Skipped => panic!("run was skipped"),
    }
}

#[tokio::test]
async fn test_chunks_of_ten() {
    let store = RecordingStore::default();
    let orchestrator = BulkOrchestrator::new(10);

    let tally = completed(assert_ok!(orchestrator.run(&videos(23), &store).await));

    assert_eq!(store.batches(), vec![10, 10, 3]);
    assert_eq!(tally.processed(), 23);
    assert_eq!(tally.saved, 23);
}

#[tokio::test]
async fn test_tally_splits_outcomes() {
    let items = videos(12);
    let store = RecordingStore {
        broken: [items[3].id.clone()].into_iter().collect(),
        dropped: [items[11].id.clone()].into_iter().collect(),
        ..Default::default()
    }
    .with_existing(&[items[0].id.as_str(), items[5].id.as_str()]);

    let orchestrator = BulkOrchestrator::new(10);
    let tally = completed(assert_ok!(orchestrator.run(&items, &store).await));

    assert_eq!(tally.saved, 8);
    assert_eq!(tally.already_exists, 2);
    // One explicit failure plus one id missing from the response
    assert_eq!(tally.failed, 2);
    assert_eq!(tally.processed(), 12);
    assert_eq!(
        tally.summary(),
        "Saved 8, already in library 2, failed 2."
    );
    assert!(matches!(
        tally.partial_failure(),
        Some(SearchError::PartialBulkFailure { failed: 2, total: 12 })
    ));
}

#[tokio::test]
async fn test_chunk_failure_aborts_with_partial_tally() {
    let store = RecordingStore {
        fail_batch: Some(2),
        ..Default::default()
    };
    let orchestrator = BulkOrchestrator::new(10);
    let progress = orchestrator.subscribe();

    let err = assert_err!(orchestrator.run(&videos(23), &store).await);
    match err {
        SearchError::BulkAborted { partial, ref reason } => {
            assert_eq!(partial.saved, 10);
            assert_eq!(partial.processed(), 10);
            assert!(reason.contains("database is locked"));
        }
        other => panic!("unexpected error: {:?}", other),
    }

    // Third chunk never attempted; progress cleared
    assert_eq!(store.batches(), vec![10, 10]);
    assert!(progress.borrow().is_none());
    assert!(!orchestrator.is_running());
}

#[tokio::test]
async fn test_progress_is_monotonic_and_cleared() {
    let entered = Arc::new(Notify::new());
    let release = Arc::new(Notify::new());
    let store = Arc::new(RecordingStore {
        gate: Some((entered.clone(), release.clone())),
        ..Default::default()
    });
    let orchestrator = Arc::new(BulkOrchestrator::new(10));
    let mut progress = orchestrator.subscribe();

    let run = {
        let orchestrator = orchestrator.clone();
        let store = store.clone();
        tokio::spawn(async move { orchestrator.run(&videos(23), store.as_ref()).await })
    };

    let mut seen = Vec::new();
    for _ in 0..3 {
        entered.notified().await;
        let snapshot = progress.borrow_and_update().clone().unwrap();
        seen.push(snapshot.processed_items);
        assert_eq!(snapshot.total_items, 23);
        assert_eq!(
            snapshot.label,
            format!("Saving {}/23...", snapshot.processed_items)
        );
        release.notify_one();
    }

    let tally = completed(run.await.unwrap().unwrap());
    assert_eq!(tally.processed(), 23);
    assert_eq!(seen, vec![0, 10, 20]);
    assert!(progress.borrow().is_none());
}

#[tokio::test]
async fn test_reentry_is_noop() {
    let entered = Arc::new(Notify::new());
    let release = Arc::new(Notify::new());
    let store = Arc::new(RecordingStore {
        gate: Some((entered.clone(), release.clone())),
        ..Default::default()
    });
    let orchestrator = Arc::new(BulkOrchestrator::new(10));

    let first = {
        let orchestrator = orchestrator.clone();
        let store = store.clone();
        tokio::spawn(async move { orchestrator.run(&videos(5), store.as_ref()).await })
    };
    entered.notified().await;
    assert!(orchestrator.is_running());

    let second = assert_ok!(orchestrator.run(&videos(5), store.as_ref()).await);
    assert_eq!(second, BulkRun::Skipped);

    release.notify_one();
    let tally = completed(first.await.unwrap().unwrap());
    assert_eq!(tally.saved, 5);
    assert_eq!(store.batches(), vec![5]);
}

#[tokio::test]
async fn test_cancelled_run_releases_orchestrator() {
    // Never released, so the run stays inside its first chunk
    let stalled = RecordingStore {
        gate: Some((Arc::new(Notify::new()), Arc::new(Notify::new()))),
        ..Default::default()
    };
    let orchestrator = BulkOrchestrator::new(10);
    let progress = orchestrator.subscribe();

    let cancelled = tokio::time::timeout(
        Duration::from_millis(20),
        orchestrator.run(&videos(5), &stalled),
    )
    .await;
    assert!(cancelled.is_err());
    assert!(!orchestrator.is_running());
    assert!(progress.borrow().is_none());

    let store = RecordingStore::default();
    let tally = completed(assert_ok!(orchestrator.run(&videos(5), &store).await));
    assert_eq!(tally.saved, 5);
    assert_eq!(store.batches(), vec![5]);
}

#[tokio::test]
async fn test_empty_input_completes_with_zero_tally() {
    let store = RecordingStore::default();
    let orchestrator = BulkOrchestrator::default();

    let tally = completed(assert_ok!(orchestrator.run(&[], &store).await));
    assert_eq!(tally, BulkTally::default());
    assert!(store.batches().is_empty());
}
