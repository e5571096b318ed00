// src/scan/batch.rs
// =============================================================================
// This module runs the fetch-and-count pipeline over the target list.
//
// How a batch works:
// 1. Start the clock
// 2. Spawn one tokio task per target (no concurrency limit)
// 3. Every task fetches its page, counts the links, and sends exactly one
//    message down a shared channel
// 4. The collector drains the channel until every task has reported
// 5. Results are sorted back into target order
//
// Failure policy:
// - A failed target is left out of `outcomes` and recorded in `failures`
// - One failing site never fails the whole batch
// - Only tasks that die without reporting (a panic) make the batch an error
//
// Single target:
// - The index is checked BEFORE any network traffic
// - The result has the same shape as a batch with one entry
//
// Rust concepts:
// - tokio::spawn: Each target runs as its own task on the runtime
// - mpsc channels: Many senders (tasks), one receiver (the collector)
// - Arc: The fetcher is shared by every task without copying it
// =============================================================================

use super::counter::count_links;
use super::fetch::{FetchError, PageFetcher};
use crate::targets::{Target, Targets};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Link count for one target that was fetched successfully.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetOutcome {
    pub index: usize,
    pub address: String,
    pub links: usize,
}

/// A target that could not be fetched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetFailure {
    pub index: usize,
    pub address: String,
    pub error: FetchError,
}

/// Everything one scan produced.
///
/// `outcomes` and `failures` are both sorted by ascending index.
#[derive(Debug, Clone)]
pub struct BatchReport {
    pub outcomes: Vec<TargetOutcome>,
    pub failures: Vec<TargetFailure>,
    pub elapsed: Duration,
}

impl BatchReport {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

#[derive(Debug, Error)]
pub enum ScanError {
    /// The caller asked for an index outside the list
    #[error("id must be between 0 and {valid_max}, got {requested}")]
    OutOfRange { requested: i64, valid_max: usize },

    /// The single requested target failed
    #[error("target {index} ({address}) failed: {source}")]
    Fetch {
        index: usize,
        address: String,
        #[source]
        source: FetchError,
    },

    /// Some tasks ended without sending their result
    #[error("only {received} of {expected} scan tasks reported back")]
    Incomplete { expected: usize, received: usize },
}

// Fetches one target and counts its links
async fn scan_target(fetcher: &dyn PageFetcher, target: &Target) -> Result<TargetOutcome, TargetFailure> {
    let started = Instant::now();

    // One GET, no retries
    match fetcher.fetch(&target.url).await {
        Ok(content) => {
            // Count straight from the raw bytes; the body is dropped afterwards
            let links = count_links(&content);
            debug!(
                id = target.index,
                url = %target.address,
                links,
                bytes = content.len(),
                took = ?started.elapsed(),
                "target scanned"
            );
            Ok(TargetOutcome {
                index: target.index,
                address: target.address.clone(),
                links,
            })
        }
        // Keep the address with the error so reports can say which site failed
        Err(error) => Err(TargetFailure {
            index: target.index,
            address: target.address.clone(),
            error,
        }),
    }
}

/// Scans every target concurrently and waits for all of them.
pub async fn run_batch(fetcher: Arc<dyn PageFetcher>, targets: &Targets) -> Result<BatchReport, ScanError> {
    let start = Instant::now();
    let expected = targets.len();
    info!(targets = expected, "starting to search links");

    // Capacity for every result, so no task ever waits on the collector
    let (tx, mut rx) = mpsc::channel(expected.max(1));

    for target in targets {
        // Each task owns its own handles: a fetcher Arc, a target copy, a sender
        let fetcher = Arc::clone(&fetcher);
        let target = target.clone();
        let tx = tx.clone();

        tokio::spawn(async move {
            let result = scan_target(fetcher.as_ref(), &target).await;
            // Only fails if the collector is gone, and then nobody is listening
            let _ = tx.send(result).await;
        });
    }

    // Drop our own sender so recv() returns None once every task is done
    drop(tx);

    let mut outcomes = Vec::with_capacity(expected);
    let mut failures = Vec::new();
    let mut received = 0;

    // Results arrive in completion order, not target order
    while let Some(result) = rx.recv().await {
        received += 1;
        match result {
            Ok(outcome) => {
                info!(id = outcome.index, url = %outcome.address, links = outcome.links, "links counted");
                outcomes.push(outcome);
            }
            Err(failure) => {
                warn!(id = failure.index, url = %failure.address, error = %failure.error, "target failed");
                failures.push(failure);
            }
        }
    }

    let elapsed = start.elapsed();

    // A task that panicked dropped its sender without sending
    if received != expected {
        warn!(expected, received, "scan tasks ended without reporting");
        return Err(ScanError::Incomplete { expected, received });
    }

    // Tasks finish in any order; callers get target order
    outcomes.sort_by_key(|outcome| outcome.index);
    failures.sort_by_key(|failure| failure.index);

    info!(
        succeeded = outcomes.len(),
        failed = failures.len(),
        took = ?elapsed,
        "finished searching links"
    );

    Ok(BatchReport {
        outcomes,
        failures,
        elapsed,
    })
}

/// Scans the single target at `index`.
///
/// `index` is signed because it comes straight from user input; anything
/// outside `0..targets.len()` is rejected without touching the network.
pub async fn run_one(fetcher: &dyn PageFetcher, targets: &Targets, index: i64) -> Result<BatchReport, ScanError> {
    // Negative numbers fail the conversion, too-large ones fail the lookup
    let target = usize::try_from(index)
        .ok()
        .and_then(|i| targets.get(i))
        .ok_or(ScanError::OutOfRange {
            requested: index,
            valid_max: targets.len().saturating_sub(1),
        })?;

    info!(id = target.index, url = %target.address, "starting to search link");
    let start = Instant::now();

    // No task or channel for a single target, just await it here
    let outcome = scan_target(fetcher, target).await.map_err(|failure| {
        warn!(id = failure.index, url = %failure.address, error = %failure.error, "target failed");
        ScanError::Fetch {
            index: failure.index,
            address: failure.address,
            source: failure.error,
        }
    })?;

    let elapsed = start.elapsed();
    info!(id = outcome.index, links = outcome.links, took = ?elapsed, "finished searching link");

    Ok(BatchReport {
        outcomes: vec![outcome],
        failures: Vec::new(),
        elapsed,
    })
}
