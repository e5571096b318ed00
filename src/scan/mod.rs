// src/scan/mod.rs
// =============================================================================
// This module contains the fetch-and-count pipeline.
//
// Submodules:
// - counter: Counts quoted http/https links in raw markup
// - fetch: Downloads a page with the shared HTTP client
// - batch: Runs fetch + count over all targets (or just one)
//
// Nothing in here knows about HTTP routes, caching or JSON. The api module
// and the `scan` command both sit on top of this.
// =============================================================================

mod batch;
mod counter;
mod fetch;

#[cfg(test)]
pub mod testing;

pub use batch::{run_batch, run_one, BatchReport, ScanError, TargetFailure, TargetOutcome};
pub use fetch::{ClientConfig, FetchError, HttpFetcher, PageFetcher};
