// src/scan/testing.rs
// =============================================================================
// Test doubles for the pipeline (compiled only for `cargo test`).
//
// FakeFetcher serves canned pages after a fixed delay and counts every call,
// so tests can check ordering, parallelism, and "no network traffic happened".
// =============================================================================

use super::fetch::{FetchError, PageFetcher};
use crate::targets::Targets;
use futures::future::BoxFuture;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use url::Url;

type Page = (Duration, Result<Vec<u8>, FetchError>);

#[derive(Default)]
pub struct FakeFetcher {
    pages: HashMap<String, Page>,
    calls: AtomicUsize,
}

impl FakeFetcher {
    pub fn page(mut self, address: &str, delay_ms: u64, body: &str) -> Self {
        self.pages.insert(
            address.to_string(),
            (Duration::from_millis(delay_ms), Ok(body.as_bytes().to_vec())),
        );
        self
    }

    pub fn failing(mut self, address: &str, delay_ms: u64, error: FetchError) -> Self {
        self.pages
            .insert(address.to_string(), (Duration::from_millis(delay_ms), Err(error)));
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl PageFetcher for FakeFetcher {
    fn fetch<'a>(&'a self, address: &'a Url) -> BoxFuture<'a, Result<Vec<u8>, FetchError>> {
        Box::pin(async move {
            self.calls.fetch_add(1, Ordering::SeqCst);
            // Unknown addresses behave like a host that doesn't resolve
            let (delay, result) = self
                .pages
                .get(address.as_str())
                .cloned()
                .unwrap_or((Duration::ZERO, Err(FetchError::Network("unknown host".into()))));
            tokio::time::sleep(delay).await;
            result
        })
    }
}

/// Address of fake site `n`, already in normalized URL form
pub fn site(n: usize) -> String {
    format!("http://site{}.test/", n)
}

/// A target list of `count` fake sites
pub fn targets(count: usize) -> Targets {
    let addresses: Vec<String> = (0..count).map(site).collect();
    Targets::parse(&addresses).unwrap()
}

/// Markup containing `n` countable links
pub fn links(n: usize) -> String {
    r#"<a href="https://example.com">x</a>"#.repeat(n)
}
