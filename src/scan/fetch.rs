// src/scan/fetch.rs
// =============================================================================
// This module downloads pages over HTTP.
//
// Key functionality:
// - One shared reqwest Client (connection pool) for the whole process
// - A single GET per call, no retries
// - Fixed browser-like headers on every request
// - Every failure is sorted into a FetchError variant
//
// The PageFetcher trait is the seam between "getting bytes" and "counting
// links". The server and the scan command use HttpFetcher; the tests plug in
// fakes that count calls or sleep for a known time.
//
// Rust concepts:
// - Traits as interfaces: PageFetcher can be implemented by anything
// - BoxFuture: an async fn inside a trait object needs a boxed future
// - Drop: a reqwest::Response releases its connection when dropped
// =============================================================================

use futures::future::BoxFuture;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT_LANGUAGE, CONNECTION};
use reqwest::Client;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// The User-Agent sent with every request.
pub const USER_AGENT: &str = "Mozilla/5.0";

/// The Accept-Language sent with every request.
pub const ACCEPT_LANGUAGE_VALUE: &str = "es-ES";

/// Why a single fetch failed.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    /// DNS resolution or TCP/TLS connection failed
    #[error("network error: {0}")]
    Network(String),

    /// The server answered with a 4xx or 5xx status
    #[error("HTTP error: status {status}")]
    Http { status: u16 },

    /// The request did not finish within the fixed bound
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    /// The status was fine but the body could not be fully read
    #[error("failed to read response body: {0}")]
    Read(String),
}

impl FetchError {
    /// Short machine-readable name, used in JSON output
    pub fn kind(&self) -> &'static str {
        match self {
            FetchError::Network(_) => "network_error",
            FetchError::Http { .. } => "http_error",
            FetchError::Timeout(_) => "timeout",
            FetchError::Read(_) => "read_error",
        }
    }
}

/// Anything that can turn an address into raw page bytes.
///
/// Implementations must be safe to share between tasks: the batch aggregator
/// hands the same fetcher to every task it spawns.
pub trait PageFetcher: Send + Sync {
    fn fetch<'a>(&'a self, address: &'a Url) -> BoxFuture<'a, Result<Vec<u8>, FetchError>>;
}

// Settings for the process-wide HTTP client
#[derive(Debug, Clone, Copy)]
pub struct ClientConfig {
    /// Upper bound for one whole fetch (connect + headers + body)
    pub timeout: Duration,
    /// How many idle keep-alive connections to keep per host
    pub max_idle_per_host: usize,
    /// How long an idle connection may sit in the pool
    pub idle_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            max_idle_per_host: 10,
            idle_timeout: Duration::from_secs(90),
        }
    }
}

/// Fetches pages with a shared reqwest client.
///
/// Cloning is cheap: reqwest::Client is an Arc around the pool internally,
/// so every clone talks to the same connections.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
    timeout: Duration,
}

impl HttpFetcher {
    /// Builds the connection pool once. Call this at startup, never per request.
    pub fn new(config: ClientConfig) -> Result<Self, reqwest::Error> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static(ACCEPT_LANGUAGE_VALUE));
        headers.insert(CONNECTION, HeaderValue::from_static("keep-alive"));

        let client = Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .timeout(config.timeout)
            .pool_max_idle_per_host(config.max_idle_per_host)
            .pool_idle_timeout(config.idle_timeout)
            .build()?;

        Ok(Self {
            client,
            timeout: config.timeout,
        })
    }

    async fn get(&self, address: &Url) -> Result<Vec<u8>, FetchError> {
        // If send() fails, reqwest has already torn down whatever it opened.
        let response = self
            .client
            .get(address.clone())
            .send()
            .await
            .map_err(|e| self.categorize_error(e))?;

        // Anything from 400 up is an error, including non-standard codes above 599
        let status = response.status();
        if status.as_u16() >= 400 {
            // Returning here drops `response`, which hands the connection back
            // (or closes it) without reading the body.
            return Err(FetchError::Http {
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::Timeout(self.timeout)
            } else {
                FetchError::Read(e.without_url().to_string())
            }
        })?;

        Ok(body.to_vec())
    }

    // Sorts reqwest errors into our own variants
    fn categorize_error(&self, error: reqwest::Error) -> FetchError {
        if error.is_timeout() {
            FetchError::Timeout(self.timeout)
        } else if error.is_body() || error.is_decode() {
            FetchError::Read(error.without_url().to_string())
        } else {
            // Connect, DNS, TLS and anything else below HTTP
            FetchError::Network(error.without_url().to_string())
        }
    }
}

impl PageFetcher for HttpFetcher {
    fn fetch<'a>(&'a self, address: &'a Url) -> BoxFuture<'a, Result<Vec<u8>, FetchError>> {
        Box::pin(self.get(address))
    }
}
