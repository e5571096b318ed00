// src/api/cache.rs
// =============================================================================
// An in-memory response cache that sits in front of the /v1 routes.
//
// How it works:
// - The key is METHOD + path + sorted query string
// - Only GET requests with a 2xx answer are stored
// - Entries expire after a fixed TTL; the LRU evicts when capacity is reached
// - Adding `?opn` (the refresh key) to a request skips the stored entry and
//   replaces it with a fresh response
// - Every response that went through the cache carries `x-cache: HIT|MISS`
//
// The scan pipeline never sees any of this; it produces the same answer
// whether or not a cache is in front of it.
//
// Rust concepts:
// - Arc<Mutex<...>>: One cache shared by every request handler
// - Middleware: A plain async fn wrapped with from_fn_with_state
// - Bytes: Cheap to clone, so the stored and returned bodies share memory
// =============================================================================

use axum::body::{Body, Bytes};
use axum::extract::{Request, State};
use axum::http::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode, Uri};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use lru::LruCache;
use parking_lot::Mutex;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, warn};

/// Query parameter that forces a refresh of the cached entry.
pub const REFRESH_KEY: &str = "opn";

/// Response header telling whether the body came from the cache.
pub static X_CACHE: HeaderName = HeaderName::from_static("x-cache");

#[derive(Debug, Clone, Copy)]
pub struct CacheConfig {
    pub ttl: Duration,
    pub capacity: NonZeroUsize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(10 * 60),
            capacity: NonZeroUsize::new(128).expect("128 is non-zero"),
        }
    }
}

#[derive(Debug, Clone)]
struct CachedResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
    stored_at: Instant,
}

impl CachedResponse {
    fn into_hit(self) -> Response {
        let mut response = (self.status, self.headers, self.body).into_response();
        response
            .headers_mut()
            .insert(X_CACHE.clone(), HeaderValue::from_static("HIT"));
        response
    }
}

/// Shared handle to the cache. Clones point at the same entries.
#[derive(Clone)]
pub struct ResponseCache {
    entries: Arc<Mutex<LruCache<String, CachedResponse>>>,
    ttl: Duration,
}

impl ResponseCache {
    pub fn new(config: CacheConfig) -> Self {
        Self {
            entries: Arc::new(Mutex::new(LruCache::new(config.capacity))),
            ttl: config.ttl,
        }
    }

    fn get(&self, key: &str) -> Option<CachedResponse> {
        let mut entries = self.entries.lock();
        // `?` returns None when there is no entry at all
        let fresh = entries.get(key)?.stored_at.elapsed() < self.ttl;
        if fresh {
            entries.get(key).cloned()
        } else {
            // Expired entries are removed on read, there is no sweeper task
            entries.pop(key);
            None
        }
    }

    fn put(&self, key: String, response: CachedResponse) {
        self.entries.lock().put(key, response);
    }

    fn remove(&self, key: &str) {
        self.entries.lock().pop(key);
    }
}

/// Builds the cache key for a request.
///
/// Returns the key and whether the refresh key was present. The refresh key
/// itself is not part of the key, and query pairs are sorted so that
/// `?a=1&b=2` and `?b=2&a=1` share an entry.
pub fn cache_key(method: &Method, uri: &Uri) -> (String, bool) {
    let mut refresh = false;
    let mut pairs: Vec<&str> = uri
        .query()
        .unwrap_or("")
        .split('&')
        .filter(|pair| !pair.is_empty())
        .filter(|pair| {
            let name = pair.split('=').next().unwrap_or_default();
            if name == REFRESH_KEY {
                refresh = true;
                false
            } else {
                true
            }
        })
        .collect();
    pairs.sort_unstable();

    // e.g. "GET /v1/links?a=1&b=2"
    let mut key = format!("{} {}", method, uri.path());
    if !pairs.is_empty() {
        key.push('?');
        key.push_str(&pairs.join("&"));
    }
    (key, refresh)
}

/// axum middleware: serve from the cache or run the handler and store the result.
pub async fn cache_responses(State(cache): State<ResponseCache>, request: Request, next: Next) -> Response {
    // Only GET responses are cacheable
    if request.method() != Method::GET {
        return next.run(request).await;
    }

    let (key, refresh) = cache_key(request.method(), request.uri());

    if refresh {
        debug!(%key, "refresh requested, dropping cached entry");
        cache.remove(&key);
    } else if let Some(hit) = cache.get(&key) {
        debug!(%key, "cache hit");
        return hit.into_hit();
    }

    // Run the handler; errors pass through untouched and are never stored
    let response = next.run(request).await;
    if !response.status().is_success() {
        return response;
    }

    // Buffer the body so one copy can be stored and one returned
    let (mut parts, body) = response.into_parts();
    let body = match axum::body::to_bytes(body, usize::MAX).await {
        Ok(body) => body,
        Err(e) => {
            warn!(%key, error = %e, "could not buffer response for the cache");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    debug!(%key, bytes = body.len(), "cache miss, storing response");
    cache.put(
        key,
        CachedResponse {
            status: parts.status,
            headers: parts.headers.clone(),
            body: body.clone(),
            stored_at: Instant::now(),
        },
    );

    // The stored copy has no x-cache header; into_hit adds HIT on the way out
    parts
        .headers
        .insert(X_CACHE.clone(), HeaderValue::from_static("MISS"));
    Response::from_parts(parts, Body::from(body))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cached(body: &'static str) -> CachedResponse {
        CachedResponse {
            status: StatusCode::OK,
            headers: HeaderMap::new(),
            body: Bytes::from_static(body.as_bytes()),
            stored_at: Instant::now(),
        }
    }

    #[test]
    fn test_cache_key_sorts_query_and_strips_refresh_key() {
        let uri: Uri = "/v1/links?b=2&opn&a=1".parse().unwrap();
        let (key, refresh) = cache_key(&Method::GET, &uri);
        assert_eq!(key, "GET /v1/links?a=1&b=2");
        assert!(refresh);

        let uri: Uri = "/v1/link/3".parse().unwrap();
        assert_eq!(cache_key(&Method::GET, &uri), ("GET /v1/link/3".to_string(), false));

        let uri: Uri = "/v1/links?opn=1".parse().unwrap();
        assert_eq!(cache_key(&Method::GET, &uri), ("GET /v1/links".to_string(), true));
    }

    #[tokio::test(start_paused = true)]
    async fn test_entries_expire_after_ttl() {
        let cache = ResponseCache::new(CacheConfig {
            ttl: Duration::from_secs(60),
            ..CacheConfig::default()
        });
        cache.put("GET /v1/links".to_string(), cached("body"));

        tokio::time::advance(Duration::from_secs(59)).await;
        assert!(cache.get("GET /v1/links").is_some());

        tokio::time::advance(Duration::from_secs(2)).await;
        assert!(cache.get("GET /v1/links").is_none());
        assert!(cache.entries.lock().is_empty());
    }

    #[tokio::test]
    async fn test_least_recently_used_entry_is_evicted() {
        let cache = ResponseCache::new(CacheConfig {
            capacity: NonZeroUsize::new(2).unwrap(),
            ..CacheConfig::default()
        });
        cache.put("a".to_string(), cached("a"));
        cache.put("b".to_string(), cached("b"));
        assert!(cache.get("a").is_some());
        cache.put("c".to_string(), cached("c"));

        assert!(cache.get("a").is_some());
        assert!(cache.get("b").is_none());
        assert!(cache.get("c").is_some());
    }
}
