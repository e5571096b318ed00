// src/api/mod.rs
// =============================================================================
// The HTTP side of the service, built on axum.
//
// Submodules:
// - routes: handlers, JSON bodies, error -> status code mapping
// - cache: response cache middleware for the /v1 routes
//
// The health check is deliberately outside the cache and never touches the
// scan pipeline.
// =============================================================================

mod cache;
mod routes;

pub use cache::{CacheConfig, ResponseCache};
pub use routes::{AppState, LinksBody};

use axum::middleware;
use axum::routing::get;
use axum::Router;
use tower_http::trace::TraceLayer;

/// Builds the full application router.
pub fn router(state: AppState, response_cache: ResponseCache) -> Router {
    let cached = Router::new()
        .route("/v1/links", get(routes::get_links))
        .route("/v1/link/{id}", get(routes::get_link))
        .layer(middleware::from_fn_with_state(response_cache, cache::cache_responses));

    Router::new()
        .route("/", get(routes::health))
        .merge(cached)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}
