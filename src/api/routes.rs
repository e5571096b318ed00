// src/api/routes.rs
// =============================================================================
// Request handlers and the JSON shapes they return.
//
// Endpoints:
// - GET /              -> {"status": "ok"}
// - GET /v1/links      -> link counts for every target
// - GET /v1/link/{id}  -> link count for one target, same body shape
//
// Body shape for both /v1 routes:
//   {"links": [{"id": 0, "url": "https://go.dev", "links": 42}],
//    "time": "1.2345s",
//    "errors": [...]}           <- only present when a target failed
//
// Rust concepts:
// - Extractors: State and Path pull typed values out of the request
// - IntoResponse: ApiError turns itself into a status code and JSON body
// - From: Report types convert into their JSON shapes
// =============================================================================

use crate::scan::{run_batch, run_one, BatchReport, PageFetcher, ScanError, TargetFailure, TargetOutcome};
use crate::targets::Targets;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tracing::error;

/// Longest accepted `{id}` path segment.
pub const MAX_ID_LENGTH: usize = 2;

/// Everything a handler needs. Cloned per request, so it only holds handles.
#[derive(Clone)]
pub struct AppState {
    pub fetcher: Arc<dyn PageFetcher>,
    pub targets: Arc<Targets>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct HealthBody {
    pub status: String,
}

/// One successfully scanned target.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Link {
    pub id: usize,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub url: String,
    pub links: usize,
}

/// One target that failed during a batch.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LinkError {
    pub id: usize,
    pub url: String,
    pub kind: String,
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LinksBody {
    pub links: Vec<Link>,
    /// Elapsed time, e.g. "1.2345s" or "850.3ms"
    pub time: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<LinkError>,
}

impl From<&TargetOutcome> for Link {
    fn from(outcome: &TargetOutcome) -> Self {
        Self {
            id: outcome.index,
            url: outcome.address.clone(),
            links: outcome.links,
        }
    }
}

impl From<&TargetFailure> for LinkError {
    fn from(failure: &TargetFailure) -> Self {
        Self {
            id: failure.index,
            url: failure.address.clone(),
            kind: failure.error.kind().to_string(),
            message: failure.error.to_string(),
        }
    }
}

impl From<&BatchReport> for LinksBody {
    fn from(report: &BatchReport) -> Self {
        Self {
            links: report.outcomes.iter().map(Link::from).collect(),
            time: format!("{:?}", report.elapsed),
            errors: report.failures.iter().map(LinkError::from).collect(),
        }
    }
}

/// Errors a handler can return. Each maps to a status code and a JSON body.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("id must be an integer of at most 2 characters, got '{0}'")]
    InvalidId(String),

    #[error(transparent)]
    Scan(#[from] ScanError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        // Pick the status code first; the message comes from the Display impl
        let status = match &self {
            ApiError::InvalidId(_) => StatusCode::UNPROCESSABLE_ENTITY,
            // Out-of-range ids have always answered 500, not 4xx
            ApiError::Scan(ScanError::OutOfRange { .. }) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Scan(ScanError::Fetch { .. }) => StatusCode::BAD_GATEWAY,
            ApiError::Scan(ScanError::Incomplete { .. }) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        // 4xx is the caller's problem and is not worth an error log line
        if status.is_server_error() {
            error!(%status, error = %self, "request failed");
        }

        let body = Json(serde_json::json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}

pub async fn health() -> Json<HealthBody> {
    Json(HealthBody {
        status: "ok".to_string(),
    })
}

pub async fn get_links(State(state): State<AppState>) -> Result<Json<LinksBody>, ApiError> {
    // Failed targets end up in the report, so `?` only fires on Incomplete
    let report = run_batch(Arc::clone(&state.fetcher), &state.targets).await?;
    Ok(Json(LinksBody::from(&report)))
}

pub async fn get_link(State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<LinksBody>, ApiError> {
    // Reject malformed ids before run_one sees them
    let index = parse_id(&id)?;
    let report = run_one(state.fetcher.as_ref(), &state.targets, index).await?;
    Ok(Json(LinksBody::from(&report)))
}

// Accepts short integers only ("0", "9", "-1"); range is checked by run_one
fn parse_id(raw: &str) -> Result<i64, ApiError> {
    if raw.len() > MAX_ID_LENGTH {
        return Err(ApiError::InvalidId(raw.to_string()));
    }
    raw.parse::<i64>()
        .map_err(|_| ApiError::InvalidId(raw.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scan::FetchError;
    use std::time::Duration;

    #[test]
    fn test_parse_id() {
        assert_eq!(parse_id("0").unwrap(), 0);
        assert_eq!(parse_id("10").unwrap(), 10);
        assert_eq!(parse_id("-1").unwrap(), -1);
        assert!(matches!(parse_id("100"), Err(ApiError::InvalidId(_))));
        assert!(matches!(parse_id("ab"), Err(ApiError::InvalidId(_))));
        assert!(matches!(parse_id(""), Err(ApiError::InvalidId(_))));
    }

    #[test]
    fn test_links_body_from_report() {
        let report = BatchReport {
            outcomes: vec![TargetOutcome {
                index: 0,
                address: "https://go.dev".to_string(),
                links: 7,
            }],
            failures: vec![TargetFailure {
                index: 1,
                address: "https://down.example".to_string(),
                error: FetchError::Http { status: 503 },
            }],
            elapsed: Duration::from_millis(1500),
        };

        let body = LinksBody::from(&report);
        assert_eq!(body.time, "1.5s");
        assert_eq!(
            body.links,
            vec![Link {
                id: 0,
                url: "https://go.dev".to_string(),
                links: 7
            }]
        );
        assert_eq!(body.errors[0].id, 1);
        assert_eq!(body.errors[0].kind, "http_error");

        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["links"][0]["url"], "https://go.dev");
        assert_eq!(json["errors"][0]["message"], "HTTP error: status 503");
    }

    #[test]
    fn test_errors_field_is_omitted_when_empty() {
        let body = LinksBody {
            links: Vec::new(),
            time: "1ms".to_string(),
            errors: Vec::new(),
        };
        let json = serde_json::to_value(&body).unwrap();
        assert!(json.get("errors").is_none());
        assert_eq!(json["links"], serde_json::json!([]));
    }
}
