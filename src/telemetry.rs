// src/telemetry.rs
// Logging setup. RUST_LOG overrides the default filter, e.g.
// `RUST_LOG=link_tally=trace,tower_http=debug link-tally serve`.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_FILTER: &str = "info,link_tally=debug";

/// Installs the global subscriber. Logs go to stderr so `scan --json` keeps
/// stdout clean.
pub fn init() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_FILTER.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
