// src/cli.rs
// =============================================================================
// This file defines our command-line interface using the `clap` crate.
//
// Two subcommands:
// - serve: run the HTTP API (the normal way to use link-tally)
// - scan:  run the same pipeline once and print the result in the terminal
//
// Every server flag can also come from an environment variable
// (LINK_TALLY_PORT, LINK_TALLY_TIMEOUT_SECS, ...), which is handy in
// containers where passing flags is awkward.
//
// Rust concepts:
// - Derive macros: clap generates the parser from the struct definitions
// - #[command(flatten)]: Shares FetchArgs between both subcommands
// =============================================================================

use crate::api::CacheConfig;
use crate::scan::ClientConfig;
use crate::targets::{TargetError, Targets};
use clap::{Args, Parser, Subcommand};
use std::num::NonZeroUsize;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(
    name = "link-tally",
    version,
    about = "Counts http/https links on a fixed set of websites, concurrently",
    long_about = "link-tally fetches a fixed list of websites in parallel and counts the \
                  quoted http/https links in each page. It serves the results over a small \
                  cached HTTP API, or prints them once with the `scan` command."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the HTTP API
    ///
    /// Example: link-tally serve --port 8888
    Serve(ServeArgs),

    /// Scan the targets once and print the results
    ///
    /// Example: link-tally scan --id 3 --json
    Scan(ScanArgs),
}

/// Flags shared by both subcommands: what to fetch and how.
#[derive(Args, Debug)]
pub struct FetchArgs {
    /// Replace the built-in site list (repeat the flag, or comma-separate)
    #[arg(long = "target", value_name = "URL", env = "LINK_TALLY_TARGETS", value_delimiter = ',')]
    pub targets: Vec<String>,

    /// Upper bound for one fetch, in seconds
    #[arg(
        long,
        env = "LINK_TALLY_TIMEOUT_SECS",
        default_value_t = 10,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub timeout_secs: u64,

    /// Idle keep-alive connections kept per host
    #[arg(long, env = "LINK_TALLY_MAX_IDLE_PER_HOST", default_value_t = 10)]
    pub max_idle_per_host: usize,

    /// How long an idle connection stays in the pool, in seconds
    #[arg(
        long,
        env = "LINK_TALLY_IDLE_TIMEOUT_SECS",
        default_value_t = 90,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub idle_timeout_secs: u64,
}

impl FetchArgs {
    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            timeout: Duration::from_secs(self.timeout_secs),
            max_idle_per_host: self.max_idle_per_host,
            idle_timeout: Duration::from_secs(self.idle_timeout_secs),
        }
    }

    /// The configured target list, or the built-in one when none was given
    pub fn targets(&self) -> Result<Targets, TargetError> {
        if self.targets.is_empty() {
            Ok(Targets::builtin())
        } else {
            Targets::parse(&self.targets)
        }
    }
}

#[derive(Args, Debug)]
pub struct ServeArgs {
    #[command(flatten)]
    pub fetch: FetchArgs,

    /// Port to listen on (all interfaces)
    #[arg(long, env = "LINK_TALLY_PORT", default_value_t = 8888)]
    pub port: u16,

    /// How long a cached response stays valid, in seconds
    #[arg(long, env = "LINK_TALLY_CACHE_TTL_SECS", default_value_t = 600)]
    pub cache_ttl_secs: u64,

    /// Maximum number of cached responses
    #[arg(long, env = "LINK_TALLY_CACHE_CAPACITY", default_value = "128")]
    pub cache_capacity: NonZeroUsize,
}

impl ServeArgs {
    pub fn cache_config(&self) -> CacheConfig {
        CacheConfig {
            ttl: Duration::from_secs(self.cache_ttl_secs),
            capacity: self.cache_capacity,
        }
    }
}

#[derive(Args, Debug)]
pub struct ScanArgs {
    #[command(flatten)]
    pub fetch: FetchArgs,

    /// Scan only the target at this position (0-based)
    #[arg(long, allow_negative_numbers = true)]
    pub id: Option<i64>,

    /// Output results in JSON format instead of a table
    #[arg(long)]
    pub json: bool,
}
