// src/main.rs
// =============================================================================
// This is the entry point of link-tally.
//
// What happens here:
// 1. Set up logging
// 2. Parse command-line arguments using clap
// 3. Build the shared pieces once: target list, HTTP client, response cache
// 4. Either serve the HTTP API or run a single scan and print it
// 5. Exit with proper code (0 = success, 1 = some target failed, 2 = error)
//
// Rust concepts used:
// - #[tokio::main]: Turns main into an async function on the tokio runtime
// - anyhow::Context: Adds a readable message to any error on its way up
// - Arc<dyn Trait>: One fetcher shared across tasks behind a trait object
// =============================================================================

mod api;       // src/api/ - HTTP routes and response cache
mod cli;       // src/cli.rs - command-line parsing
mod scan;      // src/scan/ - fetch + count pipeline
mod targets;   // src/targets.rs - the fixed site list
mod telemetry; // src/telemetry.rs - logging setup

use anyhow::{Context, Result};
use api::{AppState, LinksBody, ResponseCache};
use clap::Parser;
use cli::{Cli, Commands, ScanArgs, ServeArgs};
use scan::{BatchReport, HttpFetcher, PageFetcher, ScanError, TargetFailure};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() {
    telemetry::init();

    let exit_code = match run().await {
        Ok(code) => code,
        Err(e) => {
            error!("{:#}", e);
            2
        }
    };

    std::process::exit(exit_code);
}

async fn run() -> Result<i32> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve(args) => serve(args).await,
        Commands::Scan(args) => scan_once(args).await,
    }
}

// Runs the HTTP API until Ctrl-C
async fn serve(args: ServeArgs) -> Result<i32> {
    let targets = Arc::new(args.fetch.targets().context("invalid target list")?);

    // One client (and connection pool) for the lifetime of the process
    let fetcher = HttpFetcher::new(args.fetch.client_config()).context("failed to build the HTTP client")?;

    let state = AppState {
        fetcher: Arc::new(fetcher),
        targets: Arc::clone(&targets),
    };
    let app = api::router(state, ResponseCache::new(args.cache_config()));

    let addr = SocketAddr::from(([0, 0, 0, 0], args.port));
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;

    info!(%addr, targets = targets.len(), "starting server");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("server stopped");
    Ok(0)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        // Without a signal handler the server just runs until killed
        warn!(error = %e, "could not listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}

// Handles the 'scan' subcommand
async fn scan_once(args: ScanArgs) -> Result<i32> {
    let targets = args.fetch.targets().context("invalid target list")?;
    let fetcher: Arc<dyn PageFetcher> =
        Arc::new(HttpFetcher::new(args.fetch.client_config()).context("failed to build the HTTP client")?);

    let started = Instant::now();
    let report = match args.id {
        None => scan::run_batch(fetcher, &targets).await?,
        Some(id) => match scan::run_one(fetcher.as_ref(), &targets, id).await {
            Ok(report) => report,
            // A dead site is a result to print, not an internal error
            Err(ScanError::Fetch { index, address, source }) => BatchReport {
                outcomes: Vec::new(),
                failures: vec![TargetFailure {
                    index,
                    address,
                    error: source,
                }],
                elapsed: started.elapsed(),
            },
            Err(e) => return Err(e.into()),
        },
    };

    print_results(&report, args.json)?;

    if report.is_complete() {
        Ok(0)
    } else {
        Ok(1)
    }
}

// Prints the report either as a table or as the same JSON the API returns
fn print_results(report: &BatchReport, json: bool) -> Result<()> {
    if json {
        let json_output = serde_json::to_string_pretty(&LinksBody::from(report))?;
        println!("{}", json_output);
    } else {
        print_table(report);
    }
    Ok(())
}

fn print_table(report: &BatchReport) {
    println!("{:<4} {:<45} {:<10} {:<30}", "ID", "URL", "LINKS", "ERROR");
    println!("{}", "=".repeat(90));

    // Merge successes and failures back into target order for display
    let mut rows: Vec<(usize, &str, String, String)> = report
        .outcomes
        .iter()
        .map(|o| (o.index, o.address.as_str(), o.links.to_string(), String::new()))
        .chain(
            report
                .failures
                .iter()
                .map(|f| (f.index, f.address.as_str(), "-".to_string(), f.error.to_string())),
        )
        .collect();
    rows.sort_by_key(|row| row.0);

    for (id, url, links, error) in rows {
        let url_display = if url.chars().count() > 42 {
            format!("{}...", url.chars().take(42).collect::<String>())
        } else {
            url.to_string()
        };
        println!("{:<4} {:<45} {:<10} {:<30}", id, url_display, links, error);
    }

    println!();

    let total_links: usize = report.outcomes.iter().map(|o| o.links).sum();
    println!("Summary:");
    println!("   Scanned: {}", report.outcomes.len());
    println!("   Failed:  {}", report.failures.len());
    println!("   Links:   {}", total_links);
    println!("   Took:    {:?}", report.elapsed);
}
