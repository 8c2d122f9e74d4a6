// src/main.rs
// =============================================================================
// This is the entry point of our CLI application.
//
// What happens here:
// 1. Parse command-line arguments using clap
// 2. Resolve the server address once
// 3. Crawl the server breadth-first, building the index
// 4. Measure the indexed files and print the counts
// 5. Fetch the smallest text file, check external servers, print the rest
// 6. Exit with proper code (0 = success, 2 = usage or connection error)
//
// Everything runs on one thread with one socket open at a time, so the
// tokio runtime is the single-threaded flavour.
// =============================================================================

mod checker;
mod cli;
mod config;
mod crawl;
mod error;
mod gopher;
mod report;

use anyhow::Result;
use clap::error::ErrorKind;
use clap::Parser;
use cli::Cli;
use gopher::{IndexStore, Session, TcpConnector};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    init_logging();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            e.exit()
        }
        Err(_) => {
            let program = std::env::args()
                .next()
                .unwrap_or_else(|| "gopher-indexer".to_string());
            eprintln!("Usage: {} <hostname> <port>", program);
            std::process::exit(2);
        }
    };

    let exit_code = match run(cli).await {
        Ok(()) => 0,
        Err(e) => {
            eprintln!("Error: {}", e);
            2
        }
    };

    std::process::exit(exit_code);
}

// Diagnostics go to stderr and stay quiet unless RUST_LOG asks for more
fn init_logging() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();
}

async fn run(cli: Cli) -> Result<()> {
    let config = cli.config();
    let echo = config.echo_progress;

    let connector = TcpConnector::resolve(&cli.hostname, cli.port, config.idle_timeout).await?;
    let session = Session::new(connector, config);
    let mut store = IndexStore::new(echo);

    info!(host = %cli.hostname, port = cli.port, "starting crawl");
    crawl::crawl_server(&session, &mut store).await?;
    if store.is_empty() {
        warn!("server returned an empty index");
    }

    if echo {
        println!();
        println!("Indexation complete. Now analysing the files.");
    }

    let mut report = checker::measure_files(&session, &mut store).await?;
    report::print_counts(&report, cli.json)?;

    checker::complete_report(&session, &mut store, &mut report).await?;
    let servers_up = report.external_servers.iter().filter(|s| s.is_up()).count();
    info!(
        items = store.len(),
        servers_up,
        issues = report.issues.len(),
        "evaluation finished"
    );
    report::print_results(&report, cli.json)?;

    Ok(())
}
