// src/cli.rs
// =============================================================================
// This file defines our command-line interface using the `clap` crate.
//
//   gopher-indexer <hostname> <port> [--json] [--max-file-size N] ...
//
// The two positional arguments are required. The flags tune the limits the
// crawler works with; their defaults live in config.rs.
// =============================================================================

use crate::config::{
    CrawlConfig, DEFAULT_IDLE_TIMEOUT, DEFAULT_MAX_FILE_SIZE, DEFAULT_PROBE_TIMEOUT,
    DEFAULT_TRANSFER_TIMEOUT,
};
use clap::Parser;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(
    name = "gopher-indexer",
    version = "0.1.0",
    about = "Crawl a Gopher server, index every item and report on its health",
    long_about = "gopher-indexer walks a Gopher server breadth-first from its root directory, \
                  measures every text and binary file, prints the smallest text file and \
                  checks whether referenced external servers are up."
)]
pub struct Cli {
    /// Hostname or IP address of the Gopher server
    pub hostname: String,

    /// TCP port of the Gopher server (usually 70)
    pub port: u16,

    /// Print the final report as JSON instead of text
    ///
    /// Progress lines are suppressed so stdout stays valid JSON
    #[arg(long)]
    pub json: bool,

    /// Files of this many bytes or more are reported as too large
    #[arg(long, default_value_t = DEFAULT_MAX_FILE_SIZE)]
    pub max_file_size: u64,

    /// Seconds a new connection may stay silent
    #[arg(long, default_value_t = DEFAULT_IDLE_TIMEOUT.as_secs())]
    pub idle_timeout: u64,

    /// Seconds allowed between two chunks of one transfer
    #[arg(long, default_value_t = DEFAULT_TRANSFER_TIMEOUT.as_secs())]
    pub transfer_timeout: u64,

    /// Seconds to wait for an external server to accept a connection
    #[arg(long, default_value_t = DEFAULT_PROBE_TIMEOUT.as_secs())]
    pub probe_timeout: u64,
}

impl Cli {
    pub fn config(&self) -> CrawlConfig {
        CrawlConfig {
            max_file_size: self.max_file_size,
            idle_timeout: Duration::from_secs(self.idle_timeout),
            transfer_timeout: Duration::from_secs(self.transfer_timeout),
            probe_timeout: Duration::from_secs(self.probe_timeout),
            echo_progress: !self.json,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["gopher-indexer", "gopher.example", "70"]).unwrap();
        let config = cli.config();

        assert_eq!(cli.hostname, "gopher.example");
        assert_eq!(cli.port, 70);
        assert_eq!(config.max_file_size, 65536);
        assert_eq!(config.idle_timeout, Duration::from_secs(10));
        assert_eq!(config.transfer_timeout, Duration::from_secs(5));
        assert_eq!(config.probe_timeout, Duration::from_secs(5));
        assert!(config.echo_progress);
    }

    #[test]
    fn test_json_silences_progress() {
        let cli = Cli::try_parse_from([
            "gopher-indexer",
            "localhost",
            "7070",
            "--json",
            "--max-file-size",
            "1024",
        ])
        .unwrap();
        let config = cli.config();

        assert!(!config.echo_progress);
        assert_eq!(config.max_file_size, 1024);
    }

    #[test]
    fn test_wrong_argument_count() {
        assert!(Cli::try_parse_from(["gopher-indexer", "localhost"]).is_err());
        assert!(Cli::try_parse_from(["gopher-indexer", "a", "70", "extra"]).is_err());
    }
}
