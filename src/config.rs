// src/config.rs
// =============================================================================
// Runtime knobs for a crawl.
//
// Every value here has a default that matches a classic Gopher client, and
// each one can be overridden from the command line (see cli.rs). Tests build
// a CrawlConfig directly with much shorter timeouts.
// =============================================================================

use std::time::Duration;

/// Files at or above this many bytes are reported as too large
pub const DEFAULT_MAX_FILE_SIZE: u64 = 65536;

/// How long a fresh connection may stay silent before we give up on it
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(10);

/// Longest allowed gap between two chunks once a transfer has started
pub const DEFAULT_TRANSFER_TIMEOUT: Duration = Duration::from_secs(5);

/// How long we wait for an external server to accept a connection
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone)]
pub struct CrawlConfig {
    pub max_file_size: u64,
    pub idle_timeout: Duration,
    pub transfer_timeout: Duration,
    pub probe_timeout: Duration,
    /// Print "Request sent" / "Indexed" progress lines to stdout
    pub echo_progress: bool,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            idle_timeout: DEFAULT_IDLE_TIMEOUT,
            transfer_timeout: DEFAULT_TRANSFER_TIMEOUT,
            probe_timeout: DEFAULT_PROBE_TIMEOUT,
            echo_progress: true,
        }
    }
}
