// src/checker/probe.rs
// =============================================================================
// This module checks whether externally referenced Gopher servers are alive.
//
// Key functionality:
// - Parses the "host\tport" record of an External item
// - Skips the server we are crawling (a link back to ourselves)
// - Attempts a TCP connection bounded by the probe timeout
//
// A server is "up" if the connection completes inside the window and "down"
// otherwise, including when the host does not resolve or the port is not a
// number. A probe never stops the program.
//
// tokio's TcpStream::connect starts a non-blocking connect and waits for the
// socket to become writable before checking its pending error, so wrapping
// it in a timeout gives exactly the readiness-within-a-window check we need.
// =============================================================================

use serde::Serialize;
use std::fmt;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::{lookup_host, TcpStream};
use tokio::time::timeout;
use tracing::debug;

// Reachability of one external server
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ServerStatus {
    /// Accepted a connection within the probe window
    Up,
    /// Refused, unresolvable or silent past the window
    Down,
}

impl fmt::Display for ServerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServerStatus::Up => write!(f, "up"),
            ServerStatus::Down => write!(f, "down"),
        }
    }
}

// Result of probing a single external server
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServerCheckResult {
    pub host: String,
    pub port: String,
    pub status: ServerStatus,
}

impl ServerCheckResult {
    pub fn is_up(&self) -> bool {
        self.status == ServerStatus::Up
    }
}

// Probes the servers behind every External record, one at a time.
//
// Parameters:
//   records: "host\tport" strings, in index order
//   home: address of the server being crawled, never probed
//   window: how long each connection attempt may take
pub async fn check_servers<'a>(
    records: impl IntoIterator<Item = &'a str>,
    home: Option<SocketAddr>,
    window: Duration,
) -> Vec<ServerCheckResult> {
    let mut results = Vec::new();
    for record in records {
        if let Some(result) = check_single_server(record, home, window).await {
            results.push(result);
        }
    }
    results
}

// Returns None when the record points back at `home`
async fn check_single_server(
    record: &str,
    home: Option<SocketAddr>,
    window: Duration,
) -> Option<ServerCheckResult> {
    let (host, port) = record.split_once('\t').unwrap_or((record, ""));

    let down = || ServerCheckResult {
        host: host.to_string(),
        port: port.to_string(),
        status: ServerStatus::Down,
    };

    let Ok(port_number) = port.trim().parse::<u16>() else {
        debug!(host, port, "external record has no usable port");
        return Some(down());
    };

    let addr = match timeout(window, lookup_host((host, port_number))).await {
        Ok(Ok(mut addrs)) => match addrs.next() {
            Some(addr) => addr,
            None => return Some(down()),
        },
        _ => {
            debug!(host, "external host did not resolve");
            return Some(down());
        }
    };

    if home.is_some_and(|home| home.ip() == addr.ip() && home.port() == addr.port()) {
        debug!(%addr, "skipping reference to the crawled server");
        return None;
    }

    let status = match timeout(window, TcpStream::connect(addr)).await {
        Ok(Ok(_stream)) => ServerStatus::Up,
        Ok(Err(e)) => {
            debug!(%addr, error = %e, "external server refused");
            ServerStatus::Down
        }
        Err(_) => {
            debug!(%addr, "external server did not answer in time");
            ServerStatus::Down
        }
    };

    Some(ServerCheckResult {
        host: host.to_string(),
        port: port.to_string(),
        status,
    })
}
