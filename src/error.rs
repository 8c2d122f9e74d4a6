// src/error.rs
// =============================================================================
// Errors that stop a crawl.
//
// Only failures to *reach* the server live here. Everything that can go
// wrong after a connection is open (timeouts, empty replies, bad lines,
// oversized files) is absorbed into the index as an Item instead.
// =============================================================================

use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CrawlError {
    #[error("unable to resolve host {host}: {source}")]
    Resolve {
        host: String,
        #[source]
        source: io::Error,
    },

    #[error("unable to connect to host {host}")]
    NoAddress { host: String },

    #[error("connection to {target} failed: {source}")]
    Connect {
        target: String,
        #[source]
        source: io::Error,
    },
}
