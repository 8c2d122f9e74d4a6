// src/gopher/reader.rs
// =============================================================================
// Reads a Gopher response off a socket and feeds it to a handler.
//
// The reader pulls bounded chunks (CHUNK_SIZE bytes) from the stream and
// applies two timeouts:
// - idle timeout: nothing at all has arrived since we connected
// - transfer timeout: data started flowing, then stalled between chunks
// Either one ends the read with ReadOutcome::TimedOut.
//
// What happens to the bytes depends on the Handler:
// - Index: frame CRLF lines and classify each into an Item
// - MeasureSize: count bytes, stop early once the size ceiling is hit
// - PrintContent: keep the file content up to the "." terminator line,
//   never more than the size ceiling
//
// Lines are framed by LineFramer, which buffers a partial line until the
// rest of it arrives in a later chunk. A line that grows past
// MAX_LINE_LENGTH without a CRLF is thrown away, so a hostile server
// can't make the buffer grow forever.
// =============================================================================

use super::classify::classify_line;
use super::item::{Item, Selector};
use std::io;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::time::timeout;
use tracing::debug;

/// Largest number of bytes read from the socket in one go
pub const CHUNK_SIZE: usize = 4096;

/// Longest partial line the framer buffers while waiting for its CRLF
pub const MAX_LINE_LENGTH: usize = 64 * 1024;

const TERMINATOR: &[u8] = b".";

// Splits a byte stream into CRLF-terminated lines
#[derive(Debug)]
pub struct LineFramer {
    pending: Vec<u8>,
    max_line: usize,
    // set while skipping the rest of an oversized line
    overflowed: bool,
}

impl Default for LineFramer {
    fn default() -> Self {
        Self::with_limit(MAX_LINE_LENGTH)
    }
}

impl LineFramer {
    pub fn with_limit(max_line: usize) -> Self {
        Self {
            pending: Vec::new(),
            max_line,
            overflowed: false,
        }
    }

    // Adds a chunk and returns every line it completed (without the CRLF)
    pub fn push(&mut self, chunk: &[u8]) -> Vec<Vec<u8>> {
        self.pending.extend_from_slice(chunk);

        let mut lines = Vec::new();
        let mut start = 0;
        while let Some(offset) = find_crlf(&self.pending[start..]) {
            if self.overflowed {
                self.overflowed = false;
            } else {
                lines.push(self.pending[start..start + offset].to_vec());
            }
            start += offset + 2;
        }
        self.pending.drain(..start);

        if self.pending.len() > self.max_line {
            // keep a trailing '\r' so a CRLF split across chunks is still seen
            let keep = usize::from(self.pending.last() == Some(&b'\r'));
            let cut = self.pending.len() - keep;
            self.pending.drain(..cut);
            self.overflowed = true;
            debug!(max_line = self.max_line, "oversized line dropped");
        }
        lines
    }

    // Whatever is left once the peer closed without a final CRLF
    pub fn finish(self) -> Option<Vec<u8>> {
        if self.pending.is_empty() || self.overflowed {
            None
        } else {
            Some(self.pending)
        }
    }
}

fn find_crlf(bytes: &[u8]) -> Option<usize> {
    bytes.windows(2).position(|pair| pair == b"\r\n")
}

// Whether the reader should keep pulling chunks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Stop,
}

/// How a response ended
#[derive(Debug)]
pub enum ReadOutcome {
    /// The peer closed the connection after sending data
    Complete,
    /// The peer closed the connection without sending anything
    Empty,
    /// The handler asked to stop before the peer was done
    Stopped,
    /// Idle or transfer timeout expired
    TimedOut,
    /// Any other receive failure
    Failed(io::Error),
}

/// The value a handler produces once the response is over
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandlerResult {
    IndexedItems(Vec<Item>),
    Count(u64),
    Printed(Vec<u8>),
}

#[derive(Debug)]
pub enum Handler {
    Index {
        request: Selector,
        framer: LineFramer,
        items: Vec<Item>,
    },
    MeasureSize {
        limit: u64,
        count: u64,
    },
    PrintContent {
        limit: u64,
        received: u64,
        framer: LineFramer,
        content: Vec<u8>,
        done: bool,
    },
}

impl Handler {
    pub fn index(request: &Selector) -> Self {
        Handler::Index {
            request: request.clone(),
            framer: LineFramer::default(),
            items: Vec::new(),
        }
    }

    pub fn measure_size(limit: u64) -> Self {
        Handler::MeasureSize { limit, count: 0 }
    }

    // Collects at most `limit` bytes of content
    pub fn print_content(limit: u64) -> Self {
        Handler::PrintContent {
            limit,
            received: 0,
            framer: LineFramer::default(),
            content: Vec::new(),
            done: false,
        }
    }

    // Hands one received chunk to the handler
    pub fn feed(&mut self, chunk: &[u8]) -> Flow {
        match self {
            Handler::Index {
                request,
                framer,
                items,
            } => {
                for line in framer.push(chunk) {
                    items.extend(classify_line(&line, request));
                }
                Flow::Continue
            }
            Handler::MeasureSize { limit, count } => {
                *count += chunk.len() as u64;
                if *count >= *limit {
                    Flow::Stop
                } else {
                    Flow::Continue
                }
            }
            Handler::PrintContent {
                limit,
                received,
                framer,
                content,
                done,
            } => {
                *received += chunk.len() as u64;
                for line in framer.push(chunk) {
                    if line == TERMINATOR {
                        *done = true;
                        return Flow::Stop;
                    }
                    content.extend_from_slice(&line);
                    content.extend_from_slice(b"\r\n");
                }
                if *received >= *limit {
                    content.truncate(usize::try_from(*limit).unwrap_or(usize::MAX));
                    *done = true;
                    return Flow::Stop;
                }
                Flow::Continue
            }
        }
    }

    // Ends the response. `eof` is true when the peer closed the connection
    // normally, so a trailing line without CRLF is still complete.
    pub fn finish(self, eof: bool) -> HandlerResult {
        match self {
            Handler::Index {
                request,
                framer,
                mut items,
            } => {
                if eof {
                    if let Some(line) = framer.finish() {
                        items.extend(classify_line(&line, &request));
                    }
                }
                HandlerResult::IndexedItems(items)
            }
            Handler::MeasureSize { count, .. } => HandlerResult::Count(count),
            Handler::PrintContent {
                framer,
                mut content,
                done,
                ..
            } => {
                if eof && !done {
                    if let Some(rest) = framer.finish() {
                        if rest != TERMINATOR {
                            content.extend_from_slice(&rest);
                        }
                    }
                }
                HandlerResult::Printed(content)
            }
        }
    }
}

// Drains `stream` into `handler` until the peer closes, the handler stops,
// a timeout expires or the receive fails.
pub async fn drain<S>(
    stream: &mut S,
    handler: &mut Handler,
    idle_timeout: Duration,
    transfer_timeout: Duration,
) -> ReadOutcome
where
    S: AsyncRead + Unpin,
{
    let mut buffer = vec![0u8; CHUNK_SIZE];
    let mut received: u64 = 0;

    loop {
        let window = if received == 0 {
            idle_timeout
        } else {
            transfer_timeout
        };

        let n = match timeout(window, stream.read(&mut buffer)).await {
            Err(_) => return ReadOutcome::TimedOut,
            Ok(Err(e)) if is_timeout(&e) => return ReadOutcome::TimedOut,
            Ok(Err(e)) => return ReadOutcome::Failed(e),
            Ok(Ok(0)) => break,
            Ok(Ok(n)) => n,
        };

        received += n as u64;
        debug!(bytes = n, total = received, "chunk received");

        if handler.feed(&buffer[..n]) == Flow::Stop {
            return ReadOutcome::Stopped;
        }
    }

    if received == 0 {
        ReadOutcome::Empty
    } else {
        ReadOutcome::Complete
    }
}

fn is_timeout(error: &io::Error) -> bool {
    matches!(
        error.kind(),
        io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut
    )
}
