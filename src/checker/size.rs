// src/checker/size.rs
// =============================================================================
// This module analyses the files found by the crawl.
//
// For every text and binary item (in index order) we open a new connection
// and count the bytes of the reply:
// - reaching the size ceiling aborts the download and records a TooLarge item
// - a stalled download records a Timeout item
// - anything else updates the smallest/largest size for that file class
//
// That first pass is enough for the counts, which the caller can print
// straight away. complete_report then downloads the smallest text file
// once more to show its content, checks the external servers and collects
// the issues from the final store.
// =============================================================================

use super::probe::check_servers;
use crate::error::CrawlError;
use crate::gopher::{
    Connector, Handler, HandlerResult, IndexStore, Item, ItemKind, ReadOutcome, Selector, Session,
};
use crate::report::{Report, SizeRange};
use tracing::{info, warn};

// Measures every file and starts the report: counts, size extrema and the
// smallest text file. Content, external servers and issues are left empty
// for complete_report.
//
// The store is only appended to (Timeout / TooLarge items), never reordered.
pub async fn measure_files<C: Connector>(
    session: &Session<C>,
    store: &mut IndexStore,
) -> Result<Report, CrawlError> {
    let files: Vec<Item> = store
        .iter()
        .filter(|item| matches!(item.kind, ItemKind::Text | ItemKind::Binary))
        .cloned()
        .collect();
    info!(files = files.len(), "measuring file sizes");

    let mut text_sizes = SizeRange::default();
    let mut binary_sizes = SizeRange::default();
    let mut smallest_text_file: Option<Selector> = None;

    for file in &files {
        let Some(size) = measure_file(session, store, &file.record).await? else {
            continue;
        };

        match file.kind {
            ItemKind::Text => {
                if text_sizes.observe(size) {
                    smallest_text_file = Some(file.record.clone());
                }
            }
            ItemKind::Binary => {
                binary_sizes.observe(size);
            }
            _ => {}
        }
    }

    Ok(Report {
        directories: store.count(ItemKind::Directory),
        text_files: store.count(ItemKind::Text),
        binary_files: store.count(ItemKind::Binary),
        invalid_references: store.count(ItemKind::ErrorRef),
        text_sizes,
        binary_sizes,
        smallest_text_file,
        smallest_text_content: None,
        external_servers: Vec::new(),
        issues: Vec::new(),
    })
}

// Fills in the rest of a report started by measure_files
pub async fn complete_report<C: Connector>(
    session: &Session<C>,
    store: &mut IndexStore,
    report: &mut Report,
) -> Result<(), CrawlError> {
    if let Some(path) = &report.smallest_text_file {
        report.smallest_text_content = fetch_content(session, store, path).await?;
    }

    let externals: Vec<String> = store
        .of_kind(ItemKind::External)
        .map(|item| item.record.to_string())
        .collect();
    report.external_servers = check_servers(
        externals.iter().map(String::as_str),
        session.server_addr(),
        session.config().probe_timeout,
    )
    .await;

    // content fetch may have added a Timeout
    report.issues = store
        .iter()
        .filter(|item| item.kind.is_issue())
        .cloned()
        .collect();

    Ok(())
}

// Downloads `path` just far enough to know its size.
//
// Returns: Some(size) for a usable measurement, None when the file timed
// out, failed or turned out to be too large
async fn measure_file<C: Connector>(
    session: &Session<C>,
    store: &mut IndexStore,
    path: &Selector,
) -> Result<Option<u64>, CrawlError> {
    let limit = session.config().max_file_size;
    let exchange = session.request(path, Handler::measure_size(limit)).await?;

    let HandlerResult::Count(size) = exchange.result else {
        return Ok(None);
    };

    let measured = match exchange.outcome {
        ReadOutcome::TimedOut => {
            eprintln!("Error: Server response timeout");
            store.record(Item::new(ItemKind::Timeout, path.clone()));
            None
        }
        ReadOutcome::Failed(e) => {
            warn!(%path, error = %e, "receive failed");
            eprintln!("Error: Unable to receive server response");
            None
        }
        _ if size >= limit => {
            store.record(Item::new(ItemKind::TooLarge, path.clone()));
            None
        }
        ReadOutcome::Empty => {
            if session.config().echo_progress {
                println!("Empty response from the server");
            }
            Some(0)
        }
        ReadOutcome::Complete | ReadOutcome::Stopped => Some(size),
    };

    Ok(measured)
}

// Downloads the content of `path`, without the "." terminator line
async fn fetch_content<C: Connector>(
    session: &Session<C>,
    store: &mut IndexStore,
    path: &Selector,
) -> Result<Option<String>, CrawlError> {
    let limit = session.config().max_file_size;
    let exchange = session.request(path, Handler::print_content(limit)).await?;

    match exchange.outcome {
        ReadOutcome::TimedOut => {
            eprintln!("Error: Server response timeout");
            store.record(Item::new(ItemKind::Timeout, path.clone()));
            return Ok(None);
        }
        ReadOutcome::Failed(e) => {
            warn!(%path, error = %e, "receive failed");
            eprintln!("Error: Unable to receive server response");
            return Ok(None);
        }
        _ => {}
    }

    match exchange.result {
        HandlerResult::Printed(bytes) => Ok(Some(String::from_utf8_lossy(&bytes).into_owned())),
        _ => Ok(None),
    }
}
