// src/crawl/queue.rs
// =============================================================================
// This module walks a Gopher server breadth-first.
//
// How it works:
// 1. Request the root directory (empty selector)
// 2. Classify every line of the reply and record the items in the store
// 3. Each directory that is *new* to the store joins the back of the queue
// 4. Pop the next directory, request it, repeat until the queue is empty
//
// Because a directory only enters the queue when the store accepts it, the
// same (Directory, selector) pair is never requested twice, even if many
// pages link to it.
//
// Rust concepts:
// - VecDeque: Double-ended queue for breadth-first crawling
// - Generics: the crawler works with any Connector (real TCP or a test fake)
// =============================================================================

use crate::error::CrawlError;
use crate::gopher::{
    Connector, Handler, HandlerResult, IndexStore, Item, ItemKind, ReadOutcome, Selector, Session,
};
use std::collections::VecDeque;
use tracing::{info, warn};

// Crawls the whole server reachable from the root directory
//
// Parameters:
//   session: connection context for the server being crawled
//   store: receives every item discovered along the way
//
// Returns: Ok(()) once every directory was visited, or the connection error
// that made crawling impossible
pub async fn crawl_server<C: Connector>(
    session: &Session<C>,
    store: &mut IndexStore,
) -> Result<(), CrawlError> {
    // Directories waiting to be requested, oldest first
    let mut queue = VecDeque::new();
    queue.push_back(Selector::root());

    let mut visited = 0usize;
    while let Some(selector) = queue.pop_front() {
        visited += 1;
        for directory in index_directory(session, store, &selector).await? {
            queue.push_back(directory);
        }
    }

    info!(directories = visited, items = store.len(), "crawl finished");
    Ok(())
}

// Requests one directory and records what it lists.
//
// Returns: the selectors of directories that were not known before
async fn index_directory<C: Connector>(
    session: &Session<C>,
    store: &mut IndexStore,
    selector: &Selector,
) -> Result<Vec<Selector>, CrawlError> {
    let exchange = session.request(selector, Handler::index(selector)).await?;

    match exchange.outcome {
        ReadOutcome::TimedOut => {
            eprintln!("Error: Server response timeout");
            store.record(Item::new(ItemKind::Timeout, selector.clone()));
        }
        ReadOutcome::Failed(e) => {
            warn!(%selector, error = %e, "receive failed");
            eprintln!("Error: Unable to receive server response");
        }
        ReadOutcome::Empty => {
            if session.config().echo_progress {
                println!("Empty response from the server");
            }
        }
        ReadOutcome::Complete | ReadOutcome::Stopped => {}
    }

    let mut new_directories = Vec::new();
    if let HandlerResult::IndexedItems(items) = exchange.result {
        for item in items {
            let is_directory = item.kind == ItemKind::Directory;
            let record = item.record.clone();
            if store.record(item) && is_directory {
                new_directories.push(record);
            }
        }
    }

    Ok(new_directories)
}

// -----------------------------------------------------------------------------
// BEGINNER NOTES:
//
// 1. Why a queue instead of recursion?
//    - Recursion would go depth-first and could overflow on deep trees
//    - A VecDeque gives breadth-first order: push_back() new work,
//      pop_front() the oldest
//
// 2. Why does index_directory return the new directories?
//    - It keeps the queue owned by crawl_server alone
//    - The store decides what is "new" (insert returns false for duplicates),
//      so there is no separate visited set to keep in sync
//
// 3. What does the `?` after .await do?
//    - If the connection could not be opened, the error is returned to the
//      caller right away and the crawl stops
// -----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gopher::testing::{quiet_config, FakeServer, Unreachable};
    use crate::gopher::TcpConnector;
    use std::sync::{Arc, Mutex};
    use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
    use tokio::net::TcpListener;

    fn tree() -> FakeServer {
        FakeServer::new(&[
            (
                "",
                "iWelcome\tfake\t(NULL)\t0\r\n\
                 1A\t/a\th\t70\r\n\
                 0About\t/about\th\t70\r\n\
                 .\r\n",
            ),
            (
                "/a",
                "1B\t/a/b\th\t70\r\n\
                 1C\t/a/c\th\t70\r\n\
                 .\r\n",
            ),
            ("/a/b", "1D\t/a/b/d\th\t70\r\n9Blob\t/a/b/blob\th\t70\r\n.\r\n"),
            ("/a/c", "1Back to A\t/a\th\t70\r\n.\r\n"),
            ("/a/b/d", "0Deep\t/a/b/d/deep\th\t70\r\n"),
        ])
    }

    fn records(store: &IndexStore) -> Vec<(ItemKind, Selector)> {
        store.iter().map(|i| (i.kind, i.record.clone())).collect()
    }

    #[tokio::test]
    async fn test_breadth_first_order() {
        let server = tree();
        let session = Session::new(server.clone(), quiet_config());
        let mut store = IndexStore::new(false);

        crawl_server(&session, &mut store).await.unwrap();

        // B and C are both requested before D
        assert_eq!(server.requests(), vec!["", "/a", "/a/b", "/a/c", "/a/b/d"]);

        let dirs: Vec<_> = store
            .of_kind(ItemKind::Directory)
            .map(|i| i.record.to_string())
            .collect();
        assert_eq!(dirs, vec!["/a", "/a/b", "/a/c", "/a/b/d"]);
        assert_eq!(store.count(ItemKind::Text), 2);
        assert_eq!(store.count(ItemKind::Binary), 1);
    }

    #[tokio::test]
    async fn test_crawl_is_repeatable() {
        let server = tree();

        let mut first = IndexStore::new(false);
        crawl_server(&Session::new(server.clone(), quiet_config()), &mut first)
            .await
            .unwrap();

        let mut second = IndexStore::new(false);
        crawl_server(&Session::new(server, quiet_config()), &mut second)
            .await
            .unwrap();

        assert_eq!(records(&first), records(&second));
    }

    #[tokio::test]
    async fn test_invalid_selectors_counted_once_each() {
        // "/gone" is linked three times but requested once
        let server = FakeServer::new(&[
            (
                "",
                "1Gone\t/gone\th\t70\r\n1Also gone\t/gone\th\t70\r\n1Other\t/other\th\t70\r\n.\r\n",
            ),
            ("/other", "1Gone again\t/gone\th\t70\r\n1Lost\t/lost\th\t70\r\n.\r\n"),
        ]);
        let session = Session::new(server.clone(), quiet_config());
        let mut store = IndexStore::new(false);

        crawl_server(&session, &mut store).await.unwrap();

        assert_eq!(server.requests(), vec!["", "/gone", "/other", "/lost"]);
        let errors: Vec<_> = store
            .of_kind(ItemKind::ErrorRef)
            .map(|i| i.record.to_string())
            .collect();
        assert_eq!(errors, vec!["/gone", "/lost"]);
    }

    #[tokio::test]
    async fn test_external_servers_are_not_crawled() {
        let server = FakeServer::new(&[(
            "",
            "1Friend\t\tfriend.example\t70\r\n1Mirror\t/\th\t70\r\n.\r\n",
        )]);
        let session = Session::new(server.clone(), quiet_config());
        let mut store = IndexStore::new(false);

        crawl_server(&session, &mut store).await.unwrap();

        assert_eq!(server.requests(), vec!["", "/"]);
        assert_eq!(
            store.of_kind(ItemKind::External).next(),
            Some(&Item::new(ItemKind::External, "friend.example\t70"))
        );
    }

    #[tokio::test]
    async fn test_non_utf8_directory_is_requested_verbatim() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let seen = Arc::new(Mutex::new(Vec::<Vec<u8>>::new()));

        let log = Arc::clone(&seen);
        tokio::spawn(async move {
            loop {
                let Ok((socket, _)) = listener.accept().await else {
                    return;
                };
                let mut reader = BufReader::new(socket);
                let mut line = Vec::new();
                if reader.read_until(b'\n', &mut line).await.is_err() {
                    continue;
                }
                let body: &[u8] = match line.as_slice() {
                    b"\r\n" => b"1Caf\xe9\t/caf\xe9\th\t70\r\n.\r\n",
                    b"/caf\xe9\r\n" => b"1Menu\t/caf\xe9/menu\th\t70\r\n.\r\n",
                    _ => b".\r\n",
                };
                log.lock().unwrap().push(line);
                let mut socket = reader.into_inner();
                let _ = socket.write_all(body).await;
            }
        });

        let config = quiet_config();
        let session = Session::new(TcpConnector::new(addr, config.idle_timeout), config);
        let mut store = IndexStore::new(false);

        crawl_server(&session, &mut store).await.unwrap();

        let requests = seen.lock().unwrap().clone();
        assert_eq!(
            requests,
            vec![
                b"\r\n".to_vec(),
                b"/caf\xe9\r\n".to_vec(),
                b"/caf\xe9/menu\r\n".to_vec(),
            ]
        );
        let dirs: Vec<_> = store
            .of_kind(ItemKind::Directory)
            .map(|i| i.record.as_bytes().to_vec())
            .collect();
        assert_eq!(dirs, vec![b"/caf\xe9".to_vec(), b"/caf\xe9/menu".to_vec()]);
    }

    #[tokio::test]
    async fn test_unreachable_server_fails() {
        let session = Session::new(Unreachable, quiet_config());
        let mut store = IndexStore::new(false);
        assert!(crawl_server(&session, &mut store).await.is_err());
        assert!(store.is_empty());
    }
}
