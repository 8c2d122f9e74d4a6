// src/gopher/session.rs
// =============================================================================
// One request/response exchange with the Gopher server.
//
// Gopher is stateless: every request gets its own connection. A Session
// holds what all those connections share (where to connect, the timeouts,
// whether to echo progress) and runs each exchange:
//
//   connect -> send "<selector>\r\n" -> drain response into a handler -> close
//
// Connecting goes through the Connector trait so tests can swap the real
// TCP socket for an in-memory stream.
// =============================================================================

use super::item::Selector;
use super::reader::{drain, Handler, HandlerResult, ReadOutcome};
use crate::config::CrawlConfig;
use crate::error::CrawlError;
use std::future::Future;
use std::io;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio::net::{lookup_host, TcpStream};
use tokio::time::timeout;
use tracing::debug;

/// Opens a fresh byte stream to the server for each request
pub trait Connector {
    type Stream: AsyncRead + AsyncWrite + Unpin;

    fn connect(&self) -> impl Future<Output = io::Result<Self::Stream>>;

    /// Human readable target, used in error messages
    fn target(&self) -> String;

    /// Socket address of the server, when there is a real one
    fn server_addr(&self) -> Option<SocketAddr> {
        None
    }
}

// Connects to a Gopher server over TCP
#[derive(Debug, Clone)]
pub struct TcpConnector {
    addr: SocketAddr,
    connect_timeout: Duration,
}

impl TcpConnector {
    pub fn new(addr: SocketAddr, connect_timeout: Duration) -> Self {
        Self {
            addr,
            connect_timeout,
        }
    }

    // Resolves `host` once; every later request reuses the address
    pub async fn resolve(
        host: &str,
        port: u16,
        connect_timeout: Duration,
    ) -> Result<Self, CrawlError> {
        let mut addrs = lookup_host((host, port))
            .await
            .map_err(|source| CrawlError::Resolve {
                host: host.to_string(),
                source,
            })?;

        let addr = addrs.next().ok_or_else(|| CrawlError::NoAddress {
            host: host.to_string(),
        })?;

        debug!(%host, %addr, "resolved server address");
        Ok(Self::new(addr, connect_timeout))
    }
}

impl Connector for TcpConnector {
    type Stream = TcpStream;

    async fn connect(&self) -> io::Result<TcpStream> {
        match timeout(self.connect_timeout, TcpStream::connect(self.addr)).await {
            Ok(result) => result,
            Err(_) => Err(io::Error::new(
                io::ErrorKind::TimedOut,
                "connection attempt timed out",
            )),
        }
    }

    fn target(&self) -> String {
        self.addr.to_string()
    }

    fn server_addr(&self) -> Option<SocketAddr> {
        Some(self.addr)
    }
}

/// What a single request produced
#[derive(Debug)]
pub struct Exchange {
    pub outcome: ReadOutcome,
    pub result: HandlerResult,
}

// Crawl-wide context: the connector plus the runtime settings
pub struct Session<C> {
    connector: C,
    config: CrawlConfig,
}

impl<C: Connector> Session<C> {
    pub fn new(connector: C, config: CrawlConfig) -> Self {
        Self { connector, config }
    }

    pub fn config(&self) -> &CrawlConfig {
        &self.config
    }

    pub fn server_addr(&self) -> Option<SocketAddr> {
        self.connector.server_addr()
    }

    // Sends `selector` on a new connection and runs `handler` over the reply.
    //
    // Failing to connect is the only error: without the server there is
    // nothing left to crawl. Everything after that is reported through
    // Exchange::outcome. The connection is closed when `stream` drops,
    // whichever way this function returns.
    pub async fn request(
        &self,
        selector: &Selector,
        mut handler: Handler,
    ) -> Result<Exchange, CrawlError> {
        let mut stream = self
            .connector
            .connect()
            .await
            .map_err(|source| CrawlError::Connect {
                target: self.connector.target(),
                source,
            })?;

        // the selector goes out exactly as the server spelled it
        let mut line = Vec::with_capacity(selector.as_bytes().len() + 2);
        line.extend_from_slice(selector.as_bytes());
        line.extend_from_slice(b"\r\n");
        if let Err(e) = send(&mut stream, &line).await {
            return Ok(Exchange {
                outcome: ReadOutcome::Failed(e),
                result: handler.finish(false),
            });
        }

        if self.config.echo_progress {
            let now = chrono::Local::now().format("%Y-%m-%d %H:%M:%S");
            println!("Request sent at {}: {}", now, selector);
        }

        let outcome = drain(
            &mut stream,
            &mut handler,
            self.config.idle_timeout,
            self.config.transfer_timeout,
        )
        .await;

        debug!(%selector, ?outcome, "response finished");
        let eof = matches!(outcome, ReadOutcome::Complete | ReadOutcome::Empty);
        let result = handler.finish(eof);

        Ok(Exchange { outcome, result })
    }
}

async fn send<S: AsyncWrite + Unpin>(stream: &mut S, bytes: &[u8]) -> io::Result<()> {
    stream.write_all(bytes).await?;
    stream.flush().await
}

// -----------------------------------------------------------------------------
// BEGINNER NOTES:
//
// 1. Why is there no explicit close()?
//    - TcpStream closes its socket when it is dropped
//    - `stream` is a local in request(), so every return path drops it
//
// 2. What is `impl Future` in the trait?
//    - It lets each Connector write `async fn connect` in its impl
//    - The session awaits it without knowing the concrete stream type
// -----------------------------------------------------------------------------


#[cfg(test)]
mod tests {
    use super::testing::*;
    use super::*;
    use crate::gopher::item::{Item, ItemKind};
    use tokio::io::AsyncReadExt;
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn test_request_sends_selector_line() {
        let server = FakeServer::new(&[("/docs", "0Hi\t/docs/hi\th\t70\r\n.\r\n")]);
        let session = Session::new(server.clone(), quiet_config());

        let docs = Selector::from("/docs");
        let exchange = session.request(&docs, Handler::index(&docs)).await.unwrap();

        assert_eq!(server.requests(), vec!["/docs".to_string()]);
        assert!(matches!(exchange.outcome, ReadOutcome::Complete));
        assert_eq!(
            exchange.result,
            HandlerResult::IndexedItems(vec![Item::new(ItemKind::Text, "/docs/hi")])
        );
    }

    #[tokio::test]
    async fn test_connect_failure_is_an_error() {
        let session = Session::new(Unreachable, quiet_config());
        let root = Selector::root();
        let result = session.request(&root, Handler::index(&root)).await;
        assert!(matches!(result, Err(CrawlError::Connect { .. })));
    }

    #[tokio::test]
    async fn test_root_request_over_tcp() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let server = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = [0u8; 2];
            socket.read_exact(&mut request).await.unwrap();
            socket.write_all(b"hello").await.unwrap();
            request
        });

        let config = quiet_config();
        let connector = TcpConnector::new(addr, config.idle_timeout);
        let session = Session::new(connector, config);
        let exchange = session
            .request(&Selector::root(), Handler::measure_size(1024))
            .await
            .unwrap();

        assert_eq!(&server.await.unwrap(), b"\r\n");
        assert_eq!(exchange.result, HandlerResult::Count(5));
    }

    #[tokio::test]
    async fn test_request_line_keeps_non_utf8_bytes() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let server = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = [0u8; 7];
            socket.read_exact(&mut request).await.unwrap();
            request
        });

        let config = quiet_config();
        let connector = TcpConnector::new(addr, config.idle_timeout);
        let session = Session::new(connector, config);
        let selector = Selector::from(&b"/caf\xe9"[..]);
        session
            .request(&selector, Handler::measure_size(1024))
            .await
            .unwrap();

        assert_eq!(&server.await.unwrap(), b"/caf\xe9\r\n");
    }

    #[tokio::test]
    async fn test_silent_server_times_out() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let (socket, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(5)).await;
            drop(socket);
        });

        let config = quiet_config();
        let connector = TcpConnector::new(addr, config.idle_timeout);
        let session = Session::new(connector, config);
        let exchange = session
            .request(&Selector::from("/slow"), Handler::measure_size(1024))
            .await
            .unwrap();

        assert!(matches!(exchange.outcome, ReadOutcome::TimedOut));
    }
}
