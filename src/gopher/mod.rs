// src/gopher/mod.rs
// =============================================================================
// Everything that speaks the Gopher protocol (RFC 1436).
//
// Submodules:
// - item: Item kinds and the deduplicating IndexStore
// - classify: Turns a directory line into an Item
// - reader: Frames lines, applies timeouts, feeds response handlers
// - session: Opens a connection per request and runs one exchange
// =============================================================================

mod classify;
mod item;
mod reader;
mod session;

pub use item::{IndexStore, Item, ItemKind, Selector};
pub use reader::{Handler, HandlerResult, ReadOutcome};
pub use session::{Connector, Session, TcpConnector};

#[cfg(test)]
pub(crate) use session::testing;
