// src/gopher/item.rs
// =============================================================================
// The things we discover while crawling, and the store that keeps them.
//
// An Item is a (kind, record) pair. Records are raw bytes (see Selector).
// What `record` means depends on the kind:
// - Directory / Text / Binary / Timeout / TooLarge: a selector path
// - ErrorRef: the selector of the request that produced the error
// - External: "host\tport" of another server
//
// The IndexStore keeps items in discovery order and never stores the same
// (kind, record) pair twice. That is what lets the report count *distinct*
// failing selectors instead of every retry.
// =============================================================================

use serde::{Serialize, Serializer};
use std::collections::HashSet;
use std::fmt;

/// The exact bytes a server handed us as a selector.
///
/// Gopher does not promise UTF-8, so selectors are kept as bytes and sent
/// back unchanged. Only printing converts them (lossily) to text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Selector(Vec<u8>);

impl Selector {
    // The empty selector requests the root directory
    pub fn root() -> Self {
        Self::default()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl From<&[u8]> for Selector {
    fn from(bytes: &[u8]) -> Self {
        Self(bytes.to_vec())
    }
}

impl From<Vec<u8>> for Selector {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl From<&str> for Selector {
    fn from(text: &str) -> Self {
        Self(text.as_bytes().to_vec())
    }
}

impl PartialEq<&str> for Selector {
    fn eq(&self, other: &&str) -> bool {
        self.0 == other.as_bytes()
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", String::from_utf8_lossy(&self.0))
    }
}

impl Serialize for Selector {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&String::from_utf8_lossy(&self.0))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    Directory,
    Text,
    Binary,
    ErrorRef,
    External,
    Timeout,
    TooLarge,
}

impl ItemKind {
    // Label used in the "Indexed <label>: <record>" progress lines
    pub fn label(self) -> &'static str {
        match self {
            ItemKind::Directory => "directory",
            ItemKind::Text => "text file",
            ItemKind::Binary => "binary file",
            ItemKind::ErrorRef => "invalid request",
            ItemKind::External => "external server",
            ItemKind::Timeout => "timeout",
            ItemKind::TooLarge => "too large",
        }
    }

    /// Kinds that show up under "References with issues/errors"
    pub fn is_issue(self) -> bool {
        matches!(
            self,
            ItemKind::ErrorRef | ItemKind::Timeout | ItemKind::TooLarge
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Item {
    pub kind: ItemKind,
    pub record: Selector,
}

impl Item {
    pub fn new(kind: ItemKind, record: impl Into<Selector>) -> Self {
        Self {
            kind,
            record: record.into(),
        }
    }
}

// Ordered, deduplicated collection of everything the crawl has found
#[derive(Debug, Default)]
pub struct IndexStore {
    items: Vec<Item>,
    seen: HashSet<(ItemKind, Selector)>,
    echo: bool,
}

impl IndexStore {
    // `echo` controls whether newly recorded items are announced on the terminal
    pub fn new(echo: bool) -> Self {
        Self {
            echo,
            ..Self::default()
        }
    }

    /// Appends `item` unless an equal (kind, record) pair is already stored.
    ///
    /// Returns true when the item was new.
    pub fn insert(&mut self, item: Item) -> bool {
        if !self.seen.insert((item.kind, item.record.clone())) {
            return false;
        }
        self.items.push(item);
        true
    }

    /// Like `insert`, but also prints the progress line for a new item
    pub fn record(&mut self, item: Item) -> bool {
        let is_new = self.insert(item);
        if is_new && self.echo {
            if let Some(item) = self.items.last() {
                announce(item);
            }
        }
        is_new
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Item> {
        self.items.iter()
    }

    // All items of one kind, in discovery order
    pub fn of_kind(&self, kind: ItemKind) -> impl Iterator<Item = &Item> {
        self.items.iter().filter(move |item| item.kind == kind)
    }

    pub fn count(&self, kind: ItemKind) -> usize {
        self.of_kind(kind).count()
    }
}

// Timeouts and oversized files are problems, so they go to stderr
fn announce(item: &Item) {
    match item.kind {
        ItemKind::Timeout => eprintln!("Transmission timeout: {}", item.record),
        ItemKind::TooLarge => eprintln!("File too large: {}", item.record),
        kind => println!("Indexed {}: {}", kind.label(), item.record),
    }
}
