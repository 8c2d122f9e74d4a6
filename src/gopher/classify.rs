// src/gopher/classify.rs
// =============================================================================
// Turns one line of a Gopher directory index into an Item (or nothing).
//
// A directory line looks like:
//
//   <type><display>\t<selector>\t<host>\t<port>
//
// The first character is the item type from RFC 1436. We care about:
// - '0'  text file
// - '1'  directory (or a link to another server, see below)
// - '3'  error
// - a set of binary-ish types (9, g, I, P, ...)
// Everything else (info lines, the "." terminator, telnet, search, unknown
// types) is ignored.
//
// A '1' line with an *empty* selector points at the root of some server,
// which we treat as an external reference and record as "host\tport".
// =============================================================================

use super::item::{Item, ItemKind, Selector};

// Types we count as binary files. RFC 1436 only defines '9', but servers use
// more specific ones for images, documents, sounds and so on.
const BINARY_TYPES: &[u8] = b"4569gI:;<dhprsPX";

pub fn is_binary_type(type_byte: u8) -> bool {
    BINARY_TYPES.contains(&type_byte)
}

// Classifies a single index line (CRLF already stripped).
//
// Lines are bytes, not text: selectors are stored exactly as the server
// wrote them so they can be sent back unchanged.
//
// Parameters:
//   line: the raw directory line
//   request: the selector whose response this line came from
//
// Returns: the Item to index, or None for ignored and malformed lines
pub fn classify_line(line: &[u8], request: &Selector) -> Option<Item> {
    let type_byte = *line.first()?;

    let kind = match type_byte {
        // Errors are attributed to the request that caused them
        b'3' => return Some(Item::new(ItemKind::ErrorRef, request.clone())),
        b'0' => ItemKind::Text,
        b'1' => ItemKind::Directory,
        b if is_binary_type(b) => ItemKind::Binary,
        _ => return None,
    };

    let pathname = extract_pathname(line)?;

    if pathname.starts_with(b"/") {
        return Some(Item::new(kind, pathname));
    }

    if kind == ItemKind::Directory && pathname.is_empty() {
        return external_record(line).map(|record| Item::new(ItemKind::External, record));
    }

    None
}

// Returns the bytes strictly between the first and second tab, or from the
// first tab to the end of the line when there is no second tab.
// None when the line has no tab at all.
pub fn extract_pathname(line: &[u8]) -> Option<&[u8]> {
    let start = line.iter().position(|&b| b == b'\t')? + 1;
    let rest = &line[start..];
    let end = rest
        .iter()
        .position(|&b| matches!(b, b'\t' | b'\r' | b'\n'))
        .unwrap_or(rest.len());
    Some(&rest[..end])
}

// Host and port fields of a line, joined back with a tab. Any gopher+
// fields after the port are dropped.
fn external_record(line: &[u8]) -> Option<Vec<u8>> {
    let mut fields = line.split(|&b| b == b'\t').skip(2);
    let host = fields.next().filter(|h| !h.is_empty())?;
    let port = trim_spaces(fields.next().unwrap_or_default());

    let mut record = Vec::with_capacity(host.len() + port.len() + 1);
    record.extend_from_slice(host);
    record.push(b'\t');
    record.extend_from_slice(port);
    Some(record)
}

fn trim_spaces(mut bytes: &[u8]) -> &[u8] {
    while let [first, rest @ ..] = bytes {
        if !first.is_ascii_whitespace() {
            break;
        }
        bytes = rest;
    }
    while let [rest @ .., last] = bytes {
        if !last.is_ascii_whitespace() {
            break;
        }
        bytes = rest;
    }
    bytes
}
