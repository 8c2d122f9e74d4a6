// src/report.rs
// =============================================================================
// The final summary of a crawl, and the two ways of printing it.
//
// The text layout is consumed by other tools, so the line formats here are
// fixed ("Number of directories: 3", "Server x at port 70 is up", ...).
// The text report is printed in two parts: the counts right after the files
// are measured, the rest once the smallest text file was fetched and the
// external servers were checked. The JSON layout is the same data
// serialized with serde, printed once at the end.
// =============================================================================

use crate::checker::ServerCheckResult;
use crate::gopher::{Item, ItemKind, Selector};
use anyhow::Result;
use serde::Serialize;
use std::io::{self, Write};

// Smallest and largest size seen for one class of files
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SizeRange {
    pub smallest: Option<u64>,
    pub largest: Option<u64>,
}

impl SizeRange {
    /// Folds in one measured size. Returns true if it is a new strict minimum.
    pub fn observe(&mut self, size: u64) -> bool {
        if self.largest.map_or(true, |largest| size > largest) {
            self.largest = Some(size);
        }
        if self.smallest.map_or(true, |smallest| size < smallest) {
            self.smallest = Some(size);
            return true;
        }
        false
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub directories: usize,
    pub text_files: usize,
    pub binary_files: usize,
    pub invalid_references: usize,
    pub text_sizes: SizeRange,
    pub binary_sizes: SizeRange,
    pub smallest_text_file: Option<Selector>,
    pub smallest_text_content: Option<String>,
    pub external_servers: Vec<ServerCheckResult>,
    pub issues: Vec<Item>,
}

impl Report {
    pub fn write_counts<W: Write>(&self, out: &mut W) -> io::Result<()> {
        writeln!(out)?;
        writeln!(out, "Number of directories: {}", self.directories)?;
        writeln!(out, "Number of text files: {}", self.text_files)?;
        writeln!(out, "Number of binary files: {}", self.binary_files)?;
        writeln!(out, "Number of invalid references: {}", self.invalid_references)?;
        Ok(())
    }

    // Everything after the counts
    pub fn write_details<W: Write>(&self, out: &mut W) -> io::Result<()> {
        // an empty reply has nothing to show
        let content = self
            .smallest_text_content
            .as_deref()
            .filter(|content| !content.is_empty());
        if let Some(content) = content {
            writeln!(out)?;
            writeln!(out, "Content of the smallest text file:")?;
            write!(out, "{}", content)?;
            if !content.ends_with('\n') {
                writeln!(out)?;
            }
        }

        writeln!(out)?;
        writeln!(out, "Size of the smallest text file: {}", size(self.text_sizes.smallest))?;
        writeln!(out, "Size of the largest text file: {}", size(self.text_sizes.largest))?;
        writeln!(out, "Size of the smallest binary file: {}", size(self.binary_sizes.smallest))?;
        writeln!(out, "Size of the largest binary file: {}", size(self.binary_sizes.largest))?;

        writeln!(out)?;
        writeln!(out, "Connectivity to external servers:")?;
        if self.external_servers.is_empty() {
            writeln!(out, "No reference to any external server indexed")?;
        }
        for server in &self.external_servers {
            writeln!(out, "Server {} at port {} is {}", server.host, server.port, server.status)?;
        }

        writeln!(out)?;
        writeln!(out, "References with issues/errors:")?;
        if self.issues.is_empty() {
            writeln!(out, "No reference with issue/error found")?;
        }
        for issue in &self.issues {
            writeln!(out, "({}) {}", issue_label(issue.kind), issue.record)?;
        }

        Ok(())
    }
}

// Missing sizes print as -1, which is what existing tooling expects
fn size(value: Option<u64>) -> String {
    value.map_or_else(|| "-1".to_string(), |v| v.to_string())
}

fn issue_label(kind: ItemKind) -> &'static str {
    match kind {
        ItemKind::Timeout => "Timeout",
        ItemKind::TooLarge => "File too large",
        _ => "Invalid reference",
    }
}

// First half of the text layout. JSON output prints nothing here.
pub fn print_counts(report: &Report, json: bool) -> Result<()> {
    if !json {
        let stdout = io::stdout();
        let mut out = stdout.lock();
        report.write_counts(&mut out)?;
        out.flush()?;
    }
    Ok(())
}

// Prints the rest of the text layout, or the whole report as JSON
pub fn print_results(report: &Report, json: bool) -> Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    if json {
        let json_output = serde_json::to_string_pretty(report)?;
        writeln!(out, "{}", json_output)?;
    } else {
        report.write_details(&mut out)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checker::probe::ServerStatus;

    fn sample() -> Report {
        Report {
            directories: 3,
            text_files: 2,
            binary_files: 0,
            invalid_references: 1,
            text_sizes: SizeRange {
                smallest: Some(12),
                largest: Some(40),
            },
            binary_sizes: SizeRange::default(),
            smallest_text_file: Some(Selector::from("/motd")),
            smallest_text_content: Some("Hello there\r\n".to_string()),
            external_servers: vec![ServerCheckResult {
                host: "other.host".to_string(),
                port: "70".to_string(),
                status: ServerStatus::Down,
            }],
            issues: vec![
                Item::new(ItemKind::ErrorRef, "/gone"),
                Item::new(ItemKind::TooLarge, "/huge.iso"),
            ],
        }
    }

    fn render(report: &Report) -> String {
        let mut out = Vec::new();
        report.write_counts(&mut out).unwrap();
        report.write_details(&mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_observe_tracks_extrema() {
        let mut range = SizeRange::default();
        assert!(range.observe(10));
        assert!(!range.observe(20));
        assert!(!range.observe(10));
        assert!(range.observe(4));
        assert_eq!(range, SizeRange { smallest: Some(4), largest: Some(20) });
    }

    #[test]
    fn test_text_layout() {
        let text = render(&sample());

        assert!(text.contains("Number of directories: 3\n"));
        assert!(text.contains("Number of invalid references: 1\n"));
        assert!(text.contains("Content of the smallest text file:\nHello there\r\n"));
        assert!(text.contains("Size of the smallest text file: 12\n"));
        assert!(text.contains("Size of the largest binary file: -1\n"));
        assert!(text.contains("Server other.host at port 70 is down\n"));
        assert!(text.contains("(Invalid reference) /gone\n"));
        assert!(text.contains("(File too large) /huge.iso\n"));
    }

    #[test]
    fn test_empty_sections() {
        let mut report = sample();
        report.external_servers.clear();
        report.issues.clear();
        report.smallest_text_content = None;

        let text = render(&report);
        assert!(text.contains("No reference to any external server indexed\n"));
        assert!(text.contains("No reference with issue/error found\n"));
        assert!(!text.contains("Content of the smallest text file"));
    }

    #[test]
    fn test_counts_come_first() {
        let mut counts = Vec::new();
        sample().write_counts(&mut counts).unwrap();
        let counts = String::from_utf8(counts).unwrap();

        assert!(counts.ends_with("Number of invalid references: 1\n"));
        assert!(!counts.contains("Content of the smallest text file"));
        assert!(render(&sample()).starts_with(&counts));
    }

    #[test]
    fn test_empty_content_is_not_shown() {
        let mut report = sample();
        report.smallest_text_content = Some(String::new());

        let text = render(&report);
        assert!(!text.contains("Content of the smallest text file"));
        assert!(text.contains("Size of the smallest text file: 12\n"));
    }

    #[test]
    fn test_json_layout() {
        let value = serde_json::to_value(sample()).unwrap();
        assert_eq!(value["directories"], 3);
        assert_eq!(value["binary_sizes"]["smallest"], serde_json::Value::Null);
        assert_eq!(value["external_servers"][0]["status"], "down");
        assert_eq!(value["smallest_text_file"], "/motd");
        assert_eq!(value["issues"][1]["kind"], "too_large");
    }
}
