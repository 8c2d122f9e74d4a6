// src/crawl/mod.rs
// =============================================================================
// This module handles crawling a Gopher server.
//
// Features:
// - Breadth-first traversal starting from the root directory
// - Never leaves the server (external references are only recorded)
// - Each directory is requested at most once
// =============================================================================

mod queue;

// Re-export the main crawling function
pub use queue::crawl_server;
