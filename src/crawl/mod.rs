// src/crawl/mod.rs
// =============================================================================
// This module handles website crawling.
//
// Submodules:
// - fetch:    GET one page, parse it into an HTML document
// - extract:  pull same-origin images and links out of a document
// - frontier: visited set + pending (url, depth) queue for one crawl
// - crawler:  ties the above together, sequential or with a worker pool
//
// Features:
// - Stays on the host of the page being read (same-origin)
// - Configurable depth limit (0 = only the seed page)
// - A broken page never aborts the crawl
// - Ctrl-C stops new fetches; whatever was found so far is kept
// =============================================================================

mod crawler;
mod extract;
mod fetch;
mod frontier;

pub use crawler::{CrawlProgress, CrawlResult, Crawler};
pub use fetch::{build_client, PageFetcher, DEFAULT_USER_AGENT};
