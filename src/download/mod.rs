// src/download/mod.rs
// =============================================================================
// This module saves discovered images to disk.
//
// Submodules:
// - http:   concurrent fetch + write, per-image outcome
// - naming: unique file names when two URLs share a basename
// =============================================================================

mod http;
mod naming;

pub use http::{DownloadSummary, Downloader, DEFAULT_CONCURRENCY};
