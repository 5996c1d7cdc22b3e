// src/error.rs
// =============================================================================
// Error types for every stage of a run.
//
// Each stage has its own enum so callers can decide what is fatal:
// - FetchError:    one page could not be fetched (recovered, crawl continues)
// - DownloadError: one image could not be saved (recovered, batch continues)
// - PathError:     the download directory is unusable (fatal, exit 1)
// - CrawlError:    the seed URL is unusable (fatal, exit 2)
//
// Rust concepts:
// - thiserror: derives std::error::Error + Display from the #[error] strings
// - #[source]: keeps the underlying cause for `{:#}` / anyhow chains
// =============================================================================

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("invalid URL '{url}': {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("HTTP {status} for {url}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },

    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

impl FetchError {
    /// The URL the failed fetch was aimed at.
    pub fn url(&self) -> &str {
        match self {
            FetchError::InvalidUrl { url, .. }
            | FetchError::Status { url, .. }
            | FetchError::Transport { url, .. } => url,
        }
    }
}

#[derive(Error, Debug)]
pub enum DownloadError {
    #[error("HTTP {status} for {url}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },

    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("cannot write {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Error, Debug)]
pub enum PathError {
    #[error("Permission denied: Cannot create directory '{}'.", path.display())]
    Create {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("'{}' exists but is not a directory.", path.display())]
    NotDirectory { path: PathBuf },

    #[error("Permission denied: Cannot write to directory '{}'.", path.display())]
    NotWritable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Error, Debug)]
pub enum CrawlError {
    #[error("invalid seed URL '{url}': {source}")]
    InvalidSeed {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("seed URL '{0}' has no host to crawl")]
    NoHost(String),
}
