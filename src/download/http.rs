// src/download/http.rs
// =============================================================================
// Downloads the discovered images into the target directory.
//
// Key functionality:
// - Plans a unique file name for every image (see naming.rs)
// - Fetches up to `concurrency` images at once
// - A failed image is reported and skipped; the rest of the batch continues
// - After cancellation, images not yet started are skipped
//
// Rust concepts:
// - Streams: buffer_unordered runs a bounded number of downloads at once
// - tokio::fs: async file writes so the runtime is never blocked on disk
// =============================================================================

use super::naming::plan_destinations;
use crate::error::DownloadError;
use futures::stream::{self, StreamExt};
use indicatif::ProgressBar;
use reqwest::Client;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

pub const DEFAULT_CONCURRENCY: usize = 8;

// Outcome of one image.
//
// #[serde(tag = "status")] turns each variant into {"status": "saved", ...}
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DownloadStatus {
    /// Written to disk
    Saved { path: PathBuf, bytes: u64 },
    /// Request or write failed
    Failed { error: String },
    /// Not attempted because the run was cancelled
    Skipped,
}

#[derive(Debug, Clone, Serialize)]
pub struct DownloadResult {
    pub url: String,
    #[serde(flatten)]
    pub status: DownloadStatus,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct DownloadSummary {
    pub saved: usize,
    pub failed: usize,
    pub skipped: usize,
    pub results: Vec<DownloadResult>,
}

impl DownloadSummary {
    fn from_results(results: Vec<DownloadResult>) -> Self {
        let mut summary = DownloadSummary::default();
        for result in &results {
            match result.status {
                DownloadStatus::Saved { .. } => summary.saved += 1,
                DownloadStatus::Failed { .. } => summary.failed += 1,
                DownloadStatus::Skipped => summary.skipped += 1,
            }
        }
        summary.results = results;
        summary
    }
}

pub struct Downloader {
    client: Client,
    concurrency: usize,
    progress: ProgressBar,
    cancel: CancellationToken,
}

impl Downloader {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            concurrency: DEFAULT_CONCURRENCY,
            progress: ProgressBar::hidden(),
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Bar that ticks once per finished image. Its length is set here.
    pub fn with_progress_bar(mut self, progress: ProgressBar) -> Self {
        self.progress = progress;
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Downloads `images` (duplicates are ignored) into `dir`.
    pub async fn download_images(&self, images: &[String], dir: &Path) -> DownloadSummary {
        let mut unique: Vec<String> = images.to_vec();
        unique.sort();
        unique.dedup();

        let plan = plan_destinations(&unique, dir);
        info!(images = plan.len(), dir = %dir.display(), "downloading images");
        self.progress.set_length(plan.len() as u64);

        let results: Vec<DownloadResult> = stream::iter(plan)
            .map(|(url, path)| async move {
                let status = self.download_to(&url, path).await;
                self.progress.inc(1);
                DownloadResult { url, status }
            })
            .buffer_unordered(self.concurrency)
            .collect()
            .await;

        self.progress.finish();
        DownloadSummary::from_results(results)
    }

    async fn download_to(&self, url: &str, path: PathBuf) -> DownloadStatus {
        if self.cancel.is_cancelled() {
            return DownloadStatus::Skipped;
        }

        match download_one(&self.client, url, &path).await {
            Ok(bytes) => {
                debug!(%url, path = %path.display(), bytes, "saved image");
                DownloadStatus::Saved { path, bytes }
            }
            Err(e) => {
                warn!(%url, error = %e, "download failed");
                self.progress
                    .println(format!("Failed to download {}: {}", url, e));
                DownloadStatus::Failed {
                    error: e.to_string(),
                }
            }
        }
    }
}

// Fetches one image and writes it to `path`, returning the byte count.
async fn download_one(client: &Client, url: &str, path: &Path) -> Result<u64, DownloadError> {
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|source| DownloadError::Transport {
            url: url.to_string(),
            source,
        })?;

    let status = response.status();
    if !status.is_success() {
        return Err(DownloadError::Status {
            url: url.to_string(),
            status,
        });
    }

    let body = response.bytes().await.map_err(|source| DownloadError::Transport {
        url: url.to_string(),
        source,
    })?;

    tokio::fs::write(path, &body)
        .await
        .map_err(|source| DownloadError::Io {
            path: path.to_path_buf(),
            source,
        })?;

    Ok(body.len() as u64)
}

// -----------------------------------------------------------------------------
// NOTES:
//
// 1. Why `async move` inside .map()?
//    - Each download needs its own url/path (moved in)
//    - `self` is a reference, so moving it just copies the reference
//
// 2. Why does the summary not fail when one image fails?
//    - Dead images are common on real sites
//    - The run still saves everything else, and the failure is listed
// -----------------------------------------------------------------------------
