// src/crawl/fetch.rs
// =============================================================================
// Fetches one page and parses it into an HTML document.
//
// Every failure (bad URL, transport error, non-2xx status) comes back as a
// FetchError for that single URL. The crawler logs it and moves on.
//
// Rust concepts:
// - reqwest::Client is cheap to clone (Arc inside), so one client is shared
//   by the page fetcher and the image downloader
// - response.text() decodes the body using the charset from Content-Type,
//   falling back to UTF-8
// =============================================================================

use crate::error::FetchError;
use reqwest::Client;
use scraper::Html;
use std::time::Duration;
use tracing::debug;
use url::Url;

pub const DEFAULT_USER_AGENT: &str = concat!("image-spider/", env!("CARGO_PKG_VERSION"));

// Builds the HTTP client used for the whole run.
//
// The per-request timeout keeps one hanging server from stalling the crawl.
pub fn build_client(timeout: Duration, user_agent: &str) -> reqwest::Result<Client> {
    Client::builder()
        .timeout(timeout)
        .redirect(reqwest::redirect::Policy::limited(5))
        .user_agent(user_agent)
        .build()
}

/// A fetched and parsed page.
pub struct Page {
    /// The URL that was requested. Relative links and the same-origin host
    /// are taken from it, even when the server redirected elsewhere.
    pub url: Url,
    pub document: Html,
}

#[derive(Clone)]
pub struct PageFetcher {
    client: Client,
}

impl PageFetcher {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    pub async fn fetch(&self, url: &str) -> Result<Page, FetchError> {
        let parsed = Url::parse(url).map_err(|source| FetchError::InvalidUrl {
            url: url.to_string(),
            source,
        })?;

        debug!(%url, "fetching page");
        let response = self
            .client
            .get(parsed.clone())
            .send()
            .await
            .map_err(|source| FetchError::Transport {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status,
            });
        }

        let body = response.text().await.map_err(|source| FetchError::Transport {
            url: url.to_string(),
            source,
        })?;

        Ok(Page {
            url: parsed,
            document: Html::parse_document(&body),
        })
    }
}
