// src/crawl/crawler.rs
// =============================================================================
// Same-origin crawl that collects image URLs.
//
// How it works:
// 1. Seed the frontier with (seed_url, depth 0)
// 2. Take a node; skip it if it is too deep or already visited
// 3. Fetch and parse the page (a failure just means "nothing from here")
// 4. Collect same-origin images with a known extension
// 5. If depth < max_depth, collect same-origin links not yet visited and
//    put them on the frontier at depth + 1
// 6. Repeat until the frontier is empty or the crawl is cancelled
//
// With one worker the frontier is used as a stack, which gives a depth-first
// walk: a page's images come before its children's, and children are
// visited in the order their anchors appear. With more workers each depth
// level is fetched concurrently and image order is no longer fixed; the set
// of images found is the same.
//
// Rust concepts:
// - AtomicUsize: counters that concurrent fetches can bump through &self
// - buffer_unordered: run up to N futures at once (same as link checking)
// - CancellationToken: a cloneable flag the Ctrl-C handler can trip
// =============================================================================

use super::extract::{extract_images, extract_links};
use super::fetch::PageFetcher;
use super::frontier::{CrawlNode, Frontier, VisitedSet};
use crate::error::CrawlError;
use futures::stream::{self, StreamExt};
use serde::Serialize;
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use url::Url;

/// Observation sent to the progress sink after each page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CrawlProgress {
    pub depth: usize,
    pub image_count: usize,
    pub link_count: usize,
}

pub type ProgressCallback = Arc<dyn Fn(CrawlProgress) + Send + Sync>;

// Running totals for one crawl.
#[derive(Debug, Default)]
struct CrawlStats {
    images: AtomicUsize,
    links: AtomicUsize,
    pages_visited: AtomicUsize,
    pages_failed: AtomicUsize,
}

impl CrawlStats {
    fn snapshot(&self, depth: usize) -> CrawlProgress {
        CrawlProgress {
            depth,
            image_count: self.images.load(Ordering::Relaxed),
            link_count: self.links.load(Ordering::Relaxed),
        }
    }
}

// Everything one crawl owns. Created in `crawl`, dropped when it returns.
#[derive(Debug, Default)]
struct CrawlState {
    visited: VisitedSet,
    stats: CrawlStats,
}

// What one page contributed.
struct NodeOutcome {
    images: Vec<String>,
    links: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CrawlResult {
    pub seed: String,
    pub max_depth: usize,
    /// Images in discovery order; may contain duplicates.
    pub images: Vec<String>,
    /// Cumulative image matches, for progress display only.
    pub image_count: usize,
    /// Cumulative candidate links, for progress display only.
    pub link_count: usize,
    pub pages_visited: usize,
    pub pages_failed: usize,
    pub cancelled: bool,
}

impl CrawlResult {
    /// Distinct image URLs, sorted. This is what gets downloaded.
    pub fn unique_images(&self) -> Vec<String> {
        self.images
            .iter()
            .cloned()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}

pub struct Crawler {
    fetcher: PageFetcher,
    workers: usize,
    progress_callback: Option<ProgressCallback>,
    cancel: CancellationToken,
}

impl Crawler {
    pub fn new(fetcher: PageFetcher) -> Self {
        Self {
            fetcher,
            workers: 1,
            progress_callback: None,
            cancel: CancellationToken::new(),
        }
    }

    /// Number of concurrent page fetches. 1 (the default) keeps the
    /// depth-first order; 0 is treated as 1.
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    pub fn with_progress_callback(mut self, callback: ProgressCallback) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Crawls from `root_url`, following same-origin links up to
    /// `max_depth` hops. `max_depth == 0` reads only the seed page.
    ///
    /// Only a malformed seed is an error; failures on individual pages are
    /// logged and counted in `pages_failed`.
    pub async fn crawl(&self, root_url: &str, max_depth: usize) -> Result<CrawlResult, CrawlError> {
        let mut seed = Url::parse(root_url).map_err(|source| CrawlError::InvalidSeed {
            url: root_url.to_string(),
            source,
        })?;
        if seed.host_str().is_none() {
            return Err(CrawlError::NoHost(root_url.to_string()));
        }
        seed.set_fragment(None);
        let seed = String::from(seed);

        info!(%seed, max_depth, workers = self.workers, "starting crawl");

        let state = CrawlState::default();
        let images = if self.workers == 1 {
            self.crawl_depth_first(&seed, max_depth, &state).await
        } else {
            self.crawl_by_level(&seed, max_depth, &state).await
        };

        let result = CrawlResult {
            seed,
            max_depth,
            images,
            image_count: state.stats.images.load(Ordering::Relaxed),
            link_count: state.stats.links.load(Ordering::Relaxed),
            pages_visited: state.stats.pages_visited.load(Ordering::Relaxed),
            pages_failed: state.stats.pages_failed.load(Ordering::Relaxed),
            cancelled: self.cancel.is_cancelled(),
        };

        info!(
            pages = result.pages_visited,
            visited = state.visited.len(),
            failed = result.pages_failed,
            images = result.images.len(),
            cancelled = result.cancelled,
            "crawl finished"
        );
        Ok(result)
    }

    async fn crawl_depth_first(&self, seed: &str, max_depth: usize, state: &CrawlState) -> Vec<String> {
        let mut images = Vec::new();
        let mut frontier = Frontier::seeded(seed);

        while let Some(node) = frontier.pop() {
            if self.cancel.is_cancelled() {
                debug!("crawl cancelled, dropping remaining frontier");
                break;
            }
            if let Some(outcome) = self.visit(&node, max_depth, state).await {
                images.extend(outcome.images);
                frontier.push_children(outcome.links, node.depth + 1);
            }
        }

        images
    }

    async fn crawl_by_level(&self, seed: &str, max_depth: usize, state: &CrawlState) -> Vec<String> {
        let mut images = Vec::new();
        let mut frontier = Frontier::seeded(seed);
        let mut depth = 0;

        while !frontier.is_empty() && !self.cancel.is_cancelled() {
            let level = frontier.take_level();
            debug!(depth, pages = level.len(), "fetching level");

            let outcomes: Vec<Option<NodeOutcome>> = stream::iter(level.iter())
                .map(|node| self.visit(node, max_depth, state))
                .buffer_unordered(self.workers)
                .collect()
                .await;

            let mut next = Vec::new();
            for outcome in outcomes.into_iter().flatten() {
                images.extend(outcome.images);
                next.extend(outcome.links);
            }

            depth += 1;
            frontier.push_level(next, depth);
        }

        images
    }

    // Visits one node. None means it contributed nothing: too deep, already
    // visited, cancelled, or the fetch failed.
    async fn visit(&self, node: &CrawlNode, max_depth: usize, state: &CrawlState) -> Option<NodeOutcome> {
        if node.depth > max_depth || self.cancel.is_cancelled() {
            return None;
        }
        if !state.visited.insert(&node.url) {
            return None;
        }

        let page = match self.fetcher.fetch(&node.url).await {
            Ok(page) => page,
            Err(e) => {
                warn!(url = %e.url(), error = %e, "skipping page");
                state.stats.pages_failed.fetch_add(1, Ordering::Relaxed);
                return None;
            }
        };
        state.stats.pages_visited.fetch_add(1, Ordering::Relaxed);

        let images = extract_images(&page.document, &page.url);
        state.stats.images.fetch_add(images.len(), Ordering::Relaxed);

        let links = if node.depth < max_depth {
            let links: Vec<String> = extract_links(&page.document, &page.url)
                .into_iter()
                .filter(|link| !state.visited.contains(link))
                .collect();
            state.stats.links.fetch_add(links.len(), Ordering::Relaxed);
            links
        } else {
            Vec::new()
        };

        debug!(
            url = %node.url,
            depth = node.depth,
            images = images.len(),
            links = links.len(),
            "visited page"
        );

        if let Some(callback) = &self.progress_callback {
            callback(state.stats.snapshot(node.depth));
        }

        Some(NodeOutcome { images, links })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawl::fetch::{build_client, DEFAULT_USER_AGENT};
    use std::sync::Mutex;
    use std::time::Duration;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn crawler() -> Crawler {
        let client = build_client(Duration::from_secs(5), DEFAULT_USER_AGENT).unwrap();
        Crawler::new(PageFetcher::new(client))
    }

    // Serves `body` at `route` and asserts it is requested exactly `times`.
    async fn page(server: &MockServer, route: &str, body: &str, times: u64) {
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "text/html")
                    .set_body_string(body.to_string()),
            )
            .expect(times)
            .mount(server)
            .await;
    }

    fn url(server: &MockServer, route: &str) -> String {
        format!("{}{}", server.uri(), route)
    }

    #[tokio::test]
    async fn test_cycles_are_fetched_once() {
        let server = MockServer::start().await;
        page(&server, "/a", r#"<img src="a.png"><a href="/b">B</a><a href="/a">self</a>"#, 1).await;
        page(&server, "/b", r#"<img src="b.png"><a href="/a">A</a>"#, 1).await;

        let result = crawler().crawl(&url(&server, "/a"), 5).await.unwrap();

        assert_eq!(result.pages_visited, 2);
        assert_eq!(result.images, vec![url(&server, "/a.png"), url(&server, "/b.png")]);
    }

    #[tokio::test]
    async fn test_depth_bound_stops_at_children() {
        let server = MockServer::start().await;
        page(&server, "/", r#"<a href="/a">A</a>"#, 1).await;
        page(&server, "/a", r#"<img src="a.gif"><a href="/b">B</a>"#, 1).await;
        page(&server, "/b", r#"<img src="b.gif"><a href="/c">C</a>"#, 0).await;
        page(&server, "/c", r#"<img src="c.gif">"#, 0).await;

        let result = crawler().crawl(&url(&server, "/"), 1).await.unwrap();

        assert_eq!(result.images, vec![url(&server, "/a.gif")]);
        assert_eq!(result.pages_visited, 2);
    }

    #[tokio::test]
    async fn test_depth_zero_reads_only_the_seed() {
        let server = MockServer::start().await;
        page(&server, "/", r#"<img src="seed.jpg"><a href="/next">Next</a>"#, 1).await;
        page(&server, "/next", r#"<img src="next.jpg">"#, 0).await;

        let result = crawler().crawl(&url(&server, "/"), 0).await.unwrap();

        assert_eq!(result.images, vec![url(&server, "/seed.jpg")]);
        assert_eq!(result.link_count, 0);
    }

    #[tokio::test]
    async fn test_images_in_pre_order() {
        let server = MockServer::start().await;
        page(&server, "/", r#"<img src="r.png"><a href="/a">A</a><a href="/b">B</a>"#, 1).await;
        page(&server, "/a", r#"<img src="a.png"><a href="/c">C</a>"#, 1).await;
        page(&server, "/b", r#"<img src="b.png">"#, 1).await;
        page(&server, "/c", r#"<img src="c.png">"#, 1).await;

        let result = crawler().crawl(&url(&server, "/"), 2).await.unwrap();

        let expected: Vec<String> = ["/r.png", "/a.png", "/c.png", "/b.png"]
            .iter()
            .map(|route| url(&server, route))
            .collect();
        assert_eq!(result.images, expected);
        assert_eq!(result.image_count, 4);
        assert_eq!(result.link_count, 3);
    }

    #[tokio::test]
    async fn test_broken_page_does_not_abort_crawl() {
        let server = MockServer::start().await;
        page(&server, "/", r#"<img src="root.png"><a href="/broken">x</a><a href="/ok">y</a>"#, 1).await;
        page(&server, "/ok", r#"<img src="ok.png">"#, 1).await;
        Mock::given(method("GET"))
            .and(path("/broken"))
            .respond_with(ResponseTemplate::new(404))
            .expect(1)
            .mount(&server)
            .await;

        let result = crawler().crawl(&url(&server, "/"), 3).await.unwrap();

        assert_eq!(result.images, vec![url(&server, "/root.png"), url(&server, "/ok.png")]);
        assert_eq!(result.pages_failed, 1);
        assert_eq!(result.pages_visited, 2);
    }

    #[tokio::test]
    async fn test_other_hosts_are_never_crawled() {
        let server = MockServer::start().await;
        let other = MockServer::start().await;
        // Same machine, but "localhost" is a different host string than "127.0.0.1".
        let other_host = other.uri().replace("127.0.0.1", "localhost");
        let body = format!(
            r#"<img src="{other_host}/remote.png"><a href="{other_host}/page">away</a><img src="local.png">"#
        );
        page(&server, "/", &body, 1).await;
        page(&other, "/page", "<html></html>", 0).await;

        let result = crawler().crawl(&url(&server, "/"), 3).await.unwrap();

        assert_eq!(result.images, vec![url(&server, "/local.png")]);
        assert_eq!(result.link_count, 0);
    }

    #[tokio::test]
    async fn test_shared_image_is_unique_once() {
        let server = MockServer::start().await;
        page(&server, "/", r#"<img src="/logo.png"><a href="/a">A</a>"#, 1).await;
        page(&server, "/a", r#"<img src="/logo.png"><img src="/a.png">"#, 1).await;

        let result = crawler().crawl(&url(&server, "/"), 1).await.unwrap();

        assert_eq!(result.images.len(), 3);
        assert_eq!(
            result.unique_images(),
            vec![url(&server, "/a.png"), url(&server, "/logo.png")]
        );
    }

    #[tokio::test]
    async fn test_worker_pool_finds_same_images() {
        let server = MockServer::start().await;
        page(&server, "/", r#"<img src="r.png"><a href="/a">A</a><a href="/b">B</a>"#, 1).await;
        page(&server, "/a", r#"<img src="a.png"><a href="/b">B</a><a href="/c">C</a>"#, 1).await;
        page(&server, "/b", r#"<img src="b.png"><a href="/">root</a>"#, 1).await;
        page(&server, "/c", r#"<img src="c.png">"#, 1).await;

        let result = crawler().with_workers(4).crawl(&url(&server, "/"), 2).await.unwrap();

        let expected: Vec<String> = ["/a.png", "/b.png", "/c.png", "/r.png"]
            .iter()
            .map(|route| url(&server, route))
            .collect();
        assert_eq!(result.unique_images(), expected);
        assert_eq!(result.pages_visited, 4);
    }

    #[tokio::test]
    async fn test_cancelled_crawl_fetches_nothing() {
        let server = MockServer::start().await;
        page(&server, "/", r#"<img src="r.png">"#, 0).await;

        let token = CancellationToken::new();
        token.cancel();
        let result = crawler()
            .with_cancellation(token)
            .crawl(&url(&server, "/"), 2)
            .await
            .unwrap();

        assert!(result.cancelled);
        assert!(result.images.is_empty());
        assert_eq!(result.pages_visited, 0);
    }

    #[tokio::test]
    async fn test_progress_is_reported_per_page() {
        let server = MockServer::start().await;
        page(&server, "/", r#"<img src="r.png"><a href="/a">A</a>"#, 1).await;
        page(&server, "/a", r#"<img src="a.png">"#, 1).await;

        let seen: Arc<Mutex<Vec<CrawlProgress>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let result = crawler()
            .with_progress_callback(Arc::new(move |progress: CrawlProgress| {
                sink.lock().unwrap().push(progress)
            }))
            .crawl(&url(&server, "/"), 1)
            .await
            .unwrap();

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 2);
        assert_eq!(
            seen.last().copied(),
            Some(CrawlProgress { depth: 1, image_count: 2, link_count: 1 })
        );
        assert_eq!(result.image_count, 2);
    }

    #[tokio::test]
    async fn test_invalid_seed_is_error() {
        let err = crawler().crawl("example.com/no-scheme", 1).await.err().unwrap();
        assert!(matches!(err, CrawlError::InvalidSeed { .. }));
    }

    #[tokio::test]
    async fn test_independent_crawls_do_not_share_visited() {
        let server = MockServer::start().await;
        page(&server, "/", r#"<img src="r.png">"#, 2).await;

        let crawler = crawler();
        let first = crawler.crawl(&url(&server, "/"), 0).await.unwrap();
        let second = crawler.crawl(&url(&server, "/"), 0).await.unwrap();

        assert_eq!(first.images, second.images);
    }
}
