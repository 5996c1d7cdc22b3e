// src/crawl/extract.rs
// =============================================================================
// Pulls image sources and follow-able links out of a parsed page.
//
// Both extractors apply the same-origin rule: after resolving against the
// page URL, the candidate must have exactly the page's host. Relative URLs
// therefore always pass. Images additionally need a recognized extension.
//
// The extension check is a case-sensitive suffix match on the raw `src`
// attribute, before resolution and without stripping a query string:
//   "cat.png"      -> kept
//   "cat.PNG"      -> dropped
//   "cat.png?v=2"  -> dropped
//
// Rust concepts:
// - LazyLock: compile each CSS selector once, on first use
// - Option chaining with ? inside a function returning Option
// =============================================================================

use scraper::{Html, Selector};
use std::sync::LazyLock;
use url::Url;

/// Extensions an image source must end with to be collected.
pub const IMAGE_EXTENSIONS: [&str; 5] = [".jpg", ".jpeg", ".png", ".gif", ".bmp"];

// Constant selectors; parsing them cannot fail.
static IMAGE_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("img[src]").expect("valid img selector"));
static LINK_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a[href]").expect("valid anchor selector"));

/// Same-origin image URLs on the page, in document order.
pub fn extract_images(document: &Html, page_url: &Url) -> Vec<String> {
    document
        .select(&IMAGE_SELECTOR)
        .filter_map(|element| element.value().attr("src"))
        .filter(|src| has_image_extension(src))
        .filter_map(|src| resolve_same_origin(page_url, src))
        .map(String::from)
        .collect()
}

/// Same-origin link URLs on the page, in document order, with fragments
/// removed so `/a` and `/a#top` count as one page.
///
/// Duplicates are kept; the visited set takes care of them.
pub fn extract_links(document: &Html, page_url: &Url) -> Vec<String> {
    document
        .select(&LINK_SELECTOR)
        .filter_map(|element| element.value().attr("href"))
        .filter_map(|href| resolve_same_origin(page_url, href))
        .map(|mut url| {
            url.set_fragment(None);
            String::from(url)
        })
        .collect()
}

pub fn has_image_extension(src: &str) -> bool {
    IMAGE_EXTENSIONS.iter().any(|ext| src.ends_with(ext))
}

// Resolves `raw` against the page and keeps it only if it is an HTTP(S) URL
// on the page's host.
fn resolve_same_origin(page_url: &Url, raw: &str) -> Option<Url> {
    let resolved = page_url.join(raw.trim()).ok()?;

    if !matches!(resolved.scheme(), "http" | "https") {
        return None;
    }

    (resolved.host_str() == page_url.host_str()).then_some(resolved)
}

// -----------------------------------------------------------------------------
// NOTES:
//
// 1. Why resolve before comparing hosts?
//    - "//cdn.example.org/a.png" has no scheme but does have a host
//    - Joining it onto the page URL exposes that host, so it is rejected
//    - A plain relative path picks up the page's own host and is accepted
//
// 2. Why is the host taken from the page and not the seed?
//    - The rule is "same host as the page being read"
//    - After a same-host link the two are identical anyway
// -----------------------------------------------------------------------------
