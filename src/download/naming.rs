// src/download/naming.rs
// =============================================================================
// Decides where each image is written.
//
// Images are saved as <dir>/<last path segment of the URL>. Two different
// URLs can share that name (/a/logo.png and /b/logo.png). The first one in
// sorted order keeps the plain name; every later one gets a short md5 of its
// full URL inserted before the extension:
//
//   https://example.com/a/logo.png -> logo.png
//   https://example.com/b/logo.png -> logo-1f3870be.png
//
// The plan depends only on the set of URLs, so reruns produce the same names.
// =============================================================================

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use url::Url;

const FALLBACK_NAME: &str = "image";

/// Last non-empty path segment of `url`, still percent-encoded.
pub fn basename(url: &str) -> String {
    Url::parse(url)
        .ok()
        .and_then(|parsed| {
            parsed
                .path_segments()
                .and_then(|mut segments| segments.next_back())
                .filter(|segment| !segment.is_empty())
                .map(String::from)
        })
        .unwrap_or_else(|| FALLBACK_NAME.to_string())
}

// "logo.png" + digest -> "logo-<digest>.png"; names without a dot get the
// digest appended.
fn qualify(name: &str, url: &str) -> String {
    let digest = format!("{:x}", md5::compute(url.as_bytes()));
    let short = &digest[..8];
    match name.rfind('.') {
        Some(dot) if dot > 0 => format!("{}-{}{}", &name[..dot], short, &name[dot..]),
        _ => format!("{}-{}", name, short),
    }
}

/// Pairs every URL with a destination file in `dir`, no two URLs sharing a
/// file. `urls` is expected to be de-duplicated and sorted.
pub fn plan_destinations(urls: &[String], dir: &Path) -> Vec<(String, PathBuf)> {
    let mut taken = HashSet::new();

    urls.iter()
        .map(|url| {
            let plain = basename(url);
            let name = if taken.contains(&plain) {
                qualify(&plain, url)
            } else {
                plain
            };
            taken.insert(name.clone());
            (url.clone(), dir.join(name))
        })
        .collect()
}
