// src/crawl/frontier.rs
// =============================================================================
// Traversal state for one crawl: which URLs were already visited, and which
// (url, depth) pairs are still waiting to be visited.
//
// Both types are created fresh by every call to Crawler::crawl and dropped
// when it returns, so two crawls never share state.
//
// Rust concepts:
// - Interior mutability: VisitedSet::insert takes &self and locks a Mutex,
//   so the set can be shared by reference between concurrent fetches
// - VecDeque: used as a stack (depth-first) or drained level by level
// =============================================================================

use std::collections::{HashSet, VecDeque};
use std::sync::{Mutex, MutexGuard};

/// Set of normalized URLs already processed in this crawl.
#[derive(Debug, Default)]
pub struct VisitedSet {
    urls: Mutex<HashSet<String>>,
}

impl VisitedSet {
    // A poisoned lock only means another fetch panicked mid-insert; the set
    // itself is still a valid HashSet.
    fn lock(&self) -> MutexGuard<'_, HashSet<String>> {
        self.urls.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Atomic check-and-insert. Returns true only for the first caller that
    /// claims `url`.
    pub fn insert(&self, url: &str) -> bool {
        let mut urls = self.lock();
        if urls.contains(url) {
            return false;
        }
        urls.insert(url.to_string())
    }

    pub fn contains(&self, url: &str) -> bool {
        self.lock().contains(url)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }
}

/// One pending visit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlNode {
    pub url: String,
    pub depth: usize,
}

/// Pending visits, keyed by (url, depth).
#[derive(Debug, Default)]
pub struct Frontier {
    nodes: VecDeque<CrawlNode>,
}

impl Frontier {
    pub fn seeded(url: &str) -> Self {
        let mut nodes = VecDeque::new();
        nodes.push_back(CrawlNode {
            url: url.to_string(),
            depth: 0,
        });
        Self { nodes }
    }

    /// Push the children of one page so that `pop` hands them out in
    /// document order, each one's subtree finished before the next sibling.
    pub fn push_children(&mut self, links: Vec<String>, depth: usize) {
        for url in links.into_iter().rev() {
            self.nodes.push_back(CrawlNode { url, depth });
        }
    }

    /// Depth-first pop (LIFO).
    pub fn pop(&mut self) -> Option<CrawlNode> {
        self.nodes.pop_back()
    }

    /// Take every pending node, in the order they were discovered. Used by
    /// the worker pool, which visits one depth level at a time.
    pub fn take_level(&mut self) -> Vec<CrawlNode> {
        self.nodes.drain(..).collect()
    }

    pub fn push_level(&mut self, links: Vec<String>, depth: usize) {
        self.nodes
            .extend(links.into_iter().map(|url| CrawlNode { url, depth }));
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
