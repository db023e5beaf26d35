use serde::{Deserialize, Serialize};
use url::Url;

/// Why a crawl session stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// Frontier drained before the page cap was reached.
    Done,
    /// Page cap reached; the frontier may still hold unvisited links.
    BudgetExhausted,
    /// The restaurant had no usable website; nothing was fetched.
    NoWebsite,
    /// The session died on an unexpected error and returned empty.
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkKind {
    Page,
    Pdf,
}

/// A menu-related URL discovered during a crawl. `url` is the normalized
/// absolute form used for dedup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuLink {
    pub url: String,
    pub kind: LinkKind,
}

/// The site one session crawls. Built once per restaurant, never mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlTarget {
    pub root_url: String,
    /// Lowercase host, plus the port when it is not the scheme default.
    pub domain: String,
}

impl CrawlTarget {
    pub fn from_root(root: &Url) -> Self {
        Self {
            root_url: root.as_str().to_string(),
            domain: crate::urls::authority(root),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlResult {
    /// Absent only for `NoWebsite` results.
    pub target: Option<CrawlTarget>,
    /// Discovery order: breadth-first, page links before PDF confirmations
    /// within a page. No two entries share a normalized URL.
    pub menu_links: Vec<MenuLink>,
    pub pages_visited: usize,
    pub stopped_reason: StopReason,
}

impl CrawlResult {
    pub fn new(target: CrawlTarget) -> Self {
        Self {
            target: Some(target),
            menu_links: Vec::new(),
            pages_visited: 0,
            stopped_reason: StopReason::Done,
        }
    }

    /// Sentinel for restaurants with no website: empty, no network touched.
    pub fn skipped() -> Self {
        Self {
            target: None,
            menu_links: Vec::new(),
            pages_visited: 0,
            stopped_reason: StopReason::NoWebsite,
        }
    }

    /// Empty result for a session that aborted on an unexpected error.
    pub fn failed(target: CrawlTarget) -> Self {
        Self {
            target: Some(target),
            menu_links: Vec::new(),
            pages_visited: 0,
            stopped_reason: StopReason::Error,
        }
    }

    /// Menu links as plain absolute URL strings, in discovery order.
    pub fn menu_urls(&self) -> Vec<String> {
        self.menu_links.iter().map(|l| l.url.clone()).collect()
    }
}
