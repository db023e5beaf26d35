use serde::Deserialize;

pub const DEFAULT_USER_AGENT: &str =
    "Menuhound/0.3 (+https://github.com/fourchette-dev/menuhound)";

/// Knobs for a crawl session. Built once at process start and handed to
/// [`crate::Crawler::new`]; there is no ambient configuration state.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CrawlConfig {
    /// Hard cap on GET requests per site.
    pub max_pages_per_site: usize,
    /// Maximum link depth from the root URL.
    pub max_depth: usize,
    /// Politeness limit; the inter-request gap is `1 / requests_per_second`.
    pub requests_per_second: f64,
    /// Per-request timeout.
    pub timeout_seconds: u64,
    /// Sent on every request, including the robots.txt fetch.
    pub user_agent: String,
    /// Retries for timeouts and 5xx responses. 4xx is never retried.
    pub retry_count: u32,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            max_pages_per_site: 20,
            max_depth: 2,
            requests_per_second: 8.0,
            timeout_seconds: 10,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            retry_count: 2,
        }
    }
}
