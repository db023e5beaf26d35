//! The crawl session loop: breadth-first, same-domain, politeness-limited.

use crate::classify::{self, Candidate};
use crate::config::CrawlConfig;
use crate::error::{CrawlError, FetchError, Result};
use crate::frontier::Frontier;
use crate::limiter::RateLimiter;
use crate::result::{CrawlResult, CrawlTarget, LinkKind, MenuLink, StopReason};
use crate::robots::RobotsCache;
use crate::urls;
use reqwest::Client;
use scraper::{Html, Selector};
use std::collections::HashSet;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

const RETRY_BASE_DELAY: Duration = Duration::from_millis(500);

/// One restaurant-website crawler. The HTTP client is built once and reused
/// across sessions for connection pooling; all per-session state (frontier,
/// visited set, robots cache, rate limiter) lives inside [`Crawler::crawl`],
/// so sessions never bleed into each other.
pub struct Crawler {
    client: Client,
    config: CrawlConfig,
}

/// A fetched page body, ready for link extraction.
struct FetchedPage {
    final_url: Url,
    content_type: Option<String>,
    body: String,
}

/// An anchor pulled out of a page, in document order.
struct Anchor {
    url: Url,
    normalized: String,
    text: String,
}

impl Crawler {
    pub fn new(config: CrawlConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(Duration::from_secs(config.timeout_seconds))
            .connect_timeout(Duration::from_secs((config.timeout_seconds / 2).max(1)))
            .pool_idle_timeout(Duration::from_secs(90))
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &CrawlConfig {
        &self.config
    }

    /// Crawl a restaurant's website for menu links. Never fails: an absent
    /// or unparseable website short-circuits to a `NoWebsite` result with
    /// zero network calls, and a session-level error comes back as an empty
    /// result with `StopReason::Error`. Per-page failures are absorbed
    /// inside the session.
    pub async fn crawl(&self, website: Option<&str>) -> CrawlResult {
        let Some(raw) = website.map(str::trim).filter(|s| !s.is_empty()) else {
            return CrawlResult::skipped();
        };

        let root = match parse_root(raw) {
            Ok(url) => url,
            Err(e) => {
                debug!("Unusable website {:?}: {}", raw, e);
                return CrawlResult::skipped();
            }
        };
        let target = CrawlTarget::from_root(&root);

        match self.run_session(&root, &target).await {
            Ok(result) => result,
            Err(e) => {
                warn!("Crawl of {} aborted: {}", target.root_url, e);
                CrawlResult::failed(target)
            }
        }
    }

    async fn run_session(&self, root: &Url, target: &CrawlTarget) -> Result<CrawlResult> {
        info!("Starting crawl of {}", target.root_url);

        let link_selector =
            Selector::parse("a[href]").map_err(|e| CrawlError::ParseError(e.to_string()))?;

        let mut limiter = RateLimiter::new(self.config.requests_per_second);
        let mut robots = RobotsCache::new();
        let mut frontier = Frontier::new();
        let mut menu_seen: HashSet<String> = HashSet::new();
        let mut result = CrawlResult::new(target.clone());

        frontier.push(root.clone(), 0);

        let stopped_reason = loop {
            if result.pages_visited >= self.config.max_pages_per_site {
                break StopReason::BudgetExhausted;
            }
            let Some(entry) = frontier.pop() else {
                break StopReason::Done;
            };

            let policy = robots
                .policy_for(&self.client, &mut limiter, root.scheme(), &target.domain)
                .await;
            if !policy.is_allowed(entry.url.path()) {
                debug!("Blocked by robots.txt: {}", entry.url);
                continue;
            }

            result.pages_visited += 1;
            let page = match self.fetch_page(&mut limiter, &entry.url).await {
                Ok(page) => page,
                Err(e) => {
                    debug!("Skipping {}: {}", entry.url, e);
                    continue;
                }
            };

            // The fetched page may itself be a menu page reached by name.
            let page_key = urls::normalize(&entry.url);
            if !classify::is_pdf_url(&entry.url)
                && classify::keyword_match(&page_key, "")
                && menu_seen.insert(page_key.clone())
            {
                result.menu_links.push(MenuLink { url: page_key, kind: LinkKind::Page });
            }

            let is_html = page
                .content_type
                .as_deref()
                .map(|ct| ct.contains("text/html"))
                .unwrap_or(false);
            if !is_html {
                continue;
            }

            let mut pdf_candidates: Vec<Url> = Vec::new();
            for anchor in extract_anchors(&page, &link_selector) {
                match classify::classify(&anchor.url, &anchor.normalized, &anchor.text) {
                    Candidate::Pdf => pdf_candidates.push(anchor.url.clone()),
                    Candidate::Page => {
                        // Cross-domain keyword hits are recorded too; they
                        // just never enter the frontier.
                        if menu_seen.insert(anchor.normalized.clone()) {
                            result.menu_links.push(MenuLink {
                                url: anchor.normalized.clone(),
                                kind: LinkKind::Page,
                            });
                        }
                    }
                    Candidate::None => {}
                }

                if entry.depth + 1 <= self.config.max_depth
                    && urls::same_domain(&anchor.url, &target.domain)
                    && !classify::is_pdf_url(&anchor.url)
                {
                    frontier.push(anchor.url, entry.depth + 1);
                }
            }

            // PDF confirmations come after the page links of this page.
            for pdf_url in pdf_candidates {
                let normalized = urls::normalize(&pdf_url);
                if menu_seen.contains(&normalized) {
                    continue;
                }
                if self.verify_pdf(&mut limiter, &pdf_url).await {
                    menu_seen.insert(normalized.clone());
                    result.menu_links.push(MenuLink { url: normalized, kind: LinkKind::Pdf });
                }
            }
        };

        result.stopped_reason = stopped_reason;
        info!(
            "Crawl of {} finished: {} menu links, {} pages visited ({:?})",
            target.root_url,
            result.menu_links.len(),
            result.pages_visited,
            result.stopped_reason
        );
        Ok(result)
    }

    /// GET one page, retrying timeouts, transport errors and 5xx responses
    /// with exponential backoff up to `retry_count`. 4xx is returned
    /// immediately without retrying.
    async fn fetch_page(
        &self,
        limiter: &mut RateLimiter,
        url: &Url,
    ) -> std::result::Result<FetchedPage, FetchError> {
        let mut attempt: u32 = 0;
        loop {
            limiter.wait().await;
            debug!("Fetching {}", url);

            let err: FetchError = match self.client.get(url.clone()).send().await {
                Ok(resp) => {
                    let status = resp.status();
                    if status.is_server_error() {
                        FetchError::ServerError { status: status.as_u16(), retries: attempt }
                    } else if status.is_client_error() {
                        return Err(FetchError::ClientError { status: status.as_u16() });
                    } else {
                        let final_url = resp.url().clone();
                        let content_type = resp
                            .headers()
                            .get(reqwest::header::CONTENT_TYPE)
                            .and_then(|v| v.to_str().ok())
                            .map(|s| s.to_ascii_lowercase());
                        let body = resp
                            .text()
                            .await
                            .map_err(|e| FetchError::Body(e.to_string()))?;
                        return Ok(FetchedPage { final_url, content_type, body });
                    }
                }
                Err(e) if e.is_timeout() => FetchError::TimedOut { retries: attempt },
                Err(e) => FetchError::Transport(e.to_string()),
            };

            if attempt >= self.config.retry_count {
                return Err(err);
            }
            let backoff = RETRY_BASE_DELAY * 2u32.pow(attempt);
            debug!("Retrying {} after {:?}: {}", url, backoff, err);
            tokio::time::sleep(backoff).await;
            attempt += 1;
        }
    }

    /// HEAD a `.pdf` candidate and keep it only when the content type says
    /// it really is one. Any failure discards the candidate.
    async fn verify_pdf(&self, limiter: &mut RateLimiter, url: &Url) -> bool {
        limiter.wait().await;
        match self.client.head(url.clone()).send().await {
            Ok(resp) => resp
                .headers()
                .get(reqwest::header::CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .map(|ct| ct.to_ascii_lowercase().contains("application/pdf"))
                .unwrap_or(false),
            Err(e) => {
                debug!("PDF verification failed for {}: {}", url, e);
                false
            }
        }
    }
}

/// Parse a website field into a crawl root, defaulting to https when the
/// scheme is missing.
fn parse_root(raw: &str) -> Result<Url> {
    let url = match Url::parse(raw) {
        Ok(url) => url,
        Err(_) => Url::parse(&format!("https://{raw}"))
            .map_err(|e| CrawlError::InvalidUrl(format!("{raw}: {e}")))?,
    };

    match url.scheme() {
        "http" | "https" => {}
        other => return Err(CrawlError::InvalidUrl(format!("unsupported scheme {other:?}"))),
    }
    if url.host_str().is_none() {
        return Err(CrawlError::InvalidUrl(format!("{raw}: missing host")));
    }
    Ok(url)
}

fn extract_anchors(page: &FetchedPage, link_selector: &Selector) -> Vec<Anchor> {
    let document = Html::parse_document(&page.body);
    document
        .select(link_selector)
        .filter_map(|element| {
            let href = element.value().attr("href")?;
            let url = urls::resolve_href(&page.final_url, href)?;
            let normalized = urls::normalize(&url);
            let text = element.text().collect::<String>();
            Some(Anchor { url, normalized, text })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_config() -> CrawlConfig {
        CrawlConfig {
            // Keep tests fast; politeness is covered by the limiter tests.
            requests_per_second: 0.0,
            retry_count: 1,
            ..CrawlConfig::default()
        }
    }

    fn crawler_with(config: CrawlConfig) -> Crawler {
        Crawler::new(config).unwrap()
    }

    fn html_page(body: &str) -> ResponseTemplate {
        // `set_body_raw` sets the MIME directly; `set_body_string` would force
        // text/plain and override any content-type header, so the crawler would
        // never parse the body as HTML.
        ResponseTemplate::new(200).set_body_raw(
            format!("<html><body>{body}</body></html>").into_bytes(),
            "text/html; charset=utf-8",
        )
    }

    async fn mount_page(server: &MockServer, route: &str, body: &str) {
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(html_page(body))
            .mount(server)
            .await;
    }

    #[test]
    fn test_parse_root_adds_https() {
        let url = parse_root("bistro.example.com").unwrap();
        assert_eq!(url.as_str(), "https://bistro.example.com/");
    }

    #[test]
    fn test_parse_root_rejects_garbage() {
        assert!(parse_root("not a url at all").is_err());
        assert!(parse_root("ftp://example.com/menu").is_err());
    }

    #[tokio::test]
    async fn test_no_website_is_skipped_without_network() {
        let crawler = crawler_with(test_config());

        let result = crawler.crawl(None).await;
        assert_eq!(result.stopped_reason, StopReason::NoWebsite);
        assert!(result.menu_links.is_empty());
        assert_eq!(result.pages_visited, 0);
        assert!(result.target.is_none());

        let result = crawler.crawl(Some("   ")).await;
        assert_eq!(result.stopped_reason, StopReason::NoWebsite);

        let result = crawler.crawl(Some("not a url at all")).await;
        assert_eq!(result.stopped_reason, StopReason::NoWebsite);
    }

    #[tokio::test]
    async fn test_discovers_menu_links_by_text_and_url() {
        let server = MockServer::start().await;
        mount_page(
            &server,
            "/",
            r#"<a href="/carte">Notre Carte</a>
               <a href="/about">About us</a>
               <a href="/p42">Menu</a>"#,
        )
        .await;
        mount_page(&server, "/carte", "Entrées et plats").await;
        mount_page(&server, "/about", "A family place").await;
        mount_page(&server, "/p42", "The menu itself").await;

        let crawler = crawler_with(test_config());
        let result = crawler.crawl(Some(&server.uri())).await;

        assert_eq!(result.stopped_reason, StopReason::Done);
        let urls: Vec<&str> = result.menu_links.iter().map(|l| l.url.as_str()).collect();
        assert!(urls.iter().any(|u| u.ends_with("/carte")));
        assert!(urls.iter().any(|u| u.ends_with("/p42")));
        assert!(!urls.iter().any(|u| u.ends_with("/about")));
        assert!(result.menu_links.iter().all(|l| l.kind == LinkKind::Page));
        assert_eq!(result.pages_visited, 4);
    }

    #[tokio::test]
    async fn test_pdf_kept_only_when_head_confirms() {
        let server = MockServer::start().await;
        mount_page(
            &server,
            "/",
            r#"<a href="/files/menu.pdf">Download menu</a>
               <a href="/files/fake.pdf">Also a menu</a>"#,
        )
        .await;
        Mock::given(method("HEAD"))
            .and(path("/files/menu.pdf"))
            .respond_with(
                ResponseTemplate::new(200).insert_header("content-type", "application/pdf"),
            )
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("HEAD"))
            .and(path("/files/fake.pdf"))
            .respond_with(ResponseTemplate::new(200).insert_header("content-type", "text/html"))
            .expect(1)
            .mount(&server)
            .await;

        let crawler = crawler_with(test_config());
        let result = crawler.crawl(Some(&server.uri())).await;

        let pdfs: Vec<&MenuLink> =
            result.menu_links.iter().filter(|l| l.kind == LinkKind::Pdf).collect();
        assert_eq!(pdfs.len(), 1);
        assert!(pdfs[0].url.ends_with("/files/menu.pdf"));
        assert!(!result.menu_links.iter().any(|l| l.url.ends_with("/files/fake.pdf")));
    }

    #[tokio::test]
    async fn test_page_links_recorded_before_pdf_confirmations() {
        let server = MockServer::start().await;
        mount_page(
            &server,
            "/",
            r#"<a href="/wine.pdf">Wine list menu</a>
               <a href="/menu">Menu</a>"#,
        )
        .await;
        Mock::given(method("HEAD"))
            .and(path("/wine.pdf"))
            .respond_with(
                ResponseTemplate::new(200).insert_header("content-type", "application/pdf"),
            )
            .mount(&server)
            .await;
        mount_page(&server, "/menu", "menu").await;

        let crawler = crawler_with(test_config());
        let result = crawler.crawl(Some(&server.uri())).await;

        assert_eq!(result.menu_links.len(), 2);
        assert_eq!(result.menu_links[0].kind, LinkKind::Page);
        assert!(result.menu_links[0].url.ends_with("/menu"));
        assert_eq!(result.menu_links[1].kind, LinkKind::Pdf);
    }

    #[tokio::test]
    async fn test_missing_robots_txt_fails_open() {
        // The mock server answers 404 for /robots.txt since nothing matches.
        let server = MockServer::start().await;
        mount_page(&server, "/", r#"<a href="/menu">Menu</a>"#).await;
        mount_page(&server, "/menu", "menu").await;

        let crawler = crawler_with(test_config());
        let result = crawler.crawl(Some(&server.uri())).await;

        assert_ne!(result.stopped_reason, StopReason::Error);
        assert!(result.menu_links.iter().any(|l| l.url.ends_with("/menu")));
    }

    #[tokio::test]
    async fn test_robots_disallow_is_never_fetched() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/robots.txt"))
            .respond_with(
                ResponseTemplate::new(200).set_body_string("User-agent: *\nDisallow: /private\n"),
            )
            .expect(1)
            .mount(&server)
            .await;
        mount_page(
            &server,
            "/",
            r#"<a href="/private/menu">Menu</a>
               <a href="/carte">Carte</a>"#,
        )
        .await;
        mount_page(&server, "/carte", "carte").await;
        Mock::given(method("GET"))
            .and(path("/private/menu"))
            .respond_with(html_page("secret"))
            .expect(0)
            .mount(&server)
            .await;

        let crawler = crawler_with(test_config());
        let result = crawler.crawl(Some(&server.uri())).await;

        assert_eq!(result.stopped_reason, StopReason::Done);
        // The link still matched the keyword set; robots only gates fetching.
        assert!(result.menu_links.iter().any(|l| l.url.ends_with("/private/menu")));
    }

    #[tokio::test]
    async fn test_page_budget_stops_after_one_fetch() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(html_page(
                r#"<a href="/a">A</a><a href="/b">B</a><a href="/c">C</a>"#,
            ))
            .expect(1)
            .mount(&server)
            .await;
        for route in ["/a", "/b", "/c"] {
            Mock::given(method("GET"))
                .and(path(route))
                .respond_with(html_page("leaf"))
                .expect(0)
                .mount(&server)
                .await;
        }

        let config = CrawlConfig { max_pages_per_site: 1, ..test_config() };
        let crawler = crawler_with(config);
        let result = crawler.crawl(Some(&server.uri())).await;

        assert_eq!(result.stopped_reason, StopReason::BudgetExhausted);
        assert_eq!(result.pages_visited, 1);
    }

    #[tokio::test]
    async fn test_depth_bound_stops_enqueueing() {
        let server = MockServer::start().await;
        mount_page(&server, "/", r#"<a href="/level1">Deeper</a>"#).await;
        Mock::given(method("GET"))
            .and(path("/level1"))
            .respond_with(html_page("nothing"))
            .expect(0)
            .mount(&server)
            .await;

        let config = CrawlConfig { max_depth: 0, ..test_config() };
        let crawler = crawler_with(config);
        let result = crawler.crawl(Some(&server.uri())).await;

        assert_eq!(result.stopped_reason, StopReason::Done);
        assert_eq!(result.pages_visited, 1);
    }

    #[tokio::test]
    async fn test_cross_domain_recorded_but_not_crawled() {
        let server = MockServer::start().await;
        let other = MockServer::start().await;
        mount_page(
            &server,
            "/",
            &format!(r#"<a href="{}/menu">Partner menu</a>"#, other.uri()),
        )
        .await;
        Mock::given(method("GET"))
            .and(path("/menu"))
            .respond_with(html_page("other site"))
            .expect(0)
            .mount(&other)
            .await;

        let crawler = crawler_with(test_config());
        let result = crawler.crawl(Some(&server.uri())).await;

        assert!(result.menu_links.iter().any(|l| l.url.starts_with(&other.uri())));
        assert_eq!(result.pages_visited, 1);
    }

    #[tokio::test]
    async fn test_trailing_slash_and_fragment_dedup() {
        let server = MockServer::start().await;
        mount_page(
            &server,
            "/",
            r#"<a href="/menu">Menu</a>
               <a href="/menu/">Menu again</a>
               <a href="/menu#dinner">Dinner</a>"#,
        )
        .await;
        Mock::given(method("GET"))
            .and(path("/menu"))
            .respond_with(html_page("menu"))
            .expect(1)
            .mount(&server)
            .await;

        let crawler = crawler_with(test_config());
        let result = crawler.crawl(Some(&server.uri())).await;

        let menu_entries: Vec<&MenuLink> =
            result.menu_links.iter().filter(|l| l.url.ends_with("/menu")).collect();
        assert_eq!(menu_entries.len(), 1);
        assert_eq!(result.pages_visited, 2);
    }

    #[tokio::test]
    async fn test_server_error_retried_then_skipped() {
        let server = MockServer::start().await;
        mount_page(&server, "/", r#"<a href="/menu">Menu</a><a href="/carte">Carte</a>"#).await;
        // retry_count = 1 in the test config: initial attempt + one retry.
        Mock::given(method("GET"))
            .and(path("/menu"))
            .respond_with(ResponseTemplate::new(503))
            .expect(2)
            .mount(&server)
            .await;
        mount_page(&server, "/carte", "carte").await;

        let crawler = crawler_with(test_config());
        let result = crawler.crawl(Some(&server.uri())).await;

        // The failed page is skipped, the crawl itself still completes.
        assert_eq!(result.stopped_reason, StopReason::Done);
        assert!(result.menu_links.iter().any(|l| l.url.ends_with("/carte")));
    }

    #[tokio::test]
    async fn test_client_error_not_retried() {
        let server = MockServer::start().await;
        mount_page(&server, "/", r#"<a href="/menu">Menu</a>"#).await;
        Mock::given(method("GET"))
            .and(path("/menu"))
            .respond_with(ResponseTemplate::new(404))
            .expect(1)
            .mount(&server)
            .await;

        let crawler = crawler_with(test_config());
        let result = crawler.crawl(Some(&server.uri())).await;

        assert_eq!(result.stopped_reason, StopReason::Done);
        assert_eq!(result.pages_visited, 2);
    }

    #[tokio::test]
    async fn test_rerun_yields_same_links() {
        let server = MockServer::start().await;
        mount_page(
            &server,
            "/",
            r#"<a href="/menu">Menu</a><a href="/carte">Carte</a>"#,
        )
        .await;
        mount_page(&server, "/menu", "menu").await;
        mount_page(&server, "/carte", "carte").await;

        let crawler = crawler_with(test_config());
        let first = crawler.crawl(Some(&server.uri())).await;
        let second = crawler.crawl(Some(&server.uri())).await;

        assert_eq!(first.menu_links, second.menu_links);
        assert_eq!(first.pages_visited, second.pages_visited);
    }

    #[tokio::test]
    async fn test_non_html_body_is_not_parsed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "application/json")
                    .set_body_string(r#"{"menu": "/menu"}"#),
            )
            .mount(&server)
            .await;

        let crawler = crawler_with(test_config());
        let result = crawler.crawl(Some(&server.uri())).await;

        assert_eq!(result.stopped_reason, StopReason::Done);
        assert_eq!(result.pages_visited, 1);
        assert!(result.menu_links.is_empty());
    }
}
