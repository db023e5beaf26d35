use thiserror::Error;

/// Session-level errors. These never escape [`crate::Crawler::crawl`]; the
/// session boundary folds them into a result with `StopReason::Error`.
#[derive(Error, Debug)]
pub enum CrawlError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    #[error("parse error: {0}")]
    ParseError(String),
}

/// Per-page fetch outcome consumed by the crawl loop. Every variant is
/// non-fatal: the page is skipped and the frontier keeps draining.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("timed out after {retries} retries")]
    TimedOut { retries: u32 },

    #[error("server error {status} after {retries} retries")]
    ServerError { status: u16, retries: u32 },

    #[error("client error {status}")]
    ClientError { status: u16 },

    #[error("transport error: {0}")]
    Transport(String),

    #[error("failed to read body: {0}")]
    Body(String),
}

pub type Result<T> = std::result::Result<T, CrawlError>;
