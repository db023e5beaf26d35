pub mod classify;
pub mod config;
pub mod crawler;
pub mod error;
pub mod frontier;
pub mod limiter;
pub mod result;
pub mod robots;
pub mod urls;

pub use config::CrawlConfig;
pub use crawler::Crawler;
pub use error::{CrawlError, FetchError};
pub use result::{CrawlResult, CrawlTarget, LinkKind, MenuLink, StopReason};
