//! Google Places API client: paginated searches, place details and photo
//! downloads.

use crate::place::{PlaceDetails, PlaceSummary};
use reqwest::Client;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

const DEFAULT_BASE_URL: &str = "https://maps.googleapis.com/maps/api/place";

/// The API requires this pause before a `next_page_token` becomes valid.
const PAGE_TOKEN_DELAY: Duration = Duration::from_secs(2);

const RETRY_BASE_DELAY: Duration = Duration::from_secs(1);

#[derive(Error, Debug)]
pub enum PlacesError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Places API error {status}: {message}")]
    Api { status: String, message: String },

    #[error("server error {status} after {retries} retries")]
    ServerError { status: u16, retries: u32 },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, PlacesError>;

/// Explicit client configuration. The API key lives here and nowhere else;
/// there is no ambient key lookup inside the client.
#[derive(Debug, Clone)]
pub struct PlacesConfig {
    pub api_key: String,
    pub timeout_seconds: u64,
    pub retry_attempts: u32,
}

impl PlacesConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self { api_key: api_key.into(), timeout_seconds: 10, retry_attempts: 3 }
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    status: String,
    #[serde(default)]
    results: Vec<PlaceSummary>,
    next_page_token: Option<String>,
    error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DetailsResponse {
    status: String,
    result: Option<PlaceDetails>,
    error_message: Option<String>,
}

pub struct PlacesClient {
    client: Client,
    config: PlacesConfig,
    base_url: String,
}

impl PlacesClient {
    pub fn new(config: PlacesConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;
        Ok(Self { client, config, base_url: DEFAULT_BASE_URL.to_string() })
    }

    /// Point the client at a different API root. Used by tests.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Text search, following `next_page_token` pagination until the API
    /// runs out of pages or `max_results` is reached.
    pub async fn text_search(
        &self,
        query: &str,
        max_results: Option<usize>,
    ) -> Result<Vec<PlaceSummary>> {
        debug!("Text search: {}", query);
        self.search("textsearch", vec![("query".into(), query.into())], max_results).await
    }

    /// Nearby search around a coordinate, restricted to restaurants.
    pub async fn nearby_search(
        &self,
        lat: f64,
        lng: f64,
        radius_m: u32,
        max_results: Option<usize>,
    ) -> Result<Vec<PlaceSummary>> {
        debug!("Nearby search: {},{} r={}m", lat, lng, radius_m);
        let params = vec![
            ("location".into(), format!("{lat},{lng}")),
            ("radius".into(), radius_m.to_string()),
            ("type".into(), "restaurant".into()),
        ];
        self.search("nearbysearch", params, max_results).await
    }

    async fn search(
        &self,
        endpoint: &str,
        base_params: Vec<(String, String)>,
        max_results: Option<usize>,
    ) -> Result<Vec<PlaceSummary>> {
        let url = format!("{}/{}/json", self.base_url, endpoint);
        let mut results: Vec<PlaceSummary> = Vec::new();
        let mut next_page_token: Option<String> = None;

        loop {
            let mut params = base_params.clone();
            params.push(("key".into(), self.config.api_key.clone()));
            if let Some(token) = &next_page_token {
                params.push(("pagetoken".into(), token.clone()));
                tokio::time::sleep(PAGE_TOKEN_DELAY).await;
            }

            let resp = self.get_with_retry(&url, &params).await?;
            let page: SearchResponse = resp.json().await?;

            match page.status.as_str() {
                "OK" => {
                    results.extend(page.results);
                    info!("Retrieved {} places so far", results.len());

                    if let Some(max) = max_results
                        && results.len() >= max
                    {
                        results.truncate(max);
                        break;
                    }
                    match page.next_page_token {
                        Some(token) => next_page_token = Some(token),
                        None => break,
                    }
                }
                "ZERO_RESULTS" => {
                    warn!("No results for {} search", endpoint);
                    break;
                }
                status => {
                    return Err(PlacesError::Api {
                        status: status.to_string(),
                        message: page.error_message.unwrap_or_default(),
                    });
                }
            }
        }

        Ok(results)
    }

    /// Fetch full details for one place. `Ok(None)` when the API says the
    /// place is gone rather than broken.
    pub async fn place_details(&self, place_id: &str) -> Result<Option<PlaceDetails>> {
        let url = format!("{}/details/json", self.base_url);
        let params = vec![
            ("place_id".to_string(), place_id.to_string()),
            ("key".to_string(), self.config.api_key.clone()),
        ];

        let resp = self.get_with_retry(&url, &params).await?;
        let details: DetailsResponse = resp.json().await?;

        match details.status.as_str() {
            "OK" => Ok(details.result),
            "ZERO_RESULTS" | "NOT_FOUND" => {
                debug!("No details for {}", place_id);
                Ok(None)
            }
            status => Err(PlacesError::Api {
                status: status.to_string(),
                message: details.error_message.unwrap_or_default(),
            }),
        }
    }

    /// Download one photo to `dest`, returning the byte count written.
    pub async fn download_photo(
        &self,
        photo_reference: &str,
        max_width: u32,
        dest: &Path,
    ) -> Result<u64> {
        let url = format!("{}/photo", self.base_url);
        let params = vec![
            ("maxwidth".to_string(), max_width.to_string()),
            ("photo_reference".to_string(), photo_reference.to_string()),
            ("key".to_string(), self.config.api_key.clone()),
        ];

        let resp = self.get_with_retry(&url, &params).await?;
        let bytes = resp.bytes().await?;
        tokio::fs::write(dest, &bytes).await?;
        debug!("Wrote {} bytes to {}", bytes.len(), dest.display());
        Ok(bytes.len() as u64)
    }

    /// GET with exponential backoff on 5xx and transport errors. 4xx comes
    /// back as a response for the caller's status handling.
    async fn get_with_retry(
        &self,
        url: &str,
        params: &[(String, String)],
    ) -> Result<reqwest::Response> {
        let mut attempt: u32 = 0;
        loop {
            let err: PlacesError = match self.client.get(url).query(params).send().await {
                Ok(resp) if resp.status().is_server_error() => {
                    PlacesError::ServerError { status: resp.status().as_u16(), retries: attempt }
                }
                Ok(resp) => return Ok(resp),
                Err(e) => PlacesError::Http(e),
            };

            if attempt >= self.config.retry_attempts {
                return Err(err);
            }
            let backoff = RETRY_BASE_DELAY * 2u32.pow(attempt);
            debug!("Retrying {} after {:?}: {}", url, backoff, err);
            tokio::time::sleep(backoff).await;
            attempt += 1;
        }
    }
}
