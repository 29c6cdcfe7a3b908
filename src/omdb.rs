use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, error, warn};

use crate::media::{url_encode, ApiError, MovieDetail, MovieSummary};

pub const DEFAULT_BASE_URL: &str = "https://www.omdbapi.com/";

const TRUE_RESPONSE: &str = "True";

#[derive(Debug, Deserialize)]
struct SearchEnvelope {
    #[serde(rename = "Response")]
    response: String,
    #[serde(rename = "Search", default)]
    search: Vec<MovieSummary>,
    #[serde(rename = "Error")]
    error: Option<String>,
}

/// Maps a `"False"` envelope message onto the error taxonomy.
fn envelope_error(message: Option<String>) -> ApiError {
    let message = message.unwrap_or_else(|| String::from("Unknown error"));
    match message.as_str() {
        "Invalid API key!" | "No API key provided." => ApiError::Unauthorized,
        "Request limit reached!" => ApiError::RateLimit,
        m if m.ends_with("not found!") => ApiError::NotFound(message),
        _ => ApiError::Api(message),
    }
}

pub(crate) fn parse_search_envelope(json: serde_json::Value) -> Result<Vec<MovieSummary>, ApiError> {
    let envelope: SearchEnvelope =
        serde_json::from_value(json).map_err(|e| ApiError::Parse(e.to_string()))?;
    if envelope.response == TRUE_RESPONSE {
        Ok(envelope.search)
    } else {
        Err(envelope_error(envelope.error))
    }
}

pub(crate) fn parse_detail_envelope(json: serde_json::Value) -> Result<MovieDetail, ApiError> {
    let response = json.get("Response").and_then(|v| v.as_str());
    if response != Some(TRUE_RESPONSE) {
        let message = json.get("Error").and_then(|v| v.as_str()).map(String::from);
        return Err(envelope_error(message));
    }
    serde_json::from_value(json).map_err(|e| ApiError::Parse(e.to_string()))
}

/// Remote movie database seen by the collector and the loader.
///
/// Implementors only provide the fallible calls; `search` and `fetch_detail`
/// log failures and degrade to "no results".
#[async_trait]
pub trait MovieApi: Send + Sync {
    /// One page of search results for `term`. Pages start at 1.
    async fn search_page(&self, term: &str, page: u32) -> Result<Vec<MovieSummary>, ApiError>;

    /// Full detail record for one identifier.
    async fn lookup(&self, id: &str) -> Result<MovieDetail, ApiError>;

    async fn search(&self, term: &str, page: u32) -> Vec<MovieSummary> {
        match self.search_page(term, page).await {
            Ok(results) => results,
            Err(e) => {
                warn!("Search for '{}' page {} failed: {}", term, page, e);
                Vec::new()
            }
        }
    }

    async fn fetch_detail(&self, id: &str) -> Option<MovieDetail> {
        match self.lookup(id).await {
            Ok(detail) => Some(detail),
            Err(e) => {
                debug!("Detail lookup for {} failed: {}", id, e);
                None
            }
        }
    }
}

#[derive(Clone)]
pub struct OmdbClient {
    api_key: String,
    base_url: String,
    http_client: reqwest::Client,
}

impl std::fmt::Debug for OmdbClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OmdbClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl OmdbClient {
    pub fn new(api_key: String, base_url: String) -> Self {
        Self {
            api_key,
            base_url,
            http_client: reqwest::Client::new(),
        }
    }

    pub fn from_settings(settings: &crate::settings::AppSettings) -> Self {
        let base_url = if settings.base_url.trim().is_empty() {
            String::from(DEFAULT_BASE_URL)
        } else {
            settings.base_url.clone()
        };
        Self::new(settings.api_key.clone(), base_url)
    }

    pub(crate) fn search_url(&self, term: &str, page: u32) -> String {
        format!(
            "{}?s={}&type=movie&page={}&apikey={}",
            self.base_url,
            url_encode(term),
            page,
            self.api_key
        )
    }

    pub(crate) fn detail_url(&self, id: &str) -> String {
        format!(
            "{}?i={}&plot=full&apikey={}",
            self.base_url,
            url_encode(id),
            self.api_key
        )
    }

    async fn fetch_response(&self, url: &str) -> Result<reqwest::Response, ApiError> {
        let response = self
            .http_client
            .get(url)
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;

        match response.status().as_u16() {
            401 => Err(ApiError::Unauthorized),
            429 => Err(ApiError::RateLimit),
            s if s >= 400 => Err(ApiError::Network(format!("HTTP error: {}", s))),
            _ => Ok(response),
        }
    }

    async fn fetch_json(&self, url: &str) -> Result<serde_json::Value, ApiError> {
        self.fetch_response(url)
            .await?
            .json()
            .await
            .map_err(|e| ApiError::Parse(e.to_string()))
    }
}

#[async_trait]
impl MovieApi for OmdbClient {
    async fn search_page(&self, term: &str, page: u32) -> Result<Vec<MovieSummary>, ApiError> {
        let json = self.fetch_json(&self.search_url(term, page)).await?;
        parse_search_envelope(json)
    }

    async fn lookup(&self, id: &str) -> Result<MovieDetail, ApiError> {
        let json = self.fetch_json(&self.detail_url(id)).await?;
        parse_detail_envelope(json).inspect_err(|e| {
            if matches!(e, ApiError::Unauthorized | ApiError::RateLimit) {
                error!("OMDb rejected lookup for {}: {}", id, e);
            }
        })
    }
}
