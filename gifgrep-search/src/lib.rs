// ABOUTME: GIF search library with Tenor and Giphy clients behind one provider trait
// ABOUTME: Includes retry handling, typed configuration and the shared result model

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use secrecy::{ExposeSecret, SecretString};

pub mod builder;
pub mod constants;
pub mod error;
mod giphy;
pub mod retry;
mod tenor;
pub mod types;

pub use builder::SearchClientConfig;
pub use error::SearchError;
pub use retry::RetryConfig;
pub use types::{SearchResult, Source, resolve_source};

pub type Result<T> = std::result::Result<T, SearchError>;

/// Anything that can turn a query into an ordered list of results.
#[async_trait]
pub trait SearchProvider: Send + Sync {
    async fn search(&self, query: &str) -> Result<Vec<SearchResult>>;
}

pub struct SearchClient {
    client: reqwest::Client,
    source: Source,
    api_key: SecretString,
    limit: u32,
    base_url: String,
    retry_config: RetryConfig,
}

impl SearchClient {
    pub fn new(source: Source) -> Result<Self> {
        Self::builder().source(source).build()
    }

    pub fn from_config(config: SearchClientConfig) -> Result<Self> {
        config.validate()?;
        let api_key = config.resolve_api_key()?;

        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(constants::USER_AGENT));

        let mut client_builder = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.timeout);
        if let Some(proxy) = config.proxy {
            client_builder = client_builder.proxy(proxy);
        }
        let client = client_builder
            .build()
            .map_err(|e| SearchError::Configuration(format!("Failed to build HTTP client: {}", e)))?;

        let base_url = config
            .base_url
            .unwrap_or_else(|| match config.source {
                Source::Tenor => constants::urls::TENOR_API_BASE.to_string(),
                Source::Giphy => constants::urls::GIPHY_API_BASE.to_string(),
            })
            .trim_end_matches('/')
            .to_string();

        Ok(Self {
            client,
            source: config.source,
            api_key,
            limit: config.limit,
            base_url,
            retry_config: RetryConfig {
                max_retries: config.max_retries,
                ..RetryConfig::default()
            },
        })
    }

    pub fn source(&self) -> Source {
        self.source
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    async fn fetch_once(&self, query: &str) -> Result<Vec<SearchResult>> {
        let key = self.api_key.expose_secret();
        let (url, params) = match self.source {
            Source::Tenor => (
                format!("{}/v1/search", self.base_url),
                tenor::query_params(query, key, self.limit),
            ),
            Source::Giphy => (
                format!("{}/v1/gifs/search", self.base_url),
                giphy::query_params(query, key, self.limit),
            ),
        };

        let response = self.client.get(&url).query(&params).send().await?;
        let status = response.status();
        if !status.is_success() {
            if status.as_u16() == 429 {
                return Err(SearchError::RateLimit);
            }
            return Err(SearchError::Http {
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await?;
        let results = match self.source {
            Source::Tenor => tenor::into_results(serde_json::from_slice(&body)?),
            Source::Giphy => giphy::into_results(serde_json::from_slice(&body)?),
        };
        log::debug!(
            "{} returned {} results for {:?}",
            self.source,
            results.len(),
            query
        );
        Ok(results)
    }
}

#[async_trait]
impl SearchProvider for SearchClient {
    async fn search(&self, query: &str) -> Result<Vec<SearchResult>> {
        retry::retry_with_backoff(&self.retry_config, || self.fetch_once(query)).await
    }
}
