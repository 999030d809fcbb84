// ABOUTME: Builder pattern implementation for SearchClient configuration
// ABOUTME: Resolves API keys from the environment when none is supplied explicitly

use crate::SearchClient;
use crate::constants::{env, limits, timeouts};
use crate::error::SearchError;
use crate::types::Source;
use secrecy::SecretString;
use std::time::Duration;
use typed_builder::TypedBuilder;
use url::Url;

#[derive(Debug, TypedBuilder)]
#[builder(build_method(into = Result<SearchClient, SearchError>))]
pub struct SearchClientConfig {
    #[builder(default)]
    pub source: Source,

    /// Explicit key; falls back to TENOR_API_KEY / GIPHY_API_KEY.
    #[builder(default = None, setter(strip_option))]
    pub api_key: Option<SecretString>,

    #[builder(default = limits::DEFAULT_LIMIT)]
    pub limit: u32,

    #[builder(default = timeouts::HTTP_REQUEST_TIMEOUT)]
    pub timeout: Duration,

    #[builder(default = crate::constants::retry::MAX_RETRIES)]
    pub max_retries: u32,

    #[builder(default = None, setter(strip_option))]
    pub proxy: Option<reqwest::Proxy>,

    /// Override for the provider host, used by tests against a mock server.
    #[builder(default = None, setter(strip_option, into))]
    pub base_url: Option<String>,
}

impl From<SearchClientConfig> for Result<SearchClient, SearchError> {
    fn from(config: SearchClientConfig) -> Self {
        SearchClient::from_config(config)
    }
}

impl SearchClientConfig {
    pub(crate) fn resolve_api_key(&self) -> Result<SecretString, SearchError> {
        if let Some(key) = &self.api_key {
            return Ok(key.clone());
        }
        let from_env = |name: &str| {
            std::env::var(name)
                .ok()
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        match self.source {
            Source::Tenor => Ok(SecretString::new(
                from_env(env::TENOR_API_KEY)
                    .unwrap_or_else(|| crate::constants::TENOR_DEMO_KEY.to_string())
                    .into_boxed_str(),
            )),
            Source::Giphy => from_env(env::GIPHY_API_KEY)
                .map(|key| SecretString::new(key.into_boxed_str()))
                .ok_or(SearchError::MissingApiKey(env::GIPHY_API_KEY)),
        }
    }

    pub(crate) fn validate(&self) -> Result<(), SearchError> {
        if self.limit == 0 || self.limit > limits::MAX_LIMIT {
            return Err(SearchError::Configuration(format!(
                "limit must be between 1 and {}",
                limits::MAX_LIMIT
            )));
        }
        if let Some(base) = &self.base_url {
            Url::parse(base)
                .map_err(|e| SearchError::Configuration(format!("Invalid base URL: {}", e)))?;
        }
        Ok(())
    }
}

impl SearchClient {
    pub fn builder() -> SearchClientConfigBuilder<((), (), (), (), (), (), ())> {
        SearchClientConfig::builder()
    }

    pub fn create_proxy(url: &str) -> Result<reqwest::Proxy, SearchError> {
        let parsed_url = Url::parse(url)
            .map_err(|e| SearchError::Configuration(format!("Invalid proxy URL: {}", e)))?;

        reqwest::Proxy::all(parsed_url.as_str())
            .map_err(|e| SearchError::Configuration(format!("Invalid proxy configuration: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_tenor_falls_back_to_demo_key() {
        unsafe {
            std::env::remove_var("TENOR_API_KEY");
        }
        let config = SearchClientConfig {
            source: Source::Tenor,
            api_key: None,
            limit: limits::DEFAULT_LIMIT,
            timeout: timeouts::HTTP_REQUEST_TIMEOUT,
            max_retries: 0,
            proxy: None,
            base_url: None,
        };
        let key = config.resolve_api_key().unwrap();
        assert_eq!(key.expose_secret(), "LIVDSRZULELA");
    }

    #[test]
    #[serial]
    fn test_giphy_requires_key() {
        unsafe {
            std::env::remove_var("GIPHY_API_KEY");
        }
        let result = SearchClient::builder().source(Source::Giphy).build();
        assert!(matches!(
            result,
            Err(SearchError::MissingApiKey("GIPHY_API_KEY"))
        ));

        unsafe {
            std::env::set_var("GIPHY_API_KEY", "  ");
        }
        let result = SearchClient::builder().source(Source::Giphy).build();
        assert!(result.is_err());

        unsafe {
            std::env::set_var("GIPHY_API_KEY", "secret");
        }
        let result = SearchClient::builder().source(Source::Giphy).build();
        assert!(result.is_ok());

        unsafe {
            std::env::remove_var("GIPHY_API_KEY");
        }
    }

    #[test]
    fn test_explicit_key_wins() {
        let client = SearchClient::builder()
            .source(Source::Giphy)
            .api_key(SecretString::new("explicit".to_string().into_boxed_str()))
            .build();
        assert!(client.is_ok());
    }

    #[test]
    fn test_limit_is_validated() {
        let result = SearchClient::builder().limit(0).build();
        assert!(matches!(result, Err(SearchError::Configuration(_))));

        let result = SearchClient::builder().limit(51).build();
        assert!(matches!(result, Err(SearchError::Configuration(_))));
    }

    #[test]
    fn test_builder_validates_proxy_url() {
        match SearchClient::create_proxy("not-a-url") {
            Err(SearchError::Configuration(msg)) => assert!(msg.contains("Invalid proxy URL")),
            other => panic!("Expected configuration error, got {:?}", other.map(|_| ())),
        }
        assert!(SearchClient::create_proxy("http://proxy:8080").is_ok());
    }

    #[test]
    fn test_secret_is_not_debug_printed() {
        let key = SecretString::new("top-secret".to_string().into_boxed_str());
        assert!(!format!("{:?}", key).contains("top-secret"));
    }
}
