// ABOUTME: Custom error types for the GIF search clients with user-friendly messages
// ABOUTME: Maps HTTP, timeout and decoding failures onto a small retry-aware taxonomy

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("Missing API key: set {0}")]
    MissingApiKey(&'static str),

    #[error("Unknown source: {0}")]
    UnknownSource(String),

    #[error("http {status}")]
    Http { status: u16 },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Rate limit exceeded. Please wait before searching again")]
    RateLimit,

    #[error("Invalid API response: {0}")]
    InvalidResponse(String),

    #[error("Timeout: search took too long to complete")]
    Timeout,

    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl SearchError {
    pub fn help_text(&self) -> Option<&'static str> {
        match self {
            SearchError::MissingApiKey("GIPHY_API_KEY") => {
                Some("Create a key at https://developers.giphy.com/ and export GIPHY_API_KEY")
            }
            SearchError::MissingApiKey(_) => Some("Export the provider API key and try again"),
            SearchError::UnknownSource(_) => Some("Valid sources: tenor, giphy"),
            SearchError::Network(_) => Some("Check your internet connection and try again"),
            SearchError::RateLimit => Some("Wait a moment before searching again"),
            SearchError::Timeout => Some("Try again or check your network connection"),
            _ => None,
        }
    }

    pub fn is_retryable(&self) -> bool {
        match self {
            SearchError::Network(_) | SearchError::Timeout | SearchError::RateLimit => true,
            SearchError::Http { status } => (500..=599).contains(status),
            _ => false,
        }
    }
}

impl From<reqwest::Error> for SearchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            SearchError::Timeout
        } else if err.is_decode() {
            SearchError::InvalidResponse(err.to_string())
        } else if let Some(status) = err.status() {
            match status.as_u16() {
                429 => SearchError::RateLimit,
                code => SearchError::Http { status: code },
            }
        } else {
            SearchError::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for SearchError {
    fn from(err: serde_json::Error) -> Self {
        SearchError::InvalidResponse(err.to_string())
    }
}
