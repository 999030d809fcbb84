// ABOUTME: Centralized constants for the GIF search clients
// ABOUTME: Contains provider URLs, request limits, retry configuration and env var names

/// Retry configuration constants
pub mod retry {
    use std::time::Duration;

    /// Maximum number of retry attempts
    pub const MAX_RETRIES: u32 = 2;

    /// Initial delay before first retry
    pub const INITIAL_DELAY: Duration = Duration::from_millis(100);

    /// Maximum delay between retries
    pub const MAX_DELAY: Duration = Duration::from_secs(2);

    /// Backoff multiplier for exponential backoff
    pub const BACKOFF_MULTIPLIER: f64 = 2.0;
}

/// HTTP and request timeouts
pub mod timeouts {
    use std::time::Duration;

    /// Default timeout for search requests
    pub const HTTP_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
}

/// Provider URLs
pub mod urls {
    /// Tenor v1 API base
    pub const TENOR_API_BASE: &str = "https://api.tenor.com";

    /// Giphy v1 API base
    pub const GIPHY_API_BASE: &str = "https://api.giphy.com";
}

/// Request shaping
pub mod limits {
    pub const DEFAULT_LIMIT: u32 = 20;
    pub const MAX_LIMIT: u32 = 50;
}

/// Environment variables consulted by the clients
pub mod env {
    pub const TENOR_API_KEY: &str = "TENOR_API_KEY";
    pub const GIPHY_API_KEY: &str = "GIPHY_API_KEY";
    pub const SOURCE: &str = "GIFGREP_SOURCE";
}

/// Public Tenor v1 demo key, used when TENOR_API_KEY is unset
pub const TENOR_DEMO_KEY: &str = "LIVDSRZULELA";

pub const USER_AGENT: &str = "gifgrep";
