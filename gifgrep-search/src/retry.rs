// ABOUTME: Retry logic with exponential backoff for handling transient failures
// ABOUTME: Re-runs provider requests on network errors, timeouts, 429s and 5xx responses

use crate::constants::retry;
use crate::error::SearchError;
use std::time::Duration;
use tokio::time::sleep;

#[derive(Clone, Debug)]
pub struct RetryConfig {
    pub max_retries: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
    pub backoff_multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: retry::MAX_RETRIES,
            initial_delay: retry::INITIAL_DELAY,
            max_delay: retry::MAX_DELAY,
            backoff_multiplier: retry::BACKOFF_MULTIPLIER,
        }
    }
}

impl RetryConfig {
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            ..Default::default()
        }
    }
}

pub async fn retry_with_backoff<F, Fut, T>(
    config: &RetryConfig,
    mut operation: F,
) -> Result<T, SearchError>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, SearchError>>,
{
    let mut delay = config.initial_delay;
    let mut attempt = 0;

    loop {
        match operation().await {
            Ok(result) => return Ok(result),
            Err(error) => {
                if !error.is_retryable() || attempt >= config.max_retries {
                    return Err(error);
                }
                attempt += 1;
                log::debug!(
                    "search request failed (attempt {}/{}): {}",
                    attempt,
                    config.max_retries,
                    error
                );
                sleep(delay).await;
                delay = std::cmp::min(
                    Duration::from_millis(
                        (delay.as_millis() as f64 * config.backoff_multiplier) as u64,
                    ),
                    config.max_delay,
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    fn fast_config(max_retries: u32) -> RetryConfig {
        RetryConfig {
            max_retries,
            initial_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(2),
            backoff_multiplier: 2.0,
        }
    }

    #[tokio::test]
    async fn test_retry_success_on_first_attempt() {
        let calls = Arc::new(Mutex::new(0));
        let counter = calls.clone();

        let result = retry_with_backoff(&fast_config(2), || {
            let counter = counter.clone();
            async move {
                *counter.lock().unwrap() += 1;
                Ok::<i32, SearchError>(42)
            }
        })
        .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(*calls.lock().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_retry_success_after_failures() {
        let calls = Arc::new(Mutex::new(0));
        let counter = calls.clone();

        let result = retry_with_backoff(&fast_config(3), || {
            let counter = counter.clone();
            async move {
                let mut c = counter.lock().unwrap();
                *c += 1;
                if *c < 3 {
                    Err(SearchError::Network("Temporary failure".to_string()))
                } else {
                    Ok::<i32, SearchError>(7)
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), 7);
        assert_eq!(*calls.lock().unwrap(), 3);
    }

    #[tokio::test]
    async fn test_retry_non_retryable_error() {
        let calls = Arc::new(Mutex::new(0));
        let counter = calls.clone();

        let result = retry_with_backoff(&fast_config(3), || {
            let counter = counter.clone();
            async move {
                *counter.lock().unwrap() += 1;
                Err::<i32, SearchError>(SearchError::Http { status: 404 })
            }
        })
        .await;

        assert!(matches!(result, Err(SearchError::Http { status: 404 })));
        assert_eq!(*calls.lock().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_retry_max_attempts_exceeded() {
        let calls = Arc::new(Mutex::new(0));
        let counter = calls.clone();

        let result = retry_with_backoff(&fast_config(2), || {
            let counter = counter.clone();
            async move {
                *counter.lock().unwrap() += 1;
                Err::<i32, SearchError>(SearchError::Timeout)
            }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(*calls.lock().unwrap(), 3); // Initial attempt + 2 retries
    }
}
