// ABOUTME: HTTP client for downloading preview GIFs with size limits and timeouts
// ABOUTME: Streams the body and aborts as soon as the byte ceiling is crossed

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::Client;
use std::time::Duration;

use crate::constants::{fetch, USER_AGENT};

/// Source of raw image bytes for a URL.
#[async_trait]
pub trait PreviewFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>>;
}

pub struct HttpFetcher {
    client: Client,
    max_bytes: u64,
}

impl HttpFetcher {
    pub fn new(max_bytes: u64) -> Result<Self> {
        Self::with_timeout(max_bytes, fetch::TIMEOUT)
    }

    pub fn with_timeout(max_bytes: u64, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()
            .map_err(|e| anyhow!("Failed to create HTTP client: {}", e))?;

        Ok(Self { client, max_bytes })
    }

    pub fn max_bytes(&self) -> u64 {
        self.max_bytes
    }
}

#[async_trait]
impl PreviewFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| anyhow!("HTTP request failed for {}: {}", url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(anyhow!("http {}", status.as_u16()));
        }

        if let Some(length) = response.content_length() {
            if length > self.max_bytes {
                return Err(anyhow!(
                    "Image too large: {} bytes (max: {} bytes)",
                    length,
                    self.max_bytes
                ));
            }
        }

        let mut bytes = Vec::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| anyhow!("Failed to read response body: {}", e))?;
            bytes.extend_from_slice(&chunk);
            if bytes.len() as u64 > self.max_bytes {
                return Err(anyhow!(
                    "Image exceeded size limit during download: {} bytes (max: {})",
                    bytes.len(),
                    self.max_bytes
                ));
            }
        }

        log::debug!("fetched {} bytes from {}", bytes.len(), url);
        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Server;

    #[tokio::test]
    async fn test_successful_fetch() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/cat.gif")
            .match_header("user-agent", "gifgrep")
            .with_status(200)
            .with_header("content-type", "image/gif")
            .with_body(b"GIF89a-data")
            .create_async()
            .await;

        let fetcher = HttpFetcher::new(1024).unwrap();
        let bytes = fetcher
            .fetch(&format!("{}/cat.gif", server.url()))
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(bytes, b"GIF89a-data");
    }

    #[tokio::test]
    async fn test_non_success_status() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/missing.gif")
            .with_status(404)
            .create_async()
            .await;

        let fetcher = HttpFetcher::new(1024).unwrap();
        let err = fetcher
            .fetch(&format!("{}/missing.gif", server.url()))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "http 404");
    }

    #[tokio::test]
    async fn test_size_limit() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/big.gif")
            .with_status(200)
            .with_body(vec![0u8; 2048])
            .create_async()
            .await;

        let fetcher = HttpFetcher::new(1024).unwrap();
        let err = fetcher
            .fetch(&format!("{}/big.gif", server.url()))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("too large") || err.to_string().contains("size limit"));
    }
}
