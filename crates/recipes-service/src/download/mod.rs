//! Downloading of image payloads over HTTP.

use std::error::Error;
use std::time::Duration;

use bytes::Bytes;
use reqwest::header;

use crate::caching::{CacheKey, LoadError, LoadResult};
use crate::config::Config;

/// The `User-Agent` header sent with every image request.
pub const USER_AGENT: &str = concat!("recipes/", env!("CARGO_PKG_VERSION"));

impl LoadError {
    /// Reduces `error` to its root cause, which usually carries the most
    /// actionable message.
    fn download_error(mut error: &dyn Error) -> Self {
        while let Some(source) = error.source() {
            error = source;
        }

        Self::Download(error.to_string())
    }
}

impl From<reqwest::Error> for LoadError {
    fn from(error: reqwest::Error) -> Self {
        Self::download_error(&error)
    }
}

/// Fetches image payloads from their remote source.
///
/// This is a plain GET with no retry logic; a failed download surfaces as a
/// [`LoadError`] and the caller decides whether to start a new load.
/// Timeouts are enforced by the underlying client, configured from
/// [`Config::connect_timeout`] and [`Config::max_download_timeout`].
#[derive(Debug)]
pub struct Downloader {
    client: reqwest::Client,
}

impl Downloader {
    /// Creates a downloader with a client configured from `config`.
    pub fn new(config: &Config) -> Self {
        Self {
            client: create_client(config),
        }
    }

    /// Downloads the payload behind `key`.
    ///
    /// Any non-success status code is a [`LoadError::Download`]; the body of
    /// an error response is discarded.
    pub async fn download(&self, key: &CacheKey) -> LoadResult<Bytes> {
        tracing::debug!(key = %key, "fetching image");

        let response = self
            .client
            .get(key.as_str())
            .header(header::USER_AGENT, USER_AGENT)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            tracing::debug!(key = %key, %status, "image server responded with an error");
            return Err(LoadError::Download(status.to_string()));
        }

        Ok(response.bytes().await?)
    }
}

/// Creates the [`reqwest::Client`] used for image downloads.
fn create_client(config: &Config) -> reqwest::Client {
    reqwest::ClientBuilder::new()
        .gzip(true)
        .connect_timeout(config.connect_timeout)
        .timeout(config.max_download_timeout)
        .pool_idle_timeout(Duration::from_secs(30))
        .build()
        .unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;

    use recipes_test as test;

    fn downloader() -> Downloader {
        Downloader::new(&Config::default())
    }

    #[tokio::test]
    async fn test_download() {
        test::setup();
        let server = test::Server::new();

        let key = CacheKey::parse(server.url("/images/a.png").as_str()).unwrap();
        let bytes = downloader().download(&key).await.unwrap();

        assert_eq!(bytes.as_ref(), test::png_fixture().as_slice());
        assert_eq!(server.accesses(), 1);
    }

    #[tokio::test]
    async fn test_download_bad_status() {
        test::setup();
        let server = test::Server::new();

        let key = CacheKey::parse(server.url("/respond_statuscode/404/a.png").as_str()).unwrap();
        let result = downloader().download(&key).await;

        assert_eq!(
            result,
            Err(LoadError::Download("404 Not Found".to_string()))
        );
    }

    #[tokio::test]
    async fn test_download_connection_error() {
        test::setup();

        // Nothing listens on port 1.
        let key = CacheKey::parse("http://127.0.0.1:1/a.png").unwrap();
        let result = downloader().download(&key).await;

        assert!(matches!(result, Err(LoadError::Download(_))));
    }
}
