//! Transport seam for retrieving resource bytes, and its HTTP implementation.

use std::time::Duration;

use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::Client;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::{debug, instrument};
use url::Url;

use super::constants::{CONNECT_TIMEOUT_SECS, READ_TIMEOUT_SECS};
use super::error::TransportError;

/// Retrieves the bytes behind a locator.
///
/// This trait uses `async_trait` so workers can hold an `Arc<dyn Transport>`;
/// tests substitute in-process transports for the HTTP one.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Streams the resource at `locator` into `sink`, returning the byte count.
    ///
    /// The sink is not flushed; the caller owns durability of what it wrote.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] if the resource cannot be retrieved or the
    /// sink rejects a write ([`TransportError::Sink`]).
    async fn retrieve(
        &self,
        locator: &str,
        sink: &mut (dyn AsyncWrite + Send + Unpin),
    ) -> Result<u64, TransportError>;
}

/// HTTP transport with streaming support.
///
/// Designed to be created once and shared by all workers of a run, taking
/// advantage of connection pooling.
///
/// # Example
///
/// ```no_run
/// use batchfetch_core::fetch::{HttpTransport, Transport};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let transport = HttpTransport::new();
/// let mut file = tokio::fs::File::create("100003.jpg").await?;
/// let bytes = transport.retrieve("https://example.com/100003.jpg", &mut file).await?;
/// println!("fetched {bytes} bytes");
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
}

impl Default for HttpTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpTransport {
    /// Creates a transport with default timeouts.
    ///
    /// Default configuration:
    /// - Connect timeout: 30 seconds
    /// - Total request timeout: 5 minutes
    /// - Gzip decompression: enabled
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client builder fails to build with the static
    /// configuration. This should never happen in practice.
    #[must_use]
    pub fn new() -> Self {
        Self::new_with_timeouts(CONNECT_TIMEOUT_SECS, READ_TIMEOUT_SECS)
    }

    /// Creates a transport with explicit timeout values.
    ///
    /// The total timeout bounds each retrieval end to end, which makes it the
    /// per-record deadline of a run.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client builder fails to build with the supplied
    /// timeout configuration.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn new_with_timeouts(connect_timeout_secs: u64, read_timeout_secs: u64) -> Self {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(connect_timeout_secs))
            .timeout(Duration::from_secs(read_timeout_secs))
            .gzip(true)
            .user_agent(default_user_agent())
            .build()
            .expect("failed to build HTTP client with static configuration");
        Self { client }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    #[instrument(skip(self, sink), fields(url = %locator))]
    async fn retrieve(
        &self,
        locator: &str,
        sink: &mut (dyn AsyncWrite + Send + Unpin),
    ) -> Result<u64, TransportError> {
        Url::parse(locator).map_err(|_| TransportError::invalid_url(locator))?;

        let response = self
            .client
            .get(locator)
            .send()
            .await
            .map_err(|e| TransportError::network(locator, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::http_status(locator, status.as_u16()));
        }

        let mut stream = response.bytes_stream();
        let mut bytes_written: u64 = 0;

        while let Some(chunk_result) = stream.next().await {
            let chunk = chunk_result.map_err(|e| TransportError::network(locator, e))?;
            sink.write_all(&chunk)
                .await
                .map_err(|e| TransportError::sink(locator, e))?;
            bytes_written += chunk.len() as u64;
        }

        debug!(bytes = bytes_written, "response body streamed");
        Ok(bytes_written)
    }
}

/// Default User-Agent for fetch requests (identifies the tool).
fn default_user_agent() -> String {
    let version = env!("CARGO_PKG_VERSION");
    format!("batchfetch/{version}")
}
