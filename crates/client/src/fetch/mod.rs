//! HTTP fetch layer behind an injectable transport.
//!
//! ### Request
//! - One GET per call, carrying the caller's headers plus transport defaults
//!   (reqwest adds `Accept-Encoding` for the decompressors it enables).
//! - Header keys are case-insensitive; the last value set for a key wins.
//!
//! ### Transport seam
//! - [`Transport`] is the single "execute request, get response" contract.
//! - [`ReqwestTransport`] is the production implementation; tests substitute fakes.
//!
//! ### Status codes
//! - A non-2xx status is not an error here. The body is returned as-is and the
//!   status is left on [`FetchResponse`] for callers that care.
//! - No retries. A failed request is reported once.

pub mod url;

use bytes::{Bytes, BytesMut};
use reqwest::Url;
use reqwest::{Client, StatusCode, header};
use std::time::{Duration, Instant};

pub use self::url::{UrlError, parse_url};

use crawlhtml_core::{AppConfig, FetchError};

/// An outgoing GET request.
#[derive(Debug, Clone)]
pub struct FetchRequest {
    /// Absolute http(s) URL
    pub url: Url,
    /// Request headers
    pub headers: header::HeaderMap,
}

/// Response from a fetch operation.
#[derive(Debug, Clone)]
pub struct FetchResponse {
    /// The URL requested
    pub url: Url,
    /// The final URL after redirects
    pub final_url: Url,
    /// HTTP status code
    pub status: StatusCode,
    /// Content-Type header, kept as a hint only
    pub content_type: Option<String>,
    /// Response headers
    pub headers: header::HeaderMap,
    /// Response body bytes, undecoded
    pub body: Bytes,
    /// Time taken to fetch in milliseconds
    pub fetch_ms: u64,
}

impl FetchResponse {
    /// Build a response with the given status and body and no headers.
    pub fn new(url: Url, status: StatusCode, body: impl Into<Bytes>) -> Self {
        Self {
            final_url: url.clone(),
            url,
            status,
            content_type: None,
            headers: header::HeaderMap::new(),
            body: body.into(),
            fetch_ms: 0,
        }
    }
}

/// Executes a single HTTP request.
///
/// Implementations must not retry and must not turn status codes into errors.
#[async_trait::async_trait]
pub trait Transport: Send + Sync {
    /// Send the request and return the full response body.
    async fn execute(&self, request: FetchRequest) -> Result<FetchResponse, FetchError>;
}

/// Configuration for the reqwest transport.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// Request timeout (default: 20s)
    pub timeout: Duration,

    /// Maximum number of redirects to follow (default: 10)
    pub max_redirects: usize,

    /// Maximum response body size in bytes (default: 5MB)
    pub max_bytes: usize,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self { timeout: Duration::from_millis(20000), max_redirects: 10, max_bytes: 5 * 1024 * 1024 }
    }
}

impl From<&AppConfig> for TransportConfig {
    fn from(config: &AppConfig) -> Self {
        Self { timeout: config.timeout(), max_redirects: config.max_redirects, max_bytes: config.max_bytes }
    }
}

/// Transport backed by a pooled reqwest client.
pub struct ReqwestTransport {
    http: Client,
    config: TransportConfig,
}

impl ReqwestTransport {
    /// Create a new transport with the given configuration.
    pub fn new(config: TransportConfig) -> Result<Self, FetchError> {
        let http = Client::builder()
            .timeout(config.timeout)
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .use_rustls_tls()
            .gzip(true)
            .brotli(true)
            .deflate(true)
            .build()
            .map_err(FetchError::transport)?;

        Ok(Self { http, config })
    }

    /// Get reference to the configuration.
    pub fn config(&self) -> &TransportConfig {
        &self.config
    }

    fn too_large(&self, size: u64) -> FetchError {
        FetchError::TooLarge { size, limit: self.config.max_bytes }
    }
}

fn map_reqwest_error(err: reqwest::Error) -> FetchError {
    if err.is_timeout() { FetchError::Timeout(err.to_string()) } else { FetchError::transport(err) }
}

#[async_trait::async_trait]
impl Transport for ReqwestTransport {
    async fn execute(&self, request: FetchRequest) -> Result<FetchResponse, FetchError> {
        let start = Instant::now();
        let FetchRequest { url, headers } = request;

        tracing::debug!(url = %url, headers = headers.len(), "sending GET");

        let mut response = self
            .http
            .get(url.clone())
            .headers(headers)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        if let Some(len) = response.content_length()
            && len > self.config.max_bytes as u64
        {
            return Err(self.too_large(len));
        }

        let status = response.status();
        let final_url = response.url().clone();
        let headers = response.headers().clone();

        let mut body = BytesMut::new();
        while let Some(chunk) = response.chunk().await.map_err(map_reqwest_error)? {
            let size = body.len() + chunk.len();
            if size > self.config.max_bytes {
                return Err(self.too_large(size as u64));
            }
            body.extend_from_slice(&chunk);
        }

        let content_type = headers
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());

        let fetch_ms = start.elapsed().as_millis() as u64;

        tracing::debug!(
            url = %url,
            final_url = %final_url,
            status = status.as_u16(),
            bytes = body.len(),
            fetch_ms,
            "fetched"
        );

        Ok(FetchResponse { url, final_url, status, content_type, headers, body: body.freeze(), fetch_ms })
    }
}
