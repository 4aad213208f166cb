//! HTML fetcher that hands back UTF-8.

use std::io::Read;
use std::sync::Arc;

use reqwest::header::{self, HeaderMap, HeaderName, HeaderValue};

use crawlhtml_core::config::DEFAULT_USER_AGENT;
use crawlhtml_core::{AppConfig, Error, FetchError, MalformedPolicy};

use crate::charset::{self, HtmlReader};
use crate::fetch::{FetchRequest, FetchResponse, ReqwestTransport, Transport, TransportConfig, parse_url};

/// Fetches HTML pages over an injected transport and normalizes them to UTF-8.
///
/// Headers are fixed per crawler; configure them before sharing it across
/// tasks. Every request starts from the mobile User-Agent in
/// [`DEFAULT_USER_AGENT`] unless a `User-Agent` header is set.
pub struct Crawler {
    transport: Arc<dyn Transport>,
    headers: HeaderMap,
    policy: MalformedPolicy,
}

impl Crawler {
    /// Create a crawler over the given transport.
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(header::USER_AGENT, HeaderValue::from_static(DEFAULT_USER_AGENT));

        Self { transport, headers, policy: MalformedPolicy::default() }
    }

    /// Create a crawler backed by reqwest, configured from `config`.
    pub fn from_config(config: &AppConfig) -> Result<Self, Error> {
        let transport = ReqwestTransport::new(TransportConfig::from(config))?;

        let mut crawler = Self::new(Arc::new(transport)).with_malformed_policy(config.malformed);
        crawler.set_header("User-Agent", &config.user_agent)?;
        for (key, value) in &config.headers {
            crawler.set_header(key, value)?;
        }

        Ok(crawler)
    }

    /// Set how malformed legacy-encoded bytes are handled while reading.
    pub fn with_malformed_policy(mut self, policy: MalformedPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Set a request header. Keys are case-insensitive; the last value wins.
    pub fn set_header(&mut self, key: &str, value: &str) -> Result<(), Error> {
        let name = HeaderName::from_bytes(key.as_bytes())
            .map_err(|e| Error::InvalidHeader(format!("{key}: {e}")))?;
        let value = HeaderValue::from_str(value).map_err(|e| Error::InvalidHeader(format!("{key}: {e}")))?;

        self.headers.insert(name, value);
        Ok(())
    }

    /// Headers sent with every request.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Issue one GET for `url` and return the raw response.
    ///
    /// The status code is not checked.
    pub async fn fetch(&self, url: &str) -> Result<FetchResponse, Error> {
        let url = parse_url(url).map_err(|e| FetchError::InvalidUrl(e.to_string()))?;
        let request = FetchRequest { url, headers: self.headers.clone() };

        Ok(self.transport.execute(request).await?)
    }

    /// Fetch `url` and return its body as a UTF-8 reader.
    ///
    /// # Errors
    ///
    /// - `Error::Fetch` for URL or transport failures
    /// - `Error::Detection` if the charset cannot be guessed
    /// - `Error::UnsupportedCharset` for charsets other than UTF-8, EUC-JP,
    ///   ISO-2022-JP and Shift_JIS
    pub async fn html(&self, url: &str) -> Result<HtmlReader, Error> {
        let response = self.fetch(url).await?;

        if !response.status.is_success() {
            tracing::debug!(url = %response.url, status = response.status.as_u16(), "non-success status, using body");
        }

        charset::resolve(response.body, self.policy)
    }

    /// Fetch `url` and read the whole document into a string.
    pub async fn html_string(&self, url: &str) -> Result<String, Error> {
        let mut reader = self.html(url).await?;
        let mut html = String::new();
        reader.read_to_string(&mut html).map_err(|e| Error::Decode(e.to_string()))?;
        Ok(html)
    }
}
