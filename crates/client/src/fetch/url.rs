//! URL validation for outgoing requests.

/// Error type for URL validation failures.
#[derive(Debug, Clone, thiserror::Error)]
pub enum UrlError {
    #[error("empty URL")]
    Empty,

    #[error("unsupported scheme: {0}")]
    UnsupportedScheme(String),

    #[error("missing host")]
    MissingHost,

    #[error("invalid URL: {0}")]
    InvalidUrl(String),
}

/// Parse a URL string for a GET request.
///
/// Steps:
/// 1. Trim leading/trailing whitespace
/// 2. Require an absolute `http` or `https` URL with a host
/// 3. Remove fragment (#...), which is never sent on the wire
/// 4. Keep path and query intact
pub fn parse_url(input: &str) -> Result<url::Url, UrlError> {
    let trimmed = input.trim();

    if trimmed.is_empty() {
        return Err(UrlError::Empty);
    }

    let mut parsed = url::Url::parse(trimmed).map_err(|e| UrlError::InvalidUrl(e.to_string()))?;

    match parsed.scheme() {
        "http" | "https" => {}
        scheme => return Err(UrlError::UnsupportedScheme(scheme.to_string())),
    }

    if parsed.host_str().is_none_or(str::is_empty) {
        return Err(UrlError::MissingHost);
    }

    parsed.set_fragment(None);

    Ok(parsed)
}
