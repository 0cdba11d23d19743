//! Page fetching
//!
//! The crawl core only sees the [`Fetcher`] capability: a URL in, HTML or a
//! [`FetchError`] out. [`HttpFetcher`] is the production implementation with:
//! - per-request timeout and gzip
//! - a fixed, identifying User-Agent
//! - politeness rate limiting with governor
//! - charset detection (Content-Type, then `<meta charset>`, then UTF-8)
//! - binary media types (PDF, images) rejected as [`FetchError::Decode`]
//!
//! Retries are not done here; the fetch scheduler wraps every call in the
//! shared retry policy.

use async_trait::async_trait;
use encoding_rs::{Encoding, UTF_8};
use governor::{
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
    Quota, RateLimiter,
};
use regex::bytes::Regex;
use reqwest::{
    header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, CONTENT_TYPE},
    Client, Response,
};
use std::num::NonZeroU32;
use std::sync::LazyLock;
use std::time::Duration;

use crate::config::CrawlerConfig;
use crate::crawler::url::PageUrl;
use crate::utils::error::FetchError;

/// Bytes scanned for a `<meta charset>` declaration
const META_SNIFF_BYTES: usize = 1024;

static META_CHARSET: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<meta[^>]+charset\s*=\s*["']?\s*([a-z0-9_\-:.]+)"#).unwrap()
});

/// Capability to retrieve a page's HTML
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Fetch one page, making a single attempt
    async fn fetch(&self, url: &PageUrl) -> Result<String, FetchError>;
}

/// reqwest-backed fetcher
pub struct HttpFetcher {
    /// HTTP client with configured timeout and compression
    client: Client,

    /// Rate limiter to control request frequency
    rate_limiter: RateLimiter<NotKeyed, InMemoryState, DefaultClock>,
}

impl HttpFetcher {
    /// Create a fetcher from crawler settings
    ///
    /// # Errors
    ///
    /// Returns `FetchError::Http` if the HTTP client cannot be created
    pub fn new(config: &CrawlerConfig) -> Result<Self, FetchError> {
        Self::with_config(
            config.requests_per_second,
            Duration::from_secs(config.request_timeout_secs),
            &config.user_agent,
        )
    }

    /// Create a fetcher with explicit settings
    ///
    /// # Arguments
    ///
    /// * `requests_per_second` - Maximum number of requests per second
    /// * `timeout` - Request timeout duration
    /// * `user_agent` - User-Agent header sent with every request
    ///
    /// # Errors
    ///
    /// Returns `FetchError::Http` if the HTTP client cannot be created
    pub fn with_config(
        requests_per_second: u32,
        timeout: Duration,
        user_agent: &str,
    ) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(timeout)
            .gzip(true)
            .user_agent(user_agent)
            .default_headers(default_headers())
            .build()?;

        let rate = NonZeroU32::new(requests_per_second).unwrap_or(NonZeroU32::MIN);
        let rate_limiter = RateLimiter::direct(Quota::per_second(rate));

        Ok(Self {
            client,
            rate_limiter,
        })
    }

    /// Map a non-success status onto the error taxonomy
    fn status_error(status: u16) -> FetchError {
        if status == 429 || (500..600).contains(&status) {
            FetchError::ServerError(status)
        } else {
            FetchError::ClientError(status)
        }
    }

    async fn decode_response(response: Response) -> Result<String, FetchError> {
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .unwrap_or_default();

        if is_binary_content_type(&content_type) {
            return Err(FetchError::Decode(format!("not an HTML page: {content_type}")));
        }

        let bytes = response.bytes().await?;

        Ok(decode_bytes(&bytes, &content_type))
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &PageUrl) -> Result<String, FetchError> {
        self.rate_limiter.until_ready().await;

        tracing::debug!(url = %url, "Fetching page");

        let response = self
            .client
            .get(url.as_str())
            .send()
            .await
            .map_err(|e| if e.is_timeout() { FetchError::Timeout } else { FetchError::Http(e) })?;

        let status = response.status();
        if !status.is_success() {
            return Err(Self::status_error(status.as_u16()));
        }

        Self::decode_response(response).await
    }
}

fn default_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        ACCEPT,
        HeaderValue::from_static("text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8"),
    );
    headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9,*;q=0.5"));
    headers
}

/// Media types that can never be decoded into a page
fn is_binary_content_type(content_type: &str) -> bool {
    let media = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();

    ["image/", "audio/", "video/", "font/"]
        .iter()
        .any(|prefix| media.starts_with(prefix))
        || matches!(
            media.as_str(),
            "application/pdf" | "application/zip" | "application/octet-stream"
        )
}

/// Charset label from a Content-Type header value
fn header_charset(content_type: &str) -> Option<&'static Encoding> {
    content_type
        .split(';')
        .filter_map(|part| part.trim().split_once('='))
        .find(|(key, _)| key.trim().eq_ignore_ascii_case("charset"))
        .and_then(|(_, value)| Encoding::for_label(value.trim().trim_matches('"').as_bytes()))
}

/// Charset declared by a `<meta>` tag near the start of the document
fn meta_charset(bytes: &[u8]) -> Option<&'static Encoding> {
    let head = &bytes[..bytes.len().min(META_SNIFF_BYTES)];
    META_CHARSET
        .captures(head)
        .and_then(|caps| caps.get(1))
        .and_then(|label| Encoding::for_label(label.as_bytes()))
}

/// Decode a response body
///
/// Strategies, in order:
/// 1. charset from the Content-Type header
/// 2. `<meta charset>` / `http-equiv` declaration in the first kilobyte
/// 3. UTF-8, replacing invalid sequences
///
/// # Examples
///
/// ```
/// use profscout::crawler::fetcher::decode_bytes;
///
/// let text = decode_bytes("<p>Zürich</p>".as_bytes(), "text/html; charset=utf-8");
/// assert_eq!(text, "<p>Zürich</p>");
/// ```
pub fn decode_bytes(bytes: &[u8], content_type: &str) -> String {
    let encoding = header_charset(content_type)
        .or_else(|| meta_charset(bytes))
        .unwrap_or(UTF_8);

    let (text, actual, had_errors) = encoding.decode(bytes);
    if had_errors {
        tracing::debug!(encoding = actual.name(), "Replaced malformed byte sequences while decoding");
    }
    text.into_owned()
}
