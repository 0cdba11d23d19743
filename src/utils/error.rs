//! Error types for the profscout crawler
//!
//! This module defines the domain error types raised by the fetcher,
//! the URL/HTML layer and the interest extractor.

use thiserror::Error;

/// Errors that can occur while fetching a page
#[derive(Error, Debug)]
pub enum FetchError {
    /// HTTP request error (connection refused, DNS, TLS, body read)
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Server-side or throttling status (429, 5xx)
    #[error("Server error: {0}")]
    ServerError(u16),

    /// Client-side status that will not change on retry (404, 403, ...)
    #[error("Client error: {0}")]
    ClientError(u16),

    /// Request exceeded the per-fetch timeout
    #[error("Request timeout")]
    Timeout,

    /// Content decoding error
    #[error("Decoding error: {0}")]
    Decode(String),
}

impl FetchError {
    /// Whether retrying the same request may succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Http(e) => e.is_timeout() || e.is_connect() || e.is_request() || e.is_body(),
            Self::ServerError(status) => matches!(status, 429 | 500 | 502 | 503 | 504),
            Self::Timeout => true,
            Self::ClientError(_) | Self::Decode(_) => false,
        }
    }
}

/// Errors that can occur while parsing URLs and HTML
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// The string is not a parsable absolute URL
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Only http and https pages are crawled
    #[error("Unsupported URL scheme: {0}")]
    UnsupportedScheme(String),

    /// URL has no host component
    #[error("URL has no host: {0}")]
    MissingHost(String),
}

/// Errors raised by an interest extraction collaborator
#[derive(Error, Debug)]
pub enum ExtractionError {
    /// The extraction service could not be reached or answered non-2xx
    #[error("Extraction request failed: {0}")]
    Request(String),

    /// The service answered but produced no usable content
    #[error("Extraction returned no interests")]
    Empty,

    /// The response could not be interpreted
    #[error("Invalid extraction response: {0}")]
    InvalidResponse(String),
}

impl From<reqwest::Error> for ExtractionError {
    fn from(err: reqwest::Error) -> Self {
        Self::Request(err.to_string())
    }
}
