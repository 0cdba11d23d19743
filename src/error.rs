//! Unified error handling for the profscout crate
//!
//! This module provides a unified error type that consolidates the
//! domain-specific errors into a single `Error` enum, while keeping the
//! domain errors usable on their own.
//!
//! # Architecture
//!
//! - [`ClassifiedError`] - Retry and reporting interface of the per-page errors
//! - [`ErrorCategory`] - Which crawl error kind a per-page failure is recorded as
//! - [`Error`] - Unified error enum wrapping all domain-specific errors
//!
//! Only [`Error::FatalSeed`] and configuration problems ever surface from a
//! crawl; per-page failures are recorded in the crawl result instead.

use std::io;
use thiserror::Error;

use crate::models::CrawlErrorKind;
pub use crate::utils::error::{ExtractionError, FetchError, ParseError};

/// Retry and reporting classification shared by the per-page errors
pub trait ClassifiedError: std::error::Error {
    /// Check if this error is recoverable (can be retried)
    fn is_recoverable(&self) -> bool;

    /// Get the error category, which decides the crawl error kind recorded
    fn category(&self) -> ErrorCategory;
}

/// Classification of per-page errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Network-related errors (HTTP, timeout, throttling)
    Network,
    /// Responses that are not readable pages
    Parsing,
    /// Interest extraction collaborator errors
    Extraction,
}

impl From<ErrorCategory> for CrawlErrorKind {
    fn from(category: ErrorCategory) -> Self {
        match category {
            ErrorCategory::Network => Self::Transport,
            ErrorCategory::Parsing => Self::Parse,
            ErrorCategory::Extraction => Self::Extraction,
        }
    }
}

impl ClassifiedError for FetchError {
    fn is_recoverable(&self) -> bool {
        self.is_retryable()
    }

    fn category(&self) -> ErrorCategory {
        match self {
            Self::Decode(_) => ErrorCategory::Parsing,
            _ => ErrorCategory::Network,
        }
    }
}

impl ClassifiedError for ExtractionError {
    fn is_recoverable(&self) -> bool {
        matches!(self, Self::Request(_))
    }

    fn category(&self) -> ErrorCategory {
        ErrorCategory::Extraction
    }
}

/// Unified error type for the profscout crate
#[derive(Error, Debug)]
pub enum Error {
    /// The seed directory page could not be fetched, even after retries
    #[error("Seed URL unreachable: {url}: {reason}")]
    FatalSeed { url: String, reason: String },

    /// Fetch-specific errors
    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    /// Parse-specific errors
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    /// Interest extraction errors
    #[error("Extraction error: {0}")]
    Extraction(#[from] ExtractionError),

    /// Configuration errors
    #[error("Config error: {0}")]
    Config(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML configuration parse errors
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl Error {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}

/// Result type alias using the unified Error type
pub type Result<T> = std::result::Result<T, Error>;
