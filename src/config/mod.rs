//! Configuration management for the profscout crawler
//!
//! This module handles loading and validating configuration from environment
//! variables and TOML files. Nothing here is global: a `Config` value is
//! passed explicitly into [`crate::crawler::Crawler`] and
//! [`crate::matching::Scorer`].

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::error::{Error, Result};
use crate::parser::DEFAULT_PROFESSOR_KEYWORDS;
use crate::utils::retry::RetryConfig;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Crawl budgets, concurrency and transport knobs
    pub crawler: CrawlerConfig,

    /// Link classification heuristics
    pub classifier: ClassifierConfig,

    /// Interest similarity scoring
    pub scoring: ScoringConfig,

    /// Interest extraction service
    pub extractor: ExtractorConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Crawler-specific configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CrawlerConfig {
    /// Maximum number of profile-candidate links kept and fetched
    pub max_links: usize,

    /// Maximum number of directory pages visited (seed included)
    pub max_pages: usize,

    /// Number of concurrent fetch workers
    pub workers: usize,

    /// Per-fetch timeout in seconds
    pub request_timeout_secs: u64,

    /// Retries after the first failed attempt
    pub max_retries: u32,

    /// Base backoff delay in milliseconds
    pub retry_base_delay_ms: u64,

    /// Backoff delay cap in milliseconds
    pub retry_max_delay_ms: u64,

    /// Politeness limit for the HTTP fetcher
    pub requests_per_second: u32,

    /// User agent string
    pub user_agent: String,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            max_links: 50,
            max_pages: 3,
            workers: 5,
            request_timeout_secs: 10,
            max_retries: 3,
            retry_base_delay_ms: 500,
            retry_max_delay_ms: 5_000,
            requests_per_second: 5,
            user_agent: format!("profscout/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// Link classification policy
///
/// All token lists are compared case-insensitively.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Anchor texts that mark a pagination control
    pub pagination_tokens: Vec<String>,

    /// Query keys that carry a page number
    pub page_query_keys: Vec<String>,

    /// Path segments that introduce an individual's page (`/people/jane-doe`)
    pub profile_markers: Vec<String>,

    /// Path segments that name a listing page (`/faculty`)
    pub listing_markers: Vec<String>,

    /// File extensions that are never pages
    pub skipped_extensions: Vec<String>,

    /// Words and phrases on a fetched profile page that mark an academic
    pub professor_keywords: Vec<String>,

    /// Profile pages scoring below this are not treated as professors
    pub min_professor_confidence: f64,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        let strings = |items: &[&str]| items.iter().map(|s| s.to_string()).collect();
        Self {
            pagination_tokens: strings(&["next", "next page", "下一页", "more", ">", "»", "›"]),
            page_query_keys: strings(&["page", "p", "pg", "paged"]),
            profile_markers: strings(&[
                "people",
                "faculty",
                "profile",
                "profiles",
                "person",
                "staff",
                "professor",
                "professors",
                "directory",
                "members",
                "researchers",
                "team",
            ]),
            listing_markers: strings(&[
                "people",
                "faculty",
                "staff",
                "directory",
                "members",
                "researchers",
                "team",
                "professors",
                "faculty-staff",
                "our-people",
            ]),
            skipped_extensions: strings(&[
                "pdf", "jpg", "jpeg", "png", "gif", "zip", "doc", "docx", "ppt", "pptx",
            ]),
            professor_keywords: strings(DEFAULT_PROFESSOR_KEYWORDS),
            min_professor_confidence: 0.3,
        }
    }
}

/// Interest similarity scoring policy
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// Weight of an exact (normalized) phrase match
    pub exact_weight: f64,

    /// Weight of a fuzzy match; must be strictly below `exact_weight`
    pub fuzzy_weight: f64,

    /// Minimum token Jaccard similarity for a fuzzy match
    pub fuzzy_threshold: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            exact_weight: 1.0,
            fuzzy_weight: 0.5,
            fuzzy_threshold: 0.5,
        }
    }
}

/// Interest extraction service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractorConfig {
    /// OpenAI-compatible API base URL
    pub endpoint: String,

    /// Model name
    pub model: String,

    /// API key; without one the heuristic extractor is used
    pub api_key: Option<String>,

    /// Request timeout in seconds
    pub timeout_secs: u64,

    /// Characters of page text sent for extraction
    pub max_input_chars: usize,

    /// Temperature for generation (0.0 - 1.0)
    pub temperature: f32,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            endpoint: String::from("https://api.openai.com/v1"),
            model: String::from("gpt-4o-mini"),
            api_key: None,
            timeout_secs: 60,
            max_input_chars: 3000,
            temperature: 0.1,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Log format (text, json)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: String::from("info"),
            format: String::from("text"),
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.parse::<T>().ok())
}

impl Config {
    /// Load configuration from environment variables, defaulting the rest
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.apply_env();
        Ok(config)
    }

    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Override fields from `PROFSCOUT_*` environment variables
    pub fn apply_env(&mut self) {
        let crawler = &mut self.crawler;
        if let Some(v) = env_parse("PROFSCOUT_MAX_LINKS") {
            crawler.max_links = v;
        }
        if let Some(v) = env_parse("PROFSCOUT_MAX_PAGES") {
            crawler.max_pages = v;
        }
        if let Some(v) = env_parse("PROFSCOUT_WORKERS") {
            crawler.workers = v;
        }
        if let Some(v) = env_parse("PROFSCOUT_REQUEST_TIMEOUT") {
            crawler.request_timeout_secs = v;
        }
        if let Some(v) = env_parse("PROFSCOUT_MAX_RETRIES") {
            crawler.max_retries = v;
        }
        if let Some(v) = env_parse("PROFSCOUT_RATE_LIMIT") {
            crawler.requests_per_second = v;
        }
        if let Ok(v) = std::env::var("PROFSCOUT_USER_AGENT") {
            crawler.user_agent = v;
        }

        if let Ok(v) = std::env::var("PROFSCOUT_LLM_ENDPOINT") {
            self.extractor.endpoint = v;
        }
        if let Ok(v) = std::env::var("PROFSCOUT_LLM_MODEL") {
            self.extractor.model = v;
        }
        if let Some(key) = std::env::var("PROFSCOUT_LLM_API_KEY")
            .or_else(|_| std::env::var("OPENAI_API_KEY"))
            .ok()
            .filter(|k| !k.trim().is_empty())
        {
            self.extractor.api_key = Some(key);
        }

        if let Ok(v) = std::env::var("PROFSCOUT_LOG_LEVEL") {
            self.logging.level = v;
        }
        if let Ok(v) = std::env::var("PROFSCOUT_LOG_FORMAT") {
            self.logging.format = v;
        }
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        let crawler = &self.crawler;
        if crawler.workers == 0 {
            return Err(Error::config("workers must be greater than 0"));
        }
        if crawler.max_pages == 0 {
            return Err(Error::config("max_pages must be greater than 0"));
        }
        if crawler.max_links == 0 {
            return Err(Error::config("max_links must be greater than 0"));
        }
        if crawler.request_timeout_secs == 0 {
            return Err(Error::config("request_timeout_secs must be greater than 0"));
        }
        if crawler.requests_per_second == 0 {
            return Err(Error::config("requests_per_second must be greater than 0"));
        }

        let scoring = &self.scoring;
        if !(scoring.exact_weight > 0.0 && scoring.exact_weight <= 1.0) {
            return Err(Error::config("exact_weight must be in (0, 1]"));
        }
        if scoring.fuzzy_weight < 0.0 || scoring.fuzzy_weight >= scoring.exact_weight {
            return Err(Error::config(
                "fuzzy_weight must be non-negative and below exact_weight",
            ));
        }
        if !(scoring.fuzzy_threshold > 0.0 && scoring.fuzzy_threshold <= 1.0) {
            return Err(Error::config("fuzzy_threshold must be in (0, 1]"));
        }

        let confidence = self.classifier.min_professor_confidence;
        if !(0.0..=1.0).contains(&confidence) {
            return Err(Error::config("min_professor_confidence must be in [0, 1]"));
        }

        if self.extractor.max_input_chars == 0 {
            return Err(Error::config("max_input_chars must be greater than 0"));
        }

        Ok(())
    }

    /// Get request timeout as Duration
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.crawler.request_timeout_secs)
    }

    /// Retry policy derived from the crawler settings
    #[must_use]
    pub fn retry(&self) -> RetryConfig {
        RetryConfig::with_delays(
            self.crawler.max_retries,
            self.crawler.retry_base_delay_ms,
            self.crawler.retry_max_delay_ms,
        )
    }
}
