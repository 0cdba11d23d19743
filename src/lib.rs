//! profscout - Faculty Directory Crawler
//!
//! Crawls a university faculty directory, follows its pagination, fetches the
//! professor profile pages it links to, extracts research interests and ranks
//! professors against a set of query interests.
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - [`config`] - Configuration management and settings
//! - [`crawler`] - Link classification, pagination walk and bounded fetching
//! - [`parser`] - Profile page text and name extraction
//! - [`llm`] - Research interest extraction (LLM and heuristic)
//! - [`matching`] - Interest similarity scoring and ranking
//! - [`models`] - Core data structures and types
//! - [`utils`] - Common utilities and helpers
//!
//! # Example
//!
//! ```no_run
//! use profscout::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::from_env()?;
//!     let crawler = Crawler::from_config(config)?;
//!     let result = crawler.crawl("https://cs.example.edu/people/faculty").await?;
//!
//!     let query = SimilarityQuery::new(["machine learning", "robotics"]);
//!     for m in Scorer::default().rank_result(&query, &result).iter().take(5) {
//!         println!("{:.2} {}", m.score, m.professor.source_url);
//!     }
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod crawler;
pub mod error;
pub mod llm;
pub mod matching;
pub mod models;
pub mod parser;
pub mod utils;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::Config;
    pub use crate::crawler::{CancelSignal, Crawler, LinkClassifier};
    pub use crate::error::{ClassifiedError, Error, ErrorCategory, Result};
    pub use crate::llm::{HeuristicInterestExtractor, InterestExtractor, LlmInterestExtractor};
    pub use crate::matching::Scorer;
    pub use crate::models::{
        CrawlError, CrawlErrorKind, CrawlResult, MatchResult, PageKind, PageUrl,
        ProfessorRecord, SimilarityQuery, WalkState,
    };
}

// Direct re-exports for convenience
pub use models::{CrawlResult, PageKind, ProfessorRecord};
