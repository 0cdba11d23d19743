//! Network-free interest extraction
//!
//! Looks for a "research interests" style label and splits whatever follows
//! it into phrases. Deterministic, so the crawl can be exercised end to end
//! without an extraction service.

use async_trait::async_trait;
use regex::Regex;
use std::sync::LazyLock;

use super::{clean_phrases, InterestExtractor};
use crate::utils::error::ExtractionError;
use crate::utils::truncate_chars;

static LABEL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(?:research\s+interests?|research\s+areas?|areas\s+of\s+(?:interest|research)|research\s+topics|interests)\b[ \t]*[:\-–]?[ \t]*",
    )
    .unwrap()
});

static SEPARATOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*[,;·|•\n]\s*|\s+and\s+").unwrap());

/// Characters considered after a label
const WINDOW_CHARS: usize = 400;

/// Label-and-split extractor
#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicInterestExtractor;

impl HeuristicInterestExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Interest phrases following the first label that has any
    ///
    /// # Examples
    ///
    /// ```
    /// use profscout::llm::HeuristicInterestExtractor;
    ///
    /// let interests = HeuristicInterestExtractor::new()
    ///     .parse("Research interests: databases, query optimization and storage.");
    /// assert_eq!(interests, vec!["databases", "query optimization", "storage"]);
    /// ```
    pub fn parse(&self, text: &str) -> Vec<String> {
        for label in LABEL.find_iter(text) {
            let window = truncate_chars(&text[label.end()..], WINDOW_CHARS);
            let end = [window.find("\n\n"), window.find(". "), window.strip_suffix('.').map(str::len)]
                .into_iter()
                .flatten()
                .min()
                .unwrap_or(window.len());

            let phrases = clean_phrases(
                SEPARATOR
                    .split(&window[..end])
                    .map(str::to_string)
                    .collect::<Vec<_>>(),
            );
            if !phrases.is_empty() {
                return phrases;
            }
        }
        Vec::new()
    }
}

#[async_trait]
impl InterestExtractor for HeuristicInterestExtractor {
    async fn extract(&self, page_text: &str) -> Result<Vec<String>, ExtractionError> {
        let interests = self.parse(page_text);
        if interests.is_empty() {
            return Err(ExtractionError::Empty);
        }
        Ok(interests)
    }
}
