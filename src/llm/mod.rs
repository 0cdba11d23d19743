//! Research-interest extraction
//!
//! The crawler depends only on the [`InterestExtractor`] capability. Two
//! implementations are provided:
//! - [`LlmInterestExtractor`]: an OpenAI-compatible chat completions call
//! - [`HeuristicInterestExtractor`]: deterministic label-and-split parsing,
//!   used offline and in tests

pub mod heuristic;

pub use heuristic::HeuristicInterestExtractor;

use async_trait::async_trait;
use regex::Regex;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::LazyLock;
use std::time::Duration;

use crate::config::ExtractorConfig;
use crate::utils::error::ExtractionError;
use crate::utils::truncate_chars;

/// Capability that turns profile text into interest phrases
#[async_trait]
pub trait InterestExtractor: Send + Sync {
    /// Extract interest phrases in the order they were found
    ///
    /// An extractor that finds nothing returns `ExtractionError::Empty`.
    async fn extract(&self, page_text: &str) -> Result<Vec<String>, ExtractionError>;
}

const SYSTEM_PROMPT: &str = "You extract a professor's research interests from their webpage. \
Reply with a JSON array of short research-interest phrases (two to six words each), \
most important first. Do not add commentary.";

/// Leading bullet or `1.` / `2)` numbering
static LIST_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(?:[-*•]|\d{1,2}[.)])\s*").unwrap());

/// Chat completions request
#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

/// Chat completions response
#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    #[serde(default)]
    content: Option<String>,
}

/// `{"interests": [...]}` reply shape
#[derive(Debug, Deserialize)]
struct InterestList {
    #[serde(default)]
    interests: Vec<String>,
}

/// OpenAI-compatible interest extractor
pub struct LlmInterestExtractor {
    client: Client,
    config: ExtractorConfig,
}

impl LlmInterestExtractor {
    /// Create an extractor from configuration
    ///
    /// # Errors
    ///
    /// Returns `ExtractionError::Request` if the HTTP client cannot be created
    pub fn new(config: ExtractorConfig) -> Result<Self, ExtractionError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { client, config })
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.config.endpoint.trim_end_matches('/'))
    }

    fn build_prompt(text: &str) -> String {
        format!(
            "Based on the following professor's webpage content, list their research interests \
             as a JSON array of strings.\n\n{text}"
        )
    }

    async fn complete(&self, text: &str) -> Result<String, ExtractionError> {
        let prompt = Self::build_prompt(text);
        let request = ChatRequest {
            model: &self.config.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: &prompt,
                },
            ],
            temperature: self.config.temperature,
        };

        let mut builder = self.client.post(self.endpoint()).json(&request);
        if let Some(key) = &self.config.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder.send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ExtractionError::Request(format!(
                "{status}: {}",
                truncate_chars(&body, 200)
            )));
        }

        let chat: ChatResponse = response
            .json()
            .await
            .map_err(|e| ExtractionError::InvalidResponse(e.to_string()))?;

        chat.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| ExtractionError::InvalidResponse("no completion choices".to_string()))
    }
}

#[async_trait]
impl InterestExtractor for LlmInterestExtractor {
    async fn extract(&self, page_text: &str) -> Result<Vec<String>, ExtractionError> {
        let text = truncate_chars(page_text.trim(), self.config.max_input_chars);
        if text.is_empty() {
            return Err(ExtractionError::Empty);
        }

        let reply = self.complete(text).await?;
        tracing::debug!(reply = %truncate_chars(&reply, 200), "Interest extraction reply");

        let interests = parse_interest_reply(&reply);
        if interests.is_empty() {
            return Err(ExtractionError::Empty);
        }
        Ok(interests)
    }
}

/// Pull JSON out of a fenced block or surrounding prose
fn extract_raw_json(text: &str) -> &str {
    if let Some(start) = text.find("```json") {
        if let Some(end) = text[start + 7..].find("```") {
            return text[start + 7..start + 7 + end].trim();
        }
    }

    if let Some(start) = text.find("```") {
        let after_start = &text[start + 3..];
        let content_start = after_start.find('\n').map_or(0, |i| i + 1);
        if let Some(end) = after_start[content_start..].find("```") {
            return after_start[content_start..content_start + end].trim();
        }
    }

    for (open, close) in [('[', ']'), ('{', '}')] {
        if let (Some(start), Some(end)) = (text.find(open), text.rfind(close)) {
            if end > start {
                return &text[start..=end];
            }
        }
    }

    text.trim()
}

/// Parse a completion into interest phrases
///
/// Accepts a JSON array, a `{"interests": [...]}` object (either possibly
/// fenced), or falls back to bullet / comma separated text.
pub fn parse_interest_reply(reply: &str) -> Vec<String> {
    let json = extract_raw_json(reply);

    let parsed = serde_json::from_str::<Vec<String>>(json)
        .ok()
        .or_else(|| {
            serde_json::from_str::<InterestList>(json)
                .ok()
                .map(|list| list.interests)
        });

    let phrases = match parsed {
        Some(list) => list,
        None => reply
            .lines()
            .flat_map(|line| line.split([',', ';']))
            .map(str::to_string)
            .collect(),
    };

    clean_phrases(phrases)
}

/// Trim bullets and numbering, drop empties, dedupe case-insensitively
pub(crate) fn clean_phrases<I>(phrases: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let mut seen = HashSet::new();
    phrases
        .into_iter()
        .map(|p| {
            let p = LIST_MARKER.replace(&p, "");
            let p = p.trim_matches(|c: char| !c.is_alphanumeric() && c != '+' && c != '#');
            crate::utils::normalize_whitespace(p)
        })
        .filter(|p| p.chars().count() >= 2 && p.split_whitespace().count() <= 8)
        .filter(|p| seen.insert(p.to_lowercase()))
        .collect()
}
