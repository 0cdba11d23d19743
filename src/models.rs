// Core data structures for the profscout crawler

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use uuid::Uuid;

pub use crate::crawler::url::PageUrl;

/// What a discovered link points at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PageKind {
    /// A listing of people
    Directory,
    /// One person's page
    Profile,
    /// A control that advances a listing
    Pagination,
    /// Anything else
    Unrelated,
}

impl PageKind {
    /// Get string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Directory => "directory",
            Self::Profile => "profile",
            Self::Pagination => "pagination",
            Self::Unrelated => "unrelated",
        }
    }

    /// Directory and pagination pages are both walked as listings
    pub fn is_listing(&self) -> bool {
        matches!(self, Self::Directory | Self::Pagination)
    }
}

impl std::fmt::Display for PageKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A unit of fetch work
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlJob {
    pub url: PageUrl,
    pub kind: PageKind,
    pub discovered_from: PageUrl,
    pub depth: u32,
}

impl CrawlJob {
    /// The seed job: a directory page discovered from itself at depth 0
    pub fn seed(url: PageUrl) -> Self {
        Self {
            discovered_from: url.clone(),
            url,
            kind: PageKind::Directory,
            depth: 0,
        }
    }

    /// A job for a link found on `parent`'s page
    pub fn discovered(url: PageUrl, kind: PageKind, parent: &CrawlJob) -> Self {
        Self {
            url,
            kind,
            discovered_from: parent.url.clone(),
            depth: parent.depth + 1,
        }
    }

    pub fn is_seed(&self) -> bool {
        self.depth == 0 && self.kind == PageKind::Directory
    }
}

/// One professor's extracted research interests
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfessorRecord {
    pub source_url: PageUrl,
    /// Display name read from the profile page, when present
    #[serde(default)]
    pub name: Option<String>,
    /// The page text handed to the interest extractor
    pub raw_interest_text: String,
    /// Interest phrases in extraction order
    pub interests: Vec<String>,
    /// How much the page looks like an academic's, in `[0, 1]`
    #[serde(default)]
    pub confidence: f64,
}

/// Which stage a per-job failure happened in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CrawlErrorKind {
    Transport,
    Parse,
    Extraction,
}

/// A soft, per-job failure recorded in the crawl result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrawlError {
    pub url: PageUrl,
    pub page_kind: PageKind,
    pub kind: CrawlErrorKind,
    pub message: String,
    pub attempts: u32,
}

/// Pagination walker state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WalkState {
    Start,
    Walking,
    /// No unvisited pagination links remain
    Exhausted,
    /// The page budget cut off further pagination
    BudgetReached,
}

/// Everything one crawl session produced
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlResult {
    pub session_id: Uuid,
    pub seed_url: PageUrl,
    pub directory_pages_visited: usize,
    pub profile_links_found: usize,
    /// Appended in completion order, which is not deterministic
    pub professors: Vec<ProfessorRecord>,
    pub errors: Vec<CrawlError>,
    /// Profile-classified pages that did not look like a professor's
    #[serde(default)]
    pub non_professor_pages: Vec<PageUrl>,
    pub walk_state: WalkState,
    /// Set when the run stopped on a cancellation signal
    pub cancelled: bool,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl CrawlResult {
    /// An empty result for a session starting now
    pub fn new(session_id: Uuid, seed_url: PageUrl) -> Self {
        let now = Utc::now();
        Self {
            session_id,
            seed_url,
            directory_pages_visited: 0,
            profile_links_found: 0,
            professors: Vec::new(),
            errors: Vec::new(),
            non_professor_pages: Vec::new(),
            walk_state: WalkState::Start,
            cancelled: false,
            started_at: now,
            finished_at: now,
        }
    }

    /// Fold a scheduler batch into this result
    pub fn merge(&mut self, batch: CrawlResult) {
        self.directory_pages_visited = self.directory_pages_visited.max(batch.directory_pages_visited);
        self.profile_links_found = self.profile_links_found.max(batch.profile_links_found);
        self.professors.extend(batch.professors);
        self.errors.extend(batch.errors);
        self.non_professor_pages.extend(batch.non_professor_pages);
        self.walk_state = batch.walk_state;
        self.cancelled |= batch.cancelled;
        self.finished_at = batch.finished_at;
    }

    /// Look up a professor by page URL
    pub fn professor(&self, url: &PageUrl) -> Option<&ProfessorRecord> {
        self.professors.iter().find(|p| &p.source_url == url)
    }

    /// Errors recorded for one stage
    pub fn errors_of(&self, kind: CrawlErrorKind) -> impl Iterator<Item = &CrawlError> {
        self.errors.iter().filter(move |e| e.kind == kind)
    }
}

/// A user's declared interests
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimilarityQuery {
    pub query_interests: BTreeSet<String>,
}

impl SimilarityQuery {
    pub fn new<I, S>(interests: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            query_interests: interests.into_iter().map(Into::into).collect(),
        }
    }

    /// Build from a comma/semicolon separated list
    ///
    /// # Examples
    ///
    /// ```
    /// use profscout::models::SimilarityQuery;
    ///
    /// let query = SimilarityQuery::parse_list("machine learning; databases, ");
    /// assert_eq!(query.query_interests.len(), 2);
    /// ```
    pub fn parse_list(list: &str) -> Self {
        Self::new(
            list.split([',', ';', '\n'])
                .map(str::trim)
                .filter(|s| !s.is_empty()),
        )
    }

    pub fn is_empty(&self) -> bool {
        self.query_interests.is_empty()
    }
}

/// Similarity of one professor to a query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    pub professor: ProfessorRecord,
    /// In `[0, 1]`
    pub score: f64,
    /// Normalized query terms matched exactly
    pub matched_terms: BTreeSet<String>,
    /// Normalized query terms matched only by the fuzzy pass
    pub fuzzy_terms: BTreeSet<String>,
}
