//! Interest similarity scoring
//!
//! Interest phrases are compared after normalization: lowercase, punctuation
//! and hyphens to spaces, whitespace collapsed, each word folded to its
//! singular form. A query term then matches a professor either exactly, or
//! fuzzily when one of these holds against some professor interest:
//!
//! - one phrase's words appear contiguously inside the other's
//!   (`learning` / `machine learning`)
//! - one phrase is the acronym of the other (`ml` / `machine learning`)
//! - word-set Jaccard similarity reaches `fuzzy_threshold`
//!
//! ```text
//! score = (exact_weight * |exact| + fuzzy_weight * |fuzzy|) / |query|
//! ```
//!
//! clamped to `[0, 1]`. Each query term counts once, exact taking priority,
//! so the score depends only on the query size and the two evidence sets.

use std::collections::{BTreeSet, HashSet};

use crate::config::ScoringConfig;
use crate::models::{CrawlResult, MatchResult, ProfessorRecord, SimilarityQuery};

/// Singulars ending in `-che` that take a plain `-s` plural
const CHE_SINGULARS: &[&str] = &["cache", "niche", "headache", "avalanche", "moustache"];

/// Fold a single word to its singular form
fn singular(word: &str) -> String {
    if word.chars().count() <= 3 || !word.is_ascii() {
        return word.to_string();
    }
    if let Some(stem) = word.strip_suffix("ies") {
        return format!("{stem}y");
    }
    if let Some(stem) = word.strip_suffix("sses") {
        return format!("{stem}ss");
    }
    if let Some(stem) = word.strip_suffix('s') {
        if CHE_SINGULARS.iter().any(|s| stem.ends_with(s)) {
            return stem.to_string();
        }
    }
    for end in ["ches", "shes", "xes", "zzes"] {
        if let Some(stem) = word.strip_suffix(end) {
            return format!("{stem}{}", &end[..end.len() - 2]);
        }
    }
    if word.ends_with('s') && !["ss", "us", "is"].iter().any(|end| word.ends_with(end)) {
        return word[..word.len() - 1].to_string();
    }
    word.to_string()
}

/// Normalize an interest phrase for comparison
///
/// # Examples
///
/// ```
/// use profscout::matching::normalize_phrase;
///
/// assert_eq!(normalize_phrase("  Distributed-Systems "), "distributed system");
/// assert_eq!(normalize_phrase("Databases."), "database");
/// assert_eq!(normalize_phrase("C++"), "c++");
/// ```
pub fn normalize_phrase(phrase: &str) -> String {
    phrase
        .to_lowercase()
        .split(|c: char| c.is_whitespace() || matches!(c, '-' | '_' | '/' | ',' | ';' | ':'))
        .map(|word| word.trim_matches(|c: char| !c.is_alphanumeric() && c != '+' && c != '#'))
        .filter(|word| !word.is_empty())
        .map(singular)
        .collect::<Vec<_>>()
        .join(" ")
}

fn normalize_set<'a, I>(phrases: I) -> BTreeSet<String>
where
    I: IntoIterator<Item = &'a String>,
{
    phrases
        .into_iter()
        .map(|p| normalize_phrase(p))
        .filter(|p| !p.is_empty())
        .collect()
}

fn contains_run(haystack: &[&str], needle: &[&str]) -> bool {
    !needle.is_empty()
        && needle.len() <= haystack.len()
        && haystack.windows(needle.len()).any(|window| window == needle)
}

fn is_acronym(short: &[&str], long: &[&str]) -> bool {
    if short.len() != 1 || long.len() < 2 {
        return false;
    }
    let initials: String = long.iter().filter_map(|w| w.chars().next()).collect();
    short[0] == initials
}

/// Scores professors against a query
#[derive(Debug, Clone)]
pub struct Scorer {
    config: ScoringConfig,
}

impl Default for Scorer {
    fn default() -> Self {
        Self::new(ScoringConfig::default())
    }
}

impl Scorer {
    pub fn new(config: ScoringConfig) -> Self {
        Self { config }
    }

    /// Whether two normalized phrases are a near match
    fn fuzzy_match(&self, a: &str, b: &str) -> bool {
        let a_words: Vec<&str> = a.split(' ').collect();
        let b_words: Vec<&str> = b.split(' ').collect();

        if contains_run(&a_words, &b_words) || contains_run(&b_words, &a_words) {
            return true;
        }
        if is_acronym(&a_words, &b_words) || is_acronym(&b_words, &a_words) {
            return true;
        }

        let a_set: HashSet<&str> = a_words.iter().copied().collect();
        let b_set: HashSet<&str> = b_words.iter().copied().collect();
        let union = a_set.union(&b_set).count();
        if union == 0 {
            return false;
        }
        let jaccard = a_set.intersection(&b_set).count() as f64 / union as f64;
        jaccard >= self.config.fuzzy_threshold
    }

    /// Score one professor against a query
    ///
    /// # Examples
    ///
    /// ```
    /// use profscout::matching::Scorer;
    /// use profscout::models::{PageUrl, ProfessorRecord, SimilarityQuery};
    ///
    /// let professor = ProfessorRecord {
    ///     source_url: PageUrl::parse("https://example.edu/people/jane-doe").unwrap(),
    ///     name: None,
    ///     raw_interest_text: String::new(),
    ///     interests: vec!["Machine Learning".into(), "distributed systems".into()],
    ///     confidence: 1.0,
    /// };
    /// let query = SimilarityQuery::new(["machine learning", "databases"]);
    ///
    /// let result = Scorer::default().score(&query, &professor);
    /// assert_eq!(result.score, 0.5);
    /// assert!(result.matched_terms.contains("machine learning"));
    /// ```
    pub fn score(&self, query: &SimilarityQuery, professor: &ProfessorRecord) -> MatchResult {
        let query_terms = normalize_set(&query.query_interests);
        let interests = normalize_set(&professor.interests);

        let mut matched_terms = BTreeSet::new();
        let mut fuzzy_terms = BTreeSet::new();

        for term in &query_terms {
            if interests.contains(term) {
                matched_terms.insert(term.clone());
            } else if interests.iter().any(|interest| self.fuzzy_match(term, interest)) {
                fuzzy_terms.insert(term.clone());
            }
        }

        let score = if query_terms.is_empty() {
            0.0
        } else {
            let weighted = self.config.exact_weight * matched_terms.len() as f64
                + self.config.fuzzy_weight * fuzzy_terms.len() as f64;
            (weighted / query_terms.len() as f64).clamp(0.0, 1.0)
        };

        MatchResult {
            professor: professor.clone(),
            score,
            matched_terms,
            fuzzy_terms,
        }
    }

    /// Score and sort professors, best first
    ///
    /// The sort is stable, so ties keep the input (discovery) order.
    pub fn rank(&self, query: &SimilarityQuery, professors: &[ProfessorRecord]) -> Vec<MatchResult> {
        let mut results: Vec<MatchResult> =
            professors.iter().map(|p| self.score(query, p)).collect();
        results.sort_by(|a, b| b.score.total_cmp(&a.score));
        results
    }

    /// Rank every professor of a crawl
    pub fn rank_result(&self, query: &SimilarityQuery, result: &CrawlResult) -> Vec<MatchResult> {
        self.rank(query, &result.professors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PageUrl;

    fn professor(slug: &str, interests: &[&str]) -> ProfessorRecord {
        ProfessorRecord {
            source_url: PageUrl::parse(&format!("https://example.edu/people/{slug}")).unwrap(),
            name: None,
            raw_interest_text: String::new(),
            interests: interests.iter().map(|s| s.to_string()).collect(),
            confidence: 1.0,
        }
    }

    #[test]
    fn test_singular_folding() {
        assert_eq!(singular("studies"), "study");
        assert_eq!(singular("classes"), "class");
        assert_eq!(singular("systems"), "system");
        assert_eq!(singular("analysis"), "analysis");
        assert_eq!(singular("corpus"), "corpus");
        assert_eq!(singular("gas"), "gas");
        assert_eq!(singular("processes"), "process");
        assert_eq!(singular("approaches"), "approach");
        assert_eq!(singular("meshes"), "mesh");
        assert_eq!(singular("indexes"), "index");
        assert_eq!(singular("caches"), "cache");
        assert_eq!(singular("search"), "search");
    }

    #[test]
    fn test_exact_match_case_and_plural() {
        let query = SimilarityQuery::new(["Database"]);
        let result = Scorer::default().score(&query, &professor("a", &["DATABASES"]));
        assert_eq!(result.score, 1.0);
        assert_eq!(result.matched_terms.len(), 1);
        assert!(result.fuzzy_terms.is_empty());
    }

    #[test]
    fn test_acronym_is_fuzzy() {
        let query = SimilarityQuery::new(["ML"]);
        let result = Scorer::default().score(&query, &professor("a", &["Machine Learning"]));
        assert_eq!(result.score, 0.5);
        assert!(result.matched_terms.is_empty());
        assert!(result.fuzzy_terms.contains("ml"));
    }

    #[test]
    fn test_containment_is_fuzzy() {
        let query = SimilarityQuery::new(["learning"]);
        let result = Scorer::default().score(&query, &professor("a", &["deep learning"]));
        assert!(result.fuzzy_terms.contains("learning"));
    }

    #[test]
    fn test_jaccard_threshold() {
        let scorer = Scorer::default();
        // {graph, neural, network} vs {neural, network, pruning}: 2/4
        assert!(scorer.fuzzy_match("graph neural network", "neural network pruning"));
        // {quantum, computing} vs {cloud, computing}: 1/3
        assert!(!scorer.fuzzy_match("quantum computing", "cloud computing"));
    }

    #[test]
    fn test_exact_outweighs_fuzzy() {
        let scorer = Scorer::default();
        let query = SimilarityQuery::new(["machine learning"]);
        let exact = scorer.score(&query, &professor("a", &["machine learning"]));
        let fuzzy = scorer.score(&query, &professor("b", &["ML"]));
        assert!(exact.score > fuzzy.score);
        assert!(fuzzy.score > 0.0);
    }

    #[test]
    fn test_empty_inputs_score_zero() {
        let scorer = Scorer::default();
        let empty_query = SimilarityQuery::default();
        let result = scorer.score(&empty_query, &professor("a", &["robotics"]));
        assert_eq!(result.score, 0.0);
        assert!(result.matched_terms.is_empty());

        let query = SimilarityQuery::new(["robotics"]);
        assert_eq!(scorer.score(&query, &professor("b", &[])).score, 0.0);
    }

    #[test]
    fn test_rank_is_stable() {
        let scorer = Scorer::default();
        let professors = vec![
            professor("first", &["vision"]),
            professor("best", &["robotics"]),
            professor("second", &["vision"]),
        ];
        let query = SimilarityQuery::new(["robotics"]);

        let ranked = scorer.rank(&query, &professors);
        let order: Vec<_> = ranked
            .iter()
            .map(|m| m.professor.source_url.segments().pop().unwrap())
            .collect();
        assert_eq!(order, vec!["best", "first", "second"]);
    }
}
