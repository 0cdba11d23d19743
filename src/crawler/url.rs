//! URL normalization for crawl deduplication
//!
//! Every URL that enters the crawler goes through [`PageUrl`], which makes it
//! absolute and canonical so that equality can be used for deduplication:
//!
//! - scheme and host are lowercased, default ports dropped
//! - the fragment is stripped
//! - an empty query (`?`) is dropped
//! - a trailing slash on a non-root path is removed
//!
//! Normalization only decides identity. The URL as written is kept alongside
//! and is what relative references resolve against, since `/people/` and
//! `/people` resolve `jane-doe` differently.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use url::Url;

use crate::utils::error::ParseError;

/// A normalized, absolute http(s) URL
///
/// Equality, ordering and hashing use the normalized form only.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PageUrl {
    url: Url,
    /// As written, fragment removed; the base for relative references
    given: Url,
}

impl PageUrl {
    /// Parse and normalize an absolute URL
    ///
    /// # Errors
    ///
    /// Returns `ParseError` if the input is not an absolute http(s) URL
    ///
    /// # Examples
    ///
    /// ```
    /// use profscout::crawler::url::PageUrl;
    ///
    /// let url = PageUrl::parse("HTTPS://CS.Example.EDU/people/#top").unwrap();
    /// assert_eq!(url.as_str(), "https://cs.example.edu/people");
    /// ```
    pub fn parse(input: &str) -> Result<Self, ParseError> {
        let url = Url::parse(input.trim()).map_err(|_| ParseError::InvalidUrl(input.to_string()))?;
        Self::from_url(url)
    }

    /// Normalize an already parsed URL
    pub fn from_url(mut url: Url) -> Result<Self, ParseError> {
        match url.scheme() {
            "http" | "https" => {}
            other => return Err(ParseError::UnsupportedScheme(other.to_string())),
        }

        if url.host_str().map_or(true, str::is_empty) {
            return Err(ParseError::MissingHost(url.to_string()));
        }

        url.set_fragment(None);
        let given = url.clone();

        if url.query() == Some("") {
            url.set_query(None);
        }

        let path = url.path();
        if path.len() > 1 && path.ends_with('/') {
            let trimmed = path.trim_end_matches('/').to_string();
            url.set_path(&trimmed);
        }

        Ok(Self { url, given })
    }

    /// Resolve a (possibly relative) reference against this URL as written
    ///
    /// # Examples
    ///
    /// ```
    /// use profscout::crawler::url::PageUrl;
    ///
    /// let base = PageUrl::parse("https://cs.example.edu/people/").unwrap();
    /// let joined = base.join("jane-doe/").unwrap();
    /// assert_eq!(joined.as_str(), "https://cs.example.edu/people/jane-doe");
    /// ```
    pub fn join(&self, reference: &str) -> Result<Self, ParseError> {
        let joined = self
            .given
            .join(reference.trim())
            .map_err(|_| ParseError::InvalidUrl(reference.to_string()))?;
        Self::from_url(joined)
    }

    /// The canonical string form
    pub fn as_str(&self) -> &str {
        self.url.as_str()
    }

    /// The URL as it was written, trailing slash included
    pub fn base(&self) -> &Url {
        &self.given
    }

    /// Host with a leading `www.` removed, used for same-site checks
    pub fn site(&self) -> &str {
        let host = self.url.host_str().unwrap_or_default();
        host.strip_prefix("www.").unwrap_or(host)
    }

    /// Whether both URLs belong to the same site
    pub fn same_site(&self, other: &PageUrl) -> bool {
        self.site() == other.site()
    }

    /// Non-empty, lowercased path segments
    pub fn segments(&self) -> Vec<String> {
        self.url
            .path_segments()
            .map(|segments| {
                segments
                    .filter(|s| !s.is_empty())
                    .map(str::to_lowercase)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Lowercased keys of the query string
    pub fn query_keys(&self) -> Vec<String> {
        self.url
            .query_pairs()
            .map(|(key, _)| key.to_lowercase())
            .collect()
    }

    /// Lowercased extension of the last path segment, if any
    pub fn extension(&self) -> Option<String> {
        let last = self.segments().pop()?;
        let (stem, ext) = last.rsplit_once('.')?;
        if stem.is_empty() || ext.is_empty() {
            return None;
        }
        Some(ext.to_string())
    }
}

impl PartialEq for PageUrl {
    fn eq(&self, other: &Self) -> bool {
        self.url == other.url
    }
}

impl Eq for PageUrl {}

impl Hash for PageUrl {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.url.hash(state);
    }
}

impl PartialOrd for PageUrl {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for PageUrl {
    fn cmp(&self, other: &Self) -> Ordering {
        self.url.cmp(&other.url)
    }
}

impl fmt::Display for PageUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<String> for PageUrl {
    type Error = ParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<PageUrl> for String {
    fn from(url: PageUrl) -> Self {
        url.url.into()
    }
}

impl std::str::FromStr for PageUrl {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// href validation functions
pub mod validators {
    /// Schemes that never point at a crawlable page
    const NON_PAGE_SCHEMES: &[&str] = &["javascript:", "mailto:", "tel:", "data:", "ftp:"];

    /// Check whether an href can never lead to a page
    ///
    /// Empty hrefs, in-page fragments and `javascript:`/`mailto:`/`tel:`
    /// links are always unrelated to the crawl.
    ///
    /// # Examples
    ///
    /// ```
    /// use profscout::crawler::url::validators;
    ///
    /// assert!(validators::is_non_page_href("mailto:chair@example.edu"));
    /// assert!(validators::is_non_page_href("  "));
    /// assert!(!validators::is_non_page_href("/people/jane-doe"));
    /// ```
    pub fn is_non_page_href(href: &str) -> bool {
        let href = href.trim();
        if href.is_empty() || href.starts_with('#') {
            return true;
        }
        let lower = href.to_lowercase();
        NON_PAGE_SCHEMES.iter().any(|scheme| lower.starts_with(scheme))
    }
}
