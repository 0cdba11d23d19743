//! Anchor extraction and link classification
//!
//! [`LinkClassifier`] turns a fetched directory page into an ordered list of
//! normalized links, each tagged with a [`PageKind`]. Classification is a
//! pure function of the page URL, the HTML and the classifier policy, so
//! classifying the same page twice always gives the same answer.
//!
//! Precedence, first match wins:
//!
//! 1. Pagination: anchor text is a pagination token, `rel="next"`, a 1-3 digit
//!    page number, or the URL carries a page-number query key / `page/N` path
//! 2. Unrelated: the path ends in a document or image extension
//! 3. Profile: a person segment after a profile marker (`/people/jane-doe`),
//!    "professor" in the anchor text, or a name-like anchor on a slug URL
//! 4. Directory: in the seed's scope and shaped like a listing
//! 5. Unrelated: everything else

use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;
use std::sync::LazyLock;
use url::Url;

use crate::config::ClassifierConfig;
use crate::crawler::url::{validators, PageUrl};
use crate::models::PageKind;
use crate::utils::normalize_whitespace;

macro_rules! parse_selector {
    ($s:expr) => {
        Selector::parse($s).expect(concat!("Invalid CSS selector: ", $s))
    };
}

static ANCHOR: LazyLock<Selector> = LazyLock::new(|| parse_selector!("a[href]"));
static BASE: LazyLock<Selector> = LazyLock::new(|| parse_selector!("base[href]"));

static PAGE_NUMBER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d{1,3}$").unwrap());

/// 2-4 capitalised words, optionally led by an academic title
static NAME_LIKE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:(?:Dr|Prof)\.?\s+)?\p{Lu}[\p{L}'\-]*\.?(?:\s+\p{Lu}[\p{L}'\-]*\.?){1,3}$")
        .unwrap()
});

static SLUG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^~?[a-z][a-z0-9]*(?:[-_.][a-z0-9]+)*$").unwrap());

/// Segments that never identify a person
const NON_PERSON_SEGMENTS: &[&str] = &[
    "page", "index", "all", "search", "list", "home", "about", "contact", "news", "events",
];

/// Web page extensions stripped before slug checks
const PAGE_EXTENSIONS: &[&str] = &[".html", ".htm", ".php", ".aspx", ".asp", ".shtml"];

/// One anchor as found in the page
#[derive(Debug, Clone)]
struct Anchor {
    url: PageUrl,
    text: String,
    rel_next: bool,
}

/// Classifies the links of a directory page
#[derive(Debug, Clone)]
pub struct LinkClassifier {
    seed: PageUrl,
    /// Path segments every in-scope URL starts with
    scope: Vec<String>,
    pagination_tokens: HashSet<String>,
    page_query_keys: HashSet<String>,
    profile_markers: HashSet<String>,
    listing_markers: HashSet<String>,
    skipped_extensions: HashSet<String>,
}

fn lowered(items: &[String]) -> HashSet<String> {
    items.iter().map(|s| s.trim().to_lowercase()).collect()
}

impl LinkClassifier {
    /// Create a classifier scoped to the seed's site and parent path
    ///
    /// A seed of `https://example.edu/cs/people` scopes directory links to
    /// `https://example.edu/cs/...`.
    pub fn new(config: &ClassifierConfig, seed: PageUrl) -> Self {
        let mut scope = seed.segments();
        scope.pop();

        Self {
            seed,
            scope,
            pagination_tokens: lowered(&config.pagination_tokens),
            page_query_keys: lowered(&config.page_query_keys),
            profile_markers: lowered(&config.profile_markers),
            listing_markers: lowered(&config.listing_markers),
            skipped_extensions: lowered(&config.skipped_extensions),
        }
    }

    /// Classify every distinct link on a page
    ///
    /// Relative hrefs resolve against `<base href>` when the document has one,
    /// otherwise against `base`. Hrefs that can never be pages (`javascript:`,
    /// `mailto:`, `tel:`, bare fragments, empty) and hrefs that fail to parse
    /// are skipped. Output order is first-seen page order with duplicates
    /// removed.
    ///
    /// # Examples
    ///
    /// ```
    /// use profscout::config::ClassifierConfig;
    /// use profscout::crawler::classifier::LinkClassifier;
    /// use profscout::crawler::url::PageUrl;
    /// use profscout::models::PageKind;
    ///
    /// let seed = PageUrl::parse("https://example.edu/cs/people").unwrap();
    /// let classifier = LinkClassifier::new(&ClassifierConfig::default(), seed.clone());
    ///
    /// let html = r#"<a href="/cs/people/jane-doe">Jane Doe</a> <a href="?page=2">Next</a>"#;
    /// let links = classifier.classify(&seed, html);
    ///
    /// assert_eq!(links[0].1, PageKind::Profile);
    /// assert_eq!(links[1].1, PageKind::Pagination);
    /// ```
    pub fn classify(&self, base: &PageUrl, html: &str) -> Vec<(PageUrl, PageKind)> {
        let document = Html::parse_document(html);
        let base = resolution_base(&document, base);

        let mut seen = HashSet::new();
        let mut links = Vec::new();

        for anchor in extract_anchors(&document, &base) {
            if !seen.insert(anchor.url.clone()) {
                continue;
            }
            let kind = self.classify_anchor(&anchor);
            links.push((anchor.url, kind));
        }

        links
    }

    fn classify_anchor(&self, anchor: &Anchor) -> PageKind {
        let url = &anchor.url;
        let text = anchor.text.to_lowercase();

        if url.same_site(&self.seed) && self.is_pagination(url, &text, anchor.rel_next) {
            return PageKind::Pagination;
        }

        if url
            .extension()
            .is_some_and(|ext| self.skipped_extensions.contains(&ext))
        {
            return PageKind::Unrelated;
        }

        if url.same_site(&self.seed) && self.is_profile(url, &anchor.text, &text) {
            return PageKind::Profile;
        }

        if self.in_scope(url) && self.is_listing(url) {
            return PageKind::Directory;
        }

        PageKind::Unrelated
    }

    fn in_scope(&self, url: &PageUrl) -> bool {
        url.same_site(&self.seed) && url.segments().starts_with(&self.scope)
    }

    fn is_pagination(&self, url: &PageUrl, text: &str, rel_next: bool) -> bool {
        if rel_next || self.pagination_tokens.contains(text) || PAGE_NUMBER.is_match(text) {
            return true;
        }

        // URL-only signals must point back into the listing's scope
        if !self.in_scope(url) {
            return false;
        }

        if url
            .query_keys()
            .iter()
            .any(|key| self.page_query_keys.contains(key))
        {
            return true;
        }

        url.segments()
            .windows(2)
            .any(|pair| pair[0] == "page" && pair[1].chars().all(|c| c.is_ascii_digit()))
    }

    fn is_profile(&self, url: &PageUrl, text: &str, text_lower: &str) -> bool {
        let segments = url.segments();

        let after_marker = segments.windows(2).any(|pair| {
            self.profile_markers.contains(&pair[0]) && self.is_person_segment(&pair[1])
        });
        if after_marker {
            return true;
        }

        if text_lower.contains("professor") && self.in_scope(url) && !self.is_listing(url) {
            return true;
        }

        match segments.last() {
            Some(last) if NAME_LIKE.is_match(text) => self.slug_matches_name(last, text_lower),
            _ => false,
        }
    }

    /// A path segment that plausibly names one person
    fn is_person_segment(&self, segment: &str) -> bool {
        let stem = strip_page_extension(segment);
        !stem.is_empty()
            && !stem.chars().all(|c| c.is_ascii_digit())
            && !NON_PERSON_SEGMENTS.contains(&stem)
            && !self.profile_markers.contains(stem)
            && !self.listing_markers.contains(stem)
    }

    fn slug_matches_name(&self, segment: &str, name_lower: &str) -> bool {
        let stem = strip_page_extension(segment);
        if !SLUG.is_match(stem) || !self.is_person_segment(stem) {
            return false;
        }

        let slug_tokens: HashSet<&str> = stem
            .trim_start_matches('~')
            .split(['-', '_', '.'])
            .filter(|t| t.len() >= 2)
            .collect();

        name_lower
            .split_whitespace()
            .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric()))
            .filter(|w| w.len() >= 2 && *w != "dr" && *w != "prof")
            .any(|w| slug_tokens.contains(w))
    }

    fn is_listing(&self, url: &PageUrl) -> bool {
        let segments = url.segments();
        if segments == self.seed.segments() {
            return true;
        }
        segments
            .last()
            .is_some_and(|last| self.listing_markers.contains(strip_page_extension(last)))
    }
}

fn strip_page_extension(segment: &str) -> &str {
    PAGE_EXTENSIONS
        .iter()
        .find_map(|ext| segment.strip_suffix(ext))
        .unwrap_or(segment)
}

/// `<base href>` if present and valid, else the page URL as written
///
/// Kept as a raw `Url`: normalizing would drop the trailing slash that
/// decides how relative hrefs resolve.
fn resolution_base(document: &Html, page: &PageUrl) -> Url {
    document
        .select(&BASE)
        .next()
        .and_then(|base| base.value().attr("href"))
        .and_then(|href| page.base().join(href.trim()).ok())
        .unwrap_or_else(|| page.base().clone())
}

fn extract_anchors(document: &Html, base: &Url) -> Vec<Anchor> {
    document
        .select(&ANCHOR)
        .filter_map(|element| {
            let href = element.value().attr("href")?;
            if validators::is_non_page_href(href) {
                return None;
            }
            let url = base
                .join(href.trim())
                .ok()
                .and_then(|url| PageUrl::from_url(url).ok())?;
            Some(Anchor {
                url,
                text: anchor_text(&element),
                rel_next: has_rel_next(&element),
            })
        })
        .collect()
}

/// Visible text, falling back to `aria-label` / `title` for icon links
fn anchor_text(element: &ElementRef<'_>) -> String {
    let text = normalize_whitespace(&element.text().collect::<String>());
    if !text.is_empty() {
        return text;
    }
    ["aria-label", "title"]
        .iter()
        .find_map(|attr| element.value().attr(attr))
        .map(normalize_whitespace)
        .unwrap_or_default()
}

fn has_rel_next(element: &ElementRef<'_>) -> bool {
    element
        .value()
        .attr("rel")
        .is_some_and(|rel| rel.split_whitespace().any(|r| r.eq_ignore_ascii_case("next")))
}
