//! Profile page reader
//!
//! Reduces a professor's page to the text worth handing to an interest
//! extractor, plus a display name when one can be found.
//!
//! The reader also scores how much the page looks like it belongs to an
//! academic: distinct professor keywords found in the title, the meta
//! description and the start of the visible text. Three or more distinct
//! keywords give full confidence.

use scraper::{ElementRef, Html, Node, Selector};
use std::sync::LazyLock;

use crate::utils::{normalize_whitespace, truncate_chars};

macro_rules! parse_selector {
    ($s:expr) => {
        Selector::parse($s).expect(concat!("Invalid CSS selector: ", $s))
    };
}

static SECTION_HEADERS: LazyLock<Selector> = LazyLock::new(|| parse_selector!("h1, h2, h3, h4"));
static H1: LazyLock<Selector> = LazyLock::new(|| parse_selector!("h1"));
static TITLE: LazyLock<Selector> = LazyLock::new(|| parse_selector!("title"));
static LIST_ITEM: LazyLock<Selector> = LazyLock::new(|| parse_selector!("li"));
static META_DESCRIPTION: LazyLock<Selector> =
    LazyLock::new(|| parse_selector!(r#"meta[name="description"][content]"#));

/// Words and phrases that mark an academic's page
pub const DEFAULT_PROFESSOR_KEYWORDS: &[&str] = &[
    "professor",
    "faculty",
    "dr",
    "phd",
    "ph d",
    "research interests",
    "publications",
    "curriculum vitae",
    "cv",
    "teaching",
    "lecturer",
    "scholar",
    "emeritus",
];

/// Distinct keyword hits for full confidence
const CONFIDENT_HITS: usize = 3;

/// Characters of visible text scanned for keywords
const KEYWORD_SCAN_CHARS: usize = 3000;

/// Header words that introduce research content
const RESEARCH_KEYWORDS: &[&str] = &["research", "interests", "projects", "expertise", "publications"];

/// Sibling elements collected under a research header
const SECTION_BODY_TAGS: &[&str] = &["p", "ul", "ol", "div", "section"];

/// Elements whose text is never visible
const HIDDEN_TAGS: &[&str] = &["script", "style", "noscript", "template", "head"];

/// Characters kept per research section
pub const SECTION_CHAR_LIMIT: usize = 500;

/// What a profile page yields before interest extraction
#[derive(Debug, Clone, PartialEq)]
pub struct ProfilePage {
    /// From the first `<h1>`, else the `<title>`
    pub name: Option<String>,
    /// Research sections, or the page's visible text when it has none
    pub research_text: String,
    /// Professor keywords found, in keyword-list order
    pub keywords: Vec<String>,
    /// In `[0, 1]`
    pub confidence: f64,
}

/// Reads profile pages
#[derive(Debug, Clone)]
pub struct ProfileReader {
    max_input_chars: usize,
    /// Normalized with [`keyword_text`]
    keywords: Vec<String>,
}

/// Lowercase, punctuation to spaces, padded so `" kw "` matches whole words
fn keyword_text(text: &str) -> String {
    let words: String = text
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect();
    format!(" {} ", words.split_whitespace().collect::<Vec<_>>().join(" "))
}

impl ProfileReader {
    #[must_use]
    pub fn new(max_input_chars: usize) -> Self {
        Self {
            max_input_chars,
            keywords: Vec::new(),
        }
        .with_keywords(DEFAULT_PROFESSOR_KEYWORDS)
    }

    /// Replace the professor keyword list
    #[must_use]
    pub fn with_keywords<I, S>(mut self, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.keywords = keywords
            .into_iter()
            .map(|k| keyword_text(k.as_ref()).trim().to_string())
            .filter(|k| !k.is_empty())
            .collect();
        self
    }

    /// Extract name and research text from profile HTML
    ///
    /// # Examples
    ///
    /// ```
    /// use profscout::parser::ProfileReader;
    ///
    /// let html = "<h1>Jane Doe</h1><h2>Research Interests</h2><ul><li>Databases</li></ul>";
    /// let page = ProfileReader::new(3000).read(html);
    ///
    /// assert_eq!(page.name.as_deref(), Some("Jane Doe"));
    /// assert!(page.research_text.contains("Databases"));
    /// ```
    pub fn read(&self, html: &str) -> ProfilePage {
        let document = Html::parse_document(html);
        let visible = visible_text(&document);

        let sections = research_sections(&document);
        let text = if sections.is_empty() {
            visible.clone()
        } else {
            sections.join("\n\n")
        };

        let keywords = self.professor_keywords(&document, &visible);
        let confidence = (keywords.len() as f64 / CONFIDENT_HITS as f64).min(1.0);

        ProfilePage {
            name: display_name(&document),
            research_text: truncate_chars(text.trim(), self.max_input_chars).to_string(),
            keywords,
            confidence,
        }
    }

    fn professor_keywords(&self, document: &Html, visible: &str) -> Vec<String> {
        let title = document
            .select(&TITLE)
            .next()
            .map(|t| t.text().collect::<String>())
            .unwrap_or_default();
        let description = document
            .select(&META_DESCRIPTION)
            .next()
            .and_then(|m| m.value().attr("content"))
            .unwrap_or_default();

        let haystack = keyword_text(&format!(
            "{title} {description} {}",
            truncate_chars(visible, KEYWORD_SCAN_CHARS)
        ));

        self.keywords
            .iter()
            .filter(|k| haystack.contains(&format!(" {k} ")))
            .cloned()
            .collect()
    }
}

fn display_name(document: &Html) -> Option<String> {
    let heading = document
        .select(&H1)
        .map(|h| normalize_whitespace(&h.text().collect::<String>()))
        .find(|text| !text.is_empty());

    heading.or_else(|| {
        document
            .select(&TITLE)
            .next()
            .map(|t| t.text().collect::<String>())
            .and_then(|title| {
                let first = title.split(['|', '–']).next().unwrap_or_default();
                let name = normalize_whitespace(first);
                (!name.is_empty()).then_some(name)
            })
    })
}

fn is_header(name: &str) -> bool {
    matches!(name, "h1" | "h2" | "h3" | "h4" | "h5" | "h6")
}

/// Text under each research-looking header, up to the next header
fn research_sections(document: &Html) -> Vec<String> {
    let mut sections = Vec::new();

    for header in document.select(&SECTION_HEADERS) {
        let title = normalize_whitespace(&header.text().collect::<String>());
        let lower = title.to_lowercase();
        if !RESEARCH_KEYWORDS.iter().any(|k| lower.contains(k)) {
            continue;
        }

        let mut body = Vec::new();
        for sibling in header.next_siblings() {
            let Some(element) = ElementRef::wrap(sibling) else {
                continue;
            };
            let name = element.value().name();
            if is_header(name) {
                break;
            }
            if SECTION_BODY_TAGS.contains(&name) {
                let text = block_text(&element);
                if !text.is_empty() {
                    body.push(text);
                }
            }
        }

        if body.is_empty() {
            continue;
        }

        let body = body.join("\n");
        sections.push(format!("{title}\n{}", truncate_chars(&body, SECTION_CHAR_LIMIT)));
    }

    sections
}

/// Lists keep one item per line; everything else is flattened
fn block_text(element: &ElementRef<'_>) -> String {
    if matches!(element.value().name(), "ul" | "ol") {
        return element
            .select(&LIST_ITEM)
            .map(|li| normalize_whitespace(&li.text().collect::<String>()))
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join("\n");
    }
    normalize_whitespace(&element.text().collect::<String>())
}

/// Visible text of the whole document with scripts and styles removed
pub fn visible_text(document: &Html) -> String {
    let mut text = String::new();

    for node in document.root_element().descendants() {
        let Node::Text(fragment) = node.value() else {
            continue;
        };
        let hidden = node.ancestors().any(|ancestor| {
            ancestor
                .value()
                .as_element()
                .is_some_and(|e| HIDDEN_TAGS.contains(&e.name()))
        });
        if !hidden {
            text.push_str(fragment);
            text.push(' ');
        }
    }

    normalize_whitespace(&text)
}
