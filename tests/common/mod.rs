//! Common test utilities

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, OnceLock};

use profscout::config::Config;
use profscout::crawler::{CancelSignal, Crawler, Fetcher};
use profscout::error::FetchError;
use profscout::llm::HeuristicInterestExtractor;
use profscout::models::PageUrl;

pub const SEED: &str = "https://cs.example.edu/people";

/// In-memory site: url -> html, with optional failures
#[derive(Default)]
pub struct StubFetcher {
    pages: HashMap<String, String>,
    failing: HashSet<String>,
    binary: HashSet<String>,
    calls: Mutex<HashMap<String, usize>>,
    total: AtomicUsize,
    cancel_on: Option<String>,
    cancel: OnceLock<CancelSignal>,
}

impl StubFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(mut self, url: &str, html: impl Into<String>) -> Self {
        self.pages.insert(normalized(url), html.into());
        self
    }

    /// Answer `url` with a 503 on every attempt
    pub fn failing(mut self, url: &str) -> Self {
        self.failing.insert(normalized(url));
        self
    }

    /// Answer `url` with a body that is not an HTML page
    pub fn binary(mut self, url: &str) -> Self {
        self.binary.insert(normalized(url));
        self
    }

    /// Trip the crawler's cancel signal when `url` is fetched
    pub fn cancel_on(mut self, url: &str) -> Self {
        self.cancel_on = Some(normalized(url));
        self
    }

    pub fn attach_cancel(&self, signal: CancelSignal) {
        let _ = self.cancel.set(signal);
    }

    pub fn calls(&self, url: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .get(&normalized(url))
            .copied()
            .unwrap_or(0)
    }

    pub fn total_calls(&self) -> usize {
        self.total.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Fetcher for StubFetcher {
    async fn fetch(&self, url: &PageUrl) -> Result<String, FetchError> {
        let key = url.as_str().to_string();
        self.total.fetch_add(1, Ordering::SeqCst);
        *self.calls.lock().unwrap().entry(key.clone()).or_default() += 1;

        if self.cancel_on.as_deref() == Some(key.as_str()) {
            if let Some(signal) = self.cancel.get() {
                signal.cancel();
            }
        }

        if self.failing.contains(&key) {
            return Err(FetchError::ServerError(503));
        }
        if self.binary.contains(&key) {
            return Err(FetchError::Decode("not an HTML page: application/pdf".to_string()));
        }

        self.pages
            .get(&key)
            .cloned()
            .ok_or(FetchError::ClientError(404))
    }
}

fn normalized(url: &str) -> String {
    PageUrl::parse(url).unwrap().as_str().to_string()
}

/// Config with fast retries for tests
pub fn test_config(max_pages: usize, max_links: usize) -> Config {
    let mut config = Config::default();
    config.crawler.max_pages = max_pages;
    config.crawler.max_links = max_links;
    config.crawler.workers = 4;
    config.crawler.max_retries = 2;
    config.crawler.retry_base_delay_ms = 1;
    config.crawler.retry_max_delay_ms = 5;
    config.crawler.request_timeout_secs = 5;
    config
}

/// Crawler over a stub site with heuristic extraction
pub fn stub_crawler(config: Config, fetcher: Arc<StubFetcher>) -> Crawler {
    let crawler = Crawler::new(
        config,
        Arc::clone(&fetcher) as Arc<dyn Fetcher>,
        Arc::new(HeuristicInterestExtractor::new()),
    )
    .unwrap();
    fetcher.attach_cancel(crawler.cancel_signal());
    crawler
}

/// Directory page listing `profiles` (path, name) with an optional next link
pub fn directory_page(profiles: &[(&str, &str)], next: Option<&str>) -> String {
    let mut items = String::new();
    for (path, name) in profiles {
        items.push_str(&format!(r#"<li class="person"><a href="{path}">{name}</a></li>"#));
    }
    let next = next
        .map(|href| format!(r#"<nav class="pager"><a href="{href}">Next</a></nav>"#))
        .unwrap_or_default();

    format!(
        r#"<!DOCTYPE html>
<html>
<head><title>Faculty | Computer Science</title></head>
<body>
<header><a href="/">Home</a> <a href="mailto:office@example.edu">Contact</a></header>
<ul class="directory">{items}</ul>
{next}
<footer><a href="https://www.example.org/privacy">Privacy</a></footer>
</body>
</html>"#
    )
}

/// Profile page with a research interests list
pub fn profile_page(name: &str, interests: &[&str]) -> String {
    let items: String = interests
        .iter()
        .map(|i| format!("<li>{i}</li>"))
        .collect();

    format!(
        r#"<!DOCTYPE html>
<html>
<head><title>{name} | Computer Science</title></head>
<body>
<h1>{name}</h1>
<p>Office: Room 101</p>
<h2>Research Interests</h2>
<ul>{items}</ul>
<h2>Teaching</h2>
<p>CS 101</p>
</body>
</html>"#
    )
}
