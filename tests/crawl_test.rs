//! End-to-end crawl scenarios against an in-memory site

mod common;

use std::sync::Arc;

use common::{directory_page, profile_page, stub_crawler, test_config, StubFetcher, SEED};
use profscout::error::Error;
use profscout::matching::Scorer;
use profscout::models::{CrawlErrorKind, PageUrl, SimilarityQuery, WalkState};

const PAGE_2: &str = "https://cs.example.edu/people?page=2";
const PAGE_3: &str = "https://cs.example.edu/people?page=3";

fn url(path: &str) -> String {
    format!("https://cs.example.edu{path}")
}

/// Two directory pages, five professors
fn two_page_site() -> StubFetcher {
    StubFetcher::new()
        .page(
            SEED,
            directory_page(
                &[
                    ("/people/alice-smith", "Alice Smith"),
                    ("/people/bob-jones", "Bob Jones"),
                    ("/people/carol-white", "Carol White"),
                ],
                Some("?page=2"),
            ),
        )
        .page(
            PAGE_2,
            directory_page(
                &[
                    ("/people/dan-brown", "Dan Brown"),
                    ("/people/eve-black", "Eve Black"),
                ],
                None,
            ),
        )
        .page(
            &url("/people/alice-smith"),
            profile_page("Alice Smith", &["Machine Learning", "Robotics"]),
        )
        .page(
            &url("/people/bob-jones"),
            profile_page("Bob Jones", &["Databases", "Query Optimization"]),
        )
        .page(
            &url("/people/carol-white"),
            profile_page("Carol White", &["Computer Vision", "Deep Learning"]),
        )
        .page(
            &url("/people/dan-brown"),
            profile_page("Dan Brown", &["Distributed Systems"]),
        )
        .page(
            &url("/people/eve-black"),
            profile_page("Eve Black", &["Natural Language Processing", "Machine Learning"]),
        )
}

#[tokio::test]
async fn test_two_page_directory() {
    let fetcher = Arc::new(two_page_site());
    let crawler = stub_crawler(test_config(3, 10), Arc::clone(&fetcher));

    let result = crawler.crawl(SEED).await.unwrap();

    assert_eq!(result.directory_pages_visited, 2);
    assert_eq!(result.profile_links_found, 5);
    assert_eq!(result.professors.len(), 5);
    assert_eq!(result.walk_state, WalkState::Exhausted);
    assert!(result.errors.is_empty(), "{:?}", result.errors);
    assert!(!result.cancelled);

    let alice = result
        .professor(&PageUrl::parse(&url("/people/alice-smith")).unwrap())
        .expect("alice extracted");
    assert_eq!(alice.name.as_deref(), Some("Alice Smith"));
    assert_eq!(alice.interests, vec!["Machine Learning", "Robotics"]);
    assert!(alice.raw_interest_text.contains("Research Interests"));

    // Every page fetched exactly once
    assert_eq!(fetcher.total_calls(), 7);
}

#[tokio::test]
async fn test_link_budget_caps_profiles() {
    let fetcher = Arc::new(two_page_site());
    let crawler = stub_crawler(test_config(3, 2), Arc::clone(&fetcher));

    let result = crawler.crawl(SEED).await.unwrap();

    assert_eq!(result.professors.len(), 2);
    assert_eq!(result.profile_links_found, 2);
    assert!(result.errors.is_empty());

    // Earliest discovered links are kept
    let kept: Vec<_> = result
        .professors
        .iter()
        .map(|p| p.source_url.to_string())
        .collect();
    assert!(kept.contains(&url("/people/alice-smith")));
    assert!(kept.contains(&url("/people/bob-jones")));
    assert_eq!(fetcher.calls(&url("/people/carol-white")), 0);
}

#[tokio::test]
async fn test_page_budget_stops_walk() {
    let fetcher = Arc::new(
        StubFetcher::new()
            .page(
                SEED,
                directory_page(&[("/people/alice-smith", "Alice Smith")], Some("?page=2")),
            )
            .page(
                PAGE_2,
                directory_page(&[("/people/bob-jones", "Bob Jones")], Some("?page=3")),
            )
            .page(
                PAGE_3,
                directory_page(&[("/people/carol-white", "Carol White")], None),
            )
            .page(&url("/people/alice-smith"), profile_page("Alice Smith", &["Robotics"]))
            .page(&url("/people/bob-jones"), profile_page("Bob Jones", &["Databases"])),
    );
    let crawler = stub_crawler(test_config(2, 10), Arc::clone(&fetcher));

    let result = crawler.crawl(SEED).await.unwrap();

    assert_eq!(result.directory_pages_visited, 2);
    assert_eq!(result.walk_state, WalkState::BudgetReached);
    assert_eq!(result.professors.len(), 2);
    assert_eq!(fetcher.calls(PAGE_3), 0);
}

#[tokio::test]
async fn test_pagination_loop_terminates() {
    let page_2 = r#"<html><body>
        <a href="/people/bob-jones">Bob Jones</a>
        <a href="/people">1</a>
        <a href="/people?page=2">2</a>
        <a href="/people" rel="next">Next</a>
    </body></html>"#;

    let fetcher = Arc::new(
        StubFetcher::new()
            .page(
                SEED,
                directory_page(&[("/people/alice-smith", "Alice Smith")], Some("?page=2")),
            )
            .page(PAGE_2, page_2)
            .page(&url("/people/alice-smith"), profile_page("Alice Smith", &["Robotics"]))
            .page(&url("/people/bob-jones"), profile_page("Bob Jones", &["Databases"])),
    );
    let crawler = stub_crawler(test_config(10, 10), Arc::clone(&fetcher));

    let result = crawler.crawl(SEED).await.unwrap();

    assert_eq!(result.walk_state, WalkState::Exhausted);
    assert_eq!(result.directory_pages_visited, 2);
    assert_eq!(fetcher.calls(SEED), 1);
    assert_eq!(fetcher.calls(PAGE_2), 1);
    assert_eq!(result.professors.len(), 2);
}

#[tokio::test]
async fn test_failing_profile_is_recorded() {
    let fetcher = Arc::new(two_page_site().failing(&url("/people/bob-jones")));
    let crawler = stub_crawler(test_config(3, 10), Arc::clone(&fetcher));

    let result = crawler.crawl(SEED).await.unwrap();

    assert_eq!(result.professors.len(), 4);
    assert_eq!(result.errors.len(), 1);

    let error = &result.errors[0];
    assert_eq!(error.kind, CrawlErrorKind::Transport);
    assert_eq!(error.url.to_string(), url("/people/bob-jones"));
    assert_eq!(error.attempts, 3);
    assert_eq!(fetcher.calls(&url("/people/bob-jones")), 3);
}

#[tokio::test]
async fn test_missing_interests_is_extraction_error() {
    let fetcher = Arc::new(
        StubFetcher::new()
            .page(
                SEED,
                directory_page(&[("/people/alice-smith", "Alice Smith")], None),
            )
            .page(
                &url("/people/alice-smith"),
                "<html><body><h1>Alice Smith</h1><p>Professor. Office hours by appointment</p></body></html>",
            ),
    );
    let crawler = stub_crawler(test_config(3, 10), fetcher);

    let result = crawler.crawl(SEED).await.unwrap();

    assert_eq!(result.professors.len(), 1);
    assert!(result.professors[0].interests.is_empty());
    assert_eq!(result.errors_of(CrawlErrorKind::Extraction).count(), 1);
}

#[tokio::test]
async fn test_unreachable_seed_is_fatal() {
    let fetcher = Arc::new(StubFetcher::new().failing(SEED));
    let crawler = stub_crawler(test_config(3, 10), Arc::clone(&fetcher));

    let err = crawler.crawl(SEED).await.unwrap_err();

    assert!(matches!(err, Error::FatalSeed { .. }));
    assert_eq!(fetcher.calls(SEED), 3);
}

#[tokio::test]
async fn test_unreadable_seed_is_fatal() {
    let fetcher = Arc::new(StubFetcher::new().binary(SEED));
    let crawler = stub_crawler(test_config(3, 10), Arc::clone(&fetcher));

    let err = crawler.crawl(SEED).await.unwrap_err();

    assert!(matches!(err, Error::FatalSeed { ref reason, .. } if reason.contains("not an HTML page")));
    assert_eq!(fetcher.calls(SEED), 1);
}

#[tokio::test]
async fn test_unreadable_directory_page_is_recorded() {
    let fetcher = Arc::new(
        StubFetcher::new()
            .page(
                SEED,
                directory_page(&[("/people/alice-smith", "Alice Smith")], Some("?page=2")),
            )
            .binary(PAGE_2)
            .page(&url("/people/alice-smith"), profile_page("Alice Smith", &["Robotics"])),
    );
    let crawler = stub_crawler(test_config(3, 10), fetcher);

    let result = crawler.crawl(SEED).await.unwrap();

    assert_eq!(result.professors.len(), 1);
    assert_eq!(result.errors.len(), 1);
    assert_eq!(result.errors[0].kind, CrawlErrorKind::Parse);
    assert_eq!(result.errors[0].attempts, 1);
}

#[tokio::test]
async fn test_trailing_slash_seed_resolves_relative_links() {
    let seed = "https://cs.example.edu/people/";
    let fetcher = Arc::new(
        StubFetcher::new()
            .page(
                seed,
                directory_page(
                    &[("alice-smith", "Alice Smith"), ("bob-jones.html", "Prof. Bob Jones")],
                    Some("?page=2"),
                ),
            )
            .page(PAGE_2, directory_page(&[("carol-white", "Carol White")], None))
            .page(&url("/people/alice-smith"), profile_page("Alice Smith", &["Robotics"]))
            .page(&url("/people/bob-jones.html"), profile_page("Bob Jones", &["Databases"]))
            .page(&url("/people/carol-white"), profile_page("Carol White", &["Vision"])),
    );
    let crawler = stub_crawler(test_config(3, 10), Arc::clone(&fetcher));

    let result = crawler.crawl(seed).await.unwrap();

    assert!(result.errors.is_empty(), "{:?}", result.errors);
    assert_eq!(result.directory_pages_visited, 2);
    assert_eq!(result.professors.len(), 3);
    assert_eq!(fetcher.calls(&url("/people/carol-white")), 1);
    assert_eq!(fetcher.calls(&url("/carol-white")), 0);
}

#[tokio::test]
async fn test_non_professor_pages_are_set_aside() {
    let fetcher = Arc::new(
        StubFetcher::new()
            .page(
                SEED,
                directory_page(
                    &[
                        ("/people/alice-smith", "Alice Smith"),
                        ("/people/robotics-lab", "Robotics Lab"),
                    ],
                    None,
                ),
            )
            .page(&url("/people/alice-smith"), profile_page("Alice Smith", &["Robotics"]))
            .page(
                &url("/people/robotics-lab"),
                "<html><head><title>Robotics Lab</title></head><body><h1>Robotics Lab</h1><p>News and events from the lab.</p></body></html>",
            ),
    );
    let crawler = stub_crawler(test_config(3, 10), fetcher);

    let result = crawler.crawl(SEED).await.unwrap();

    assert_eq!(result.profile_links_found, 2);
    assert_eq!(result.professors.len(), 1);
    assert!(result.professors[0].confidence > 0.5);
    assert_eq!(
        result.non_professor_pages,
        vec![PageUrl::parse(&url("/people/robotics-lab")).unwrap()]
    );
}

#[tokio::test]
async fn test_invalid_seed_is_rejected() {
    let crawler = stub_crawler(test_config(3, 10), Arc::new(StubFetcher::new()));

    let err = crawler.crawl("not a url").await.unwrap_err();
    assert!(matches!(err, Error::Parse(_)));
}

#[tokio::test]
async fn test_cancel_before_start() {
    let fetcher = Arc::new(two_page_site());
    let crawler = stub_crawler(test_config(3, 10), Arc::clone(&fetcher));

    crawler.cancel();
    let result = crawler.crawl(SEED).await.unwrap();

    assert!(result.cancelled);
    assert!(result.professors.is_empty());
    assert_eq!(fetcher.total_calls(), 0);
}

#[tokio::test]
async fn test_cancel_during_walk_returns_partial_result() {
    let fetcher = Arc::new(two_page_site().cancel_on(SEED));
    let crawler = stub_crawler(test_config(3, 10), Arc::clone(&fetcher));

    let result = crawler.crawl(SEED).await.unwrap();

    assert!(result.cancelled);
    assert_eq!(result.directory_pages_visited, 1);
    assert_eq!(result.walk_state, WalkState::Walking);
    assert!(result.professors.is_empty());
    assert_eq!(fetcher.calls(PAGE_2), 0);
}

#[tokio::test]
async fn test_crawl_then_rank() {
    let crawler = stub_crawler(test_config(3, 10), Arc::new(two_page_site()));
    let result = crawler.crawl(SEED).await.unwrap();

    let query = SimilarityQuery::new(["machine learning", "NLP"]);
    let ranked = Scorer::default().rank_result(&query, &result);

    assert_eq!(ranked.len(), 5);
    assert_eq!(ranked[0].professor.name.as_deref(), Some("Eve Black"));
    assert!(ranked[0].matched_terms.contains("machine learning"));
    assert!(ranked[0].fuzzy_terms.contains("nlp"));
    assert_eq!(ranked[1].professor.name.as_deref(), Some("Alice Smith"));
    assert!(ranked.iter().skip(2).all(|m| m.score < ranked[1].score));
}
