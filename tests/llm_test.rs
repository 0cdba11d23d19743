//! LLM interest extraction against a mock chat completions endpoint

mod common;

use std::sync::Arc;

use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use common::{directory_page, profile_page, test_config, StubFetcher, SEED};
use profscout::config::ExtractorConfig;
use profscout::crawler::{Crawler, Fetcher};
use profscout::error::{ClassifiedError, ExtractionError};
use profscout::llm::{InterestExtractor, LlmInterestExtractor};
use profscout::models::CrawlErrorKind;

fn extractor(server: &MockServer) -> LlmInterestExtractor {
    LlmInterestExtractor::new(ExtractorConfig {
        endpoint: server.uri(),
        model: "test-model".to_string(),
        api_key: Some("sk-test".to_string()),
        timeout_secs: 5,
        ..Default::default()
    })
    .unwrap()
}

fn completion(content: &str) -> serde_json::Value {
    json!({
        "id": "chatcmpl-1",
        "object": "chat.completion",
        "choices": [
            {
                "index": 0,
                "message": { "role": "assistant", "content": content },
                "finish_reason": "stop"
            }
        ]
    })
}

#[tokio::test]
async fn test_extract_json_array() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("authorization", "Bearer sk-test"))
        .and(body_partial_json(json!({ "model": "test-model" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion(
            "```json\n[\"Machine Learning\", \"Robotics\", \"machine learning\"]\n```",
        )))
        .expect(1)
        .mount(&mock_server)
        .await;

    let interests = extractor(&mock_server)
        .extract("Research Interests\nMachine learning for robots")
        .await
        .unwrap();

    assert_eq!(interests, vec!["Machine Learning", "Robotics"]);
}

#[tokio::test]
async fn test_extract_interests_object() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion(
            r#"Sure! {"interests": ["Computer Vision", "3D Reconstruction"]}"#,
        )))
        .mount(&mock_server)
        .await;

    let interests = extractor(&mock_server).extract("Vision lab").await.unwrap();
    assert_eq!(interests, vec!["Computer Vision", "3D Reconstruction"]);
}

#[tokio::test]
async fn test_server_error_is_recoverable() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
        .mount(&mock_server)
        .await;

    let err = extractor(&mock_server).extract("Databases").await.unwrap_err();
    assert!(matches!(err, ExtractionError::Request(_)));
    assert!(err.is_recoverable());
}

#[tokio::test]
async fn test_malformed_body_is_invalid_response() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&mock_server)
        .await;

    let err = extractor(&mock_server).extract("Databases").await.unwrap_err();
    assert!(matches!(err, ExtractionError::InvalidResponse(_)));
    assert!(!err.is_recoverable());
}

#[tokio::test]
async fn test_empty_text_skips_request() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion("[]")))
        .expect(0)
        .mount(&mock_server)
        .await;

    let err = extractor(&mock_server).extract("   ").await.unwrap_err();
    assert!(matches!(err, ExtractionError::Empty));
}

#[tokio::test]
async fn test_crawl_with_failing_extraction_service() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&mock_server)
        .await;

    let fetcher = Arc::new(
        StubFetcher::new()
            .page(
                SEED,
                directory_page(&[("/people/alice-smith", "Alice Smith")], None),
            )
            .page(
                "https://cs.example.edu/people/alice-smith",
                profile_page("Alice Smith", &["Robotics"]),
            ),
    );

    let crawler = Crawler::new(
        test_config(3, 10),
        fetcher as Arc<dyn Fetcher>,
        Arc::new(extractor(&mock_server)),
    )
    .unwrap();

    let result = crawler.crawl(SEED).await.unwrap();

    // The profile is kept, its interests are not
    assert_eq!(result.professors.len(), 1);
    assert_eq!(result.professors[0].name.as_deref(), Some("Alice Smith"));
    assert!(result.professors[0].interests.is_empty());
    assert!(result.professors[0].raw_interest_text.contains("Robotics"));

    let errors: Vec<_> = result.errors_of(CrawlErrorKind::Extraction).collect();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].attempts, 3);
}
