use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use knowledge_base::keywords::KeywordTable;
use knowledge_base::models::Tag;
use knowledge_base::remote::{ClassifierError, HuggingFaceClassifier, ZeroShotClassifier};
use knowledge_base::tagger::{TagSource, Tagger};

const MODEL_PATH: &str = "/models/facebook/bart-large-mnli";

fn classifier_for(server: &MockServer, timeout: Duration) -> HuggingFaceClassifier {
    HuggingFaceClassifier::new(format!("{}{}", server.uri(), MODEL_PATH), "test-key", timeout)
        .unwrap()
}

#[tokio::test]
async fn test_sends_zero_shot_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(MODEL_PATH))
        .and(header("authorization", "Bearer test-key"))
        .and(body_json(json!({
            "inputs": "database is on fire",
            "parameters": { "candidate_labels": ["Technical", "Urgent", "General"] }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "sequence": "database is on fire",
            "labels": ["Urgent", "Technical", "General"],
            "scores": [0.71, 0.25, 0.04]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let classifier = classifier_for(&server, Duration::from_secs(5));
    let tag = classifier.classify("database is on fire").await.unwrap();
    assert_eq!(tag, Some(Tag::Urgent));
}

#[tokio::test]
async fn test_accepts_nested_list_shape() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([[{ "label": "General", "score": 0.9 }]])),
        )
        .mount(&server)
        .await;

    let classifier = classifier_for(&server, Duration::from_secs(5));
    assert_eq!(
        classifier.classify("hello").await.unwrap(),
        Some(Tag::General)
    );
}

#[tokio::test]
async fn test_unknown_label_is_absent() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([{ "label": "Spam", "score": 0.99 }])),
        )
        .mount(&server)
        .await;

    let classifier = classifier_for(&server, Duration::from_secs(5));
    assert_eq!(classifier.classify("hello").await.unwrap(), None);
}

#[tokio::test]
async fn test_http_error_is_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({ "error": "Invalid credentials" })),
        )
        .mount(&server)
        .await;

    let classifier = classifier_for(&server, Duration::from_secs(5));
    let err = classifier.classify("hello").await.unwrap_err();
    match &err {
        ClassifierError::Status { status, body } => {
            assert_eq!(*status, 401);
            assert!(body.contains("Invalid credentials"));
        }
        other => panic!("expected status error, got {:?}", other),
    }
    assert!(err.is_configuration());
}

#[tokio::test]
async fn test_non_json_body_is_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>gateway</html>"))
        .mount(&server)
        .await;

    let classifier = classifier_for(&server, Duration::from_secs(5));
    let err = classifier.classify("hello").await.unwrap_err();
    assert!(matches!(err, ClassifierError::Decode(_)));
}

#[tokio::test]
async fn test_timeout_is_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "labels": ["Urgent"] }))
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&server)
        .await;

    let classifier = classifier_for(&server, Duration::from_millis(100));
    let err = classifier.classify("hello").await.unwrap_err();
    assert!(matches!(err, ClassifierError::Transport(_)));
}

#[tokio::test]
async fn test_tagger_falls_back_when_endpoint_fails() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503).set_body_string("model is loading"))
        .expect(1)
        .mount(&server)
        .await;

    let classifier = classifier_for(&server, Duration::from_secs(5));
    let tagger = Tagger::new(Box::new(classifier), Arc::new(KeywordTable::default()));

    let decision = tagger
        .decide("server returned a 500 error and stack trace")
        .await;
    assert_eq!(decision.tag, Tag::Technical);
    assert_eq!(decision.source, TagSource::Keyword);
}

#[tokio::test]
async fn test_tagger_blank_text_makes_no_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "labels": ["Urgent"] })))
        .expect(0)
        .mount(&server)
        .await;

    let classifier = classifier_for(&server, Duration::from_secs(5));
    let tagger = Tagger::new(Box::new(classifier), Arc::new(KeywordTable::default()));

    assert_eq!(tagger.tag("   ").await, Tag::General);
}
