//! End-to-end tests for the search reply producer against a mock endpoint.

use std::time::Duration;

use serde_json::json;
use stagechat_adapters::{
    AdapterError, ReplyProducer, SearchConfig, SearchReplyProducer, not_found_reply,
    search_error_reply,
};
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn producer_for(server: &MockServer) -> SearchReplyProducer {
    SearchReplyProducer::new(SearchConfig {
        endpoint: format!("{}/search", server.uri()),
        api_key: Some("test-key".into()),
        timeout: Duration::from_secs(5),
        ..SearchConfig::default()
    })
    .expect("valid config")
}

#[tokio::test]
async fn sends_query_mode_and_contents_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/search"))
        .and(header("authorization", "Bearer test-key"))
        .and(body_partial_json(json!({
            "query": "weather",
            "type": "neural",
            "contents": { "text": true },
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [{ "text": "Sunny all week", "url": "https://example.com" }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let reply = producer_for(&server).produce("weather").await;
    assert_eq!(
        reply,
        "Here's what I found about \"weather\":\n\nResult 1: Sunny all week"
    );
}

#[tokio::test]
async fn five_results_are_cut_to_three() {
    let server = MockServer::start().await;
    let results: Vec<_> = (1..=5)
        .map(|i| json!({ "text": format!("hit {i}"), "title": format!("T{i}") }))
        .collect();
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "results": results })))
        .mount(&server)
        .await;

    let reply = producer_for(&server).produce("rust").await;
    assert!(reply.contains("Result 1: hit 1"));
    assert!(reply.contains("Result 3: hit 3"));
    assert!(!reply.contains("Result 4"));
    assert!(!reply.contains("hit 5"));
}

#[tokio::test]
async fn empty_results_use_not_found_reply() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "results": [] })))
        .mount(&server)
        .await;

    let reply = producer_for(&server).produce("obscure").await;
    assert_eq!(reply, not_found_reply("obscure"));
}

#[tokio::test]
async fn http_error_uses_error_reply() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    assert_eq!(
        producer_for(&server).produce("weather").await,
        search_error_reply("weather")
    );
}

#[tokio::test]
async fn http_error_surfaces_status_from_search() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let err = producer_for(&server).search("weather").await.unwrap_err();
    assert!(matches!(err, AdapterError::HttpStatus { status: 401, .. }));
}

#[tokio::test]
async fn garbage_body_uses_error_reply() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    assert_eq!(
        producer_for(&server).produce("weather").await,
        search_error_reply("weather")
    );
}

#[tokio::test]
async fn transport_error_uses_error_reply() {
    let producer = SearchReplyProducer::new(SearchConfig {
        endpoint: "http://127.0.0.1:1/search".into(),
        api_key: Some("test-key".into()),
        timeout: Duration::from_secs(2),
        ..SearchConfig::default()
    })
    .unwrap();

    assert_eq!(producer.produce("weather").await, search_error_reply("weather"));
}
