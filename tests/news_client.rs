//! Integration tests for the NewsAPI client against a mock server

use reqwest::Client;
use serde_json::json;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use headlines::data::{Category, NewsClient, NewsError, NewsQuery};
use headlines::feed::FeedSource;

const ENDPOINT: &str = "/v2/top-headlines";

fn client_for(server: &MockServer) -> NewsClient {
    NewsClient::with_client(Client::new(), Some("test-key".to_string()))
        .with_base_url(format!("{}{}", server.uri(), ENDPOINT))
}

fn ok_body() -> serde_json::Value {
    json!({
        "status": "ok",
        "totalResults": 2,
        "articles": [
            {
                "source": { "id": "bbc-news", "name": "BBC News" },
                "author": "Jane Reporter",
                "title": "Harbour cleanup finishes early",
                "description": "Crews wrapped up a week ahead of schedule.",
                "url": "https://example.com/harbour",
                "urlToImage": "https://example.com/harbour.jpg",
                "publishedAt": "2024-07-15T14:00:00Z",
                "content": "Crews wrapped up... [+1200 chars]"
            },
            {
                "source": { "id": null, "name": null },
                "author": null,
                "title": "[Removed]",
                "description": null,
                "url": "https://removed.com",
                "urlToImage": null,
                "publishedAt": null,
                "content": null
            }
        ]
    })
}

#[tokio::test]
async fn test_fetch_sends_query_and_key() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(ENDPOINT))
        .and(query_param("country", "gb"))
        .and(query_param("category", "technology"))
        .and(query_param("page", "3"))
        .and(query_param("pageSize", "20"))
        .and(header("X-Api-Key", "test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(ok_body()))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server).with_query(NewsQuery {
        country: Some("gb".to_string()),
        category: Some(Category::Technology),
        keywords: None,
    });

    let articles = client.fetch_headlines(3, 20).await.unwrap();

    assert_eq!(articles.len(), 2);
    assert_eq!(articles[0].title, "Harbour cleanup finishes early");
    assert_eq!(articles[0].source_name, "BBC News");
    assert_eq!(
        articles[0].image_url.as_deref(),
        Some("https://example.com/harbour.jpg")
    );
    // Invalid articles are passed through for the controller to filter
    assert!(!articles[1].is_displayable());
}

#[tokio::test]
async fn test_feed_source_uses_same_request() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(ENDPOINT))
        .and(query_param("page", "1"))
        .and(query_param("pageSize", "5"))
        .respond_with(ResponseTemplate::new(200).set_body_json(ok_body()))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let source: &dyn FeedSource = &client;

    let articles = source.fetch_page(1, 5).await.unwrap();

    assert_eq!(articles.len(), 2);
}

#[tokio::test]
async fn test_error_envelope_becomes_api_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(ENDPOINT))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "status": "error",
            "code": "apiKeyInvalid",
            "message": "Your API key is invalid or incorrect."
        })))
        .mount(&server)
        .await;

    let result = client_for(&server).fetch_headlines(1, 20).await;

    match result {
        Err(NewsError::Api { code, message }) => {
            assert_eq!(code, "apiKeyInvalid");
            assert!(message.contains("invalid"));
        }
        other => panic!("Expected Api error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_server_error_without_envelope() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(ENDPOINT))
        .respond_with(ResponseTemplate::new(502).set_body_string("Bad Gateway"))
        .mount(&server)
        .await;

    let result = client_for(&server).fetch_headlines(1, 20).await;

    assert!(matches!(result, Err(NewsError::HttpStatus(502))));
}

#[tokio::test]
async fn test_malformed_body_is_parse_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(ENDPOINT))
        .respond_with(ResponseTemplate::new(200).set_body_string("{\"status\": \"ok\", \"articles\": ["))
        .mount(&server)
        .await;

    let result = client_for(&server).fetch_headlines(1, 20).await;

    assert!(matches!(result, Err(NewsError::ParseError(_))));
}

#[tokio::test]
async fn test_unreachable_server_is_request_error() {
    let client = NewsClient::with_client(Client::new(), None).with_base_url("http://127.0.0.1:1");

    let result = client.fetch_headlines(1, 20).await;

    assert!(matches!(result, Err(NewsError::RequestFailed(_))));
}
