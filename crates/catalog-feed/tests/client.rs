//! Integration tests for `PriceFeedClient` using wiremock HTTP mocks.

use catalog_feed::{FeedError, PriceFeedClient};
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_client(base_url: &str, token: Option<&str>) -> PriceFeedClient {
    PriceFeedClient::new(&format!("{base_url}/prices"), token, 5)
        .expect("client construction should not fail")
}

fn skus(items: &[&str]) -> Vec<String> {
    items.iter().map(ToString::to_string).collect()
}

#[tokio::test]
async fn fetch_prices_posts_skus_with_bearer_token() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/prices"))
        .and(header("authorization", "Bearer feed-token"))
        .and(body_json(serde_json::json!({"skus": ["IP16-128-BLK", "MBA-M2-256"]})))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "prices": {
                "IP16-128-BLK": {"price": 89990, "name": "iPhone 16 128GB Black"},
                "MBA-M2-256": {"price": "99990"}
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server.uri(), Some("feed-token"));
    let prices = client
        .fetch_prices(&skus(&["IP16-128-BLK", "MBA-M2-256"]))
        .await
        .expect("should parse prices");

    assert_eq!(prices.len(), 2);
    assert_eq!(prices["IP16-128-BLK"].price, Some(89_990.0));
    assert_eq!(
        prices["IP16-128-BLK"].name.as_deref(),
        Some("iPhone 16 128GB Black")
    );
    assert_eq!(prices["MBA-M2-256"].price, Some(99_990.0));
}

#[tokio::test]
async fn empty_sku_list_makes_no_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;

    let client = test_client(&server.uri(), None);
    let prices = client.fetch_prices(&[]).await.expect("no request, no error");
    assert!(prices.is_empty());
}

#[tokio::test]
async fn server_error_is_reported_with_status() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
        .mount(&server)
        .await;

    let client = test_client(&server.uri(), None);
    let err = client
        .fetch_prices(&skus(&["A"]))
        .await
        .expect_err("503 should fail");

    match err {
        FeedError::UnexpectedStatus { status, body } => {
            assert_eq!(status, 503);
            assert_eq!(body, "maintenance");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn non_json_body_is_a_deserialize_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let client = test_client(&server.uri(), None);
    let err = client.fetch_prices(&skus(&["A"])).await.unwrap_err();
    assert!(matches!(err, FeedError::Deserialize { .. }));
}

#[tokio::test]
async fn body_without_prices_is_a_shape_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"ok": true})))
        .mount(&server)
        .await;

    let client = test_client(&server.uri(), None);
    let err = client.fetch_prices(&skus(&["A"])).await.unwrap_err();
    assert!(matches!(err, FeedError::UnexpectedShape(_)));
}
