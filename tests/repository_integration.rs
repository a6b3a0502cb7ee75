//! Integration tests exercising the repositories against a mock platform.

use std::time::{Duration, Instant};

use serde_json::{json, Value};
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use ctp_repositories::{Commercetools, CommercetoolsConfig, Query};

async fn mock_token(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "test-token",
            "expires_in": 3600
        })))
        .mount(server)
        .await;
}

async fn plugin(server: &MockServer) -> Commercetools {
    mock_token(server).await;
    Commercetools::register(CommercetoolsConfig {
        host: Some(server.uri()),
        oauth_host: Some(server.uri()),
        project_key: Some("test".to_string()),
        client_id: Some("client-id".to_string()),
        client_secret: Some("client-secret".to_string()),
        concurrency: None,
        add_logger: Some(false),
    })
    .expect("valid configuration")
}

fn paged(total: u64, offset: u64, results: Vec<Value>) -> Value {
    json!({
        "limit": 500,
        "offset": offset,
        "count": results.len(),
        "total": total,
        "results": results
    })
}

#[tokio::test]
async fn token_is_fetched_once_and_reused() {
    let server = MockServer::start().await;
    mock_token(&server).await;

    Mock::given(method("GET"))
        .and(path("/test/carts/cart-1"))
        .and(header("Authorization", "Bearer test-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "cart-1" })))
        .expect(2)
        .mount(&server)
        .await;

    let plugin = Commercetools::register(CommercetoolsConfig {
        host: Some(server.uri()),
        oauth_host: Some(server.uri()),
        project_key: Some("test".to_string()),
        client_id: Some("client-id".to_string()),
        client_secret: Some("client-secret".to_string()),
        concurrency: None,
        add_logger: Some(false),
    })
    .unwrap();

    let carts = plugin.repository("cart").unwrap();
    carts.get("cart-1", None).await.unwrap();
    carts.get("cart-1", None).await.unwrap();

    let token_requests = server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .filter(|request| request.url.path() == "/oauth/token")
        .count();
    assert_eq!(token_requests, 1);
}

#[tokio::test]
async fn request_queue_caps_in_flight_requests() {
    let server = MockServer::start().await;
    mock_token(&server).await;

    Mock::given(method("GET"))
        .and(path("/test/carts"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_delay(Duration::from_millis(150))
                .set_body_json(paged(0, 0, vec![])),
        )
        .expect(3)
        .mount(&server)
        .await;

    let plugin = Commercetools::register(CommercetoolsConfig {
        host: Some(server.uri()),
        oauth_host: Some(server.uri()),
        project_key: Some("test".to_string()),
        client_id: Some("client-id".to_string()),
        client_secret: Some("client-secret".to_string()),
        concurrency: Some(1),
        add_logger: Some(false),
    })
    .unwrap();

    let carts = plugin.repository("cart").unwrap();
    let started = Instant::now();
    let (a, b, c) = tokio::join!(carts.find(None), carts.find(None), carts.find(None));
    a.unwrap();
    b.unwrap();
    c.unwrap();

    // A single permit serializes the three delayed responses; anything
    // faster than three full delays means the cap leaked.
    assert!(started.elapsed() >= Duration::from_millis(450));
}

#[tokio::test]
async fn get_by_key_uses_key_path_form() {
    let server = MockServer::start().await;
    let plugin = plugin(&server).await;

    Mock::given(method("GET"))
        .and(path("/test/customers/key=jane"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "key": "jane" })))
        .expect(1)
        .mount(&server)
        .await;

    let customer = plugin
        .repository("customer")
        .unwrap()
        .get("key=jane", None)
        .await
        .unwrap();
    assert_eq!(customer["key"], "jane");
}

#[tokio::test]
async fn create_posts_the_draft_as_json() {
    let server = MockServer::start().await;
    let plugin = plugin(&server).await;

    let draft = json!({ "currency": "EUR", "country": "DE" });
    Mock::given(method("POST"))
        .and(path("/test/carts"))
        .and(header("Content-Type", "application/json"))
        .and(body_json(&draft))
        .respond_with(
            ResponseTemplate::new(201).set_body_json(json!({ "id": "cart-1", "version": 1 })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let created = plugin
        .repository("cart")
        .unwrap()
        .create(&draft, None)
        .await
        .unwrap();
    assert_eq!(created["version"], 1);
}

#[tokio::test]
async fn update_sends_version_and_actions() {
    let server = MockServer::start().await;
    let plugin = plugin(&server).await;

    let actions = vec![json!({ "action": "setKey", "key": "new-key" })];
    Mock::given(method("POST"))
        .and(path("/test/orders/order-1"))
        .and(body_json(json!({ "version": 2, "actions": actions })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "id": "order-1", "version": 3 })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let updated = plugin
        .repository("order")
        .unwrap()
        .update("order-1", 2, &actions, None)
        .await
        .unwrap();
    assert_eq!(updated["version"], 3);
}

#[tokio::test]
async fn delete_appends_the_version_parameter() {
    let server = MockServer::start().await;
    let plugin = plugin(&server).await;

    Mock::given(method("DELETE"))
        .and(path("/test/carts/cart-1"))
        .and(query_param("version", "4"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    // An empty response body is surfaced as null, not an error.
    let deleted = plugin
        .repository("cart")
        .unwrap()
        .delete("cart-1", 4, None)
        .await
        .unwrap();
    assert!(deleted.is_null());
}

#[tokio::test]
async fn find_forwards_where_and_pagination() {
    let server = MockServer::start().await;
    let plugin = plugin(&server).await;

    Mock::given(method("GET"))
        .and(path("/test/orders"))
        .and(query_param("where", "customerId=\"c-1\""))
        .and(query_param("limit", "50"))
        .and(query_param("offset", "100"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(paged(1, 100, vec![json!({ "id": "o-1" })])),
        )
        .expect(1)
        .mount(&server)
        .await;

    let query: Query = serde_json::from_value(json!({
        "where": ["customerId=\"c-1\""],
        "page": 3,
        "perPage": 50
    }))
    .unwrap();

    let page = plugin
        .repository("order")
        .unwrap()
        .find(Some(&query))
        .await
        .unwrap();
    assert_eq!(page.total, 1);
    assert_eq!(page.results.len(), 1);
}

#[tokio::test]
async fn find_all_returns_a_single_page_untouched() {
    let server = MockServer::start().await;
    let plugin = plugin(&server).await;

    Mock::given(method("GET"))
        .and(path("/test/carts"))
        .and(query_param("limit", "500"))
        .and(query_param("offset", "0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(paged(
            2,
            0,
            vec![json!({ "id": "a" }), json!({ "id": "b" })],
        )))
        .expect(1)
        .mount(&server)
        .await;

    let all = plugin
        .repository("cart")
        .unwrap()
        .find_all(None)
        .await
        .unwrap();
    assert_eq!(all.total, 2);
    assert_eq!(all.count, 2);
    assert_eq!(all.results.len(), 2);
}

#[tokio::test]
async fn find_all_flattens_pagination_in_page_order() {
    let server = MockServer::start().await;
    let plugin = plugin(&server).await;

    let page_one: Vec<Value> = (0..500).map(|n| json!({ "n": n })).collect();
    let page_two: Vec<Value> = (500..1000).map(|n| json!({ "n": n })).collect();
    let page_three: Vec<Value> = vec![json!({ "n": 1000 })];

    for (offset, results) in [(0u64, page_one), (500, page_two), (1000, page_three)] {
        Mock::given(method("GET"))
            .and(path("/test/carts"))
            .and(query_param("limit", "500"))
            .and(query_param("offset", offset.to_string()))
            .respond_with(ResponseTemplate::new(200).set_body_json(paged(1001, offset, results)))
            .expect(1)
            .mount(&server)
            .await;
    }

    let all = plugin
        .repository("cart")
        .unwrap()
        .find_all(None)
        .await
        .unwrap();

    assert_eq!(all.total, 1001);
    assert_eq!(all.limit, 1001);
    assert_eq!(all.offset, 0);
    assert_eq!(all.count, 1001);
    assert_eq!(all.results.len(), 1001);
    assert_eq!(all.results[0]["n"], 0);
    assert_eq!(all.results[500]["n"], 500);
    assert_eq!(all.results[1000]["n"], 1000);
}

#[tokio::test]
async fn disallowed_operations_never_reach_the_network() {
    let server = MockServer::start().await;
    let plugin = plugin(&server).await;

    let err = plugin
        .repository("order-import")
        .unwrap()
        .find(None)
        .await
        .unwrap_err();

    assert_eq!(err.status(), Some(405));
    let body = err.body().unwrap();
    assert_eq!(body["statusCode"], 405);
    assert_eq!(body["message"], "Order Import doesn't allow FIND");

    // Only registration-time traffic is allowed, and there was none.
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn api_errors_preserve_status_and_body() {
    let server = MockServer::start().await;
    let plugin = plugin(&server).await;

    let error_body = json!({
        "statusCode": 409,
        "message": "Object has a different version",
        "errors": [{ "code": "ConcurrentModification", "currentVersion": 5 }]
    });
    Mock::given(method("POST"))
        .and(path("/test/carts/cart-1"))
        .respond_with(ResponseTemplate::new(409).set_body_json(&error_body))
        .expect(1)
        .mount(&server)
        .await;

    let err = plugin
        .repository("cart")
        .unwrap()
        .update("cart-1", 4, &[json!({ "action": "recalculate" })], None)
        .await
        .unwrap_err();

    assert_eq!(err.status(), Some(409));
    assert_eq!(err.body().unwrap(), error_body);
}

#[tokio::test]
async fn search_hits_the_projection_search_endpoint() {
    let server = MockServer::start().await;
    let plugin = plugin(&server).await;

    Mock::given(method("GET"))
        .and(path("/test/product-projections/search"))
        .and(query_param("text.en", "red shoe"))
        .and(query_param("fuzzy", "true"))
        .and(query_param("staged", "false"))
        .respond_with(ResponseTemplate::new(200).set_body_json(paged(0, 0, vec![])))
        .expect(1)
        .mount(&server)
        .await;

    let query = serde_json::from_value(json!({
        "text": { "language": "en", "value": "red shoe" },
        "fuzzy": true,
        "staged": false
    }))
    .unwrap();

    plugin
        .repository("product-projection")
        .unwrap()
        .search(Some(&query))
        .await
        .unwrap();
}

#[tokio::test]
async fn suggest_scopes_keywords_by_language() {
    let server = MockServer::start().await;
    let plugin = plugin(&server).await;

    Mock::given(method("GET"))
        .and(path("/test/product-projections/suggest"))
        .and(query_param("searchKeywords.de", "schuh"))
        .and(query_param("limit", "5"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "searchKeywords.de": [] })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let query = serde_json::from_value(json!({
        "searchKeywords": { "language": "de", "value": "schuh" },
        "limit": 5
    }))
    .unwrap();

    plugin
        .repository("product-projection")
        .unwrap()
        .suggest(Some(&query))
        .await
        .unwrap();
}

#[tokio::test]
async fn customer_login_posts_credentials() {
    let server = MockServer::start().await;
    let plugin = plugin(&server).await;

    let credentials = json!({ "email": "jane@example.com", "password": "secret" });
    Mock::given(method("POST"))
        .and(path("/test/login"))
        .and(body_json(&credentials))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "customer": { "id": "c-1" } })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let signed_in = plugin
        .repository("customer")
        .unwrap()
        .login(&credentials)
        .await
        .unwrap();
    assert_eq!(signed_in["customer"]["id"], "c-1");
}

#[tokio::test]
async fn customer_lookup_by_password_token_uses_path_form() {
    let server = MockServer::start().await;
    let plugin = plugin(&server).await;

    Mock::given(method("GET"))
        .and(path("/test/customers/password-token=tok-123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "c-1" })))
        .expect(1)
        .mount(&server)
        .await;

    plugin
        .repository("customer")
        .unwrap()
        .get_by_password_token("tok-123")
        .await
        .unwrap();
}

#[tokio::test]
async fn customer_flows_are_scoped_to_the_customer_resource() {
    let server = MockServer::start().await;
    let plugin = plugin(&server).await;

    let err = plugin
        .repository("cart")
        .unwrap()
        .login(&json!({}))
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(405));
    assert_eq!(
        err.body().unwrap()["message"],
        "Carts doesn't allow LOGIN"
    );
}

#[tokio::test]
async fn custom_object_upsert_and_container_key_delete() {
    let server = MockServer::start().await;
    let plugin = plugin(&server).await;

    let draft = json!({ "container": "checkout", "key": "rates", "value": { "de": 19 } });
    Mock::given(method("POST"))
        .and(path("/test/custom-objects"))
        .and(body_json(&draft))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "version": 2 })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("DELETE"))
        .and(path("/test/custom-objects/checkout/rates"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "version": 2 })))
        .expect(1)
        .mount(&server)
        .await;

    let objects = plugin.repository("custom-object").unwrap();
    objects.upsert(&draft).await.unwrap();
    objects
        .delete_by_container_and_key("checkout", "rates")
        .await
        .unwrap();

    // Action-based updates have no meaning for container/key objects.
    let err = objects.update("id-1", 1, &[], None).await.unwrap_err();
    assert_eq!(err.status(), Some(405));
}

#[tokio::test]
async fn store_scoped_carts_and_orders() {
    let server = MockServer::start().await;
    let plugin = plugin(&server).await;

    let draft = json!({ "currency": "EUR" });
    Mock::given(method("POST"))
        .and(path("/test/in-store/key=KEY-01/carts"))
        .and(body_json(&draft))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "id": "cart-1" })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/test/in-store/key=KEY-01/carts"))
        .respond_with(ResponseTemplate::new(200).set_body_json(paged(0, 0, vec![])))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/test/in-store/key=KEY-01/orders"))
        .respond_with(ResponseTemplate::new(200).set_body_json(paged(0, 0, vec![])))
        .expect(1)
        .mount(&server)
        .await;

    let stores = plugin.repository("store").unwrap();
    stores.create_cart("KEY-01", &draft).await.unwrap();
    stores.get_carts("KEY-01").await.unwrap();
    stores.get_orders("KEY-01").await.unwrap();
}

#[tokio::test]
async fn stores_support_standard_crud_via_custom_service() {
    let server = MockServer::start().await;
    let plugin = plugin(&server).await;

    Mock::given(method("GET"))
        .and(path("/test/stores/key=KEY-01"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "key": "KEY-01" })))
        .expect(1)
        .mount(&server)
        .await;

    let store = plugin
        .repository("store")
        .unwrap()
        .get("key=KEY-01", None)
        .await
        .unwrap();
    assert_eq!(store["key"], "KEY-01");
}
