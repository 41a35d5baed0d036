//! Integration tests for the API server over the in-memory store.

use std::sync::{Arc, OnceLock};

use axum::body::Body;
use axum::http::{Request, StatusCode};
use common::{ProductId, UserId};
use domain::{Money, Product};
use metrics_exporter_prometheus::PrometheusHandle;
use ordering::RecordingNotifier;
use store::InMemoryStore;
use tower::ServiceExt;

static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

fn get_metrics_handle() -> PrometheusHandle {
    METRICS_HANDLE
        .get_or_init(|| {
            let builder = metrics_exporter_prometheus::PrometheusBuilder::new();
            builder
                .install_recorder()
                .expect("failed to install Prometheus recorder")
        })
        .clone()
}

struct TestApp {
    app: axum::Router,
    store: InMemoryStore,
    user_id: UserId,
}

async fn setup() -> TestApp {
    let store = InMemoryStore::new();
    let notifier = Arc::new(RecordingNotifier::new());
    let state = api::create_state(store.clone(), notifier);
    let app = api::create_app(state, get_metrics_handle());

    TestApp {
        app,
        store,
        user_id: UserId::new(),
    }
}

async fn seed_product(store: &InMemoryStore, price: i64, stock: i64) -> Product {
    let product = Product {
        id: ProductId::new(),
        name: "Peach Oolong".to_string(),
        price: Money::new(price),
        sale_price: None,
        stock,
        sold: 0,
    };
    store.insert_product(product.clone()).await;
    product
}

fn json_request(method: &str, uri: &str, user_id: Option<UserId>, body: serde_json::Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(user_id) = user_id {
        builder = builder.header("x-user-id", user_id.to_string());
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

async fn response_json(response: axum::response::Response) -> serde_json::Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

async fn fill_cart(t: &TestApp, product: &Product, quantity: u32) {
    let response = t
        .app
        .clone()
        .oneshot(json_request(
            "PUT",
            "/cart",
            Some(t.user_id),
            serde_json::json!({
                "lines": [{
                    "product_id": product.id.to_string(),
                    "quantity": quantity,
                }]
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

fn checkout_body() -> serde_json::Value {
    serde_json::json!({
        "shipping_method": "standard",
        "payment_method": "cod",
        "shipping_address": "12 Tea Lane",
        "shipping_phone": "0900000000",
    })
}

#[tokio::test]
async fn test_health_check() {
    let t = setup().await;

    let response = t
        .app
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = response_json(response).await;
    assert_eq!(json["status"], "ok");
}

#[tokio::test]
async fn test_checkout_requires_auth() {
    let t = setup().await;

    let response = t
        .app
        .oneshot(json_request("POST", "/checkout", None, checkout_body()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_checkout_and_get_order() {
    let t = setup().await;
    let product = seed_product(&t.store, 50_000, 10).await;
    fill_cart(&t, &product, 2).await;

    let response = t
        .app
        .clone()
        .oneshot(json_request(
            "POST",
            "/checkout",
            Some(t.user_id),
            checkout_body(),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    let created = response_json(response).await;
    assert_eq!(created["status"], "pending");
    assert_eq!(created["subtotal"], 100_000);
    assert_eq!(created["total"], 110_000);
    assert_eq!(created["points_earned"], 500);
    let order_id = created["id"].as_str().unwrap().to_string();

    // Fetch it back.
    let response = t
        .app
        .clone()
        .oneshot(
            Request::builder()
                .uri(format!("/orders/{order_id}"))
                .header("x-user-id", t.user_id.to_string())
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let fetched = response_json(response).await;
    assert_eq!(fetched["id"], order_id.as_str());
    assert_eq!(fetched["items"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_checkout_empty_cart_is_bad_request() {
    let t = setup().await;

    let response = t
        .app
        .oneshot(json_request(
            "POST",
            "/checkout",
            Some(t.user_id),
            checkout_body(),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_checkout_insufficient_stock_is_conflict() {
    let t = setup().await;
    let product = seed_product(&t.store, 50_000, 2).await;
    fill_cart(&t, &product, 3).await;

    let response = t
        .app
        .oneshot(json_request(
            "POST",
            "/checkout",
            Some(t.user_id),
            checkout_body(),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CONFLICT);
    let json = response_json(response).await;
    let message = json["error"].as_str().unwrap();
    assert!(message.contains("Peach Oolong"));
    assert!(message.contains("2 available"));
}

#[tokio::test]
async fn test_other_users_orders_are_hidden() {
    let t = setup().await;
    let product = seed_product(&t.store, 50_000, 10).await;
    fill_cart(&t, &product, 1).await;

    let response = t
        .app
        .clone()
        .oneshot(json_request(
            "POST",
            "/checkout",
            Some(t.user_id),
            checkout_body(),
        ))
        .await
        .unwrap();
    let order_id = response_json(response).await["id"]
        .as_str()
        .unwrap()
        .to_string();

    let stranger = UserId::new();
    let response = t
        .app
        .oneshot(
            Request::builder()
                .uri(format!("/orders/{order_id}"))
                .header("x-user-id", stranger.to_string())
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_admin_status_update_and_customer_cancel_window() {
    let t = setup().await;
    let product = seed_product(&t.store, 50_000, 10).await;
    fill_cart(&t, &product, 1).await;

    let response = t
        .app
        .clone()
        .oneshot(json_request(
            "POST",
            "/checkout",
            Some(t.user_id),
            checkout_body(),
        ))
        .await
        .unwrap();
    let order_id = response_json(response).await["id"]
        .as_str()
        .unwrap()
        .to_string();

    // Operator confirms.
    let response = t
        .app
        .clone()
        .oneshot(json_request(
            "PUT",
            &format!("/admin/orders/{order_id}/status"),
            None,
            serde_json::json!({ "status": "confirmed" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = response_json(response).await;
    assert_eq!(json["status"], "confirmed");

    // Customer cancels within the window (still allowed from confirmed).
    let response = t
        .app
        .clone()
        .oneshot(json_request(
            "POST",
            &format!("/orders/{order_id}/cancel"),
            Some(t.user_id),
            serde_json::json!({ "reason": "wrong drink" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = response_json(response).await;
    assert_eq!(json["status"], "cancelled");
    assert_eq!(json["cancellation_reason"], "wrong drink");
}

#[tokio::test]
async fn test_late_cancel_is_conflict_and_request_is_recorded() {
    let t = setup().await;
    let product = seed_product(&t.store, 50_000, 10).await;
    fill_cart(&t, &product, 1).await;

    let response = t
        .app
        .clone()
        .oneshot(json_request(
            "POST",
            "/checkout",
            Some(t.user_id),
            checkout_body(),
        ))
        .await
        .unwrap();
    let order_id = response_json(response).await["id"]
        .as_str()
        .unwrap()
        .to_string();

    let parsed = common::OrderId::from_uuid(order_id.parse().unwrap());
    t.store.backdate(parsed, chrono::Duration::minutes(6)).await;

    // Direct cancel is rejected now.
    let response = t
        .app
        .clone()
        .oneshot(json_request(
            "POST",
            &format!("/orders/{order_id}/cancel"),
            Some(t.user_id),
            serde_json::json!({ "reason": "too late" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    // But a cancellation request is recorded.
    let response = t
        .app
        .clone()
        .oneshot(json_request(
            "POST",
            &format!("/orders/{order_id}/cancel-request"),
            Some(t.user_id),
            serde_json::json!({ "reason": "please cancel" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = response_json(response).await;
    assert_eq!(json["status"], "pending");
}

#[tokio::test]
async fn test_review_callback_jumps_pending_to_shipping() {
    let t = setup().await;
    let product = seed_product(&t.store, 50_000, 10).await;
    fill_cart(&t, &product, 1).await;

    let response = t
        .app
        .clone()
        .oneshot(json_request(
            "POST",
            "/checkout",
            Some(t.user_id),
            checkout_body(),
        ))
        .await
        .unwrap();
    let order_id = response_json(response).await["id"]
        .as_str()
        .unwrap()
        .to_string();

    let response = t
        .app
        .clone()
        .oneshot(json_request(
            "POST",
            &format!("/orders/{order_id}/review-submitted"),
            None,
            serde_json::json!({}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = response_json(response).await;
    assert_eq!(json["advanced"], true);
    assert_eq!(json["status"], "shipping");

    // A second callback is a no-op.
    let response = t
        .app
        .oneshot(json_request(
            "POST",
            &format!("/orders/{order_id}/review-submitted"),
            None,
            serde_json::json!({}),
        ))
        .await
        .unwrap();
    let json = response_json(response).await;
    assert_eq!(json["advanced"], false);
}

#[tokio::test]
async fn test_metrics_endpoint_renders() {
    let t = setup().await;

    let response = t
        .app
        .oneshot(
            Request::builder()
                .uri("/metrics")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}
