//! HTTP API server with observability for the shop backend.
//!
//! Exposes checkout, order reads, cancellation, the review callback, and
//! privileged status management, with structured logging (tracing) and
//! Prometheus metrics.

pub mod auth;
pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post, put};
use metrics_exporter_prometheus::PrometheusHandle;
use ordering::{CheckoutService, LifecycleEngine, Notifier};
use store::Store;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use routes::orders::AppState;

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<S: Store + Clone + 'static>(
    state: Arc<AppState<S>>,
    metrics_handle: PrometheusHandle,
) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route("/checkout", post(routes::orders::checkout::<S>))
        .route(
            "/cart",
            get(routes::cart::get::<S>).put(routes::cart::replace::<S>),
        )
        .route("/orders", get(routes::orders::list::<S>))
        .route("/orders/{id}", get(routes::orders::get::<S>))
        .route("/orders/{id}/cancel", post(routes::orders::cancel::<S>))
        .route(
            "/orders/{id}/cancel-request",
            post(routes::orders::cancel_request::<S>),
        )
        .route(
            "/orders/{id}/review-submitted",
            post(routes::orders::review_submitted::<S>),
        )
        .route(
            "/admin/orders/{id}/status",
            put(routes::admin::update_status::<S>),
        )
        .route("/admin/orders/{id}/cancel", post(routes::admin::cancel::<S>))
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Wires the application state from a store and a notifier.
pub fn create_state<S: Store + Clone + 'static>(
    store: S,
    notifier: Arc<dyn Notifier>,
) -> Arc<AppState<S>> {
    let checkout = CheckoutService::new(store.clone(), notifier.clone());
    let lifecycle = Arc::new(LifecycleEngine::new(store.clone(), notifier));

    Arc::new(AppState {
        checkout,
        lifecycle,
        store,
    })
}
