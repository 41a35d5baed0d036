//! Checkout, order reads, cancellation, and the review callback.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use common::OrderId;
use domain::Order;
use ordering::{CheckoutRequest, CheckoutService, LifecycleEngine};
use serde::{Deserialize, Serialize};
use store::Store;
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::error::ApiError;

/// Shared application state accessible from all handlers.
pub struct AppState<S: Store> {
    pub checkout: CheckoutService<S>,
    pub lifecycle: Arc<LifecycleEngine<S>>,
    pub store: S,
}

// -- Request types --

#[derive(Deserialize)]
pub struct CancelRequest {
    pub reason: String,
}

// -- Response types --

#[derive(Serialize)]
pub struct OrderItemResponse {
    pub product_id: String,
    pub product_name: String,
    pub quantity: u32,
    pub unit_price: i64,
    pub size: String,
    pub ice: String,
    pub sugar: String,
    pub notes: Option<String>,
}

#[derive(Serialize)]
pub struct OrderResponse {
    pub id: String,
    pub order_no: String,
    pub status: String,
    pub payment_method: String,
    pub shipping_method: String,
    pub subtotal: i64,
    pub shipping_fee: i64,
    pub voucher_code: Option<String>,
    pub voucher_discount: i64,
    pub points_used: i64,
    pub points_earned: i64,
    pub total: i64,
    pub shipping_address: String,
    pub shipping_phone: String,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub confirmed_at: Option<DateTime<Utc>>,
    pub preparing_at: Option<DateTime<Utc>>,
    pub shipping_at: Option<DateTime<Utc>>,
    pub delivered_at: Option<DateTime<Utc>>,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub cancellation_reason: Option<String>,
    pub items: Vec<OrderItemResponse>,
}

impl From<&Order> for OrderResponse {
    fn from(order: &Order) -> Self {
        OrderResponse {
            id: order.id.to_string(),
            order_no: order.order_no.clone(),
            status: order.status.to_string(),
            payment_method: order.payment_method.as_str().to_string(),
            shipping_method: order.shipping_method.as_str().to_string(),
            subtotal: order.subtotal.amount(),
            shipping_fee: order.shipping_fee.amount(),
            voucher_code: order.voucher_code.clone(),
            voucher_discount: order.voucher_discount.amount(),
            points_used: order.points_used,
            points_earned: order.points_earned,
            total: order.total.amount(),
            shipping_address: order.shipping_address.clone(),
            shipping_phone: order.shipping_phone.clone(),
            notes: order.notes.clone(),
            created_at: order.created_at,
            confirmed_at: order.confirmed_at,
            preparing_at: order.preparing_at,
            shipping_at: order.shipping_at,
            delivered_at: order.delivered_at,
            cancelled_at: order.cancelled_at,
            cancellation_reason: order.cancellation_reason.clone(),
            items: order
                .items
                .iter()
                .map(|item| OrderItemResponse {
                    product_id: item.product_id.to_string(),
                    product_name: item.product_name.clone(),
                    quantity: item.quantity,
                    unit_price: item.unit_price.amount(),
                    size: item.size.as_str().to_string(),
                    ice: item.ice.as_str().to_string(),
                    sugar: item.sugar.as_str().to_string(),
                    notes: item.notes.clone(),
                })
                .collect(),
        }
    }
}

// -- Handlers --

/// POST /checkout — commit the user's cart as an order.
#[tracing::instrument(skip(state, req))]
pub async fn checkout<S: Store + 'static>(
    State(state): State<Arc<AppState<S>>>,
    AuthUser(user_id): AuthUser,
    Json(req): Json<CheckoutRequest>,
) -> Result<(StatusCode, Json<OrderResponse>), ApiError> {
    let order = state.checkout.commit_order(user_id, req).await?;
    Ok((StatusCode::CREATED, Json(OrderResponse::from(&order))))
}

/// GET /orders — list the authenticated user's orders.
#[tracing::instrument(skip(state))]
pub async fn list<S: Store + 'static>(
    State(state): State<Arc<AppState<S>>>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<Vec<OrderResponse>>, ApiError> {
    let orders = state.store.orders_for_user(user_id).await?;
    Ok(Json(orders.iter().map(OrderResponse::from).collect()))
}

/// GET /orders/{id} — load one of the user's orders.
#[tracing::instrument(skip(state))]
pub async fn get<S: Store + 'static>(
    State(state): State<Arc<AppState<S>>>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<OrderResponse>, ApiError> {
    let order_id = parse_order_id(&id)?;
    let order = state
        .store
        .order(order_id)
        .await?
        .filter(|order| order.user_id == user_id)
        .ok_or_else(|| ApiError::NotFound(format!("Order {id} not found")))?;

    Ok(Json(OrderResponse::from(&order)))
}

/// POST /orders/{id}/cancel — cancel within the allowed window.
#[tracing::instrument(skip(state, req))]
pub async fn cancel<S: Store + 'static>(
    State(state): State<Arc<AppState<S>>>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<String>,
    Json(req): Json<CancelRequest>,
) -> Result<Json<OrderResponse>, ApiError> {
    let order_id = parse_order_id(&id)?;
    let order = state
        .lifecycle
        .cancel_by_customer(user_id, order_id, req.reason)
        .await?;
    Ok(Json(OrderResponse::from(&order)))
}

/// POST /orders/{id}/cancel-request — record a late cancellation request.
#[tracing::instrument(skip(state, req))]
pub async fn cancel_request<S: Store + 'static>(
    State(state): State<Arc<AppState<S>>>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<String>,
    Json(req): Json<CancelRequest>,
) -> Result<Json<OrderResponse>, ApiError> {
    let order_id = parse_order_id(&id)?;
    let order = state
        .lifecycle
        .request_cancellation(user_id, order_id, &req.reason)
        .await?;
    Ok(Json(OrderResponse::from(&order)))
}

/// POST /orders/{id}/review-submitted — internal callback from the review
/// subsystem. A review on a pending order jumps it straight to shipping;
/// anything else is a no-op.
#[tracing::instrument(skip(state))]
pub async fn review_submitted<S: Store + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let order_id = parse_order_id(&id)?;
    let jumped = state.lifecycle.review_submitted(order_id).await?;

    Ok(Json(serde_json::json!({
        "advanced": jumped.is_some(),
        "status": jumped.map(|o| o.status.to_string()),
    })))
}

pub(crate) fn parse_order_id(id: &str) -> Result<OrderId, ApiError> {
    let uuid = Uuid::parse_str(id)
        .map_err(|e| ApiError::BadRequest(format!("Invalid order ID: {e}")))?;
    Ok(OrderId::from_uuid(uuid))
}
