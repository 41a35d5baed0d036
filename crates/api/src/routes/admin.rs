//! Privileged order management. Access control is enforced by middleware
//! outside this system; these handlers assume an already-authorized
//! operator.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use domain::OrderStatus;
use serde::Deserialize;
use store::Store;

use crate::error::ApiError;
use crate::routes::orders::{AppState, CancelRequest, OrderResponse, parse_order_id};

#[derive(Deserialize)]
pub struct UpdateStatusRequest {
    pub status: String,
}

/// PUT /admin/orders/{id}/status — apply a manual forward transition.
#[tracing::instrument(skip(state, req))]
pub async fn update_status<S: Store + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
    Json(req): Json<UpdateStatusRequest>,
) -> Result<Json<OrderResponse>, ApiError> {
    let order_id = parse_order_id(&id)?;
    let status = OrderStatus::parse(&req.status)
        .ok_or_else(|| ApiError::BadRequest(format!("Unknown status: {}", req.status)))?;

    let order = state.lifecycle.update_status(order_id, status).await?;
    Ok(Json(OrderResponse::from(&order)))
}

/// POST /admin/orders/{id}/cancel — operator cancellation, no time window.
#[tracing::instrument(skip(state, req))]
pub async fn cancel<S: Store + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
    Json(req): Json<CancelRequest>,
) -> Result<Json<OrderResponse>, ApiError> {
    let order_id = parse_order_id(&id)?;
    let order = state
        .lifecycle
        .cancel_by_operator(order_id, req.reason)
        .await?;
    Ok(Json(OrderResponse::from(&order)))
}
