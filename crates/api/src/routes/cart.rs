//! Minimal cart surface: enough to fill and inspect the working set the
//! checkout consumes. Catalog browsing itself lives elsewhere.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use domain::{CartLine, CupSize, IceLevel, SugarLevel};
use serde::{Deserialize, Serialize};
use store::Store;
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::routes::orders::AppState;

#[derive(Deserialize)]
pub struct CartLineRequest {
    pub product_id: Uuid,
    pub quantity: u32,
    #[serde(default)]
    pub size: CupSize,
    #[serde(default)]
    pub ice: IceLevel,
    #[serde(default)]
    pub sugar: SugarLevel,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Deserialize)]
pub struct ReplaceCartRequest {
    pub lines: Vec<CartLineRequest>,
}

#[derive(Serialize)]
pub struct CartLineResponse {
    pub product_id: String,
    pub quantity: u32,
    pub size: String,
    pub ice: String,
    pub sugar: String,
    pub notes: Option<String>,
}

/// PUT /cart — replace the user's cart.
#[tracing::instrument(skip(state, req))]
pub async fn replace<S: Store + 'static>(
    State(state): State<Arc<AppState<S>>>,
    AuthUser(user_id): AuthUser,
    Json(req): Json<ReplaceCartRequest>,
) -> Result<Json<Vec<CartLineResponse>>, ApiError> {
    let lines: Vec<CartLine> = req
        .lines
        .into_iter()
        .map(|line| CartLine {
            product_id: line.product_id.into(),
            quantity: line.quantity,
            size: line.size,
            ice: line.ice,
            sugar: line.sugar,
            notes: line.notes,
        })
        .collect();

    state.store.replace_cart(user_id, lines).await?;
    let stored = state.store.cart_lines(user_id).await?;
    Ok(Json(stored.iter().map(to_response).collect()))
}

/// GET /cart — read the user's cart.
#[tracing::instrument(skip(state))]
pub async fn get<S: Store + 'static>(
    State(state): State<Arc<AppState<S>>>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<Vec<CartLineResponse>>, ApiError> {
    let lines = state.store.cart_lines(user_id).await?;
    Ok(Json(lines.iter().map(to_response).collect()))
}

fn to_response(line: &CartLine) -> CartLineResponse {
    CartLineResponse {
        product_id: line.product_id.to_string(),
        quantity: line.quantity,
        size: line.size.as_str().to_string(),
        ice: line.ice.as_str().to_string(),
        sugar: line.sugar.as_str().to_string(),
        notes: line.notes.clone(),
    }
}
