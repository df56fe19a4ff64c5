//! Basket handlers
//!
//! Every route works on the caller's own basket.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use uuid::Uuid;

use crate::auth::AuthenticatedUser;
use crate::dto::basket::{AddItemRequest, BasketResponse, TotalsQuery, TotalsResponse, UpdateQuantityRequest};
use crate::error::ApiError;
use crate::handlers::{path_id, validated};
use crate::AppState;

pub async fn get_basket(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthenticatedUser>,
) -> Result<Json<BasketResponse>, ApiError> {
    let basket = state.services.baskets.get_basket(caller.user_id).await?;
    Ok(Json(BasketResponse::from(&basket)))
}

pub async fn add_item(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthenticatedUser>,
    Json(request): Json<AddItemRequest>,
) -> Result<(StatusCode, Json<BasketResponse>), ApiError> {
    let request = validated(request)?;
    let basket = state
        .services
        .baskets
        .add_product(caller.user_id, path_id(request.product_id, "product")?, request.quantity)
        .await?;
    Ok((StatusCode::CREATED, Json(BasketResponse::from(&basket))))
}

pub async fn update_quantity(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthenticatedUser>,
    Path(product_id): Path<Uuid>,
    Json(request): Json<UpdateQuantityRequest>,
) -> Result<Json<BasketResponse>, ApiError> {
    let basket = state
        .services
        .baskets
        .update_quantity(caller.user_id, path_id(product_id, "product")?, request.quantity)
        .await?;
    Ok(Json(BasketResponse::from(&basket)))
}

pub async fn remove_item(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthenticatedUser>,
    Path(product_id): Path<Uuid>,
) -> Result<Json<BasketResponse>, ApiError> {
    let basket = state
        .services
        .baskets
        .remove_product(caller.user_id, path_id(product_id, "product")?)
        .await?;
    Ok(Json(BasketResponse::from(&basket)))
}

/// Totals with an optional promo code that is checked but not stored
pub async fn totals(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthenticatedUser>,
    Query(query): Query<TotalsQuery>,
) -> Result<Json<TotalsResponse>, ApiError> {
    let promo_code = query.promo_code.as_deref().filter(|c| !c.trim().is_empty());
    let totals = state.services.baskets.totals(caller.user_id, promo_code).await?;
    Ok(Json(TotalsResponse::from(totals)))
}
