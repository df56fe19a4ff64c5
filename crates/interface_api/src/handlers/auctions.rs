//! Auction handlers

use axum::{
    extract::{Path, State},
    Extension, Json,
};
use uuid::Uuid;

use core_kernel::ProductId;
use domain_catalog::parse_bid_amount;

use crate::auth::AuthenticatedUser;
use crate::dto::auction::{AuctionResponse, PlaceBidRequest};
use crate::error::ApiError;
use crate::handlers::{path_id, validated};
use crate::AppState;

/// Current state of an auction
pub async fn get_auction(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<AuctionResponse>, ApiError> {
    let auction = state.services.auctions.get_auction(path_id(id, "product")?).await?;
    Ok(Json(AuctionResponse::from(&auction)))
}

/// Places a bid for the caller
pub async fn place_bid(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthenticatedUser>,
    Path(id): Path<Uuid>,
    Json(request): Json<PlaceBidRequest>,
) -> Result<Json<AuctionResponse>, ApiError> {
    let request = validated(request)?;
    let product_id: ProductId = path_id(id, "product")?;
    let amount = parse_bid_amount(&request.amount)?;

    let auction = state
        .services
        .auctions
        .place_bid(product_id, caller.user_id, amount)
        .await?;
    Ok(Json(AuctionResponse::from(&auction)))
}
