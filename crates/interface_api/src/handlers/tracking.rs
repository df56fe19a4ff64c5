//! Order tracking handler

use axum::{
    extract::{Path, State},
    Extension, Json,
};
use uuid::Uuid;

use core_kernel::OrderId;

use crate::auth::AuthenticatedUser;
use crate::dto::tracking::TrackingResponse;
use crate::error::ApiError;
use crate::handlers::path_id;
use crate::AppState;

/// Delivery status and checkpoints of an order, for its buyer or seller
pub async fn order_tracking(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthenticatedUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<TrackingResponse>, ApiError> {
    let order_id: OrderId = path_id(id, "order")?;
    let order = state.services.orders.get_order(order_id).await?;
    if !caller.may_act_for(order.buyer_id) && !caller.may_act_for(order.seller_id) {
        return Err(ApiError::Forbidden("Order belongs to another user".to_string()));
    }

    let tracked = state
        .services
        .tracking
        .tracked_order_for_order(order_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("No tracking for order {}", order_id)))?;
    let checkpoints = state.services.tracking.checkpoints(tracked.id).await?;

    Ok(Json(TrackingResponse::new(&tracked, &checkpoints)))
}
