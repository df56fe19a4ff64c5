//! Checkout handler

use std::collections::HashMap;

use axum::{extract::State, http::StatusCode, Extension, Json};

use core_kernel::{DateRange, ProductId};
use domain_order::{CheckoutRequest, PaymentMethod};

use crate::auth::AuthenticatedUser;
use crate::dto::checkout::{CheckoutBody, CheckoutResponse, RentalPeriod};
use crate::error::ApiError;
use crate::handlers::path_id;
use crate::AppState;

fn rental_map(rentals: Vec<RentalPeriod>) -> Result<HashMap<ProductId, DateRange>, ApiError> {
    rentals
        .into_iter()
        .map(|r| {
            let range = DateRange::new(r.start, r.end).map_err(|e| ApiError::BadRequest(e.to_string()))?;
            Ok((path_id(r.product_id, "product")?, range))
        })
        .collect()
}

/// Turns the caller's basket into orders
pub async fn checkout(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthenticatedUser>,
    Json(body): Json<CheckoutBody>,
) -> Result<(StatusCode, Json<CheckoutResponse>), ApiError> {
    let payment_method = PaymentMethod::parse(&body.payment_method)?;
    let rentals = rental_map(body.rentals)?;

    let totals = state.services.checkout.preview(caller.user_id, &rentals).await?;
    let history_id = state
        .services
        .checkout
        .create_order_from_cart(CheckoutRequest {
            buyer_id: caller.user_id,
            payment_method,
            contact: body.contact.into(),
            additional_info: body.additional_info,
            rentals,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(CheckoutResponse::new(*history_id.as_uuid(), &totals)),
    ))
}
