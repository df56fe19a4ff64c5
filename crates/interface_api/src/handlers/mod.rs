//! Request handlers

pub mod auctions;
pub mod auth;
pub mod basket;
pub mod checkout;
pub mod contracts;
pub mod health;
pub mod tracking;

use uuid::Uuid;
use validator::Validate;

use crate::error::ApiError;

/// Runs the derived field checks on a request body
pub(crate) fn validated<T: Validate>(body: T) -> Result<T, ApiError> {
    body.validate()?;
    Ok(body)
}

/// Path ids arrive as bare UUIDs; the nil UUID never names a stored entity
pub(crate) fn path_id<T: From<Uuid>>(id: Uuid, entity: &str) -> Result<T, ApiError> {
    if id.is_nil() {
        return Err(ApiError::BadRequest(format!("Invalid {} ID", entity)));
    }
    Ok(T::from(id))
}
