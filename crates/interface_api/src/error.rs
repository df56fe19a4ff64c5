//! API error handling
//!
//! Every handler returns [`ApiError`]; domain errors convert into it so the
//! status mapping lives in one place.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use core_kernel::{CoreError, MoneyError, PortError};
use domain_account::AccountError;
use domain_basket::BasketError;
use domain_catalog::{BidError, CatalogError};
use domain_contract::ContractError;
use domain_order::OrderError;

/// API error types
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Validation error: {message}")]
    Validation { message: String, details: Vec<String> },

    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::Validation {
            message: message.into(),
            details: Vec::new(),
        }
    }

    fn field(field: &str, message: impl Into<String>) -> Self {
        let message = message.into();
        ApiError::Validation {
            details: vec![format!("{}: {}", field, message)],
            message,
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Validation { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<String>>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let (error_type, message, details) = match self {
            ApiError::NotFound(msg) => ("not_found", msg, None),
            ApiError::BadRequest(msg) => ("bad_request", msg, None),
            ApiError::Unauthorized(msg) => ("unauthorized", msg, None),
            ApiError::Forbidden(msg) => ("forbidden", msg, None),
            ApiError::Conflict(msg) => ("conflict", msg, None),
            ApiError::Validation { message, details } => {
                ("validation_error", message, Some(details).filter(|d| !d.is_empty()))
            }
            ApiError::ServiceUnavailable(msg) => {
                tracing::warn!(error = %msg, "Storage unavailable");
                ("service_unavailable", "Service temporarily unavailable".to_string(), None)
            }
            ApiError::Internal(msg) => {
                tracing::error!(error = %msg, "Internal error");
                ("internal_error", "Internal server error".to_string(), None)
            }
        };

        let body = ErrorResponse {
            error: error_type.to_string(),
            message,
            details,
        };

        (status, Json(body)).into_response()
    }
}

impl From<PortError> for ApiError {
    fn from(err: PortError) -> Self {
        match err {
            PortError::NotFound { .. } => ApiError::NotFound(err.to_string()),
            PortError::Validation { message, field } => match field {
                Some(field) => ApiError::field(&field, message),
                None => ApiError::validation(message),
            },
            PortError::Conflict { message } => ApiError::Conflict(message),
            PortError::Connection { .. } | PortError::Timeout { .. } => ApiError::ServiceUnavailable(err.to_string()),
            PortError::Internal { .. } => ApiError::Internal(err.to_string()),
        }
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::NotFound(msg) => ApiError::NotFound(msg),
            CoreError::InvalidStateTransition(msg) => ApiError::Conflict(msg),
            CoreError::Configuration(msg) => ApiError::Internal(msg),
            other => ApiError::BadRequest(other.to_string()),
        }
    }
}

impl From<MoneyError> for ApiError {
    fn from(err: MoneyError) -> Self {
        ApiError::BadRequest(err.to_string())
    }
}

impl From<AccountError> for ApiError {
    fn from(err: AccountError) -> Self {
        match err {
            AccountError::InvalidField { field, message } => ApiError::field(field, message),
            AccountError::LoginRejected(msg) => ApiError::Unauthorized(msg),
            AccountError::NotABuyer(_) | AccountError::NotASeller(_) => ApiError::Forbidden(err.to_string()),
            AccountError::UsernameTaken
            | AccountError::EmailTaken
            | AccountError::InsufficientBalance
            | AccountError::InvalidLinkageTransition { .. } => ApiError::Conflict(err.to_string()),
            AccountError::Core(e) => e.into(),
            AccountError::Money(e) => e.into(),
            AccountError::Port(e) => e.into(),
        }
    }
}

impl From<BidError> for ApiError {
    fn from(err: BidError) -> Self {
        match err {
            BidError::EmptyAmount | BidError::InvalidFormat | BidError::NotPositive => {
                ApiError::field("amount", err.to_string())
            }
            BidError::UnsavedAuction | BidError::UnknownBidder => ApiError::NotFound(err.to_string()),
            BidError::OwnAuction => ApiError::Forbidden(err.to_string()),
            BidError::AuctionEnded
            | BidError::NotStarted
            | BidError::BelowMinimum(_)
            | BidError::InsufficientBalance
            | BidError::Rejected(_) => ApiError::Conflict(err.to_string()),
        }
    }
}

impl From<CatalogError> for ApiError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::InvalidField { field, message } => ApiError::field(field, message),
            CatalogError::Bid(e) => e.into(),
            CatalogError::AuctionStillRunning | CatalogError::AlreadyWaitlisted | CatalogError::NotBorrowed(_) => {
                ApiError::Conflict(err.to_string())
            }
            CatalogError::Core(e) => e.into(),
            CatalogError::Money(e) => e.into(),
            CatalogError::Account(e) => e.into(),
            CatalogError::Port(e) => e.into(),
        }
    }
}

impl From<BasketError> for ApiError {
    fn from(err: BasketError) -> Self {
        match err {
            BasketError::NegativeQuantity | BasketError::InvalidQuantityText => {
                ApiError::field("quantity", err.to_string())
            }
            BasketError::EmptyPromoCode | BasketError::InvalidPromoCode => {
                ApiError::field("promo_code", err.to_string())
            }
            BasketError::ItemNotFound => ApiError::NotFound(err.to_string()),
            BasketError::NotCheckoutReady(_) | BasketError::OutOfStock { .. } | BasketError::InsufficientStock { .. } => {
                ApiError::Conflict(err.to_string())
            }
            BasketError::Core(e) => e.into(),
            BasketError::Money(e) => e.into(),
            BasketError::Catalog(e) => e.into(),
            BasketError::Port(e) => e.into(),
        }
    }
}

impl From<OrderError> for ApiError {
    fn from(err: OrderError) -> Self {
        match err {
            OrderError::InvalidField { field, message } => ApiError::field(field, message),
            OrderError::UnknownStatus(_) | OrderError::UnknownPeriod(_) => ApiError::BadRequest(err.to_string()),
            OrderError::EmptyCart | OrderError::CannotRevert => ApiError::Conflict(err.to_string()),
            OrderError::Core(e) => e.into(),
            OrderError::Money(e) => e.into(),
            OrderError::Account(e) => e.into(),
            OrderError::Basket(e) => e.into(),
            OrderError::Port(e) => e.into(),
        }
    }
}

impl From<ContractError> for ApiError {
    fn from(err: ContractError) -> Self {
        match err {
            ContractError::InvalidField { field, message } => ApiError::field(field, message),
            ContractError::EndDateNotAfter => ApiError::field("new_end_date", err.to_string()),
            ContractError::InvalidDocument => ApiError::BadRequest(err.to_string()),
            ContractError::NotActive(_) | ContractError::AlreadyRenewed | ContractError::RenewalLimitExceeded => {
                ApiError::Conflict(err.to_string())
            }
            ContractError::Core(e) => e.into(),
            ContractError::Account(e) => e.into(),
            ContractError::Port(e) => e.into(),
        }
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut details: Vec<String> = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, errs)| {
                errs.iter().map(move |e| match &e.message {
                    Some(message) => format!("{}: {}", field, message),
                    None => format!("{}: {}", field, e.code),
                })
            })
            .collect();
        details.sort();
        ApiError::Validation {
            message: "Request validation failed".to_string(),
            details,
        }
    }
}
