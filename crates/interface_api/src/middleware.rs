//! API middleware

use axum::{
    body::Body,
    extract::State,
    http::{header, Request},
    middleware::Next,
    response::Response,
};
use chrono::Utc;
use tracing::{info, warn};

use crate::auth::{validate_token, AuthenticatedUser};
use crate::error::ApiError;
use crate::AppState;

/// Bearer token authentication
///
/// Stores the [`AuthenticatedUser`] in the request extensions for handlers
/// and the audit log.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let token = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty());

    let Some(token) = token else {
        warn!("Missing or invalid Authorization header");
        return Err(ApiError::Unauthorized("Missing bearer token".to_string()));
    };

    let caller = validate_token(token, &state.config.jwt_secret)
        .and_then(|claims| AuthenticatedUser::from_claims(&claims))
        .map_err(|e| {
            warn!(error = %e, "Token validation failed");
            ApiError::Unauthorized(e.to_string())
        })?;

    request.extensions_mut().insert(caller);
    Ok(next.run(request).await)
}

/// Logs every API request with its caller and outcome
pub async fn audit_middleware(request: Request<Body>, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let user_id = request
        .extensions()
        .get::<AuthenticatedUser>()
        .map(|c| c.user_id.to_string())
        .unwrap_or_else(|| "anonymous".to_string());

    let start = Utc::now();

    let response = next.run(request).await;

    let duration = Utc::now() - start;
    let status = response.status();

    info!(
        method = %method,
        uri = %uri,
        user = %user_id,
        status = %status.as_u16(),
        duration_ms = duration.num_milliseconds(),
        "API request"
    );

    response
}
