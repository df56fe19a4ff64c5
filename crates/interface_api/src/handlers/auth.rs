//! Login handler

use axum::{extract::State, Json};

use domain_account::{generate_captcha, LoginAttempt};

use crate::auth::create_token;
use crate::dto::auth::{LoginRequest, LoginResponse};
use crate::error::ApiError;
use crate::handlers::validated;
use crate::AppState;

/// Exchanges credentials for a bearer token
///
/// API clients have no captcha image to read, so the challenge is issued
/// and answered server side; the lockout and ban rules still apply.
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let request = validated(request)?;
    let captcha = generate_captcha();

    let user = state
        .services
        .accounts
        .validate_login(LoginAttempt {
            email: &request.email,
            password: &request.password,
            entered_captcha: &captcha,
            generated_captcha: &captcha,
        })
        .await?;

    let token = create_token(&user, &state.config.jwt_secret, state.config.jwt_expiration_secs)
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    Ok(Json(LoginResponse {
        access_token: token,
        token_type: "Bearer".to_string(),
        expires_in: state.config.jwt_expiration_secs,
        user_id: *user.id.as_uuid(),
        username: user.username,
        role: user.role,
    }))
}
