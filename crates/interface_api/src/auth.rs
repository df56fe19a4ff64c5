//! Authentication and authorization

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, errors::ErrorKind, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use core_kernel::UserId;
use domain_account::{User, UserRole};

/// JWT claims
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID, bare UUID)
    pub sub: String,
    pub username: String,
    pub role: UserRole,
    /// Expiration timestamp
    pub exp: i64,
    /// Issued at timestamp
    pub iat: i64,
}

/// Auth errors
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid token")]
    InvalidToken,
    #[error("Token expired")]
    TokenExpired,
    #[error("Token could not be issued")]
    Signing,
}

/// The caller of an authenticated route, stored in request extensions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub user_id: UserId,
    pub username: String,
    pub role: UserRole,
}

impl AuthenticatedUser {
    pub fn from_claims(claims: &Claims) -> Result<Self, AuthError> {
        let user_id: UserId = claims.sub.parse().map_err(|_| AuthError::InvalidToken)?;
        if user_id.is_nil() {
            return Err(AuthError::InvalidToken);
        }
        Ok(Self {
            user_id,
            username: claims.username.clone(),
            role: claims.role,
        })
    }

    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }

    /// True for the user themself or an admin
    pub fn may_act_for(&self, user_id: UserId) -> bool {
        self.user_id == user_id || self.is_admin()
    }
}

const MAX_TOKEN_LIFETIME_SECS: u64 = 30 * 24 * 3600;

/// Issues a token for a user who has just logged in
pub fn create_token(user: &User, secret: &str, expiration_secs: u64) -> Result<String, AuthError> {
    let now = Utc::now();
    let exp = now + Duration::seconds(expiration_secs.min(MAX_TOKEN_LIFETIME_SECS) as i64);

    let claims = Claims {
        sub: user.id.as_uuid().to_string(),
        username: user.username.clone(),
        role: user.role,
        exp: exp.timestamp(),
        iat: now.timestamp(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|_| AuthError::Signing)
}

/// Validates a JWT token
pub fn validate_token(token: &str, secret: &str) -> Result<Claims, AuthError> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|e| match e.kind() {
        ErrorKind::ExpiredSignature => AuthError::TokenExpired,
        _ => AuthError::InvalidToken,
    })?;

    Ok(token_data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(role: UserRole) -> User {
        User::new("ioana_m", "ioana@market.ro", "+40712345678", "hash", role)
    }

    #[test]
    fn test_token_round_trip() {
        let buyer = user(UserRole::Buyer);
        let token = create_token(&buyer, "secret", 60).unwrap();
        let claims = validate_token(&token, "secret").unwrap();

        let caller = AuthenticatedUser::from_claims(&claims).unwrap();
        assert_eq!(caller.user_id, buyer.id);
        assert_eq!(caller.username, "ioana_m");
        assert_eq!(caller.role, UserRole::Buyer);
    }

    #[test]
    fn test_wrong_secret_is_rejected() {
        let token = create_token(&user(UserRole::Seller), "secret", 60).unwrap();
        assert!(matches!(validate_token(&token, "other"), Err(AuthError::InvalidToken)));
    }

    #[test]
    fn test_only_self_or_admin_may_act() {
        let other = UserId::new();
        let buyer = AuthenticatedUser::from_claims(&validate_token(
            &create_token(&user(UserRole::Buyer), "s", 60).unwrap(),
            "s",
        )
        .unwrap())
        .unwrap();
        assert!(buyer.may_act_for(buyer.user_id));
        assert!(!buyer.may_act_for(other));

        let admin = AuthenticatedUser {
            user_id: UserId::new(),
            username: "admin".to_string(),
            role: UserRole::Admin,
        };
        assert!(admin.may_act_for(other));
    }
}
