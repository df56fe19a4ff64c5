//! Account validation rules
//!
//! # Registration Rules
//!
//! Checked in this order, the first failure is reported:
//! - Username of at least 4 characters
//! - Email address of the form `local@domain.tld`
//! - Password of at least 8 characters with an uppercase letter, a digit and
//!   one of `!@#$%^&*()_+`
//! - Romanian mobile number: `+40` followed by 9 digits
//! - Role of Buyer or Seller

use std::borrow::Cow;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use validator::{Validate, ValidationError};

use crate::error::AccountError;
use crate::user::UserRole;

pub const USERNAME_MESSAGE: &str = "Username must be at least 4 characters long.";
pub const EMAIL_MESSAGE: &str = "Invalid email address format.";
pub const PASSWORD_MESSAGE: &str = "The password must be at least 8 characters long, have at least 1 uppercase letter, at least 1 digit and at least 1 special character.";
pub const PHONE_MESSAGE: &str = "The phone number should start with +40 area code followed by 9 digits.";
pub const ROLE_MESSAGE: &str = "Please select an account type (Buyer or Seller).";

const PASSWORD_SPECIAL_CHARACTERS: &str = "!@#$%^&*()_+";
const MIN_PASSWORD_LENGTH: usize = 8;

static EMAIL_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").expect("email pattern compiles")
});

static PHONE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\+40\d{9}$").expect("phone pattern compiles"));

/// Registration form submitted by a new user
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RegistrationRequest {
    #[validate(length(min = 4, message = "Username must be at least 4 characters long."))]
    pub username: String,
    #[validate(regex(path = *EMAIL_PATTERN, message = "Invalid email address format."))]
    pub email: String,
    #[validate(custom(function = "validate_password_strength"))]
    pub password: String,
    #[validate(regex(path = *PHONE_PATTERN, message = "The phone number should start with +40 area code followed by 9 digits."))]
    pub phone: String,
    pub role: UserRole,
}

impl RegistrationRequest {
    const FIELD_ORDER: [&'static str; 4] = ["username", "email", "password", "phone"];

    /// Runs every rule and reports the first failing field in form order
    pub fn check(&self) -> Result<(), AccountError> {
        if let Err(errors) = self.validate() {
            let field_errors = errors.field_errors();
            for field in Self::FIELD_ORDER {
                if let Some(failures) = field_errors.get(field) {
                    let message = failures
                        .first()
                        .and_then(|e| e.message.as_ref())
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("Invalid {}", field));
                    return Err(AccountError::invalid_field(field, message));
                }
            }
        }

        if !self.role.is_selectable() {
            return Err(AccountError::invalid_field("role", ROLE_MESSAGE));
        }

        Ok(())
    }
}

fn validate_password_strength(password: &str) -> Result<(), ValidationError> {
    if UserValidator::is_valid_password(password) {
        Ok(())
    } else {
        Err(ValidationError::new("password_strength").with_message(Cow::Borrowed(PASSWORD_MESSAGE)))
    }
}

/// Stand-alone field checks, shared by registration and login
pub struct UserValidator;

impl UserValidator {
    pub fn is_valid_username(username: &str) -> bool {
        username.chars().count() >= 4
    }

    pub fn is_valid_email(email: &str) -> bool {
        EMAIL_PATTERN.is_match(email)
    }

    pub fn is_valid_phone(phone: &str) -> bool {
        PHONE_PATTERN.is_match(phone)
    }

    pub fn is_valid_password(password: &str) -> bool {
        password.chars().count() >= MIN_PASSWORD_LENGTH
            && password.chars().any(|c| c.is_ascii_uppercase())
            && password.chars().any(|c| c.is_ascii_digit())
            && password.chars().any(|c| PASSWORD_SPECIAL_CHARACTERS.contains(c))
    }
}
