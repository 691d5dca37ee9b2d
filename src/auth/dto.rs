use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::claims::Role;
use crate::web::ValidationError;

pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Request body for user registration.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub display_name: String,
    pub user_name: String,
    pub password: String,
}

impl RegisterRequest {
    /// Field errors in declaration order; empty when the request is acceptable.
    pub fn validate(&self) -> Vec<ValidationError> {
        lazy_static! {
            static ref USER_NAME_RE: Regex = Regex::new(r"^[A-Za-z0-9_.-]{3,32}$").unwrap();
        }

        let mut errors = Vec::new();
        if self.display_name.trim().is_empty() {
            errors.push(ValidationError::field("displayName", "must not be blank"));
        }
        if !USER_NAME_RE.is_match(&self.user_name) {
            errors.push(ValidationError::field(
                "userName",
                "must be 3 to 32 letters, digits, '.', '_' or '-'",
            ));
        }
        if self.password.chars().count() < MIN_PASSWORD_LENGTH {
            errors.push(ValidationError::field(
                "password",
                "must be at least 8 characters long",
            ));
        }
        errors
    }
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub id: Uuid,
}

/// Request body for login.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub user_name: String,
    pub password: String,
}

/// Request body for token refresh.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// Response returned after login or refresh.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub user: PublicUser,
}

/// Public part of the user returned to the client.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicUser {
    pub id: Uuid,
    pub display_name: String,
    pub login_name: Option<String>,
    pub roles: Vec<Role>,
}
