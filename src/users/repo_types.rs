use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// User record in the database.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub display_name: String,
    pub email: Option<String>,
    pub is_not_banned: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub account_created: OffsetDateTime,
    #[serde(skip)]
    pub user_key: Vec<u8>, // flag derivation key, never exposed
}

/// Login name and argon2 hash for password users.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct PasswordAuth {
    pub user_id: Uuid,
    pub login_name: String,
    #[serde(skip_serializing)]
    pub hashed_password: String,
    pub is_password_non_expired: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct UserAuth {
    pub user_id: Uuid,
    pub is_admin: bool,
    pub is_enabled: bool,
}
