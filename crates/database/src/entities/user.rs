//! User entity definitions

use serde::Serialize;

/// A registered account. Timestamps are RFC 3339 strings.
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct User {
    #[serde(skip_serializing)]
    pub id: i64,
    pub public_id: String,
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub avatar: String,
    pub cover_image: Option<String>,
    #[serde(skip_serializing)]
    pub password_hash: String,
    #[serde(skip_serializing)]
    pub refresh_token: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Values required to insert a user. Callers normalise and hash beforehand.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub avatar: String,
    pub cover_image: Option<String>,
    pub password_hash: String,
}

#[derive(Debug, Clone)]
pub struct AccountUpdate {
    pub full_name: String,
    pub email: String,
}
