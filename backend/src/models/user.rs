//! Models that represent users and authentication payloads.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use crate::types::UserId;

#[derive(Debug, Clone, PartialEq, FromRow)]
/// Database representation of an account that can own live streams.
pub struct User {
    /// Unique identifier for the user.
    pub id: UserId,
    /// Login identifier; unique across accounts.
    pub email: String,
    /// Name shown next to the user's public streams.
    pub display_name: String,
    /// Argon2 hash of the user's password.
    pub password_hash: String,
    /// Creation timestamp for auditing.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp for auditing.
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Constructs a new user with a freshly generated identifier.
    pub fn new(email: String, display_name: String, password_hash: String) -> Self {
        let now = Utc::now();
        Self {
            id: UserId::new(),
            email,
            display_name,
            password_hash,
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
/// Payload for creating a new account.
pub struct RegisterRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 8, max = 128))]
    pub password: String,
    #[validate(length(min = 1, max = 255))]
    pub display_name: String,
}

#[derive(Debug, Deserialize)]
/// Credentials submitted by a user attempting to authenticate.
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
/// Bearer token returned after registration or login.
pub struct AuthResponse {
    pub access_token: String,
    pub token_type: String,
    /// Lifetime of the token in seconds.
    pub expires_in: u64,
    pub user: UserResponse,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
/// Representation of the authenticated user returned by the API.
pub struct UserResponse {
    pub id: UserId,
    pub email: String,
    pub name: String,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        UserResponse {
            id: user.id,
            email: user.email.clone(),
            name: user.display_name.clone(),
        }
    }
}
