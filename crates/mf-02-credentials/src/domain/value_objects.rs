//! # Value Objects
//!
//! Request and response bodies of the authentication API.

use serde::{Deserialize, Serialize};
use shared_types::UserProfile;

/// `POST /auth/login` body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    /// Username
    pub username: String,
    /// Password
    pub password: String,
}

/// `POST /auth/login` response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoginResponse {
    /// Bearer token
    pub access_token: String,
    /// Authenticated user
    pub user: UserProfile,
}

/// `POST /auth/refresh-token` response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshResponse {
    /// Replacement bearer token
    pub access_token: String,
}
