//! # HTTP Authentication Backend
//!
//! `AuthBackend` over the REST authentication API:
//!
//! | Call | Endpoint |
//! |------|----------|
//! | login | `POST {base}/auth/login {username, password}` |
//! | profile | `GET {base}/auth/profile` (bearer) |
//! | refresh | `POST {base}/auth/refresh-token` (bearer) |

use crate::container::{AuthApiConfig, ConfigError};
use async_trait::async_trait;
use mf_02_credentials::{AuthBackend, AuthError, LoginRequest, LoginResponse, RefreshResponse};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use shared_types::UserProfile;
use shell_telemetry::{metric_inc, TOKEN_REFRESHES};
use std::sync::Arc;
use tracing::debug;

/// Authentication API client.
pub struct HttpAuthBackend {
    client: reqwest::Client,
    base_url: String,
}

impl HttpAuthBackend {
    /// Build the client with the configured timeout.
    pub fn new(config: &AuthApiConfig) -> Result<Self, ConfigError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| ConfigError::Client(e.to_string()))?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Base URL in use.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, AuthError> {
        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            return Err(AuthError::Unauthorized);
        }
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(AuthError::Rejected {
                status: status.as_u16(),
                message,
            });
        }
        response
            .json::<T>()
            .await
            .map_err(|e| AuthError::InvalidResponse(e.to_string()))
    }
}

fn network(e: reqwest::Error) -> AuthError {
    AuthError::Network(e.to_string())
}

#[async_trait]
impl AuthBackend for HttpAuthBackend {
    async fn login(&self, username: &str, password: &str) -> Result<LoginResponse, AuthError> {
        debug!(user = %username, "POST /auth/login");
        let response = self
            .client
            .post(self.url("/auth/login"))
            .json(&LoginRequest {
                username: username.to_string(),
                password: password.to_string(),
            })
            .send()
            .await
            .map_err(network)?;
        Self::decode(response).await
    }

    async fn fetch_profile(&self, token: &str) -> Result<UserProfile, AuthError> {
        debug!("GET /auth/profile");
        let response = self
            .client
            .get(self.url("/auth/profile"))
            .bearer_auth(token)
            .send()
            .await
            .map_err(network)?;
        Self::decode(response).await
    }

    async fn refresh_token(&self, token: &str) -> Result<String, AuthError> {
        debug!("POST /auth/refresh-token");
        let response = self
            .client
            .post(self.url("/auth/refresh-token"))
            .bearer_auth(token)
            .send()
            .await
            .map_err(network)?;
        Self::decode::<RefreshResponse>(response)
            .await
            .map(|r| r.access_token)
    }
}

/// Counts refresh outcomes of any backend.
pub struct MeteredAuthBackend {
    inner: Arc<dyn AuthBackend>,
}

impl MeteredAuthBackend {
    /// Wrap `inner`.
    pub fn new(inner: Arc<dyn AuthBackend>) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl AuthBackend for MeteredAuthBackend {
    async fn login(&self, username: &str, password: &str) -> Result<LoginResponse, AuthError> {
        self.inner.login(username, password).await
    }

    async fn fetch_profile(&self, token: &str) -> Result<UserProfile, AuthError> {
        self.inner.fetch_profile(token).await
    }

    async fn refresh_token(&self, token: &str) -> Result<String, AuthError> {
        let result = self.inner.refresh_token(token).await;
        let outcome = if result.is_ok() { "success" } else { "failure" };
        metric_inc!(TOKEN_REFRESHES, &[outcome]);
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mf_02_credentials::MockAuthBackend;

    #[test]
    fn test_base_url_trailing_slash() {
        let backend = HttpAuthBackend::new(&AuthApiConfig {
            base_url: "http://localhost:3001/api/".to_string(),
            timeout_secs: 10,
        })
        .unwrap();
        assert_eq!(backend.base_url(), "http://localhost:3001/api");
        assert_eq!(backend.url("/auth/login"), "http://localhost:3001/api/auth/login");
    }

    #[tokio::test]
    async fn test_unreachable_backend_is_network_error() {
        // Port 9 (discard) is closed on test machines.
        let backend = HttpAuthBackend::new(&AuthApiConfig {
            base_url: "http://127.0.0.1:9/api".to_string(),
            timeout_secs: 1,
        })
        .unwrap();
        let err = backend.fetch_profile("t").await.unwrap_err();
        assert!(matches!(err, AuthError::Network(_)));
        assert!(!err.is_unauthorized());
    }

    #[tokio::test]
    async fn test_metered_backend_counts_refreshes() {
        let mock = Arc::new(MockAuthBackend::new().with_user("alice", "pw", &[]));
        let token = mock.issue_token("alice");
        let metered = MeteredAuthBackend::new(mock.clone());

        let before = TOKEN_REFRESHES.with_label_values(&["success"]).get();
        metered.refresh_token(&token).await.unwrap();
        assert!(TOKEN_REFRESHES.with_label_values(&["success"]).get() > before);

        let before = TOKEN_REFRESHES.with_label_values(&["failure"]).get();
        assert!(metered.refresh_token("unknown").await.is_err());
        assert!(TOKEN_REFRESHES.with_label_values(&["failure"]).get() > before);
    }
}
