use std::time::Duration;

use hund_shared::constants::{PATH_LOGIN, PATH_REGISTER};
use hund_shared::protocol::TokenResponse;
use hund_shared::{ApiError, Credentials};
use tracing::debug;

use super::{build_http, send_json};
use crate::config::ClientConfig;

/// Unauthenticated client for the account endpoints that hand out tokens.
#[derive(Clone)]
pub struct AuthClient {
    http: reqwest::Client,
    base_url: String,
    request_timeout: Option<Duration>,
}

impl AuthClient {
    pub fn new(config: &ClientConfig) -> Result<Self, ApiError> {
        Ok(Self {
            http: build_http(config)?,
            base_url: config.base_url.clone(),
            request_timeout: config.request_timeout,
        })
    }

    /// Create an account and return its API token.
    pub async fn register(&self, credentials: &Credentials) -> Result<String, ApiError> {
        debug!(username = %credentials.username, "registering");
        self.exchange(PATH_REGISTER, credentials).await
    }

    /// Exchange credentials for an API token.
    pub async fn login(&self, credentials: &Credentials) -> Result<String, ApiError> {
        debug!(username = %credentials.username, "logging in");
        self.exchange(PATH_LOGIN, credentials).await
    }

    async fn exchange(&self, path: &str, credentials: &Credentials) -> Result<String, ApiError> {
        let mut request = self
            .http
            .post(format!("{}{path}", self.base_url))
            .json(credentials);
        if let Some(timeout) = self.request_timeout {
            request = request.timeout(timeout);
        }
        let response: TokenResponse = send_json(request).await?;
        Ok(response.token)
    }
}

#[cfg(test)]
mod tests {
    use axum::http::{HeaderMap, StatusCode};
    use axum::response::{IntoResponse, Response};
    use axum::routing::post;
    use axum::{Json, Router};

    use super::*;
    use crate::test_support::spawn_server;

    async fn login(headers: HeaderMap, Json(creds): Json<Credentials>) -> Response {
        if headers.contains_key("authorization") {
            return (StatusCode::BAD_REQUEST, "unexpected bearer").into_response();
        }
        if creds.password == "hunter2" {
            Json(serde_json::json!({ "token": format!("token-for-{}", creds.username) }))
                .into_response()
        } else {
            (StatusCode::UNAUTHORIZED, "Wrong password").into_response()
        }
    }

    async fn router() -> String {
        spawn_server(
            Router::new()
                .route("/account/login", post(login))
                .route("/account/register", post(login)),
        )
        .await
    }

    #[tokio::test]
    async fn test_login_returns_token() {
        let url = router().await;
        let auth = AuthClient::new(&ClientConfig::with_base_url(&url)).unwrap();

        let token = auth.login(&Credentials::new("alice", "hunter2")).await.unwrap();
        assert_eq!(token, "token-for-alice");

        let token = auth.register(&Credentials::new("bob", "hunter2")).await.unwrap();
        assert_eq!(token, "token-for-bob");
    }

    #[tokio::test]
    async fn test_wrong_password_is_unauthorized() {
        let url = router().await;
        let auth = AuthClient::new(&ClientConfig::with_base_url(&url)).unwrap();

        let err = auth.login(&Credentials::new("alice", "nope")).await.unwrap_err();
        assert_eq!(err, ApiError::Unauthorized("Wrong password".into()));
    }
}
