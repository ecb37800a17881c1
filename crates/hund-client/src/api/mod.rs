//! The remote API contract and its HTTP implementation.
//!
//! [`PkgApi`] is the seam between the orchestration core and the network:
//! the catalog, query session, generator and history only ever see this
//! trait, so they can be driven by [`ApiClient`] in production and by a
//! scripted fake in tests.

mod auth;
mod http;

pub use auth::AuthClient;
pub use http::ApiClient;

use hund_shared::{ApiError, GeneratedIndex, HistoryEntry, IndexInfo, PkgResult};

/// Authenticated operations of the package index service.
///
/// Every call either yields a value or a classified [`ApiError`]; nothing is
/// retried.
#[allow(async_fn_in_trait)]
pub trait PkgApi {
    /// Names of all channels the server knows about.
    async fn list_channels(&self) -> Result<Vec<String>, ApiError>;

    /// Indices of one channel, in server order.
    async fn list_indices(&self, channel: &str) -> Result<Vec<IndexInfo>, ApiError>;

    /// Build a new index for `channel`.  May run for many minutes.
    async fn generate_index(&self, channel: &str) -> Result<GeneratedIndex, ApiError>;

    /// Search an index.  A blank `text` matches every package.
    async fn query(&self, index_id: &str, text: &str) -> Result<Vec<PkgResult>, ApiError>;

    /// The user's search history, in server order (usually newest first).
    async fn list_history(&self) -> Result<Vec<HistoryEntry>, ApiError>;

    async fn delete_history_entry(&self, index_id: &str) -> Result<(), ApiError>;

    async fn delete_account(&self) -> Result<(), ApiError>;
}

/// Send a request and turn any non-success status into an [`ApiError`].
///
/// The server answers failures with a plain-text message body, which is
/// carried in the error.
pub(crate) async fn send(request: reqwest::RequestBuilder) -> Result<reqwest::Response, ApiError> {
    let response = request.send().await.map_err(transport_error)?;
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let message = match response.text().await {
        Ok(body) if !body.trim().is_empty() => body.trim().to_string(),
        Ok(_) => status.canonical_reason().unwrap_or("no message").to_string(),
        Err(e) => format!("unreadable error body: {e}"),
    };
    tracing::debug!(status = status.as_u16(), %message, "request failed");
    Err(ApiError::from_status(status.as_u16(), message))
}

/// [`send`], then decode the JSON success body.
pub(crate) async fn send_json<T: serde::de::DeserializeOwned>(
    request: reqwest::RequestBuilder,
) -> Result<T, ApiError> {
    let body = send(request)
        .await?
        .bytes()
        .await
        .map_err(transport_error)?;
    serde_json::from_slice(&body).map_err(|e| ApiError::Decode(e.to_string()))
}

fn transport_error(e: reqwest::Error) -> ApiError {
    if e.is_timeout() {
        ApiError::NetworkError(format!("request timed out: {e}"))
    } else {
        ApiError::NetworkError(e.to_string())
    }
}

pub(crate) fn build_http(config: &crate::config::ClientConfig) -> Result<reqwest::Client, ApiError> {
    reqwest::Client::builder()
        .connect_timeout(config.connect_timeout)
        .user_agent(concat!("hund/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| ApiError::NetworkError(format!("failed to build HTTP client: {e}")))
}
