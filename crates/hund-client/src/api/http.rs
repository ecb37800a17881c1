use std::time::Duration;

use hund_shared::constants::{
    index_query_path, PATH_ACCOUNT_DELETE, PATH_CHANNELS, PATH_CHANNEL_INDICES,
    PATH_GENERATE_INDEX, PATH_HISTORY, PATH_HISTORY_DELETE,
};
use hund_shared::protocol::{ChannelList, HistoryDeleteRequest, IndexGenerateRequest};
use hund_shared::{ApiError, GeneratedIndex, HistoryEntry, IndexInfo, PkgResult};
use tracing::debug;

use super::{build_http, send, send_json, PkgApi};
use crate::config::ClientConfig;

/// Bearer-authenticated client for the package index API.
///
/// The token is fixed at construction.  A new token (login, register) means
/// a new client, so requests already in flight keep the credentials they
/// started with.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    token: String,
    request_timeout: Option<Duration>,
    generate_timeout: Option<Duration>,
}

impl ApiClient {
    pub fn new(config: &ClientConfig, token: impl Into<String>) -> Result<Self, ApiError> {
        Ok(Self {
            http: build_http(config)?,
            base_url: config.base_url.clone(),
            token: token.into(),
            request_timeout: config.request_timeout,
            generate_timeout: config.generate_timeout,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn get(&self, path: &str) -> reqwest::RequestBuilder {
        self.authed(self.http.get(format!("{}{path}", self.base_url)), self.request_timeout)
    }

    fn post(&self, path: &str, timeout: Option<Duration>) -> reqwest::RequestBuilder {
        self.authed(self.http.post(format!("{}{path}", self.base_url)), timeout)
    }

    fn authed(
        &self,
        request: reqwest::RequestBuilder,
        timeout: Option<Duration>,
    ) -> reqwest::RequestBuilder {
        let request = request.bearer_auth(&self.token);
        match timeout {
            Some(timeout) => request.timeout(timeout),
            None => request,
        }
    }
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl PkgApi for ApiClient {
    async fn list_channels(&self) -> Result<Vec<String>, ApiError> {
        debug!("listing channels");
        let list: ChannelList = send_json(self.get(PATH_CHANNELS)).await?;
        Ok(list.channels)
    }

    async fn list_indices(&self, channel: &str) -> Result<Vec<IndexInfo>, ApiError> {
        debug!(channel, "listing indices");
        send_json(self.get(PATH_CHANNEL_INDICES).query(&[("channel", channel)])).await
    }

    async fn generate_index(&self, channel: &str) -> Result<GeneratedIndex, ApiError> {
        debug!(channel, timeout = ?self.generate_timeout, "requesting index generation");
        let body = IndexGenerateRequest {
            channel: channel.to_string(),
        };
        send_json(self.post(PATH_GENERATE_INDEX, self.generate_timeout).json(&body)).await
    }

    async fn query(&self, index_id: &str, text: &str) -> Result<Vec<PkgResult>, ApiError> {
        debug!(index_id, text, "querying index");
        send_json(self.get(&index_query_path(index_id)).query(&[("query", text)])).await
    }

    async fn list_history(&self) -> Result<Vec<HistoryEntry>, ApiError> {
        debug!("listing history");
        send_json(self.get(PATH_HISTORY)).await
    }

    async fn delete_history_entry(&self, index_id: &str) -> Result<(), ApiError> {
        debug!(index_id, "deleting history entry");
        let body = HistoryDeleteRequest {
            index: index_id.to_string(),
        };
        send(self.post(PATH_HISTORY_DELETE, self.request_timeout).json(&body)).await?;
        Ok(())
    }

    async fn delete_account(&self) -> Result<(), ApiError> {
        debug!("deleting account");
        send(self.post(PATH_ACCOUNT_DELETE, self.request_timeout)).await?;
        Ok(())
    }
}
