//! Request and response envelopes of the REST API.
//!
//! The domain values themselves live in [`crate::types`]; these structs only
//! exist to match the JSON shapes the server expects or emits.

use serde::{Deserialize, Serialize};

/// `GET /pkg/channel`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChannelList {
    pub channels: Vec<String>,
}

/// `POST /pkg/channel/index/generate`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct IndexGenerateRequest {
    pub channel: String,
}

/// `POST /account/history/delete`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HistoryDeleteRequest {
    pub index: String,
}

/// `POST /account/login` and `POST /account/register`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TokenResponse {
    pub token: String,
}
