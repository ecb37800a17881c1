/// Application name
pub const APP_NAME: &str = "hund";

/// Production API deployment
pub const DEFAULT_BASE_URL: &str = "https://hund.piaseczny.dev";

/// Default timeout for ordinary API calls, in seconds
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Default TCP connect timeout, in seconds
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

/// REST paths, relative to the base URL
pub const PATH_CHANNELS: &str = "/pkg/channel";
pub const PATH_CHANNEL_INDICES: &str = "/pkg/channel/index";
pub const PATH_GENERATE_INDEX: &str = "/pkg/channel/index/generate";
pub const PATH_HISTORY: &str = "/account/history";
pub const PATH_HISTORY_DELETE: &str = "/account/history/delete";
pub const PATH_ACCOUNT_DELETE: &str = "/account/delete";
pub const PATH_REGISTER: &str = "/account/register";
pub const PATH_LOGIN: &str = "/account/login";

/// Path of the query endpoint for one index.
pub fn index_query_path(index_id: &str) -> String {
    format!("/pkg/index/{index_id}/query")
}

/// Preference keys holding the persisted session
pub const PREF_API_KEY: &str = "api_key";
pub const PREF_USERNAME: &str = "username";
pub const PREF_LOGGED_IN: &str = "logged_in";
