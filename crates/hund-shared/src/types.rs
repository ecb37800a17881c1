use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A named update stream of the package index (e.g. `nixos-unstable`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Channel {
    pub name: String,
}

impl Channel {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl std::fmt::Display for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.name)
    }
}

/// An immutable, timestamped snapshot of a channel's package metadata.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct IndexInfo {
    /// Opaque server-side identifier (a UUID in practice).
    pub id: String,
    #[serde(rename = "date", with = "timestamp")]
    pub created_at: DateTime<Utc>,
    pub total_file_count: u64,
}

/// One catalog row: a channel and its indices in server order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChannelEntry {
    pub channel: Channel,
    pub indices: Vec<IndexInfo>,
}

impl ChannelEntry {
    pub fn new(channel: Channel, indices: Vec<IndexInfo>) -> Self {
        Self { channel, indices }
    }

    pub fn name(&self) -> &str {
        &self.channel.name
    }

    pub fn index(&self, id: &str) -> Option<&IndexInfo> {
        self.indices.iter().find(|index| index.id == id)
    }

    pub fn contains_index(&self, id: &str) -> bool {
        self.index(id).is_some()
    }
}

/// A single store path matched by a search.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct PkgResult {
    pub pkg_name: String,
    pub out_name: String,
    pub out_hash: String,
    pub path: String,
    pub version: String,
}

/// A past search result recorded by the server for the logged-in user.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HistoryEntry {
    pub index_id: String,
    #[serde(with = "timestamp")]
    pub date: DateTime<Utc>,
    pub pkg: PkgResult,
}

/// Summary returned by the server once an index build finishes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GeneratedIndex {
    pub id: String,
    #[serde(rename = "time", with = "timestamp")]
    pub created_at: DateTime<Utc>,
    pub total_package_count: u64,
    pub total_file_count: u64,
}

impl GeneratedIndex {
    /// The catalog view of the freshly built index.
    pub fn to_index_info(&self) -> IndexInfo {
        IndexInfo {
            id: self.id.clone(),
            created_at: self.created_at,
            total_file_count: self.total_file_count,
        }
    }
}

/// Username and password pair used for registration and login.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Both fields must be non-empty; everything else is up to the server.
    pub fn is_complete(&self) -> bool {
        !self.username.is_empty() && !self.password.is_empty()
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// The authenticated session persisted across restarts.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Session {
    pub token: String,
    pub username: String,
    pub logged_in: bool,
}

impl Session {
    pub fn new(token: impl Into<String>, username: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            username: username.into(),
            logged_in: true,
        }
    }

    /// Whether this session can authenticate API calls.
    pub fn is_active(&self) -> bool {
        self.logged_in && !self.token.is_empty()
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("username", &self.username)
            .field("logged_in", &self.logged_in)
            .finish_non_exhaustive()
    }
}

/// Wire format of server timestamps.
///
/// The server emits RFC 3339 with nanoseconds; older deployments used a
/// colon-less offset (`+0100`). Both are accepted, output is always RFC 3339
/// in UTC.
pub mod timestamp {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    const COMPACT_OFFSET: &str = "%Y-%m-%dT%H:%M:%S%.f%z";

    pub fn format(value: &DateTime<Utc>) -> String {
        value.to_rfc3339_opts(SecondsFormat::Nanos, true)
    }

    pub fn parse(raw: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
        DateTime::parse_from_rfc3339(raw)
            .or_else(|_| DateTime::parse_from_str(raw, COMPACT_OFFSET))
            .map(|dt| dt.with_timezone(&Utc))
    }

    pub fn serialize<S: Serializer>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format(value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).map_err(serde::de::Error::custom)
    }
}
