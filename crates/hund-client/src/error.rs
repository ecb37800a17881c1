use hund_shared::{ApiError, GeneratedIndex};
use hund_store::StoreError;
use thiserror::Error;

/// Errors surfaced by the orchestration core.
#[derive(Error, Debug)]
pub enum CoreError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("Session store error: {0}")]
    Store(#[from] StoreError),

    #[error("No index selected")]
    NoIndexSelected,

    #[error("No channel selected")]
    NoChannelSelected,

    #[error("Unknown channel: {0}")]
    UnknownChannel(String),

    #[error("Index {index} does not belong to channel {channel}")]
    IndexNotInChannel { index: String, channel: String },

    #[error("Index generation already running for {0}")]
    GenerationInProgress(String),

    /// The index was built but the follow-up catalog refresh failed.  The
    /// generated index has still been merged into the catalog.
    #[error("Index {} generated, but refreshing the channel failed: {source}", .generated.id)]
    RefreshFailed {
        generated: GeneratedIndex,
        source: ApiError,
    },

    /// Warning-level: the catalog is usable, some channels just have no
    /// indices listed.
    #[error("Indices could not be fetched for: {}", .0.join(", "))]
    PartialPopulationFailure(Vec<String>),

    #[error("Username and password are required")]
    InvalidCredentials,

    #[error("Not logged in")]
    NotLoggedIn,
}

impl CoreError {
    /// Whether the server rejected the token; the session should be dropped.
    pub fn is_unauthorized(&self) -> bool {
        match self {
            Self::Api(e) | Self::RefreshFailed { source: e, .. } => e.is_unauthorized(),
            _ => false,
        }
    }
}
