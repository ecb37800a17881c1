use thiserror::Error;

/// Classified failure of a remote API call.
///
/// Every status above 400 carries the server's plain-text body as message.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// Expired or invalid token; the caller should force a logout.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Server error ({status}): {message}")]
    ServerError { status: u16, message: String },

    #[error("Request rejected ({status}): {message}")]
    RequestError { status: u16, message: String },

    /// No response was received at all.
    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Malformed response: {0}")]
    Decode(String),
}

impl ApiError {
    /// Classify a non-success HTTP status and its body.
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        match status {
            401 => Self::Unauthorized(message),
            s if s >= 500 => Self::ServerError { status: s, message },
            s => Self::RequestError { status: s, message },
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized(_))
    }

    /// HTTP status, if a response was received.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Unauthorized(_) => Some(401),
            Self::ServerError { status, .. } | Self::RequestError { status, .. } => Some(*status),
            Self::NetworkError(_) | Self::Decode(_) => None,
        }
    }
}
