//! Types shared by every hund crate: the remote API data model, the request
//! and response envelopes exchanged with the server, and the API error
//! taxonomy.

pub mod constants;
pub mod error;
pub mod protocol;
pub mod types;

pub use error::ApiError;
pub use types::*;
