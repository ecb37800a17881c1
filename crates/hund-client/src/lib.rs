//! # hund-client
//!
//! Session and query orchestration for the hund package index service.
//!
//! The crate is presentation-agnostic: every component keeps its state in a
//! [`tokio::sync::watch`] channel, so a front end renders plain snapshots and
//! re-renders whenever a subscription fires.
//!
//! - [`api`] talks to the REST API and classifies failures.
//! - [`catalog`] discovers channels and their indices and owns the selection.
//! - [`query`] runs searches with last-submitted-wins semantics.
//! - [`generation`] builds new indices and refreshes the catalog.
//! - [`history`] lists and prunes the server-side search history.
//! - [`account`] handles login, registration and the persisted session.
//! - [`state`] ties the per-session components together.

pub mod account;
pub mod api;
pub mod catalog;
pub mod config;
pub mod generation;
pub mod history;
pub mod query;
pub mod state;

mod error;

#[cfg(test)]
pub(crate) mod test_support;

pub use account::Account;
pub use api::{ApiClient, AuthClient, PkgApi};
pub use catalog::{Catalog, CatalogState, PopulateReport};
pub use config::ClientConfig;
pub use error::CoreError;
pub use generation::{GenerationState, IndexGenerator};
pub use history::{History, HistoryState};
pub use query::{filter_packages, QueryFailure, QuerySession, QueryState, SearchOutcome};
pub use state::AppState;

pub use hund_shared as shared;
pub use hund_store as store;
