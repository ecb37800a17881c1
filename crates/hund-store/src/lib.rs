//! # hund-store
//!
//! Local persistence for the hund client, backed by SQLite.
//!
//! The only thing the client keeps on disk is the authenticated session
//! (token, username, logged-in flag), stored as rows of a small key-value
//! `preferences` table.  Search results and catalog data are never cached.

pub mod database;
pub mod migrations;
pub mod preferences;
pub mod session;

mod error;

pub use database::Database;
pub use error::StoreError;
pub use session::{MemorySessionStore, SessionStore, SqliteSessionStore};
