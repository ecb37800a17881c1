//! Schema versioning.
//!
//! The schema version lives in `PRAGMA user_version`.  Opening a database
//! applies every step newer than that version, in order, and records each
//! one as it lands.

pub mod v001_initial;

use rusqlite::Connection;

use crate::error::{Result, StoreError};

type Step = fn(&Connection) -> rusqlite::Result<()>;

/// Ordered schema steps; a step's version is its position, starting at 1.
const STEPS: &[(&str, Step)] = &[("v001_initial", v001_initial::up)];

/// Schema version after every step has been applied.
pub const CURRENT_VERSION: u32 = STEPS.len() as u32;

/// Bring the schema of `conn` up to [`CURRENT_VERSION`].
pub fn run_migrations(conn: &Connection) -> Result<()> {
    let applied: u32 = conn.pragma_query_value(None, "user_version", |row| row.get(0))?;
    if applied > CURRENT_VERSION {
        return Err(StoreError::Migration(format!(
            "database schema v{applied} is newer than this build (v{CURRENT_VERSION})"
        )));
    }

    for (version, (name, step)) in (1u32..).zip(STEPS).skip(applied as usize) {
        tracing::info!(version, name, "applying migration");
        step(conn).map_err(|e| StoreError::Migration(format!("{name}: {e}")))?;
        conn.pragma_update(None, "user_version", version)?;
    }
    Ok(())
}
