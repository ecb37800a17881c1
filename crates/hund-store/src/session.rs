//! Persistence of the authenticated [`Session`].
//!
//! Consumers depend on the [`SessionStore`] trait and receive an
//! implementation through their constructors; nothing reads the session from
//! ambient global state.

use std::path::Path;
use std::sync::Mutex;

use hund_shared::constants::{PREF_API_KEY, PREF_LOGGED_IN, PREF_USERNAME};
use hund_shared::Session;

use crate::database::Database;
use crate::error::{Result, StoreError};

/// Get/set/clear access to the one live session of a client instance.
pub trait SessionStore: Send + Sync {
    /// The stored session, or `None` when no token has been saved.
    fn get(&self) -> Result<Option<Session>>;

    /// Replace the stored session.
    fn set(&self, session: &Session) -> Result<()>;

    /// Forget the session (logout, account deletion, expired token).
    fn clear(&self) -> Result<()>;
}

/// Session store backed by the `preferences` table of a [`Database`].
pub struct SqliteSessionStore {
    db: Mutex<Database>,
}

impl SqliteSessionStore {
    pub fn new(db: Database) -> Self {
        Self { db: Mutex::new(db) }
    }

    /// Open the database at `path` and wrap it.
    pub fn open_at(path: &Path) -> Result<Self> {
        Ok(Self::new(Database::open_at(path)?))
    }

    /// Open the platform default database and wrap it.
    pub fn open_default() -> Result<Self> {
        Ok(Self::new(Database::open_default()?))
    }
}

impl SessionStore for SqliteSessionStore {
    fn get(&self) -> Result<Option<Session>> {
        let db = self.db.lock().map_err(|_| StoreError::Poisoned)?;

        let Some(token) = db.get_pref(PREF_API_KEY)? else {
            return Ok(None);
        };
        let username = db.get_pref(PREF_USERNAME)?.unwrap_or_default();
        let logged_in = db.get_pref(PREF_LOGGED_IN)?.as_deref() == Some("true");

        Ok(Some(Session {
            token,
            username,
            logged_in,
        }))
    }

    fn set(&self, session: &Session) -> Result<()> {
        let mut db = self.db.lock().map_err(|_| StoreError::Poisoned)?;
        let logged_in = if session.logged_in { "true" } else { "false" };
        db.set_prefs(&[
            (PREF_API_KEY, session.token.as_str()),
            (PREF_USERNAME, session.username.as_str()),
            (PREF_LOGGED_IN, logged_in),
        ])?;
        tracing::debug!(username = %session.username, "session stored");
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        let mut db = self.db.lock().map_err(|_| StoreError::Poisoned)?;
        db.remove_prefs(&[PREF_API_KEY, PREF_USERNAME, PREF_LOGGED_IN])?;
        tracing::debug!("session cleared");
        Ok(())
    }
}

/// Process-local session store.  Used by tests and throw-away clients.
#[derive(Default)]
pub struct MemorySessionStore {
    session: Mutex<Option<Session>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_session(session: Session) -> Self {
        Self {
            session: Mutex::new(Some(session)),
        }
    }
}

impl SessionStore for MemorySessionStore {
    fn get(&self) -> Result<Option<Session>> {
        Ok(self.session.lock().map_err(|_| StoreError::Poisoned)?.clone())
    }

    fn set(&self, session: &Session) -> Result<()> {
        *self.session.lock().map_err(|_| StoreError::Poisoned)? = Some(session.clone());
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        *self.session.lock().map_err(|_| StoreError::Poisoned)? = None;
        Ok(())
    }
}

impl<T: SessionStore + ?Sized> SessionStore for std::sync::Arc<T> {
    fn get(&self) -> Result<Option<Session>> {
        (**self).get()
    }

    fn set(&self, session: &Session) -> Result<()> {
        (**self).set(session)
    }

    fn clear(&self) -> Result<()> {
        (**self).clear()
    }
}
