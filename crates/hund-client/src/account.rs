//! Account lifecycle: register, login, restore and drop the session.
//!
//! Every successful authentication yields a fresh [`ApiClient`].  Clients are
//! never re-keyed, so a token change cannot race with requests in flight.

use hund_shared::{Credentials, Session};
use hund_store::SessionStore;
use tracing::{info, warn};

use crate::api::{ApiClient, AuthClient, PkgApi};
use crate::config::ClientConfig;
use crate::error::CoreError;

pub struct Account<S> {
    store: S,
    auth: AuthClient,
    config: ClientConfig,
}

impl<S: SessionStore> Account<S> {
    pub fn new(config: ClientConfig, store: S) -> Result<Self, CoreError> {
        Ok(Self {
            auth: AuthClient::new(&config)?,
            store,
            config,
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn session(&self) -> Result<Option<Session>, CoreError> {
        Ok(self.store.get()?)
    }

    pub fn is_logged_in(&self) -> Result<bool, CoreError> {
        Ok(self.session()?.is_some_and(|session| session.is_active()))
    }

    pub async fn login(&self, credentials: &Credentials) -> Result<ApiClient, CoreError> {
        if !credentials.is_complete() {
            return Err(CoreError::InvalidCredentials);
        }
        let token = self.auth.login(credentials).await?;
        info!(username = %credentials.username, "logged in");
        self.start_session(token, &credentials.username)
    }

    pub async fn register(&self, credentials: &Credentials) -> Result<ApiClient, CoreError> {
        if !credentials.is_complete() {
            return Err(CoreError::InvalidCredentials);
        }
        let token = self.auth.register(credentials).await?;
        info!(username = %credentials.username, "account registered");
        self.start_session(token, &credentials.username)
    }

    /// Client for the persisted session, if there is an active one.
    pub fn restore(&self) -> Result<Option<ApiClient>, CoreError> {
        match self.session()? {
            Some(session) if session.is_active() => {
                Ok(Some(ApiClient::new(&self.config, session.token)?))
            }
            _ => Ok(None),
        }
    }

    pub fn logout(&self) -> Result<(), CoreError> {
        self.store.clear()?;
        info!("logged out");
        Ok(())
    }

    /// Delete the account on the server, then forget the session.
    pub async fn delete_account<A: PkgApi>(&self, api: &A) -> Result<(), CoreError> {
        api.delete_account().await?;
        self.store.clear()?;
        info!("account deleted");
        Ok(())
    }

    /// Drop the session if `error` means the token was rejected.
    ///
    /// Returns whether the session was cleared.
    pub fn handle_failure(&self, error: &CoreError) -> Result<bool, CoreError> {
        if !error.is_unauthorized() {
            return Ok(false);
        }
        warn!(error = %error, "token rejected, clearing session");
        self.store.clear()?;
        Ok(true)
    }

    fn start_session(&self, token: String, username: &str) -> Result<ApiClient, CoreError> {
        let client = ApiClient::new(&self.config, token.as_str())?;
        self.store.set(&Session::new(token, username))?;
        Ok(client)
    }
}
