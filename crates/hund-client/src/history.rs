//! Server-side search history of the logged-in account.

use std::sync::Arc;

use hund_shared::{ApiError, HistoryEntry};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::api::PkgApi;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HistoryState {
    /// Server order, most recent first.
    pub entries: Vec<HistoryEntry>,
    pub loading: bool,
    pub loaded: bool,
    /// Failure of the most recent refresh.
    pub error: Option<ApiError>,
}

pub struct History<A> {
    api: Arc<A>,
    state: watch::Sender<HistoryState>,
}

impl<A: PkgApi> History<A> {
    pub fn new(api: Arc<A>) -> Self {
        Self {
            api,
            state: watch::Sender::new(HistoryState::default()),
        }
    }

    pub fn snapshot(&self) -> HistoryState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<HistoryState> {
        self.state.subscribe()
    }

    pub fn entries(&self) -> Vec<HistoryEntry> {
        self.state.borrow().entries.clone()
    }

    /// Reload the history from the server.
    ///
    /// On failure the previous entries are kept and the error is both
    /// recorded in the state and returned.
    pub async fn refresh(&self) -> Result<Vec<HistoryEntry>, ApiError> {
        let _guard = LoadingGuard::enter(&self.state);

        match self.api.list_history().await {
            Ok(entries) => {
                debug!(count = entries.len(), "history loaded");
                self.state.send_modify(|state| {
                    state.entries = entries.clone();
                    state.loaded = true;
                    state.error = None;
                });
                Ok(entries)
            }
            Err(e) => {
                warn!(error = %e, "failed to load history");
                self.state.send_modify(|state| state.error = Some(e.clone()));
                Err(e)
            }
        }
    }

    /// Delete one entry of `index_id` on the server, then the first matching
    /// local entry.
    pub async fn delete(&self, index_id: &str) -> Result<(), ApiError> {
        self.api.delete_history_entry(index_id).await?;
        self.state.send_if_modified(|state| {
            match state.entries.iter().position(|entry| entry.index_id == index_id) {
                Some(pos) => {
                    state.entries.remove(pos);
                    true
                }
                None => false,
            }
        });
        info!(index_id, "history entry deleted");
        Ok(())
    }
}

struct LoadingGuard<'a> {
    state: &'a watch::Sender<HistoryState>,
}

impl<'a> LoadingGuard<'a> {
    fn enter(state: &'a watch::Sender<HistoryState>) -> Self {
        state.send_modify(|state| state.loading = true);
        Self { state }
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.state.send_modify(|state| state.loading = false);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{history_entry, FakeApi};

    fn history(api: FakeApi) -> (History<FakeApi>, Arc<FakeApi>) {
        let api = Arc::new(api);
        (History::new(api.clone()), api)
    }

    #[tokio::test]
    async fn test_refresh_keeps_server_order() {
        let (history, _) = history(FakeApi::new().with_history(vec![
            history_entry("idx-2", "htop"),
            history_entry("idx-1", "hello"),
        ]));

        let entries = history.refresh().await.unwrap();
        assert_eq!(entries.len(), 2);

        let state = history.snapshot();
        assert!(state.loaded);
        assert!(!state.loading);
        assert_eq!(state.entries[0].index_id, "idx-2");
    }

    #[tokio::test]
    async fn test_failed_refresh_resets_loading_and_keeps_entries() {
        let (history, api) = history(FakeApi::new().with_history(vec![history_entry("idx-1", "hello")]));
        history.refresh().await.unwrap();

        api.fail_history(ApiError::Unauthorized("expired".into()));
        let err = history.refresh().await.unwrap_err();
        assert!(err.is_unauthorized());

        let state = history.snapshot();
        assert!(!state.loading);
        assert_eq!(state.error, Some(err));
        assert_eq!(state.entries.len(), 1);
    }

    #[tokio::test]
    async fn test_delete_removes_one_entry() {
        let (history, api) = history(FakeApi::new().with_history(vec![
            history_entry("idx-1", "hello"),
            history_entry("idx-2", "htop"),
            history_entry("idx-1", "ripgrep"),
        ]));
        history.refresh().await.unwrap();

        history.delete("idx-1").await.unwrap();

        let names: Vec<_> = history.entries().into_iter().map(|e| e.pkg.pkg_name).collect();
        assert_eq!(names, vec!["htop", "ripgrep"]);
        assert_eq!(api.count_calls("delete_history_entry:idx-1"), 1);

        history.refresh().await.unwrap();
        let after_refresh: Vec<_> = history.entries().into_iter().map(|e| e.pkg.pkg_name).collect();
        assert_eq!(after_refresh, names, "local state matches the server");
    }
}
