//! Query session: one logical search at a time, last submission wins.
//!
//! Every submission takes a ticket from a monotonically increasing counter.
//! A response is applied only if its ticket is still the newest one, so a
//! slow answer to an older query can never overwrite the state of a newer
//! one.  [`QuerySession::cancel`] simply takes a ticket without issuing a
//! request, which turns whatever is in flight into a stale response.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use hund_shared::{ApiError, PkgResult};
use thiserror::Error;
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::api::PkgApi;
use crate::catalog::CatalogState;

/// Why the latest search produced no results.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueryFailure {
    #[error("No index selected")]
    NoIndexSelected,

    #[error(transparent)]
    Api(#[from] ApiError),
}

/// State of the most recent search.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum QueryState {
    #[default]
    Idle,
    Searching,
    Results(Vec<PkgResult>),
    Failed(QueryFailure),
}

impl QueryState {
    pub fn is_searching(&self) -> bool {
        matches!(self, Self::Searching)
    }

    pub fn results(&self) -> Option<&[PkgResult]> {
        match self {
            Self::Results(results) => Some(results),
            _ => None,
        }
    }
}

/// What happened to one [`QuerySession::search`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchOutcome {
    /// The response was applied; this is the new state.
    Applied(QueryState),
    /// A newer search or a cancellation superseded this one.
    Superseded,
}

/// Runs searches against the catalog's current index.
pub struct QuerySession<A> {
    api: Arc<A>,
    catalog: watch::Receiver<CatalogState>,
    ticket: AtomicU64,
    state: watch::Sender<QueryState>,
    current_package: watch::Sender<Option<PkgResult>>,
}

impl<A: PkgApi> QuerySession<A> {
    pub fn new(api: Arc<A>, catalog: watch::Receiver<CatalogState>) -> Self {
        Self {
            api,
            catalog,
            ticket: AtomicU64::new(0),
            state: watch::Sender::new(QueryState::Idle),
            current_package: watch::Sender::new(None),
        }
    }

    pub fn snapshot(&self) -> QueryState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<QueryState> {
        self.state.subscribe()
    }

    /// Search the current index for `text`.
    ///
    /// Surrounding whitespace is ignored and a blank query matches every
    /// package.  Without a current index the session fails immediately and
    /// no request is made.
    pub async fn search(&self, text: &str) -> SearchOutcome {
        let index_id = self
            .catalog
            .borrow()
            .current_index()
            .map(|index| index.id.clone());

        let Some(index_id) = index_id else {
            let failed = QueryState::Failed(QueryFailure::NoIndexSelected);
            self.state.send_modify(|state| {
                self.ticket.fetch_add(1, Ordering::SeqCst);
                *state = failed.clone();
            });
            return SearchOutcome::Applied(failed);
        };

        let text = text.trim();
        let mut ticket = 0;
        self.state.send_modify(|state| {
            ticket = self.ticket.fetch_add(1, Ordering::SeqCst) + 1;
            *state = QueryState::Searching;
        });
        debug!(ticket, index_id = %index_id, text, "search issued");

        let next = match self.api.query(&index_id, text).await {
            Ok(results) => {
                debug!(ticket, count = results.len(), "search returned");
                QueryState::Results(results)
            }
            Err(e) => {
                warn!(ticket, error = %e, "search failed");
                QueryState::Failed(QueryFailure::Api(e))
            }
        };

        let applied = self.state.send_if_modified(|state| {
            if self.ticket.load(Ordering::SeqCst) != ticket {
                return false;
            }
            *state = next.clone();
            true
        });

        if applied {
            SearchOutcome::Applied(next)
        } else {
            debug!(ticket, "discarding stale search response");
            SearchOutcome::Superseded
        }
    }

    /// Invalidate any in-flight search and return to `Idle`.
    pub fn cancel(&self) {
        self.state.send_modify(|state| {
            self.ticket.fetch_add(1, Ordering::SeqCst);
            *state = QueryState::Idle;
        });
    }

    /// Remember the result the user opened.
    pub fn select_package(&self, package: PkgResult) {
        self.current_package.send_replace(Some(package));
    }

    pub fn clear_package(&self) {
        self.current_package.send_if_modified(|current| current.take().is_some());
    }

    pub fn current_package(&self) -> Option<PkgResult> {
        self.current_package.borrow().clone()
    }

    pub fn subscribe_package(&self) -> watch::Receiver<Option<PkgResult>> {
        self.current_package.subscribe()
    }
}

/// Narrow already fetched results by package name.
///
/// Matching is a case-insensitive substring test on the trimmed `text`; a
/// blank `text` keeps every result.
pub fn filter_packages<'a>(packages: &'a [PkgResult], text: &str) -> Vec<&'a PkgResult> {
    let needle = text.trim().to_uppercase();
    if needle.is_empty() {
        return packages.iter().collect();
    }
    packages
        .iter()
        .filter(|pkg| pkg.pkg_name.to_uppercase().contains(&needle))
        .collect()
}
