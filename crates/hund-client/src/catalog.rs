//! Channel/index catalog.
//!
//! Holds every discovered channel with its indices plus the user's current
//! channel and index.  Invariants maintained by every transition:
//!
//! - channel names are unique;
//! - `current_channel`, if set, names an entry of `channels`;
//! - `current_index`, if set, is an index of the current channel.

use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use futures::future::join_all;
use hund_shared::{ApiError, Channel, ChannelEntry, GeneratedIndex, IndexInfo};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::api::PkgApi;
use crate::error::CoreError;

/// Snapshot of the catalog.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogState {
    pub channels: Vec<ChannelEntry>,
    current_channel: Option<String>,
    current_index: Option<String>,
    /// Set once a population has completed.
    pub populated: bool,
    /// A population is in flight.
    pub populating: bool,
}

impl CatalogState {
    pub fn channel(&self, name: &str) -> Option<&ChannelEntry> {
        self.channels.iter().find(|entry| entry.name() == name)
    }

    pub fn current_channel(&self) -> Option<&ChannelEntry> {
        self.current_channel.as_deref().and_then(|name| self.channel(name))
    }

    pub fn current_index(&self) -> Option<&IndexInfo> {
        let id = self.current_index.as_deref()?;
        self.current_channel()?.index(id)
    }

    pub fn current_channel_name(&self) -> Option<&str> {
        self.current_channel.as_deref()
    }

    pub fn current_index_id(&self) -> Option<&str> {
        self.current_index.as_deref()
    }

    fn selection(&self) -> (Option<String>, Option<String>) {
        (self.current_channel.clone(), self.current_index.clone())
    }

    /// Select `name` and its first index (if any) in one step.
    pub(crate) fn select_channel(&mut self, name: &str) -> Result<(), CoreError> {
        let entry = self
            .channel(name)
            .ok_or_else(|| CoreError::UnknownChannel(name.to_string()))?;
        let first = entry.indices.first().map(|index| index.id.clone());
        self.current_channel = Some(name.to_string());
        self.current_index = first;
        Ok(())
    }

    /// Select an index of the current channel.  Indices of other channels
    /// are rejected.
    pub(crate) fn select_index(&mut self, id: &str) -> Result<(), CoreError> {
        let entry = self.current_channel().ok_or(CoreError::NoChannelSelected)?;
        if !entry.contains_index(id) {
            return Err(CoreError::IndexNotInChannel {
                index: id.to_string(),
                channel: entry.name().to_string(),
            });
        }
        self.current_index = Some(id.to_string());
        Ok(())
    }

    /// First channel with an index and that index; otherwise the first
    /// channel alone; otherwise nothing.
    fn auto_select(&mut self) {
        match self.channels.iter().find(|entry| !entry.indices.is_empty()) {
            Some(entry) => {
                self.current_channel = Some(entry.name().to_string());
                self.current_index = entry.indices.first().map(|index| index.id.clone());
            }
            None => {
                self.current_channel = self.channels.first().map(|entry| entry.name().to_string());
                self.current_index = None;
            }
        }
    }

    /// Re-establish the invariants after `channels` was replaced.
    ///
    /// A selection whose channel disappeared counts as no selection and is
    /// auto-selected afresh.  A surviving channel keeps its index if it
    /// still exists, otherwise falls back to its first index.
    fn reconcile_selection(&mut self) {
        let Some(name) = self.current_channel.clone() else {
            self.auto_select();
            return;
        };
        let Some(entry) = self.channel(&name) else {
            debug!(channel = %name, "selected channel vanished");
            self.auto_select();
            return;
        };
        let keep = self
            .current_index
            .as_deref()
            .is_some_and(|id| entry.contains_index(id));
        if !keep {
            self.current_index = entry.indices.first().map(|index| index.id.clone());
        }
    }
}

/// Outcome of a successful [`Catalog::populate`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PopulateReport {
    pub channels: usize,
    pub indices: usize,
    /// Channels whose index list could not be fetched; they are listed with
    /// no indices.
    pub failures: Vec<(String, ApiError)>,
    /// A newer population or an index build landed first, so this result was
    /// discarded.
    pub superseded: bool,
}

impl PopulateReport {
    pub fn is_partial(&self) -> bool {
        !self.failures.is_empty()
    }

    /// The warning to show for a partial population, if any.
    pub fn warning(&self) -> Option<CoreError> {
        self.is_partial().then(|| {
            CoreError::PartialPopulationFailure(
                self.failures.iter().map(|(name, _)| name.clone()).collect(),
            )
        })
    }
}

/// Discovers channels and indices and owns the current selection.
pub struct Catalog<A> {
    api: Arc<A>,
    state: watch::Sender<CatalogState>,
    in_flight: AtomicUsize,
    /// Bumped by every population call and every applied index refresh.
    epoch: AtomicU64,
}

impl<A: PkgApi> Catalog<A> {
    pub fn new(api: Arc<A>) -> Self {
        Self {
            api,
            state: watch::Sender::new(CatalogState::default()),
            in_flight: AtomicUsize::new(0),
            epoch: AtomicU64::new(0),
        }
    }

    pub fn snapshot(&self) -> CatalogState {
        self.state.borrow().clone()
    }

    /// Receiver notified on every catalog change.
    pub fn subscribe(&self) -> watch::Receiver<CatalogState> {
        self.state.subscribe()
    }

    /// Fetch all channels, then every channel's indices concurrently.
    ///
    /// A failing channel list aborts the population; a failing index list
    /// only empties that channel and is recorded in the report.  The latest
    /// call wins: a result is only applied if no population was started and
    /// no index refresh was applied since this call began.
    pub async fn populate(&self) -> Result<PopulateReport, CoreError> {
        let _guard = PopulatingGuard::enter(self);
        let epoch = self.epoch.fetch_add(1, Ordering::SeqCst) + 1;

        let names = dedupe(self.api.list_channels().await?);
        debug!(count = names.len(), "fetched channel list");

        let fetches = names.iter().map(|name| async move {
            let result = self.api.list_indices(name).await;
            (name, result)
        });
        let results = join_all(fetches).await;

        let mut report = PopulateReport {
            channels: names.len(),
            ..PopulateReport::default()
        };
        let mut entries = Vec::with_capacity(results.len());
        for (name, result) in results {
            let indices = match result {
                Ok(indices) => indices,
                Err(e) => {
                    warn!(channel = %name, error = %e, "failed to fetch indices");
                    report.failures.push((name.clone(), e));
                    Vec::new()
                }
            };
            debug!(channel = %name, count = indices.len(), "fetched indices");
            report.indices += indices.len();
            entries.push(ChannelEntry::new(Channel::new(name.as_str()), indices));
        }

        let applied = self.state.send_if_modified(|state| {
            if self.epoch.load(Ordering::SeqCst) != epoch {
                return false;
            }
            state.channels = entries;
            state.populated = true;
            state.reconcile_selection();
            true
        });
        if !applied {
            debug!(epoch, "discarding stale catalog population");
            report.superseded = true;
            return Ok(report);
        }

        let state = self.state.borrow();
        info!(
            channels = report.channels,
            indices = report.indices,
            failed = report.failures.len(),
            channel = ?state.current_channel_name(),
            index = ?state.current_index_id(),
            "catalog populated"
        );
        Ok(report)
    }

    pub fn select_channel(&self, name: &str) -> Result<(), CoreError> {
        let mut result = Ok(());
        self.state.send_if_modified(|state| {
            let before = state.selection();
            result = state.select_channel(name);
            state.selection() != before
        });
        result
    }

    pub fn select_index(&self, id: &str) -> Result<(), CoreError> {
        let mut result = Ok(());
        self.state.send_if_modified(|state| {
            let before = state.selection();
            result = state.select_index(id);
            state.selection() != before
        });
        result
    }

    /// Re-read the indices of `channel` after an index build.
    ///
    /// `generated` is merged in if the server list does not contain it yet,
    /// and becomes the current index when `channel` is the current channel.
    /// If the re-read fails the generated index is still merged into the
    /// existing list and the error is returned.  Populations already in
    /// flight become stale once the refresh is applied.
    pub async fn refresh_after_generation(
        &self,
        channel: &str,
        generated: Option<&GeneratedIndex>,
    ) -> Result<(), ApiError> {
        let fetched = self.api.list_indices(channel).await;

        let (mut indices, error) = match fetched {
            Ok(indices) => (indices, None),
            Err(e) => {
                warn!(channel, error = %e, "failed to refresh indices after generation");
                let existing = self
                    .state
                    .borrow()
                    .channel(channel)
                    .map(|entry| entry.indices.clone())
                    .unwrap_or_default();
                (existing, Some(e))
            }
        };
        if let Some(generated) = generated {
            if !indices.iter().any(|index| index.id == generated.id) {
                indices.push(generated.to_index_info());
            }
        }

        self.state.send_modify(|state| {
            let Some(entry) = state.channels.iter_mut().find(|entry| entry.name() == channel) else {
                debug!(channel, "channel left the catalog before refresh completed");
                return;
            };
            entry.indices = indices;
            self.epoch.fetch_add(1, Ordering::SeqCst);

            if state.current_channel.as_deref() != Some(channel) {
                state.reconcile_selection();
                return;
            }
            let preferred = generated.map(|g| g.id.clone());
            match preferred {
                Some(id) if state.channel(channel).is_some_and(|e| e.contains_index(&id)) => {
                    state.current_index = Some(id);
                }
                _ => state.reconcile_selection(),
            }
        });

        match error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

/// Keeps `populating` set while at least one population is running.
struct PopulatingGuard<'a, A> {
    catalog: &'a Catalog<A>,
}

impl<'a, A> PopulatingGuard<'a, A> {
    fn enter(catalog: &'a Catalog<A>) -> Self {
        catalog.in_flight.fetch_add(1, Ordering::SeqCst);
        catalog.state.send_if_modified(|state| !std::mem::replace(&mut state.populating, true));
        Self { catalog }
    }
}

impl<A> Drop for PopulatingGuard<'_, A> {
    fn drop(&mut self) {
        let remaining = self.catalog.in_flight.fetch_sub(1, Ordering::SeqCst) - 1;
        if remaining == 0 {
            self.catalog
                .state
                .send_if_modified(|state| std::mem::replace(&mut state.populating, false));
        }
    }
}

fn dedupe(names: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    names
        .into_iter()
        .filter(|name| seen.insert(name.clone()))
        .collect()
}
