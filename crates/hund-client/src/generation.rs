//! Index generation workflow.
//!
//! `Idle -> Generating -> refresh catalog -> Idle`, or `Generating -> Idle`
//! on failure.  At most one build per channel is in flight; the generating
//! mark is released by a guard, so an error or a dropped future can never
//! leave a channel stuck.

use std::collections::BTreeSet;
use std::sync::Arc;

use hund_shared::GeneratedIndex;
use tokio::sync::watch;
use tracing::{info, warn};

use crate::api::PkgApi;
use crate::catalog::Catalog;
use crate::error::CoreError;

/// Channels with a build currently running.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerationState {
    pub generating: BTreeSet<String>,
}

impl GenerationState {
    pub fn is_idle(&self) -> bool {
        self.generating.is_empty()
    }
}

pub struct IndexGenerator<A> {
    api: Arc<A>,
    state: watch::Sender<GenerationState>,
}

impl<A: PkgApi> IndexGenerator<A> {
    pub fn new(api: Arc<A>) -> Self {
        Self {
            api,
            state: watch::Sender::new(GenerationState::default()),
        }
    }

    pub fn snapshot(&self) -> GenerationState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<GenerationState> {
        self.state.subscribe()
    }

    pub fn is_generating(&self, channel: &str) -> bool {
        self.state.borrow().generating.contains(channel)
    }

    /// Build a new index for the catalog's current channel.
    pub async fn generate(&self, catalog: &Catalog<A>) -> Result<GeneratedIndex, CoreError> {
        let channel = catalog
            .snapshot()
            .current_channel_name()
            .map(str::to_string)
            .ok_or(CoreError::NoChannelSelected)?;
        self.generate_for(catalog, &channel).await
    }

    /// Build a new index for `channel` and fold it into `catalog`.
    ///
    /// On a successful build whose catalog refresh fails, the error is
    /// [`CoreError::RefreshFailed`] and still carries the generated index.
    pub async fn generate_for(
        &self,
        catalog: &Catalog<A>,
        channel: &str,
    ) -> Result<GeneratedIndex, CoreError> {
        let _guard = GeneratingGuard::enter(self, channel)?;
        info!(channel, "generating index");

        let generated = match self.api.generate_index(channel).await {
            Ok(generated) => generated,
            Err(e) => {
                warn!(channel, error = %e, "index generation failed");
                return Err(e.into());
            }
        };
        info!(
            channel,
            id = %generated.id,
            packages = generated.total_package_count,
            files = generated.total_file_count,
            "index generated"
        );

        match catalog.refresh_after_generation(channel, Some(&generated)).await {
            Ok(()) => Ok(generated),
            Err(source) => Err(CoreError::RefreshFailed { generated, source }),
        }
    }
}

struct GeneratingGuard<'a, A> {
    generator: &'a IndexGenerator<A>,
    channel: String,
}

impl<'a, A> GeneratingGuard<'a, A> {
    fn enter(generator: &'a IndexGenerator<A>, channel: &str) -> Result<Self, CoreError> {
        let claimed = generator
            .state
            .send_if_modified(|state| state.generating.insert(channel.to_string()));
        if !claimed {
            warn!(channel, "index generation already running");
            return Err(CoreError::GenerationInProgress(channel.to_string()));
        }
        Ok(Self {
            generator,
            channel: channel.to_string(),
        })
    }
}

impl<A> Drop for GeneratingGuard<'_, A> {
    fn drop(&mut self) {
        self.generator
            .state
            .send_if_modified(|state| state.generating.remove(&self.channel));
    }
}
