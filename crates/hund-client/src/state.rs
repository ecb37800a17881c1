//! Per-session application state.
//!
//! [`AppState`] owns every stateful component of one authenticated session
//! and wires them to the same [`PkgApi`].  Logging in again means building a
//! new `AppState` around the new client.

use std::sync::Arc;

use hund_shared::{GeneratedIndex, HistoryEntry};
use tracing::debug;

use crate::api::PkgApi;
use crate::catalog::{Catalog, PopulateReport};
use crate::error::CoreError;
use crate::generation::IndexGenerator;
use crate::history::History;
use crate::query::{QuerySession, SearchOutcome};

pub struct AppState<A> {
    pub catalog: Catalog<A>,
    pub query: QuerySession<A>,
    pub generator: IndexGenerator<A>,
    pub history: History<A>,
}

impl<A: PkgApi> AppState<A> {
    pub fn new(api: Arc<A>) -> Self {
        let catalog = Catalog::new(api.clone());
        let query = QuerySession::new(api.clone(), catalog.subscribe());
        Self {
            query,
            generator: IndexGenerator::new(api.clone()),
            history: History::new(api),
            catalog,
        }
    }

    /// Populate the catalog.  A search against an index that is no longer
    /// current is cancelled.
    pub async fn populate(&self) -> Result<PopulateReport, CoreError> {
        self.with_selection_watch(self.catalog.populate()).await
    }

    pub fn select_channel(&self, name: &str) -> Result<(), CoreError> {
        self.with_selection_watch_sync(|| self.catalog.select_channel(name))
    }

    pub fn select_index(&self, id: &str) -> Result<(), CoreError> {
        self.with_selection_watch_sync(|| self.catalog.select_index(id))
    }

    pub async fn search(&self, text: &str) -> SearchOutcome {
        self.query.search(text).await
    }

    pub async fn generate_index(&self) -> Result<GeneratedIndex, CoreError> {
        self.with_selection_watch(self.generator.generate(&self.catalog))
            .await
    }

    /// Make the package of a history entry the current package.
    pub fn open_history_entry(&self, entry: &HistoryEntry) {
        self.query.select_package(entry.pkg.clone());
    }

    fn current_index_id(&self) -> Option<String> {
        self.catalog
            .snapshot()
            .current_index_id()
            .map(str::to_string)
    }

    fn cancel_if_moved(&self, before: Option<String>) {
        if self.current_index_id() != before {
            debug!(from = ?before, "current index changed, cancelling search");
            self.query.cancel();
        }
    }

    async fn with_selection_watch<T>(
        &self,
        operation: impl std::future::Future<Output = T>,
    ) -> T {
        let before = self.current_index_id();
        let output = operation.await;
        self.cancel_if_moved(before);
        output
    }

    fn with_selection_watch_sync<T>(&self, operation: impl FnOnce() -> T) -> T {
        let before = self.current_index_id();
        let output = operation();
        self.cancel_if_moved(before);
        output
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::query::QueryState;
    use crate::test_support::{generated, history_entry, index, pkg, FakeApi};

    fn app(api: FakeApi) -> (AppState<FakeApi>, Arc<FakeApi>) {
        let api = Arc::new(api);
        (AppState::new(api.clone()), api)
    }

    #[tokio::test]
    async fn test_search_after_populate() {
        let (app, _) = app(
            FakeApi::new()
                .with_channel("stable", vec![index("s1")])
                .with_packages(vec![pkg("hello"), pkg("htop")]),
        );
        app.populate().await.unwrap();

        let outcome = app.search("").await;
        assert!(matches!(outcome, SearchOutcome::Applied(QueryState::Results(ref r)) if r.len() == 2));
    }

    #[tokio::test]
    async fn test_switching_channel_cancels_search() {
        let (app, api) = app(
            FakeApi::new()
                .with_channel("a", vec![index("a1")])
                .with_channel("b", vec![index("b1")])
                .with_packages(vec![pkg("hello")]),
        );
        app.populate().await.unwrap();
        api.delay_query("hello", Duration::from_millis(30));

        let switch = async {
            tokio::task::yield_now().await;
            app.select_channel("b").unwrap();
        };
        let (outcome, ()) = tokio::join!(app.search("hello"), switch);

        assert_eq!(outcome, SearchOutcome::Superseded);
        assert_eq!(app.query.snapshot(), QueryState::Idle);
    }

    #[tokio::test]
    async fn test_reselecting_same_index_keeps_results() {
        let (app, _) = app(
            FakeApi::new()
                .with_channel("a", vec![index("a1")])
                .with_packages(vec![pkg("hello")]),
        );
        app.populate().await.unwrap();
        app.search("hello").await;

        app.select_index("a1").unwrap();
        assert!(app.query.snapshot().results().is_some());
    }

    #[tokio::test]
    async fn test_generation_moves_selection_and_resets_query() {
        let (app, api) = app(
            FakeApi::new()
                .with_channel("stable", vec![index("s1")])
                .with_packages(vec![pkg("hello")]),
        );
        app.populate().await.unwrap();
        app.search("hello").await;

        api.set_generate_result(Ok(generated("abc")));
        app.generate_index().await.unwrap();

        assert_eq!(app.catalog.snapshot().current_index_id(), Some("abc"));
        assert_eq!(app.query.snapshot(), QueryState::Idle);
    }

    #[tokio::test]
    async fn test_generation_survives_slower_repopulate() {
        let (app, api) = app(FakeApi::new().with_channel("stable", vec![index("s1")]));
        app.populate().await.unwrap();
        api.set_generate_result(Ok(generated("abc")));
        api.delay_indices("stable", Duration::from_millis(60));

        let build = async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            api.delay_indices("stable", Duration::ZERO);
            app.generate_index().await.unwrap()
        };
        let (repopulate, built) = tokio::join!(app.populate(), build);

        assert_eq!(built.id, "abc");
        assert!(repopulate.unwrap().superseded);
        let state = app.catalog.snapshot();
        assert_eq!(state.current_index_id(), Some("abc"));
        assert!(state.channel("stable").unwrap().contains_index("abc"));
    }

    #[tokio::test]
    async fn test_open_history_entry() {
        let (app, _) = app(FakeApi::new().with_history(vec![history_entry("idx-1", "htop")]));
        let entries = app.history.refresh().await.unwrap();

        app.open_history_entry(&entries[0]);
        assert_eq!(app.query.current_package().unwrap().pkg_name, "htop");
    }
}
