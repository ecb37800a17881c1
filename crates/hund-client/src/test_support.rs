//! Scripted [`PkgApi`] fake and helpers shared by the unit tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{TimeZone, Utc};
use hund_shared::{ApiError, GeneratedIndex, HistoryEntry, IndexInfo, PkgResult};
use tokio::sync::Notify;

use crate::api::PkgApi;
use crate::query::filter_packages;

pub(crate) fn index(id: &str) -> IndexInfo {
    IndexInfo {
        id: id.to_string(),
        created_at: Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap(),
        total_file_count: 100,
    }
}

pub(crate) fn pkg(name: &str) -> PkgResult {
    PkgResult {
        pkg_name: name.to_string(),
        out_name: "out".to_string(),
        out_hash: format!("{name}-hash"),
        path: format!("/bin/{name}"),
        version: "1.0".to_string(),
    }
}

pub(crate) fn generated(id: &str) -> GeneratedIndex {
    GeneratedIndex {
        id: id.to_string(),
        created_at: Utc.with_ymd_and_hms(2024, 3, 2, 12, 0, 0).unwrap(),
        total_package_count: 1,
        total_file_count: 10,
    }
}

pub(crate) fn history_entry(index_id: &str, name: &str) -> HistoryEntry {
    HistoryEntry {
        index_id: index_id.to_string(),
        date: Utc.with_ymd_and_hms(2024, 3, 3, 9, 30, 0).unwrap(),
        pkg: pkg(name),
    }
}

/// In-memory stand-in for the remote API.
#[derive(Default)]
pub(crate) struct FakeApi {
    channels: Mutex<Vec<String>>,
    channel_error: Mutex<Option<ApiError>>,
    indices: Mutex<HashMap<String, Result<Vec<IndexInfo>, ApiError>>>,
    index_delays: Mutex<HashMap<String, Duration>>,
    packages: Mutex<Vec<PkgResult>>,
    query_delays: Mutex<HashMap<String, Duration>>,
    query_errors: Mutex<HashMap<String, ApiError>>,
    generate_result: Mutex<Option<Result<GeneratedIndex, ApiError>>>,
    generate_gate: Mutex<Option<Arc<Notify>>>,
    history: Mutex<Vec<HistoryEntry>>,
    history_error: Mutex<Option<ApiError>>,
    calls: Mutex<Vec<String>>,
}

impl FakeApi {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_channel(self, name: &str, indices: Vec<IndexInfo>) -> Self {
        self.channels.lock().unwrap().push(name.to_string());
        self.set_indices(name, indices);
        self
    }

    pub(crate) fn with_failing_channel(self, name: &str, error: ApiError) -> Self {
        self.channels.lock().unwrap().push(name.to_string());
        self.indices
            .lock()
            .unwrap()
            .insert(name.to_string(), Err(error));
        self
    }

    pub(crate) fn with_packages(self, packages: Vec<PkgResult>) -> Self {
        *self.packages.lock().unwrap() = packages;
        self
    }

    pub(crate) fn with_history(self, entries: Vec<HistoryEntry>) -> Self {
        *self.history.lock().unwrap() = entries;
        self
    }

    pub(crate) fn set_indices(&self, channel: &str, indices: Vec<IndexInfo>) {
        self.indices
            .lock()
            .unwrap()
            .insert(channel.to_string(), Ok(indices));
    }

    pub(crate) fn fail_indices(&self, channel: &str, error: ApiError) {
        self.indices
            .lock()
            .unwrap()
            .insert(channel.to_string(), Err(error));
    }

    pub(crate) fn fail_channel_list(&self, error: ApiError) {
        *self.channel_error.lock().unwrap() = Some(error);
    }

    pub(crate) fn fail_history(&self, error: ApiError) {
        *self.history_error.lock().unwrap() = Some(error);
    }

    pub(crate) fn delay_indices(&self, channel: &str, delay: Duration) {
        self.index_delays
            .lock()
            .unwrap()
            .insert(channel.to_string(), delay);
    }

    pub(crate) fn delay_query(&self, text: &str, delay: Duration) {
        self.query_delays
            .lock()
            .unwrap()
            .insert(text.to_string(), delay);
    }

    pub(crate) fn fail_query(&self, text: &str, error: ApiError) {
        self.query_errors
            .lock()
            .unwrap()
            .insert(text.to_string(), error);
    }

    pub(crate) fn set_generate_result(&self, result: Result<GeneratedIndex, ApiError>) {
        *self.generate_result.lock().unwrap() = Some(result);
    }

    /// Make `generate_index` wait until the returned handle is notified.
    pub(crate) fn gate_generation(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.generate_gate.lock().unwrap() = Some(gate.clone());
        gate
    }

    pub(crate) fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub(crate) fn count_calls(&self, prefix: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.starts_with(prefix))
            .count()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

impl PkgApi for FakeApi {
    async fn list_channels(&self) -> Result<Vec<String>, ApiError> {
        self.record("list_channels".into());
        if let Some(err) = self.channel_error.lock().unwrap().clone() {
            return Err(err);
        }
        Ok(self.channels.lock().unwrap().clone())
    }

    async fn list_indices(&self, channel: &str) -> Result<Vec<IndexInfo>, ApiError> {
        self.record(format!("list_indices:{channel}"));
        let delay = self.index_delays.lock().unwrap().get(channel).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.indices
            .lock()
            .unwrap()
            .get(channel)
            .cloned()
            .unwrap_or_else(|| {
                Err(ApiError::RequestError {
                    status: 404,
                    message: format!("unknown channel {channel}"),
                })
            })
    }

    async fn generate_index(&self, channel: &str) -> Result<GeneratedIndex, ApiError> {
        self.record(format!("generate_index:{channel}"));
        let gate = self.generate_gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        self.generate_result
            .lock()
            .unwrap()
            .clone()
            .unwrap_or_else(|| Ok(generated("generated")))
    }

    async fn query(&self, index_id: &str, text: &str) -> Result<Vec<PkgResult>, ApiError> {
        self.record(format!("query:{index_id}:{text}"));
        let delay = self.query_delays.lock().unwrap().get(text).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(err) = self.query_errors.lock().unwrap().get(text).cloned() {
            return Err(err);
        }
        let packages = self.packages.lock().unwrap();
        Ok(filter_packages(&packages, text).into_iter().cloned().collect())
    }

    async fn list_history(&self) -> Result<Vec<HistoryEntry>, ApiError> {
        self.record("list_history".into());
        if let Some(err) = self.history_error.lock().unwrap().clone() {
            return Err(err);
        }
        Ok(self.history.lock().unwrap().clone())
    }

    async fn delete_history_entry(&self, index_id: &str) -> Result<(), ApiError> {
        self.record(format!("delete_history_entry:{index_id}"));
        let mut history = self.history.lock().unwrap();
        if let Some(pos) = history.iter().position(|entry| entry.index_id == index_id) {
            history.remove(pos);
        }
        Ok(())
    }

    async fn delete_account(&self) -> Result<(), ApiError> {
        self.record("delete_account".into());
        Ok(())
    }
}

/// Serve `router` on an ephemeral local port and return its base URL.
pub(crate) async fn spawn_server(router: axum::Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}
