//! Test doubles shared by the store's unit tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Local, TimeZone};
use tokio::sync::Notify;

use crate::api::{
    ApiError, ApiResult, CreateRecordRequest, RecordFilter, RemoteApi, RemoteFateIndex,
    RemoteStats, SyncResponse,
};
use crate::auth::{AuthSession, AuthUser};
use crate::clock::FixedClock;
use crate::config::StorePolicy;
use crate::models::{Record, RecordKind, RecordUpdate};
use crate::storage::MemoryStore;
use crate::store::Store;

/// 2026-10-14 09:30:00 local time.
pub fn fixed_now() -> DateTime<Local> {
    Local
        .with_ymd_and_hms(2026, 10, 14, 9, 30, 0)
        .single()
        .unwrap()
}

/// A store over an in-memory key-value store with the clock frozen at [`fixed_now`].
pub fn fixed_store(remote: FakeRemote) -> Store<FakeRemote> {
    Store::new(
        Arc::new(MemoryStore::new()),
        remote,
        StorePolicy::default(),
    )
    .with_clock(Arc::new(FixedClock(fixed_now())))
}

pub fn server_record(id: &str, date: &str, kind: RecordKind, score: u32) -> Record {
    Record {
        id: id.to_string(),
        date: date.to_string(),
        time: "12:00".to_string(),
        kind,
        score,
        note: None,
        created_at: format!("{date}T12:00:00.000Z"),
        updated_at: format!("{date}T12:00:00.000Z"),
    }
}

/// Scripted [`RemoteApi`]. Clones share state.
#[derive(Clone, Default)]
pub struct FakeRemote {
    inner: Arc<FakeInner>,
}

#[derive(Default)]
struct FakeInner {
    authenticated: AtomicBool,
    failing: AtomicBool,
    state: Mutex<FakeState>,
    sync_started: Notify,
    create_started: Notify,
}

#[derive(Default)]
struct FakeState {
    calls: HashMap<&'static str, usize>,
    next_id: usize,
    server_records: Vec<Record>,
    sync_response: Option<Vec<Record>>,
    synced_batches: Vec<Vec<Record>>,
    stats: RemoteStats,
    fate_index: i64,
    sync_gate: Option<Arc<Notify>>,
    create_gate: Option<Arc<Notify>>,
}

impl FakeRemote {
    pub fn offline() -> Self {
        Self::default()
    }

    pub fn authenticated() -> Self {
        let remote = Self::default();
        remote.set_authenticated(true);
        remote
    }

    pub fn set_authenticated(&self, authenticated: bool) {
        self.inner
            .authenticated
            .store(authenticated, Ordering::SeqCst);
    }

    /// Make every network call fail.
    pub fn set_failing(&self, failing: bool) {
        self.inner.failing.store(failing, Ordering::SeqCst);
    }

    pub fn set_server_records(&self, records: Vec<Record>) {
        self.state().server_records = records;
    }

    /// What `sync_records` answers with as `serverRecords`.
    pub fn set_sync_response(&self, records: Option<Vec<Record>>) {
        self.state().sync_response = records;
    }

    pub fn set_stats(&self, stats: RemoteStats) {
        self.state().stats = stats;
    }

    pub fn set_fate_index(&self, fate_index: i64) {
        self.state().fate_index = fate_index;
    }

    /// Hold `sync_records` until the returned handle is notified.
    pub fn gate_sync(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.state().sync_gate = Some(gate.clone());
        gate
    }

    pub fn clear_sync_gate(&self) {
        self.state().sync_gate = None;
    }

    /// Hold `create_record` until the returned handle is notified.
    pub fn gate_create(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.state().create_gate = Some(gate.clone());
        gate
    }

    /// Resolves once a `create_record` call has started.
    pub async fn wait_for_create_start(&self) {
        self.inner.create_started.notified().await;
    }

    /// Resolves once a `sync_records` call has started.
    pub async fn wait_for_sync_start(&self) {
        self.inner.sync_started.notified().await;
    }

    pub fn calls(&self, operation: &str) -> usize {
        self.state().calls.get(operation).copied().unwrap_or(0)
    }

    pub fn total_calls(&self) -> usize {
        self.state().calls.values().sum()
    }

    pub fn synced_batches(&self) -> Vec<Vec<Record>> {
        self.state().synced_batches.clone()
    }

    pub fn user(&self) -> AuthUser {
        AuthUser {
            id: "7".to_string(),
            email: Some("user@example.com".to_string()),
        }
    }

    fn state(&self) -> std::sync::MutexGuard<'_, FakeState> {
        self.inner.state.lock().unwrap()
    }

    fn begin(&self, operation: &'static str) -> ApiResult<()> {
        *self.state().calls.entry(operation).or_default() += 1;
        if self.inner.failing.load(Ordering::SeqCst) {
            Err(ApiError::Status {
                status: 503,
                message: "service unavailable".to_string(),
            })
        } else {
            Ok(())
        }
    }
}

impl RemoteApi for FakeRemote {
    fn is_authenticated(&self) -> bool {
        self.inner.authenticated.load(Ordering::SeqCst)
    }

    fn current_user(&self) -> Option<AuthUser> {
        self.is_authenticated().then(|| self.user())
    }

    fn logout(&self) -> ApiResult<()> {
        self.set_authenticated(false);
        Ok(())
    }

    async fn send_code(&self, _email: &str) -> ApiResult<()> {
        self.begin("send_code")
    }

    async fn login(&self, _email: &str, _code: &str) -> ApiResult<AuthSession> {
        self.begin("login")?;
        self.set_authenticated(true);
        Ok(AuthSession {
            token: "fake-token".to_string(),
            user: self.user(),
        })
    }

    async fn create_record(&self, record: &CreateRecordRequest) -> ApiResult<Record> {
        self.inner.create_started.notify_one();
        let gate = self.state().create_gate.take();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        self.begin("create_record")?;
        let mut state = self.state();
        state.next_id += 1;
        let created = Record {
            id: format!("srv-{}", state.next_id),
            date: record.date.clone(),
            time: String::new(),
            kind: record.kind,
            score: record.score,
            note: record.note.clone(),
            created_at: String::new(),
            updated_at: String::new(),
        };
        state.server_records.push(created.clone());
        Ok(created)
    }

    async fn update_record(&self, id: &str, patch: &RecordUpdate) -> ApiResult<()> {
        self.begin("update_record")?;
        let mut state = self.state();
        if let Some(record) = state.server_records.iter_mut().find(|record| record.id == id) {
            if let Some(kind) = patch.kind {
                record.kind = kind;
            }
            if let Some(score) = patch.score {
                record.score = score;
            }
        }
        Ok(())
    }

    async fn delete_record(&self, id: &str) -> ApiResult<()> {
        self.begin("delete_record")?;
        self.state().server_records.retain(|record| record.id != id);
        Ok(())
    }

    async fn get_records(&self, _filter: &RecordFilter) -> ApiResult<Vec<Record>> {
        self.begin("get_records")?;
        Ok(self.state().server_records.clone())
    }

    async fn get_stats(&self) -> ApiResult<RemoteStats> {
        self.begin("get_stats")?;
        Ok(self.state().stats)
    }

    async fn get_fate_index(&self) -> ApiResult<RemoteFateIndex> {
        self.begin("get_fate_index")?;
        Ok(RemoteFateIndex {
            fate_index: self.state().fate_index,
        })
    }

    async fn sync_records(&self, records: &[Record]) -> ApiResult<SyncResponse> {
        *self.state().calls.entry("sync_records").or_default() += 1;
        self.inner.sync_started.notify_one();
        let gate = self.state().sync_gate.clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        if self.inner.failing.load(Ordering::SeqCst) {
            return Err(ApiError::Status {
                status: 503,
                message: "service unavailable".to_string(),
            });
        }
        let mut state = self.state();
        state.synced_batches.push(records.to_vec());
        Ok(SyncResponse {
            server_records: state.sync_response.clone(),
        })
    }
}
