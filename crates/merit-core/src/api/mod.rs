//! Remote API: the backend the store synchronizes against.
//!
//! [`RemoteApi`] is the seam between the store and the network. Every call
//! may fail; the store treats any [`ApiError`] as "fall back to local state".

mod http;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use http::{normalize_base_url, HttpApiClient, DEFAULT_TIMEOUT_SECS};

use crate::auth::{AuthSession, AuthUser};
use crate::models::{Record, RecordKind, RecordUpdate};

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Not signed in")]
    NotAuthenticated,
    #[error("Invalid API configuration: {0}")]
    InvalidConfiguration(String),
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("HTTP {status}: {message}")]
    Status { status: u16, message: String },
    #[error("Request rejected: {0}")]
    Rejected(String),
    #[error("Invalid response payload: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Local session storage failed: {0}")]
    Session(String),
}

pub type ApiResult<T> = Result<T, ApiError>;

/// Body of a record creation request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateRecordRequest {
    #[serde(rename = "type")]
    pub kind: RecordKind,
    pub score: u32,
    pub note: Option<String>,
    pub date: String,
}

impl From<&Record> for CreateRecordRequest {
    fn from(record: &Record) -> Self {
        Self {
            kind: record.kind,
            score: record.score,
            note: record.note.clone(),
            date: record.date.clone(),
        }
    }
}

/// Query filter for listing server records.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordFilter {
    pub date: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub limit: Option<usize>,
}

impl RecordFilter {
    /// Query-string pairs, using the backend's camelCase names.
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(date) = &self.date {
            pairs.push(("date", date.clone()));
        }
        if let Some(start_date) = &self.start_date {
            pairs.push(("startDate", start_date.clone()));
        }
        if let Some(end_date) = &self.end_date {
            pairs.push(("endDate", end_date.clone()));
        }
        if let Some(limit) = self.limit {
            pairs.push(("limit", limit.to_string()));
        }
        pairs
    }
}

/// Lifetime totals as computed by the server.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteStats {
    #[serde(default)]
    pub total_gong: u64,
    #[serde(default)]
    pub total_guo: u64,
    #[serde(default)]
    pub total_count: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteFateIndex {
    pub fate_index: i64,
}

/// Result of a bulk sync. `server_records`, when present, is the server's
/// authoritative record set for the user.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncResponse {
    pub server_records: Option<Vec<Record>>,
}

/// Backend operations consumed by the store.
#[allow(async_fn_in_trait)]
pub trait RemoteApi {
    /// Whether a session token is present. Does not touch the network.
    fn is_authenticated(&self) -> bool;

    fn current_user(&self) -> Option<AuthUser>;

    /// Forget the local session.
    fn logout(&self) -> ApiResult<()>;

    /// Ask the backend to email a one-time login code.
    async fn send_code(&self, email: &str) -> ApiResult<()>;

    /// Exchange an emailed code for a session.
    async fn login(&self, email: &str, code: &str) -> ApiResult<AuthSession>;

    async fn create_record(&self, record: &CreateRecordRequest) -> ApiResult<Record>;

    async fn update_record(&self, id: &str, patch: &RecordUpdate) -> ApiResult<()>;

    async fn delete_record(&self, id: &str) -> ApiResult<()>;

    async fn get_records(&self, filter: &RecordFilter) -> ApiResult<Vec<Record>>;

    async fn get_stats(&self) -> ApiResult<RemoteStats>;

    async fn get_fate_index(&self) -> ApiResult<RemoteFateIndex>;

    async fn sync_records(&self, records: &[Record]) -> ApiResult<SyncResponse>;
}
