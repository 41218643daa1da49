//! HTTP implementation of [`RemoteApi`] against the Merit backend.

use std::time::Duration;

use reqwest::{Client, Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};

use super::{
    ApiError, ApiResult, CreateRecordRequest, RecordFilter, RemoteApi, RemoteFateIndex,
    RemoteStats, SyncResponse,
};
use crate::auth::{validate_email, validate_login_code, AuthSession, AuthState, AuthUser};
use crate::models::{decode_records, Record, RecordUpdate};
use crate::util::{compact_text, is_http_url, normalize_text_option, ERROR_SNIPPET_CHARS};

/// Default per-request timeout
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

#[derive(Clone)]
pub struct HttpApiClient {
    base_url: String,
    client: Client,
    auth: AuthState,
}

impl HttpApiClient {
    pub fn new(base_url: impl AsRef<str>, timeout: Duration, auth: AuthState) -> ApiResult<Self> {
        let base_url = normalize_base_url(base_url.as_ref())?;
        Ok(Self {
            base_url,
            client: Client::builder().timeout(timeout).build()?,
            auth,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub const fn auth(&self) -> &AuthState {
        &self.auth
    }

    /// Probe the backend's health endpoint.
    pub async fn health(&self) -> ApiResult<Value> {
        let data = self
            .send(Method::GET, "/api/health", &[], None, false)
            .await?;
        Ok(data.unwrap_or(Value::Null))
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        query: &[(&'static str, String)],
        body: Option<Value>,
        requires_auth: bool,
    ) -> ApiResult<Option<Value>> {
        let mut request = self
            .client
            .request(method.clone(), format!("{}{}", self.base_url, path))
            .header(reqwest::header::ACCEPT, "application/json");

        if requires_auth {
            let token = self.auth.token().ok_or(ApiError::NotAuthenticated)?;
            request = request.bearer_auth(token);
        }
        if !query.is_empty() {
            request = request.query(query);
        }
        if let Some(body) = body {
            request = request.json(&body);
        }

        tracing::debug!("{} {}", method, path);
        let response = request.send().await?;
        let status = response.status();

        if requires_auth && status == StatusCode::UNAUTHORIZED {
            tracing::warn!("Server rejected the session token; signing out");
            if let Err(error) = self.auth.clear() {
                tracing::warn!("Failed to clear rejected session: {}", error);
            }
        }

        let body = response.text().await?;
        if !status.is_success() {
            return Err(ApiError::Status {
                status: status.as_u16(),
                message: parse_api_error(status, &body),
            });
        }

        parse_envelope(&body)
    }
}

impl RemoteApi for HttpApiClient {
    fn is_authenticated(&self) -> bool {
        self.auth.is_authenticated()
    }

    fn current_user(&self) -> Option<AuthUser> {
        self.auth.current_user()
    }

    fn logout(&self) -> ApiResult<()> {
        self.auth
            .clear()
            .map_err(|error| ApiError::Session(error.to_string()))
    }

    async fn send_code(&self, email: &str) -> ApiResult<()> {
        let email = validate_email(email)?;
        self.send(
            Method::POST,
            "/api/auth/send-code",
            &[],
            Some(json!({ "email": email })),
            false,
        )
        .await?;
        Ok(())
    }

    async fn login(&self, email: &str, code: &str) -> ApiResult<AuthSession> {
        let email = validate_email(email)?;
        let code = validate_login_code(code)?;
        let data = self
            .send(
                Method::POST,
                "/api/auth/login",
                &[],
                Some(json!({ "email": email, "code": code })),
                false,
            )
            .await?;
        let session: AuthSession = decode_data(data)?;
        self.auth
            .set_session(&session)
            .map_err(|error| ApiError::Session(error.to_string()))?;
        Ok(session)
    }

    async fn create_record(&self, record: &CreateRecordRequest) -> ApiResult<Record> {
        let data = self
            .send(
                Method::POST,
                "/api/records",
                &[],
                Some(serde_json::to_value(record)?),
                true,
            )
            .await?;
        decode_data(data)
    }

    async fn update_record(&self, id: &str, patch: &RecordUpdate) -> ApiResult<()> {
        self.send(
            Method::PUT,
            &record_path(id),
            &[],
            Some(serde_json::to_value(patch)?),
            true,
        )
        .await?;
        Ok(())
    }

    async fn delete_record(&self, id: &str) -> ApiResult<()> {
        self.send(Method::DELETE, &record_path(id), &[], None, true)
            .await?;
        Ok(())
    }

    async fn get_records(&self, filter: &RecordFilter) -> ApiResult<Vec<Record>> {
        let data = self
            .send(
                Method::GET,
                "/api/records",
                &filter.query_pairs(),
                None,
                true,
            )
            .await?;
        Ok(decode_record_list(data))
    }

    async fn get_stats(&self) -> ApiResult<RemoteStats> {
        let data = self
            .send(Method::GET, "/api/records/stats", &[], None, true)
            .await?;
        decode_data(data)
    }

    async fn get_fate_index(&self) -> ApiResult<RemoteFateIndex> {
        let data = self
            .send(Method::GET, "/api/fate/index", &[], None, true)
            .await?;
        decode_data(data)
    }

    async fn sync_records(&self, records: &[Record]) -> ApiResult<SyncResponse> {
        let data = self
            .send(
                Method::POST,
                "/api/sync/records",
                &[],
                Some(json!({ "records": records })),
                true,
            )
            .await?;
        Ok(decode_sync_response(data))
    }
}

/// Validate and normalize the backend base URL (scheme required, no trailing slash).
pub fn normalize_base_url(raw: &str) -> ApiResult<String> {
    let url = normalize_text_option(Some(raw.to_string())).ok_or_else(|| {
        ApiError::InvalidConfiguration("API base URL must not be empty".to_string())
    })?;
    if is_http_url(&url) {
        Ok(url.trim_end_matches('/').to_string())
    } else {
        Err(ApiError::InvalidConfiguration(
            "API base URL must include http:// or https://".to_string(),
        ))
    }
}

fn record_path(id: &str) -> String {
    format!("/api/records/{}", urlencoding::encode(id))
}

#[derive(Debug, Deserialize)]
struct ApiEnvelope {
    #[serde(default = "default_success")]
    success: bool,
    #[serde(default)]
    data: Option<Value>,
    #[serde(default)]
    message: Option<String>,
}

const fn default_success() -> bool {
    true
}

fn parse_envelope(body: &str) -> ApiResult<Option<Value>> {
    if body.trim().is_empty() {
        return Ok(None);
    }
    let envelope: ApiEnvelope = serde_json::from_str(body)?;
    if envelope.success {
        Ok(envelope.data.filter(|data| !data.is_null()))
    } else {
        Err(ApiError::Rejected(
            normalize_text_option(envelope.message).unwrap_or_else(|| "request failed".to_string()),
        ))
    }
}

fn decode_data<T: DeserializeOwned>(data: Option<Value>) -> ApiResult<T> {
    let data =
        data.ok_or_else(|| ApiError::Rejected("response did not include data".to_string()))?;
    Ok(serde_json::from_value(data)?)
}

/// Accepts either a bare array or `{ "records": [...] }`.
fn decode_record_list(data: Option<Value>) -> Vec<Record> {
    match data {
        Some(Value::Array(values)) => decode_records(values),
        Some(Value::Object(mut object)) => match object.remove("records") {
            Some(Value::Array(values)) => decode_records(values),
            _ => Vec::new(),
        },
        _ => Vec::new(),
    }
}

fn decode_sync_response(data: Option<Value>) -> SyncResponse {
    let server_records = match data {
        Some(Value::Object(mut object)) => match object.remove("serverRecords") {
            Some(Value::Array(values)) => Some(decode_records(values)),
            _ => None,
        },
        _ => None,
    };
    SyncResponse { server_records }
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: Option<String>,
    message: Option<String>,
}

fn parse_api_error(status: StatusCode, body: &str) -> String {
    if let Ok(payload) = serde_json::from_str::<ApiErrorBody>(body) {
        if let Some(message) = payload.message.or(payload.error) {
            return message.trim().to_string();
        }
    }

    let trimmed = compact_text(body, ERROR_SNIPPET_CHARS);
    if trimmed.is_empty() {
        status
            .canonical_reason()
            .unwrap_or("request failed")
            .to_string()
    } else {
        trimmed
    }
}
