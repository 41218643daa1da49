use std::path::PathBuf;
use std::sync::Arc;

use merit_core::api::HttpApiClient;
use merit_core::auth::AuthState;
use merit_core::clock::parse_date;
use merit_core::models::{DayStats, FateLevel, MonthStats, TodayStats, TotalStats, WeekDay};
use merit_core::storage::{MemoryStore, SharedStore, SqliteStore};
use merit_core::util::non_blank;
use merit_core::{Record, Store, SyncOutcome};
use serde::Serialize;

use crate::error::CliError;
use crate::settings::{load_client_config, resolve_config_path, resolve_db_path};

pub type CliStore = Store<HttpApiClient>;

pub const LOGIN_HINT: &str =
    "Tip: sign in with `merit auth login` to back up your records and sync across devices.";

const WEEKDAY_NAMES: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreOptions {
    pub db_path: PathBuf,
    pub config_path: PathBuf,
    pub ephemeral: bool,
}

impl StoreOptions {
    pub fn resolve(db_path: Option<PathBuf>, config_path: Option<PathBuf>, ephemeral: bool) -> Self {
        Self {
            db_path: resolve_db_path(db_path),
            config_path: resolve_config_path(config_path),
            ephemeral,
        }
    }
}

pub fn open_store(options: &StoreOptions) -> Result<CliStore, CliError> {
    let config = load_client_config(&options.config_path)?;
    let kv: SharedStore = if options.ephemeral {
        Arc::new(MemoryStore::new())
    } else {
        Arc::new(SqliteStore::open(&options.db_path)?)
    };
    let auth = AuthState::new(kv.clone());
    let api = HttpApiClient::new(
        config.resolved_api_base_url(),
        config.request_timeout(),
        auth,
    )?;
    tracing::debug!("Using backend {}", api.base_url());
    Ok(Store::new(kv, api, config.policy))
}

pub fn normalize_record_id(id: &str) -> Result<String, CliError> {
    non_blank(id)
        .map(str::to_string)
        .ok_or(CliError::EmptyRecordId)
}

/// Validate a `YYYY-MM-DD` argument, defaulting to `today`.
pub fn resolve_day(date: Option<&str>, today: &str) -> Result<String, CliError> {
    match date {
        None => Ok(today.to_string()),
        Some(date) => parse_date(date)
            .map(merit_core::clock::format_date)
            .ok_or_else(|| CliError::InvalidDate(date.to_string())),
    }
}

pub fn format_record_line(record: &Record) -> String {
    let mut line = format!(
        "{}  {} {}  {:<5} {:>+5}",
        record.id,
        record.date,
        record.sort_time(),
        record.kind.as_str(),
        record.signed_score()
    );
    if let Some(note) = record.note.as_deref() {
        line.push_str("  ");
        line.push_str(note);
    }
    line
}

pub fn format_record_lines(records: &[Record]) -> Vec<String> {
    records.iter().map(format_record_line).collect()
}

pub fn format_record_detail(record: &Record) -> Vec<String> {
    vec![
        format!("id:       {}", record.id),
        format!("type:     {}", record.kind),
        format!("score:    {}", record.score),
        format!("date:     {} {}", record.date, record.sort_time()),
        format!("note:     {}", record.note.as_deref().unwrap_or("-")),
        format!("created:  {}", record.created_at),
        format!("updated:  {}", record.updated_at),
    ]
}

pub fn format_day_summary(stats: &DayStats) -> String {
    format!(
        "merit {}  fault {}  net {:+}  ({} records)",
        stats.merit,
        stats.fault,
        net(stats.merit, stats.fault),
        stats.count
    )
}

pub fn format_today_lines(date: &str, stats: &TodayStats) -> Vec<String> {
    vec![
        format!("Today ({date})"),
        format!("  merit  {:>6}  ({} records)", stats.merit, stats.merit_count),
        format!("  fault  {:>6}  ({} records)", stats.fault, stats.fault_count),
        format!("  net    {:>+6}", net(stats.merit, stats.fault)),
    ]
}

pub fn format_week_lines(days: &[WeekDay]) -> Vec<String> {
    days.iter()
        .map(|day| {
            let name = usize::try_from(day.weekday)
                .ok()
                .and_then(|index| WEEKDAY_NAMES.get(index))
                .copied()
                .unwrap_or("???");
            let marker = if day.is_today { "*" } else { " " };
            format!(
                "{marker}{name} {}  +{:<5} -{:<5} {:>2} records",
                day.date, day.stats.merit, day.stats.fault, day.stats.count
            )
        })
        .collect()
}

pub fn format_month_lines(year: i32, month: u32, stats: &MonthStats) -> Vec<String> {
    let mut lines = vec![format!(
        "{year:04}-{month:02}  merit {}  fault {}  net {:+}",
        stats.merit,
        stats.fault,
        net(stats.merit, stats.fault)
    )];
    lines.extend(
        stats
            .daily
            .iter()
            .map(|(date, totals)| format!("  {date}  +{:<5} -{}", totals.merit, totals.fault)),
    );
    lines
}

pub fn format_total_lines(stats: &TotalStats) -> Vec<String> {
    vec![
        format!("merit    {}", stats.merit),
        format!("fault    {}", stats.fault),
        format!("net      {:+}", net(stats.merit, stats.fault)),
        format!("records  {}", stats.total_records),
    ]
}

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct FateView {
    pub index: u8,
    pub level: u8,
    pub label: &'static str,
}

impl FateView {
    pub const fn new(index: u8) -> Self {
        let level = FateLevel::from_index(index);
        Self {
            index,
            level: level.as_u8(),
            label: level.label(),
        }
    }
}

pub fn format_fate_line(view: &FateView) -> String {
    format!(
        "Fate index {}/100  level {} ({})",
        view.index, view.level, view.label
    )
}

/// Message for a finished sync, or the error to exit with.
pub fn describe_sync_outcome(outcome: &SyncOutcome) -> Result<String, CliError> {
    match outcome {
        SyncOutcome::Synced {
            pushed,
            server_records: Some(count),
        } => Ok(format!(
            "Synced {pushed} records; {count} records now cached from the server"
        )),
        SyncOutcome::Synced {
            pushed,
            server_records: None,
        } => Ok(format!("Synced {pushed} records")),
        SyncOutcome::NothingToSync => Ok("Nothing to sync".to_string()),
        SyncOutcome::AlreadySyncing => Ok("A sync is already running".to_string()),
        SyncOutcome::NotAuthenticated => Err(CliError::NotSignedIn),
        SyncOutcome::Failed(message) => Err(CliError::SyncFailed(message.clone())),
    }
}

fn net(merit: u64, fault: u64) -> i128 {
    i128::from(merit) - i128::from(fault)
}
