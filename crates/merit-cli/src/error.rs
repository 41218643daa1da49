use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] merit_core::Error),
    #[error(transparent)]
    Api(#[from] merit_core::api::ApiError),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
    #[error("Record ID cannot be empty")]
    EmptyRecordId,
    #[error("Record not found: {0}")]
    RecordNotFound(String),
    #[error("Nothing to change. Pass --type, --score, --note or --clear-note.")]
    NothingToEdit,
    #[error("Invalid date '{0}', expected YYYY-MM-DD")]
    InvalidDate(String),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Not signed in. Run `merit auth login` first.")]
    NotSignedIn,
    #[error("Sync failed: {0}")]
    SyncFailed(String),
}
