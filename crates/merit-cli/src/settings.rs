//! Where the CLI keeps its config and data, and how they are loaded.

use std::env;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

use merit_core::config::ClientConfig;

use crate::error::CliError;

const APP_DIR: &str = "merit";
const CONFIG_FILE_NAME: &str = "config.json";
const DB_FILE_NAME: &str = "merit.db";

pub const CONFIG_ENV: &str = "MERIT_CONFIG";
pub const DB_PATH_ENV: &str = "MERIT_DB_PATH";
pub const API_URL_ENV: &str = "MERIT_API_URL";

pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
        .join(CONFIG_FILE_NAME)
}

pub fn default_db_path() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
        .join(DB_FILE_NAME)
}

pub fn resolve_config_path(cli_path: Option<PathBuf>) -> PathBuf {
    resolve_path(cli_path, env::var_os(CONFIG_ENV), default_config_path)
}

pub fn resolve_db_path(cli_path: Option<PathBuf>) -> PathBuf {
    resolve_path(cli_path, env::var_os(DB_PATH_ENV), default_db_path)
}

/// `--flag` beats the environment, which beats the platform default.
pub fn resolve_path(
    cli_path: Option<PathBuf>,
    env_path: Option<OsString>,
    default: impl FnOnce() -> PathBuf,
) -> PathBuf {
    cli_path
        .or_else(|| env_path.filter(|value| !value.is_empty()).map(PathBuf::from))
        .unwrap_or_else(default)
}

/// Load the config file and apply `MERIT_API_URL`.
pub fn load_client_config(path: &Path) -> Result<ClientConfig, CliError> {
    load_client_config_with(path, env::var(API_URL_ENV).ok())
}

pub fn load_client_config_with(
    path: &Path,
    api_url_override: Option<String>,
) -> Result<ClientConfig, CliError> {
    let config = ClientConfig::load_from_path(path).map_err(|error| {
        CliError::Config(format!("Failed to load {}: {}", path.display(), error))
    })?;
    config
        .with_api_base_url(api_url_override)
        .map_err(|error| CliError::Config(format!("{API_URL_ENV}: {error}")))
}
