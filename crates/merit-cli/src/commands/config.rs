use std::path::Path;

use merit_core::config::ClientConfig;

use crate::cli::ConfigCommands;
use crate::commands::common::StoreOptions;
use crate::error::CliError;
use crate::settings::load_client_config;

/// Values `merit config init` writes. `None` keeps what the file has.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigInitArgs {
    pub api_base_url: Option<String>,
    pub request_timeout_secs: Option<u64>,
    pub login_prompt_threshold: Option<usize>,
    pub fate_window_days: Option<u32>,
}

pub fn run_config(command: ConfigCommands, options: &StoreOptions) -> Result<(), CliError> {
    match command {
        ConfigCommands::Init {
            api_base_url,
            timeout_secs,
            login_prompt_threshold,
            fate_window_days,
        } => {
            let args = ConfigInitArgs {
                api_base_url,
                request_timeout_secs: timeout_secs,
                login_prompt_threshold,
                fate_window_days,
            };
            let config = init_config(&options.config_path, args)?;
            println!("Saved config to {}", options.config_path.display());
            for line in config_lines(&config) {
                println!("{line}");
            }
            Ok(())
        }
        ConfigCommands::Show { json } => {
            let config = load_client_config(&options.config_path)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&config)?);
            } else {
                println!("Config file: {}", options.config_path.display());
                for line in config_lines(&config) {
                    println!("{line}");
                }
            }
            Ok(())
        }
    }
}

/// Merge `args` into the file at `path` and write it back. The environment
/// override is not persisted.
pub fn init_config(path: &Path, args: ConfigInitArgs) -> Result<ClientConfig, CliError> {
    let config = ClientConfig::load_from_path(path).map_err(|error| {
        CliError::Config(format!("Failed to load {}: {}", path.display(), error))
    })?;
    let mut config = config
        .with_api_base_url(args.api_base_url)
        .map_err(|error| CliError::Config(format!("api base URL: {error}")))?;
    if let Some(secs) = args.request_timeout_secs {
        config.request_timeout_secs = secs;
    }
    if let Some(threshold) = args.login_prompt_threshold {
        config.policy.login_prompt_threshold = threshold;
    }
    if let Some(days) = args.fate_window_days {
        config.policy.fate_window_days = days;
    }

    config.save_to_path(path).map_err(|error| {
        CliError::Config(format!("Failed to save {}: {}", path.display(), error))
    })?;
    Ok(config)
}

pub fn config_lines(config: &ClientConfig) -> Vec<String> {
    vec![
        format!("Backend: {}", config.resolved_api_base_url()),
        format!("Request timeout: {}s", config.request_timeout_secs),
        format!(
            "Sign-in hint after: {} records today",
            config.policy.login_prompt_threshold
        ),
        format!("Fate window: {} days", config.policy.fate_window_days),
    ]
}
