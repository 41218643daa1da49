use merit_core::models::PRESET_SCORES;
use merit_core::{NewRecord, RecordKind};

use crate::commands::common::{format_record_line, open_store, StoreOptions, LOGIN_HINT};
use crate::error::CliError;

pub async fn run_add(
    kind: RecordKind,
    score: Option<u32>,
    note: Option<String>,
    options: &StoreOptions,
) -> Result<(), CliError> {
    if let Some(score) = score.filter(|score| !PRESET_SCORES.contains(score)) {
        tracing::info!("Score {} is not one of the presets {:?}", score, PRESET_SCORES);
    }
    let store = open_store(options)?;
    let record = store
        .add_record(NewRecord { kind, score, note })
        .await?;

    println!("{}", format_record_line(&record));
    if store.should_prompt_login()? {
        eprintln!("{LOGIN_HINT}");
    }
    Ok(())
}
