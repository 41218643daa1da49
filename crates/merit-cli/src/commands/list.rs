use crate::commands::common::{
    format_day_summary, format_record_detail, format_record_lines, normalize_record_id,
    open_store, resolve_day, StoreOptions,
};
use crate::error::CliError;

pub async fn run_list(
    date: Option<&str>,
    as_json: bool,
    options: &StoreOptions,
) -> Result<(), CliError> {
    let store = open_store(options)?;
    let day = resolve_day(date, &store.today())?;
    if store.is_authenticated() {
        store.get_all_records().await?;
    }
    let records = store.get_records_by_date(&day)?;

    if as_json {
        println!("{}", serde_json::to_string_pretty(&records)?);
        return Ok(());
    }

    if records.is_empty() {
        println!("No records on {day}.");
        return Ok(());
    }
    for line in format_record_lines(&records) {
        println!("{line}");
    }
    println!("{}", format_day_summary(&store.day_stats(&day)?));
    Ok(())
}

pub fn run_show(id: &str, as_json: bool, options: &StoreOptions) -> Result<(), CliError> {
    let id = normalize_record_id(id)?;
    let store = open_store(options)?;
    let record = store
        .get_record(&id)?
        .ok_or_else(|| CliError::RecordNotFound(id.clone()))?;

    if as_json {
        println!("{}", serde_json::to_string_pretty(&record)?);
    } else {
        for line in format_record_detail(&record) {
            println!("{line}");
        }
    }
    Ok(())
}
