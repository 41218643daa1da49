use crate::commands::common::{open_store, StoreOptions};
use crate::error::CliError;

pub async fn run_health(options: &StoreOptions) -> Result<(), CliError> {
    let store = open_store(options)?;
    let status = store.api().health().await?;
    println!("{} is reachable", store.api().base_url());
    if !status.is_null() {
        println!("{}", serde_json::to_string_pretty(&status)?);
    }
    Ok(())
}
