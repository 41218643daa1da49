use crate::commands::common::{describe_sync_outcome, open_store, StoreOptions};
use crate::error::CliError;

pub async fn run_sync(options: &StoreOptions) -> Result<(), CliError> {
    let store = open_store(options)?;
    let outcome = store.sync_to_server().await?;
    println!("{}", describe_sync_outcome(&outcome)?);
    if outcome.is_success() {
        store.get_all_records().await?;
    }
    Ok(())
}
