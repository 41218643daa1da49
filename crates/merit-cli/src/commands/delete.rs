use crate::commands::common::{normalize_record_id, open_store, StoreOptions};
use crate::error::CliError;

pub async fn run_delete(id: &str, options: &StoreOptions) -> Result<(), CliError> {
    let id = normalize_record_id(id)?;
    let store = open_store(options)?;
    if store.delete_record(&id).await? {
        println!("Deleted {id}");
        Ok(())
    } else {
        Err(CliError::RecordNotFound(id))
    }
}
