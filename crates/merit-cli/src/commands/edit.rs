use merit_core::{RecordKind, RecordUpdate};

use crate::commands::common::{format_record_line, normalize_record_id, open_store, StoreOptions};
use crate::error::CliError;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EditArgs {
    pub kind: Option<RecordKind>,
    pub score: Option<u32>,
    pub note: Option<String>,
    pub clear_note: bool,
}

impl EditArgs {
    pub fn into_update(self) -> Result<RecordUpdate, CliError> {
        let note = if self.clear_note {
            Some(None)
        } else {
            self.note.map(Some)
        };
        let update = RecordUpdate {
            kind: self.kind,
            score: self.score,
            note,
        };
        if update.is_empty() {
            Err(CliError::NothingToEdit)
        } else {
            Ok(update)
        }
    }
}

pub async fn run_edit(id: &str, args: EditArgs, options: &StoreOptions) -> Result<(), CliError> {
    let id = normalize_record_id(id)?;
    let update = args.into_update()?;
    let store = open_store(options)?;
    let record = store
        .update_record(&id, update)
        .await?
        .ok_or(CliError::RecordNotFound(id))?;

    println!("{}", format_record_line(&record));
    Ok(())
}
