use merit_core::api::RemoteApi;

use crate::cli::AuthCommands;
use crate::commands::common::{describe_sync_outcome, open_store, CliStore, StoreOptions};
use crate::error::CliError;

pub async fn run_auth(command: AuthCommands, options: &StoreOptions) -> Result<(), CliError> {
    let store = open_store(options)?;
    match command {
        AuthCommands::SendCode { email } => {
            store.api().send_code(&email).await?;
            println!("Login code sent to {}", email.trim());
            Ok(())
        }
        AuthCommands::Login { email, code } => run_login(&store, &email, &code).await,
        AuthCommands::Status => {
            for line in status_lines(&store)? {
                println!("{line}");
            }
            Ok(())
        }
        AuthCommands::Logout => {
            store.logout()?;
            println!("Signed out. Local records are kept.");
            Ok(())
        }
    }
}

async fn run_login(store: &CliStore, email: &str, code: &str) -> Result<(), CliError> {
    let mut events = store.api().auth().subscribe();
    let session = store.api().login(email, code).await?;
    println!(
        "Signed in as {}",
        session.user.email.as_deref().unwrap_or(&session.user.id)
    );

    // Reconcile local records the same way a long-running client would.
    while let Ok(event) = events.try_recv() {
        if let Some(outcome) = store.handle_auth_event(event).await? {
            match describe_sync_outcome(&outcome) {
                Ok(message) => println!("{message}"),
                Err(error) => eprintln!("Warning: {error}"),
            }
        }
    }
    Ok(())
}

fn status_lines(store: &CliStore) -> Result<Vec<String>, CliError> {
    let mut lines = Vec::new();
    match store.api().current_user().filter(|_| store.is_authenticated()) {
        Some(user) => lines.push(format!(
            "Signed in as {} (user {})",
            user.email.as_deref().unwrap_or("(no email)"),
            user.id
        )),
        None => lines.push("Not signed in.".to_string()),
    }
    lines.push(format!("Backend: {}", store.api().base_url()));
    lines.push(format!(
        "Pending sync: {} records",
        store.pending_records()?.len()
    ));
    lines.push(format!(
        "Last sync: {}",
        store.last_sync()?.as_deref().unwrap_or("never")
    ));
    Ok(lines)
}
