//! "Try the server, else answer locally."

use std::future::Future;

use crate::error::{Error, Result};

/// Run `remote` when `authenticated`, falling back to `local` if it is
/// skipped or fails with an API error.
///
/// Remote failures are logged and swallowed. Any other error raised inside
/// `remote` (storage, serialization) is returned as is.
pub async fn with_remote_fallback<T, R, Fut, L>(
    operation: &str,
    authenticated: bool,
    remote: R,
    local: L,
) -> Result<T>
where
    R: FnOnce() -> Fut,
    Fut: Future<Output = Result<T>>,
    L: FnOnce() -> Result<T>,
{
    if authenticated {
        match remote().await {
            Ok(value) => return Ok(value),
            Err(Error::Api(error)) => {
                tracing::warn!("{} failed remotely, using local data: {}", operation, error);
            }
            Err(error) => return Err(error),
        }
    }
    local()
}
