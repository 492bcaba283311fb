//! Handler helpers
//!
//! redb calls are synchronous; handlers run them on the blocking pool so a
//! slow commit never stalls the async executor.

use shared::error::{AppError, AppResult};

/// Run a storage-bound closure on the blocking pool and flatten its result
pub async fn blocking<T, E, F>(f: F) -> AppResult<T>
where
    F: FnOnce() -> Result<T, E> + Send + 'static,
    T: Send + 'static,
    E: Into<AppError> + Send + 'static,
{
    match tokio::task::spawn_blocking(f).await {
        Ok(result) => result.map_err(Into::into),
        Err(e) => {
            tracing::error!(error = %e, "Blocking task failed");
            Err(AppError::internal("Blocking task failed"))
        }
    }
}
