pub mod generate;
pub mod jobs;
pub mod outputs;

use crate::error::{AppError, AppResult};

/// Run blocking filesystem work on the blocking pool.
pub(crate) async fn blocking<T, F>(work: F) -> AppResult<T>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| AppError::InternalError(format!("Blocking task failed: {e}")))
}
