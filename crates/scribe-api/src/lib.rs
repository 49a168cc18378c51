pub mod auth;
pub mod error;
pub mod middleware;
pub mod notes;

use error::ApiError;
use tracing::error;

/// Runs a blocking storage operation off the async runtime.
pub(crate) async fn run_blocking<T, F>(f: F) -> Result<T, ApiError>
where
    F: FnOnce() -> Result<T, ApiError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f).await.map_err(|e| {
        error!("spawn_blocking join error: {e}");
        ApiError::Internal(anyhow::anyhow!("background task failed"))
    })?
}
