use thiserror::Error;

/// Storage failures, classified so callers can tell a retryable
/// outage apart from a constraint conflict.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Database busy or locked past the bounded wait, or the
    /// connection lock was poisoned. Safe to retry with backoff.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// UNIQUE constraint violation.
    #[error("{0}")]
    Conflict(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        if let rusqlite::Error::SqliteFailure(e, _) = &err {
            match e.code {
                rusqlite::ErrorCode::DatabaseBusy | rusqlite::ErrorCode::DatabaseLocked => {
                    return StoreError::Unavailable(err.to_string());
                }
                rusqlite::ErrorCode::ConstraintViolation => {
                    return StoreError::Conflict(err.to_string());
                }
                _ => {}
            }
        }
        StoreError::Other(err.into())
    }
}
