use layerforge_core::error::CoreError;

/// Errors returned by [`PipelineStore`](crate::store::PipelineStore)
/// implementations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Domain error: missing row, illegal transition, invalid input.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A database error from sqlx.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;
