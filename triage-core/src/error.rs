use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to prepare store directory: {0}")]
    Io(#[from] std::io::Error),

    #[error("patient not found: {0}")]
    NotFound(String),

    #[error("store task failed: {0}")]
    Task(String),

    #[error("{0}")]
    Other(String),
}
