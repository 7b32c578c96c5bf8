use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Malformed document: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unsupported store scheme: {0}")]
    UnsupportedScheme(String),

    #[error("Documents must be JSON objects")]
    InvalidDocument,

    #[cfg(feature = "test-util")]
    #[error("Injected failure")]
    Injected,
}
