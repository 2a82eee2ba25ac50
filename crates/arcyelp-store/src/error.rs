use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("document has no string \"id\"")]
    MissingId,

    #[error("document id {0:?} cannot be used as a key")]
    InvalidId(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}
