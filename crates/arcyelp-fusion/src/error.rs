use thiserror::Error;

#[derive(Error, Debug)]
pub enum FusionError {
    #[error("sort_by must be one of best_match, rating, review_count, distance; got {0:?}")]
    InvalidSortOption(String),
    #[error("400 response from Yelp: {0}")]
    BadRequest(String),
    #[error("Yelp returned {status}: {body}")]
    Upstream { status: u16, body: String },
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("client configuration: {0}")]
    Config(String),
}

impl FusionError {
    /// Whether the request timed out in transit.
    pub fn is_timeout(&self) -> bool {
        matches!(self, FusionError::Http(e) if e.is_timeout())
    }
}
