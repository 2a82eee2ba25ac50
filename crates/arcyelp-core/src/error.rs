use thiserror::Error;

/// Failures raised while indexing, locating, or reshaping business records.
#[derive(Debug, Error)]
pub enum EnrichError {
    #[error("invalid H3 resolution {0} (expected 0..=15)")]
    InvalidResolution(u8),

    #[error("invalid coordinate: latitude {latitude}, longitude {longitude}")]
    InvalidCoordinate { latitude: f64, longitude: f64 },

    #[error("unsupported geometry format: {0:?}")]
    UnsupportedGeometryFormat(String),

    #[error("business {id} has no coordinates")]
    MissingCoordinates { id: String },

    #[error("record did not serialize to a JSON object")]
    NotAnObject,

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl EnrichError {
    /// Whether this error aborts a whole batch rather than a single record.
    pub fn is_batch_fatal(&self) -> bool {
        !matches!(self, EnrichError::MissingCoordinates { .. })
    }
}
