use arcyelp_core::EnrichError;
use arcyelp_fusion::FusionError;
use arcyelp_store::StoreError;
use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;
use tracing::error;

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("A valid where string is required.")]
    MissingWhere,
    #[error("unsupported where clause {0:?}; only 1=1 is supported")]
    UnsupportedWhere(String),
    #[error("invalid parameter {name}: {reason}")]
    InvalidParameter { name: String, reason: String },
    #[error("{0} is not configured")]
    NotConfigured(&'static str),
    #[error(transparent)]
    Fusion(#[from] FusionError),
    #[error(transparent)]
    Enrich(#[from] EnrichError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ServiceError {
    pub fn invalid(name: impl Into<String>, reason: impl Into<String>) -> Self {
        ServiceError::InvalidParameter {
            name: name.into(),
            reason: reason.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ServiceError::MissingWhere
            | ServiceError::UnsupportedWhere(_)
            | ServiceError::InvalidParameter { .. } => StatusCode::BAD_REQUEST,
            ServiceError::NotConfigured(_) => StatusCode::SERVICE_UNAVAILABLE,
            ServiceError::Fusion(e) => match e {
                FusionError::InvalidSortOption(_) | FusionError::BadRequest(_) => {
                    StatusCode::BAD_REQUEST
                }
                FusionError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
                _ if e.is_timeout() => StatusCode::GATEWAY_TIMEOUT,
                _ => StatusCode::BAD_GATEWAY,
            },
            ServiceError::Enrich(EnrichError::Json(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            ServiceError::Enrich(_) => StatusCode::BAD_REQUEST,
            ServiceError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(status = status.as_u16(), error = %self, "query failed");
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
