use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::access::AuthRejection;
use crate::backend::BackendError;

pub type Result<T> = std::result::Result<T, AdapterError>;

#[derive(Debug, Error)]
pub enum AdapterError {
    #[error("not found")]
    NotFound,

    /// Player is not enabled or is served by another adapter. Reported as 404.
    #[error("player {0} is not available")]
    Disabled(String),

    #[error("{}", .0.message)]
    Unauthorized(AuthRejection),

    #[error("precondition failed: {0}")]
    PreconditionFailed(String),

    #[error("bad gateway: {0}")]
    BadGateway(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl AdapterError {
    pub fn status(&self) -> StatusCode {
        match self {
            AdapterError::NotFound | AdapterError::Disabled(_) => StatusCode::NOT_FOUND,
            AdapterError::Unauthorized(rejection) => rejection.status,
            AdapterError::PreconditionFailed(_) => StatusCode::PRECONDITION_FAILED,
            AdapterError::BadGateway(_) => StatusCode::BAD_GATEWAY,
            AdapterError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<BackendError> for AdapterError {
    fn from(err: BackendError) -> Self {
        AdapterError::BadGateway(err.to_string())
    }
}

impl IntoResponse for AdapterError {
    fn into_response(self) -> Response {
        let status = self.status();
        // a disabled player must be indistinguishable from an unknown one
        let message = match &self {
            AdapterError::Disabled(_) => AdapterError::NotFound.to_string(),
            other => other.to_string(),
        };
        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}
