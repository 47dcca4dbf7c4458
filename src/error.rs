// API error outcomes and their JSON payload: {"errorMsg": "..."}.

use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::dispatch::DispatchError;
use crate::params::ParamError;
use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    ServerError(String),
}

/// Error body shared by every non-2xx response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorPayload {
    pub error_msg: String,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::ServerError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<ParamError> for ApiError {
    fn from(e: ParamError) -> Self {
        ApiError::BadRequest(e.0)
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::AlreadyExists(_) => ApiError::Conflict(e.to_string()),
            StoreError::InvalidPattern(msg) | StoreError::InvalidArgument(msg) => {
                ApiError::BadRequest(msg)
            }
            StoreError::Database(_) | StoreError::Codec(_) => {
                tracing::warn!(error = %e, "store failure");
                ApiError::ServerError(e.to_string())
            }
        }
    }
}

impl From<DispatchError> for ApiError {
    fn from(e: DispatchError) -> Self {
        match e {
            DispatchError::Param(p) => p.into(),
            DispatchError::Store(s) => s.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status();
        let body = Json(ErrorPayload {
            error_msg: self.to_string(),
        });
        (status, body).into_response()
    }
}
