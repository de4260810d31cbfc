use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::response::{IntoResponse, Response};
use core_executor::error::ExecutionError;
use http::StatusCode;
use serde::{Deserialize, Serialize};
use snafu::prelude::*;

#[derive(Snafu, Debug)]
#[snafu(visibility(pub))]
pub enum ApiError {
    #[snafu(transparent)]
    Execution { source: ExecutionError },

    #[snafu(display("{message}"))]
    BadPayload { message: String },
}

pub type ApiResult<T> = Result<T, ApiError>;

/// Body of every failed request.
#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    pub error: String,
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadPayload {
            message: rejection.body_text(),
        }
    }
}

impl ApiError {
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::Execution { source } => match source {
                ExecutionError::EngineUnavailable { .. }
                | ExecutionError::QueryExecution { .. } => StatusCode::BAD_REQUEST,
                ExecutionError::OpenDatabase { .. }
                | ExecutionError::SerializeBatch { .. }
                | ExecutionError::Worker { .. }
                | ExecutionError::WorkerGone => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::BadPayload { .. } => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(ErrorResponse {
            error: self.to_string(),
        });
        (status, body).into_response()
    }
}
