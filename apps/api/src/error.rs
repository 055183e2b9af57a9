//! API error types with HTTP response mapping.
//!
//! Every failure leaves the server as `{"success": false, "message": ...}`.
//!
//! | Source                                          | Status |
//! |-------------------------------------------------|--------|
//! | malformed body, validation, stock, type, status | 400    |
//! | missing or invalid token                        | 401    |
//! | product, counterparty, transaction not found    | 404    |
//! | retry budget exhausted                          | 409    |
//! | storage or internal failure                     | 500    |

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use stockbook_core::{CoreError, ValidationError};
use stockbook_db::{DbError, PostingError};

use crate::response::ApiResponse;

/// Message returned for every 500. Details go to the log only.
const INTERNAL_MESSAGE: &str = "Internal server error";

/// API errors.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    NotFound(String),

    /// A business rule rejected the request.
    #[error(transparent)]
    Rejected(#[from] CoreError),

    #[error("The record was modified concurrently after {attempts} attempts, please retry")]
    Conflict { attempts: u32 },

    #[error("Storage failure: {0}")]
    Storage(#[from] DbError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Rejected(err) if err.is_not_found() => StatusCode::NOT_FOUND,
            ApiError::Rejected(_) => StatusCode::BAD_REQUEST,
            ApiError::Conflict { .. } => StatusCode::CONFLICT,
            ApiError::Storage(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = %self, "Request failed");
            INTERNAL_MESSAGE.to_string()
        } else {
            tracing::debug!(status = status.as_u16(), error = %self, "Request rejected");
            self.to_string()
        };

        (status, Json(ApiResponse::failure(message))).into_response()
    }
}

impl From<PostingError> for ApiError {
    fn from(err: PostingError) -> Self {
        match err {
            PostingError::Rejected(err) => ApiError::Rejected(err),
            PostingError::ConcurrentModification { attempts } => ApiError::Conflict { attempts },
            PostingError::Storage(err) => ApiError::Storage(err),
        }
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::Rejected(CoreError::Validation(err))
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}
