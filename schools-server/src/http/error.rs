//! API error types with IntoResponse
//!
//! Store failures are logged in full and answered with a bare 500;
//! nothing about the failure reaches the client.

use axum::extract::rejection::BytesRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::db::{DbError, Lookup};

pub const NOT_FOUND_MESSAGE: &str = "Not found";
pub const MALFORMED_BODY_MESSAGE: &str = "Malformed JSON body";

/// API error type with automatic HTTP status mapping
#[derive(Debug)]
pub enum ApiError {
    /// No row for the requested id (404)
    NotFound,

    /// JSON-typed body that does not parse (400)
    MalformedBody,

    /// Body could not be read at all (status from the rejection)
    Body(BytesRejection),

    /// Database error (500, logged)
    Database(DbError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            Self::NotFound => (
                StatusCode::NOT_FOUND,
                Json(json!({ "message": NOT_FOUND_MESSAGE })),
            )
                .into_response(),
            Self::MalformedBody => (
                StatusCode::BAD_REQUEST,
                Json(json!({ "message": MALFORMED_BODY_MESSAGE })),
            )
                .into_response(),
            Self::Body(rejection) => rejection.into_response(),
            Self::Database(e) => {
                tracing::error!(error = %e, "database error");
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
        }
    }
}

impl From<DbError> for ApiError {
    fn from(e: DbError) -> Self {
        Self::Database(e)
    }
}

impl From<BytesRejection> for ApiError {
    fn from(rejection: BytesRejection) -> Self {
        Self::Body(rejection)
    }
}

/// Turn an id-scoped lookup into the row or the matching API error.
pub fn require<T>(lookup: Lookup<T>) -> Result<T, ApiError> {
    match lookup {
        Lookup::Found(row) => Ok(row),
        Lookup::NotFound => Err(ApiError::NotFound),
        Lookup::StoreError(e) => Err(ApiError::Database(e)),
    }
}
