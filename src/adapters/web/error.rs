//! HTTP error responses for the web adapter.

use axum::{
    Json,
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

use crate::domain::error::JournalError;

#[derive(Debug)]
pub struct WebError {
    pub status: StatusCode,
    pub message: String,
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    message: &'a str,
}

impl WebError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }
}

pub fn status_from_error(err: &JournalError) -> StatusCode {
    match err {
        JournalError::Validation { .. } => StatusCode::BAD_REQUEST,
        JournalError::NotFound { .. } => StatusCode::NOT_FOUND,
        JournalError::InvalidStateTransition { .. } => StatusCode::CONFLICT,
        JournalError::Database { .. }
        | JournalError::DatabaseQuery { .. }
        | JournalError::ConfigParse { .. }
        | JournalError::ConfigMissing { .. }
        | JournalError::ConfigInvalid { .. }
        | JournalError::Csv { .. }
        | JournalError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl From<JournalError> for WebError {
    fn from(err: JournalError) -> Self {
        let status = status_from_error(&err);
        if status.is_server_error() {
            tracing::error!(error = %err, "request failed");
        }
        Self::new(status, err.to_string())
    }
}

impl From<JsonRejection> for WebError {
    fn from(rejection: JsonRejection) -> Self {
        Self::bad_request(rejection.body_text())
    }
}

impl From<QueryRejection> for WebError {
    fn from(rejection: QueryRejection) -> Self {
        Self::bad_request(rejection.body_text())
    }
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(ErrorBody {
                message: &self.message,
            }),
        )
            .into_response()
    }
}
