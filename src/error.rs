//! Typed errors and HTTP mapping.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Raised while assembling applications, endpoints and steps. Fatal: a chain with
/// an invalid configuration never runs.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("validation: {0}")]
    Validation(String),
    #[error("config load: {0}")]
    Load(String),
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("invalid field name in filter: {0}")]
    InvalidFilterField(String),
    #[error("invalid filter value: {0}")]
    InvalidFilterValue(String),
    #[error("invalid filter operator: {0}")]
    InvalidFilterOperator(String),
    #[error("unexpected token in filter: {0}")]
    UnexpectedFilterToken(String),
    #[error("invalid order by clause: {0}")]
    InvalidOrderByClause(String),
    #[error("invalid select clause: {0}")]
    InvalidSelectClause(String),
    #[error("missing required field: {0}")]
    MissingRequiredField(String),
    #[error("update payload has no fields besides the identifier")]
    EmptyUpdatePayload,
    #[error("invalid paging parameter: {0}")]
    InvalidPagingParameter(String),
    #[error("method not supported: {0}")]
    MethodNotSupported(String),
    #[error("storage: {0}")]
    Storage(#[from] sqlx::Error),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("bad request: {0}")]
    BadRequest(String),
}

impl AppError {
    /// Stable machine-readable code used in the error envelope.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Config(_) => "config_error",
            AppError::InvalidFilterField(_) => "invalid_filter_field",
            AppError::InvalidFilterValue(_) => "invalid_filter_value",
            AppError::InvalidFilterOperator(_) => "invalid_filter_operator",
            AppError::UnexpectedFilterToken(_) => "unexpected_filter_token",
            AppError::InvalidOrderByClause(_) => "invalid_order_by_clause",
            AppError::InvalidSelectClause(_) => "invalid_select_clause",
            AppError::MissingRequiredField(_) => "missing_required_field",
            AppError::EmptyUpdatePayload => "empty_update_payload",
            AppError::InvalidPagingParameter(_) => "invalid_paging_parameter",
            AppError::MethodNotSupported(_) => "method_not_supported",
            AppError::Storage(_) => "storage_error",
            AppError::NotFound(_) => "not_found",
            AppError::BadRequest(_) => "bad_request",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Config(_) | AppError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::MethodNotSupported(_) => StatusCode::METHOD_NOT_ALLOWED,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            _ => StatusCode::BAD_REQUEST,
        }
    }
}

#[derive(Serialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code().to_string(),
                message: self.to_string(),
            },
        };
        (status, Json(body)).into_response()
    }
}
