//! Error-to-response mapping

use axum::http::StatusCode;
use axum::Json;

use kf_core::api::ErrorResponse;
use kf_core::error::ValidationError;
use kf_core::KfError;

/// Rejection returned by every handler
pub type ApiError = (StatusCode, Json<ErrorResponse>);

pub fn status_for(err: &KfError) -> StatusCode {
    match err {
        KfError::Validation(ValidationError::Duplicate(_)) => StatusCode::CONFLICT,
        KfError::Validation(_) => StatusCode::BAD_REQUEST,
        KfError::NotFound { .. } => StatusCode::NOT_FOUND,
        KfError::UnsupportedProvider { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        KfError::Workspace(_)
        | KfError::Step(_)
        | KfError::Store(_)
        | KfError::Config(_)
        | KfError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn label_for(err: &KfError) -> &'static str {
    match err {
        KfError::Validation(ValidationError::Duplicate(_)) => "Cluster already exists",
        KfError::Validation(_) => "Invalid request",
        KfError::NotFound { .. } => "Not found",
        KfError::UnsupportedProvider { .. } => "Unsupported cloud provider",
        KfError::Step(_) => "External command failed",
        _ => "Internal error",
    }
}

pub fn api_error(err: KfError) -> ApiError {
    let status = status_for(&err);
    if status.is_server_error() {
        tracing::error!("Request failed: {}", err);
    } else {
        tracing::debug!("Request rejected: {}", err);
    }
    (
        status,
        Json(ErrorResponse {
            error: label_for(&err).to_string(),
            message: Some(err.to_string()),
        }),
    )
}

/// Rejection for a malformed path segment
pub fn bad_request(message: impl Into<String>) -> ApiError {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse {
            error: "Invalid request".to_string(),
            message: Some(message.into()),
        }),
    )
}
