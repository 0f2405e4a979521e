use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use carehub_forms::handoff::HandoffError;
use carehub_forms::{BuilderError, FormError};
use carehub_storage::error::StorageError;
use serde::Serialize;

/// Unified API error type for all route handlers.
#[derive(Debug)]
pub enum ApiError {
    NotFound(String),
    BadRequest(String),
    Conflict(String),
    Unprocessable(String),
    Internal(String),
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            ApiError::Unprocessable(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg),
            ApiError::Internal(msg) => {
                tracing::error!("internal error: {msg}");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal server error".to_string())
            }
        };

        (status, Json(ErrorBody { error: message })).into_response()
    }
}

impl From<BuilderError> for ApiError {
    fn from(e: BuilderError) -> Self {
        match e {
            BuilderError::SectionNotFound(_)
            | BuilderError::ItemNotFound(_)
            | BuilderError::InvalidReorder(_) => ApiError::BadRequest(e.to_string()),
            BuilderError::AlreadyPublished(_) => ApiError::Conflict(e.to_string()),
            BuilderError::EmptyTemplate(_) | BuilderError::InvalidTemplate(_) => {
                ApiError::Unprocessable(e.to_string())
            }
        }
    }
}

impl From<FormError> for ApiError {
    fn from(e: FormError) -> Self {
        match e {
            FormError::UnknownItem(_) => ApiError::NotFound(e.to_string()),
            FormError::NotMultipleChoice(_) | FormError::UnknownOption { .. } => {
                ApiError::BadRequest(e.to_string())
            }
            FormError::TemplateNotPublished(_)
            | FormError::TemplateDisabled(_)
            | FormError::HandoffInFlight(_)
            | FormError::DraftsUnavailable
            | FormError::Finalized(_) => ApiError::Conflict(e.to_string()),
            FormError::NotInFlight(_) => ApiError::Internal(e.to_string()),
            FormError::Handoff(inner) => ApiError::from(inner),
        }
    }
}

impl From<HandoffError> for ApiError {
    fn from(e: HandoffError) -> Self {
        match e.downcast_ref::<StorageError>() {
            Some(
                StorageError::AlreadyExists { .. } | StorageError::PreconditionFailed { .. },
            ) => ApiError::Conflict(e.to_string()),
            _ => ApiError::Internal(e.to_string()),
        }
    }
}
