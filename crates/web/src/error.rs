use axum::{
    Json,
    extract::{
        multipart::MultipartError,
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
    http::StatusCode,
    response::{IntoResponse, Response},
};
use ingest::IngestError;
use serde_json::json;
use std::fmt;
use storage::error::StorageError;
use validator::ValidationErrors;

/// Web layer errors
#[derive(Debug)]
pub enum WebError {
    Storage(StorageError),
    Ingest(IngestError),
    Validation(ValidationErrors),
    BadRequest(String),
    NotFound(String),
    /// The feature needs a collaborator that is not configured
    Unavailable(String),
    InternalServerError(String),
}

impl fmt::Display for WebError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Storage(e) => write!(f, "Storage error: {}", e),
            Self::Ingest(e) => write!(f, "Ingest error: {}", e),
            Self::Validation(e) => write!(f, "Validation error: {}", e),
            Self::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            Self::NotFound(msg) => write!(f, "Not found: {}", msg),
            Self::Unavailable(msg) => write!(f, "Unavailable: {}", msg),
            Self::InternalServerError(msg) => write!(f, "Internal server error: {}", msg),
        }
    }
}

fn storage_status(error: &StorageError) -> StatusCode {
    match error {
        StorageError::NotFound => StatusCode::NOT_FOUND,
        StorageError::ConstraintViolation(_) | StorageError::InvalidTransition { .. } => StatusCode::CONFLICT,
        StorageError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        StorageError::Database(_) | StorageError::Migration(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn storage_message(error: &StorageError) -> String {
    match error {
        StorageError::NotFound => "Resource not found".to_string(),
        StorageError::ConstraintViolation(msg) | StorageError::InvalidInput(msg) => msg.clone(),
        StorageError::InvalidTransition { .. } => error.to_string(),
        StorageError::Database(_) | StorageError::Migration(_) => {
            tracing::error!("Storage error: {:?}", error);
            "An internal error occurred".to_string()
        }
    }
}

impl WebError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::Storage(e) | Self::Ingest(IngestError::StorageError(e)) => storage_status(e),
            Self::Ingest(IngestError::ValidationError(_)) => StatusCode::BAD_REQUEST,
            Self::Ingest(
                IngestError::UpstreamError(_)
                | IngestError::MediaError(_)
                | IngestError::RequestError(_)
                | IngestError::ParseError(_),
            ) => StatusCode::BAD_GATEWAY,
            Self::Ingest(IngestError::TrainingError(_) | IngestError::IoError(_)) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            Self::Validation(_) | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::InternalServerError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        let status_code = self.status_code();

        let body = match &self {
            Self::Storage(e) | Self::Ingest(IngestError::StorageError(e)) => {
                json!({
                    "success": false,
                    "error": storage_message(e)
                })
            }
            Self::Ingest(IngestError::IoError(e)) => {
                tracing::error!("I/O error: {:?}", e);
                json!({
                    "success": false,
                    "error": "An internal error occurred"
                })
            }
            Self::Ingest(e) => {
                tracing::warn!("Ingest error: {}", e);
                json!({
                    "success": false,
                    "error": e.to_string()
                })
            }
            Self::Validation(errors) => {
                let field_errors: Vec<String> = errors
                    .field_errors()
                    .iter()
                    .flat_map(|(field, errors)| {
                        errors.iter().map(move |e| {
                            format!(
                                "{}: {}",
                                field,
                                e.message
                                    .as_ref()
                                    .map(|m| m.to_string())
                                    .unwrap_or_else(|| e.code.to_string())
                            )
                        })
                    })
                    .collect();

                json!({
                    "success": false,
                    "error": "Validation failed",
                    "details": field_errors
                })
            }
            Self::BadRequest(msg) | Self::NotFound(msg) | Self::Unavailable(msg) => {
                json!({
                    "success": false,
                    "error": msg
                })
            }
            Self::InternalServerError(msg) => {
                tracing::error!("Internal server error: {}", msg);
                json!({
                    "success": false,
                    "error": "An internal error occurred"
                })
            }
        };

        (status_code, Json(body)).into_response()
    }
}

impl From<StorageError> for WebError {
    fn from(error: StorageError) -> Self {
        Self::Storage(error)
    }
}

impl From<IngestError> for WebError {
    fn from(error: IngestError) -> Self {
        Self::Ingest(error)
    }
}

impl From<ValidationErrors> for WebError {
    fn from(error: ValidationErrors) -> Self {
        Self::Validation(error)
    }
}

impl From<MultipartError> for WebError {
    fn from(error: MultipartError) -> Self {
        Self::BadRequest(format!("Invalid multipart body: {}", error))
    }
}

impl From<JsonRejection> for WebError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for WebError {
    fn from(rejection: QueryRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for WebError {
    fn from(rejection: PathRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<std::io::Error> for WebError {
    fn from(error: std::io::Error) -> Self {
        Self::Ingest(IngestError::IoError(error))
    }
}

pub type WebResult<T> = Result<T, WebError>;
