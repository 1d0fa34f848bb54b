use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    response::{IntoResponse, Response},
    Json,
};
use greenlight_dal::ValidationErrors;
use http::StatusCode;
use serde_json::json;
use tracing::{debug, error};

pub type ApiResult<T> = std::result::Result<T, ApiError>;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("the requested resource could not be found")]
    ResourceNotFound,

    #[error("unable to update the record due to an edit conflict, please try again")]
    EditConflict,

    #[error("validation failed: {0}")]
    ValidationFailed(ValidationErrors),

    #[error("{0}")]
    InvalidQuery(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("the server is busy, please try again later")]
    Timeout,

    #[error("the server encountered a problem and could not process your request")]
    InternalError(String),
}

impl From<greenlight_dal::Error> for ApiError {
    fn from(value: greenlight_dal::Error) -> Self {
        match value {
            greenlight_dal::Error::RecordNotFound(_) => ApiError::ResourceNotFound,
            greenlight_dal::Error::EditConflict { id, version } => {
                debug!("Edit conflict on movie {id}, version {version}");
                ApiError::EditConflict
            }
            greenlight_dal::Error::ValidationFailed(errors) => ApiError::ValidationFailed(errors),
            greenlight_dal::Error::InvalidSortField(field) => {
                let mut errors = ValidationErrors::default();
                errors.add("sort", format!("invalid sort value {field}"));
                ApiError::ValidationFailed(errors)
            }
            greenlight_dal::Error::Timeout => ApiError::Timeout,
            e => ApiError::InternalError(e.to_string()),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(value: JsonRejection) -> Self {
        ApiError::BadRequest(value.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(value: PathRejection) -> Self {
        ApiError::BadRequest(value.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(value: QueryRejection) -> Self {
        ApiError::InvalidQuery(value.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::ResourceNotFound => StatusCode::NOT_FOUND,
            ApiError::EditConflict => StatusCode::CONFLICT,
            ApiError::ValidationFailed(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::InvalidQuery(_) | ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Timeout => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::InternalError(msg) => {
                error!("Internal error: {msg}");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let body = match self {
            ApiError::ValidationFailed(errors) => json!({ "error": errors }),
            other => json!({ "error": other.to_string() }),
        };

        (status, Json(body)).into_response()
    }
}
