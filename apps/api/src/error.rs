use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use rolegate_application::TransitionError;
use rolegate_core::AppError;
use serde::Serialize;

/// API error payload.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    message: String,
}

/// HTTP API error wrapper around application errors.
#[derive(Debug)]
pub enum ApiError {
    /// Generic application failure.
    App(AppError),
    /// Lifecycle transition failure, including policy violations.
    Transition(TransitionError),
}

impl From<AppError> for ApiError {
    fn from(value: AppError) -> Self {
        Self::App(value)
    }
}

impl From<TransitionError> for ApiError {
    fn from(value: TransitionError) -> Self {
        Self::Transition(value)
    }
}

fn app_error_status(error: &AppError) -> StatusCode {
    match error {
        AppError::Validation(_) => StatusCode::BAD_REQUEST,
        AppError::NotFound(_) => StatusCode::NOT_FOUND,
        AppError::Conflict(_) => StatusCode::CONFLICT,
        AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            Self::App(error) => (app_error_status(error), error.to_string()),
            Self::Transition(TransitionError::Policy(violation)) => {
                (StatusCode::UNPROCESSABLE_ENTITY, violation.to_string())
            }
            Self::Transition(TransitionError::App(error)) => {
                (app_error_status(error), error.to_string())
            }
        };

        let payload = Json(ErrorResponse { message });
        (status, payload).into_response()
    }
}

/// Standard API result type.
pub type ApiResult<T> = Result<T, ApiError>;
