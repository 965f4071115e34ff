use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use backend_application::AppError;

#[derive(Debug)]
pub enum HttpError {
    Unauthorized,
    App(AppError),
}

impl From<AppError> for HttpError {
    fn from(value: AppError) -> Self {
        HttpError::App(value)
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
    kind: &'static str,
}

fn status_for(err: &AppError) -> StatusCode {
    match err {
        AppError::Validation(_) => StatusCode::BAD_REQUEST,
        AppError::Conflict(_) => StatusCode::CONFLICT,
        AppError::Forbidden => StatusCode::FORBIDDEN,
        AppError::NotFound(_) => StatusCode::NOT_FOUND,
        AppError::Unauthenticated => StatusCode::UNAUTHORIZED,
        AppError::BackendUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            HttpError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                ErrorBody {
                    error: "unauthorized".to_string(),
                    kind: "unauthorized",
                },
            ),
            HttpError::App(err) => {
                // Internal details stay in the logs.
                let error = match &err {
                    AppError::Internal(_) => "internal error".to_string(),
                    other => other.to_string(),
                };
                (
                    status_for(&err),
                    ErrorBody {
                        error,
                        kind: err.kind(),
                    },
                )
            }
        };
        (status, Json(body)).into_response()
    }
}
