// HTTP error translation
// Decision: Handlers return ApiError; this is the only place an AppError becomes a status code
// Decision: Every error body is {"message": ...}, including JSON body rejections

use axum::extract::rejection::JsonRejection;
use axum::extract::FromRequest;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use spicescape_core::AppError;

use super::common::ErrorResponse;

/// Error returned by every handler and extractor in the API
#[derive(Debug)]
pub struct ApiError(pub AppError);

pub type ApiResult<T> = Result<T, ApiError>;

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        Self(err)
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        Self(AppError::from(err))
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        // Bodies over the router's DefaultBodyLimit surface as a JSON rejection
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            return Self(AppError::payload_too_large(rejection.body_text()));
        }
        Self(AppError::bad_request(rejection.body_text()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.0.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        if let AppError::Internal(detail) = &self.0 {
            tracing::error!(error = %detail, "Request failed with internal error");
        }

        (status, Json(ErrorResponse::new(self.0.public_message()))).into_response()
    }
}

/// `Json` extractor whose rejection uses the API error body
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);
