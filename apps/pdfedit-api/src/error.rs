//! Error types for the PDF editing server

use axum::{
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use pdfedit_core::PdfEditError;
use serde::Serialize;
use thiserror::Error;
use tracing::{error, warn};

/// Server error types
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error(transparent)]
    Pdf(#[from] PdfEditError),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Error response body
#[derive(Serialize)]
struct ErrorResponse {
    success: bool,
    error: String,
    code: String,
}

impl ApiError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::InvalidRequest(_) => (StatusCode::BAD_REQUEST, "INVALID_REQUEST"),
            ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
            ApiError::Pdf(err) => {
                let code = match err {
                    PdfEditError::Range(_) => "INVALID_RANGE",
                    PdfEditError::Format(_) => "INVALID_PDF",
                    PdfEditError::NotFound(_) => "TEXT_NOT_FOUND",
                    PdfEditError::Input(_) => "INVALID_REQUEST",
                    PdfEditError::Font(_) => "INVALID_FONT",
                    PdfEditError::Image(_) => "INVALID_IMAGE",
                    PdfEditError::Password(_) => "INVALID_PASSWORD",
                    PdfEditError::Operation(_) => "PDF_OPERATION_FAILED",
                };
                let status = if err.is_client_error() {
                    StatusCode::BAD_REQUEST
                } else {
                    StatusCode::INTERNAL_SERVER_ERROR
                };
                (status, code)
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        if status.is_server_error() {
            error!("{}: {}", code, self);
        } else {
            warn!("{}: {}", code, self);
        }

        let body = ErrorResponse {
            success: false,
            error: self.to_string(),
            code: code.to_string(),
        };

        (status, Json(body)).into_response()
    }
}

impl From<MultipartError> for ApiError {
    fn from(err: MultipartError) -> Self {
        ApiError::InvalidRequest(format!("Malformed multipart body: {}", err))
    }
}
