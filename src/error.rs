use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

use crate::models::booking::BookingStatus;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("invalid coordinate ({latitude}, {longitude})")]
    InvalidCoordinate { latitude: f64, longitude: f64 },

    #[error("not found: {0}")]
    NotFound(String),

    #[error("driver unavailable: {0}")]
    DriverUnavailable(String),

    #[error("invalid transition from {from} to {to}")]
    InvalidTransition {
        from: BookingStatus,
        to: BookingStatus,
    },

    #[error("not authorized: {0}")]
    NotAuthorized(String),

    #[error("provider unavailable: {0}")]
    ProviderUnavailable(String),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Domain declines are well-formed outcomes and stay on 200 with
        // success:false; 4xx is reserved for malformed input.
        let status = match &self {
            AppError::InvalidCoordinate { .. } | AppError::BadRequest(_) => {
                StatusCode::BAD_REQUEST
            }
            AppError::NotFound(_)
            | AppError::DriverUnavailable(_)
            | AppError::InvalidTransition { .. }
            | AppError::NotAuthorized(_) => StatusCode::OK,
            AppError::ProviderUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({
            "success": false,
            "message": self.to_string(),
        }));

        (status, body).into_response()
    }
}
