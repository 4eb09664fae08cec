//! # API Errors
//!
//! Maps `BookingError` onto HTTP responses shaped as
//! `{error, code, message?}`.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use booking_core::BookingError;
use serde::Serialize;
use thiserror::Error;
use tracing::{error, warn};

/// Error returned by request handlers
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Booking(#[from] BookingError),

    /// A failed operation with a human summary shown instead of the raw cause
    #[error("{summary}: {source}")]
    Operation {
        summary: &'static str,
        #[source]
        source: BookingError,
    },

    #[error("Invalid JSON body: {0}")]
    Json(#[from] JsonRejection),
}

impl ApiError {
    /// `map_err` adapter attaching a summary, e.g. "Failed to retrieve session"
    pub fn during(summary: &'static str) -> impl FnOnce(BookingError) -> ApiError {
        move |source| ApiError::Operation { summary, source }
    }

    fn booking(&self) -> Option<&BookingError> {
        match self {
            ApiError::Booking(e) | ApiError::Operation { source: e, .. } => Some(e),
            ApiError::Json(_) => None,
        }
    }

    fn summary(&self) -> Option<&'static str> {
        match self {
            ApiError::Operation { summary, .. } => Some(*summary),
            _ => None,
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self.booking() {
            Some(e) => StatusCode::from_u16(e.status_code())
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            None => StatusCode::BAD_REQUEST,
        }
    }

    fn body(&self) -> ErrorBody {
        let Some(e) = self.booking() else {
            return ErrorBody {
                error: "Invalid JSON body".to_string(),
                code: "invalid_request",
                message: match self {
                    ApiError::Json(rejection) => Some(rejection.body_text()),
                    _ => None,
                },
            };
        };

        let (error, message) = match e {
            BookingError::InvalidRequest(msg) | BookingError::ServiceNotConfigured(msg) => {
                (msg.clone(), None)
            }
            BookingError::PaymentProviderError { message, .. } => (
                self.summary().unwrap_or("Payment provider error").to_string(),
                Some(message.clone()),
            ),
            BookingError::SignatureInvalid(msg) | BookingError::WebhookPayload(msg) => {
                (format!("Webhook Error: {}", msg), None)
            }
            BookingError::NotFound { .. } => (e.to_string(), None),
            BookingError::Internal(_) => ("Internal server error".to_string(), None),
        };

        ErrorBody {
            error,
            code: e.error_code(),
            message,
        }
    }
}

/// JSON error body
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    pub code: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!(status = status.as_u16(), "Request failed: {}", self);
        } else {
            warn!(status = status.as_u16(), "Request rejected: {}", self);
        }

        (status, Json(self.body())).into_response()
    }
}
