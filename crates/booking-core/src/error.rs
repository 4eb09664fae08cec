//! # Booking Error Types
//!
//! Typed error handling for the travel-checkout payment flow.
//! All booking operations return `Result<T, BookingError>`.

use thiserror::Error;

/// Core error type for all booking/payment operations
#[derive(Debug, Error)]
pub enum BookingError {
    /// Client input was missing or malformed
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// A required credential or setting is absent (deployment error)
    #[error("Service not configured: {0}")]
    ServiceNotConfigured(String),

    /// Payment provider call failed
    #[error("Payment provider error [{provider}]: {message}")]
    PaymentProviderError { provider: String, message: String },

    /// Webhook signature missing, malformed or mismatched
    #[error("Webhook signature invalid: {0}")]
    SignatureInvalid(String),

    /// Verified webhook body is not a usable event
    #[error("Webhook payload invalid: {0}")]
    WebhookPayload(String),

    /// Unknown session or package
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    /// Internal error (serialization of our own data, poisoned locks)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl BookingError {
    pub fn provider(provider: impl Into<String>, message: impl Into<String>) -> Self {
        BookingError::PaymentProviderError {
            provider: provider.into(),
            message: message.into(),
        }
    }

    pub fn session_not_found(session_id: impl Into<String>) -> Self {
        BookingError::NotFound {
            kind: "Session",
            id: session_id.into(),
        }
    }

    pub fn package_not_found(package_id: impl Into<String>) -> Self {
        BookingError::NotFound {
            kind: "Package",
            id: package_id.into(),
        }
    }

    /// Returns true if the user may simply try again
    pub fn is_retryable(&self) -> bool {
        matches!(self, BookingError::PaymentProviderError { .. })
    }

    /// Returns the HTTP status code appropriate for this error
    pub fn status_code(&self) -> u16 {
        match self {
            BookingError::InvalidRequest(_) => 400,
            BookingError::ServiceNotConfigured(_) => 500,
            BookingError::PaymentProviderError { .. } => 500,
            BookingError::SignatureInvalid(_) => 400,
            BookingError::WebhookPayload(_) => 400,
            BookingError::NotFound { .. } => 404,
            BookingError::Internal(_) => 500,
        }
    }

    /// Machine-readable error code for API responses
    pub fn error_code(&self) -> &'static str {
        match self {
            BookingError::InvalidRequest(_) => "invalid_request",
            BookingError::ServiceNotConfigured(_) => "service_not_configured",
            BookingError::PaymentProviderError { .. } => "payment_provider_error",
            BookingError::SignatureInvalid(_) => "signature_invalid",
            BookingError::WebhookPayload(_) => "invalid_request",
            BookingError::NotFound { .. } => "not_found",
            BookingError::Internal(_) => "internal_error",
        }
    }
}

/// Result type alias for booking operations
pub type BookingResult<T> = Result<T, BookingError>;
