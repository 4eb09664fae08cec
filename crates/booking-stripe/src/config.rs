//! # Stripe Configuration
//!
//! Configuration management for the Stripe integration.
//! Secrets come from environment variables and may be absent: a missing key
//! does not stop the server, it makes every payment call fail fast with
//! `ServiceNotConfigured`.

use booking_core::{BookingError, BookingResult};
use std::env;

const DEFAULT_API_BASE_URL: &str = "https://api.stripe.com";
const DEFAULT_API_VERSION: &str = "2024-12-18.acacia";

/// Stripe API configuration
#[derive(Clone)]
pub struct StripeConfig {
    /// Secret API key (sk_test_... or sk_live_...)
    pub secret_key: Option<String>,

    /// Webhook signing secret (whsec_...)
    pub webhook_secret: Option<String>,

    /// API base URL (for testing/mocking)
    pub api_base_url: String,

    /// API version
    pub api_version: String,
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl StripeConfig {
    /// Load configuration from environment variables.
    ///
    /// Optional env vars:
    /// - `STRIPE_SECRET_KEY`
    /// - `STRIPE_WEBHOOK_SECRET`
    /// - `STRIPE_API_BASE_URL`
    ///
    /// Keys that are present but malformed are rejected.
    pub fn from_env() -> BookingResult<Self> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let config = Self {
            secret_key: non_empty_var("STRIPE_SECRET_KEY"),
            webhook_secret: non_empty_var("STRIPE_WEBHOOK_SECRET"),
            api_base_url: non_empty_var("STRIPE_API_BASE_URL")
                .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string()),
            api_version: DEFAULT_API_VERSION.to_string(),
        };
        config.validate()?;
        Ok(config)
    }

    /// Create config with explicit values (for testing)
    pub fn new(secret_key: impl Into<String>, webhook_secret: impl Into<String>) -> Self {
        Self {
            secret_key: Some(secret_key.into()),
            webhook_secret: Some(webhook_secret.into()),
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            api_version: DEFAULT_API_VERSION.to_string(),
        }
    }

    /// Config with no credentials at all
    pub fn unconfigured() -> Self {
        Self {
            secret_key: None,
            webhook_secret: None,
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            api_version: DEFAULT_API_VERSION.to_string(),
        }
    }

    /// Validate key formats of the keys that are set
    pub fn validate(&self) -> BookingResult<()> {
        if let Some(key) = &self.secret_key {
            if !key.starts_with("sk_test_") && !key.starts_with("sk_live_") {
                return Err(BookingError::ServiceNotConfigured(
                    "STRIPE_SECRET_KEY must start with sk_test_ or sk_live_".to_string(),
                ));
            }
        }
        if let Some(secret) = &self.webhook_secret {
            if !secret.starts_with("whsec_") {
                return Err(BookingError::ServiceNotConfigured(
                    "STRIPE_WEBHOOK_SECRET must start with whsec_".to_string(),
                ));
            }
        }
        Ok(())
    }

    pub fn has_secret_key(&self) -> bool {
        self.secret_key.is_some()
    }

    pub fn has_webhook_secret(&self) -> bool {
        self.webhook_secret.is_some()
    }

    /// The secret key, or an operator-actionable error
    pub fn require_secret_key(&self) -> BookingResult<&str> {
        self.secret_key.as_deref().ok_or_else(|| {
            BookingError::ServiceNotConfigured(
                "Payment service not configured. Please add STRIPE_SECRET_KEY to environment variables."
                    .to_string(),
            )
        })
    }

    /// The webhook signing secret, or an operator-actionable error
    pub fn require_webhook_secret(&self) -> BookingResult<&str> {
        self.webhook_secret.as_deref().ok_or_else(|| {
            BookingError::ServiceNotConfigured(
                "Webhook not configured. Please add STRIPE_WEBHOOK_SECRET to environment variables."
                    .to_string(),
            )
        })
    }

    /// Check if using test keys
    pub fn is_test_mode(&self) -> bool {
        self.secret_key
            .as_deref()
            .is_some_and(|key| key.starts_with("sk_test_"))
    }

    /// Get authorization header value
    pub fn auth_header(&self) -> BookingResult<String> {
        Ok(format!("Bearer {}", self.require_secret_key()?))
    }

    /// Builder: set custom API base URL (for testing)
    pub fn with_api_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into();
        self
    }
}

impl std::fmt::Debug for StripeConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let redact = |value: &Option<String>| value.as_ref().map(|_| "<redacted>");
        f.debug_struct("StripeConfig")
            .field("secret_key", &redact(&self.secret_key))
            .field("webhook_secret", &redact(&self.webhook_secret))
            .field("api_base_url", &self.api_base_url)
            .field("api_version", &self.api_version)
            .finish()
    }
}
