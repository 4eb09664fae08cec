//! # Stripe Checkout Sessions
//!
//! Implementation of the Stripe Checkout Sessions API.
//! One session is one single-use hosted page for one travel package.

use crate::config::StripeConfig;
use crate::signature::{verify_signature, DEFAULT_TOLERANCE_SECS};
use crate::types::{StripeCheckoutSession, StripeErrorResponse};
use crate::webhook::parse_event;
use async_trait::async_trait;
use booking_core::{
    from_smallest_unit, BookingError, BookingResult, CheckoutSession, CheckoutSessionParams,
    PaymentProvider, SessionDetails, WebhookEvent,
};
use chrono::{DateTime, Utc};
use reqwest::{Client, Response, StatusCode};
use tracing::{debug, error, info, instrument};

const PROVIDER: &str = "stripe";

/// Stripe Checkout Session provider
///
/// Uses Stripe's hosted checkout page; card data never touches this service.
pub struct StripeCheckoutProvider {
    config: StripeConfig,
    client: Client,
}

impl StripeCheckoutProvider {
    /// Create a new Stripe checkout provider
    pub fn new(config: StripeConfig) -> BookingResult<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .map_err(|e| BookingError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { config, client })
    }

    /// Create from environment variables
    pub fn from_env() -> BookingResult<Self> {
        Self::new(StripeConfig::from_env()?)
    }

    pub fn config(&self) -> &StripeConfig {
        &self.config
    }

    /// Form-encoded body for `POST /v1/checkout/sessions`
    fn form_params(params: &CheckoutSessionParams) -> Vec<(String, String)> {
        vec![
            ("payment_method_types[0]".to_string(), "card".to_string()),
            ("mode".to_string(), "payment".to_string()),
            (
                "line_items[0][price_data][currency]".to_string(),
                params.currency.clone(),
            ),
            (
                "line_items[0][price_data][unit_amount]".to_string(),
                params.unit_amount.to_string(),
            ),
            (
                "line_items[0][price_data][product_data][name]".to_string(),
                params.metadata.package_name.clone(),
            ),
            (
                "line_items[0][price_data][product_data][description]".to_string(),
                params.description(),
            ),
            ("line_items[0][quantity]".to_string(), params.quantity.to_string()),
            ("success_url".to_string(), params.success_url.clone()),
            ("cancel_url".to_string(), params.cancel_url.clone()),
            ("metadata[packageId]".to_string(), params.metadata.package_id.clone()),
            (
                "metadata[packageName]".to_string(),
                params.metadata.package_name.clone(),
            ),
        ]
    }

    /// Turn a non-2xx Stripe response into a provider error
    async fn provider_error(response: Response) -> BookingError {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        error!("Stripe API error: status={}, body={}", status, body);

        match serde_json::from_str::<StripeErrorResponse>(&body) {
            Ok(StripeErrorResponse { error }) => BookingError::provider(
                PROVIDER,
                error
                    .message
                    .or(error.code)
                    .unwrap_or_else(|| format!("HTTP {}", status)),
            ),
            Err(_) => BookingError::provider(PROVIDER, format!("HTTP {}: {}", status, body)),
        }
    }

    async fn read_session(response: Response) -> BookingResult<StripeCheckoutSession> {
        let body = response
            .text()
            .await
            .map_err(|e| BookingError::provider(PROVIDER, e.to_string()))?;

        serde_json::from_str(&body).map_err(|e| {
            BookingError::provider(PROVIDER, format!("Failed to parse Stripe response: {}", e))
        })
    }
}

/// Session IDs are interpolated into the request path
fn validate_session_id(session_id: &str) -> BookingResult<()> {
    let valid = !session_id.is_empty()
        && session_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_');

    if valid {
        Ok(())
    } else {
        Err(BookingError::InvalidRequest(format!(
            "Invalid session ID: {}",
            session_id
        )))
    }
}

#[async_trait]
impl PaymentProvider for StripeCheckoutProvider {
    #[instrument(skip(self, params), fields(package_id = %params.metadata.package_id))]
    async fn create_checkout_session(
        &self,
        params: &CheckoutSessionParams,
    ) -> BookingResult<CheckoutSession> {
        let auth = self.config.auth_header()?;

        if params.unit_amount <= 0 {
            return Err(BookingError::InvalidRequest(
                "Amount must be greater than zero".to_string(),
            ));
        }

        debug!(
            "Creating Stripe checkout session: unit_amount={}, currency={}",
            params.unit_amount, params.currency
        );

        let url = format!("{}/v1/checkout/sessions", self.config.api_base_url);

        let response = self
            .client
            .post(&url)
            .header("Authorization", auth)
            .header("Stripe-Version", &self.config.api_version)
            .header("Idempotency-Key", &params.idempotency_key)
            .form(&Self::form_params(params))
            .send()
            .await
            .map_err(|e| BookingError::provider(PROVIDER, e.to_string()))?;

        if !response.status().is_success() {
            return Err(Self::provider_error(response).await);
        }

        let session = Self::read_session(response).await?;
        let url = session.url.clone().ok_or_else(|| {
            BookingError::provider(PROVIDER, "Checkout session has no URL")
        })?;

        info!("Created Stripe checkout session: id={}", session.id);

        Ok(CheckoutSession {
            status: session.status(),
            session_id: session.id,
            url,
            metadata: params.metadata.clone(),
            currency: params.currency.clone(),
            amount_minor_units: session.amount_total.unwrap_or_else(|| params.amount_total()),
            expires_at: session
                .expires_at
                .and_then(|ts| DateTime::<Utc>::from_timestamp(ts, 0)),
        })
    }

    #[instrument(skip(self))]
    async fn retrieve_session(&self, session_id: &str) -> BookingResult<SessionDetails> {
        let auth = self.config.auth_header()?;
        validate_session_id(session_id)?;

        let url = format!(
            "{}/v1/checkout/sessions/{}",
            self.config.api_base_url, session_id
        );

        let response = self
            .client
            .get(&url)
            .header("Authorization", auth)
            .header("Stripe-Version", &self.config.api_version)
            .send()
            .await
            .map_err(|e| BookingError::provider(PROVIDER, e.to_string()))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(BookingError::session_not_found(session_id));
        }
        if !response.status().is_success() {
            return Err(Self::provider_error(response).await);
        }

        let session = Self::read_session(response).await?;
        debug!(
            "Retrieved Stripe checkout session: id={}, payment_status={:?}",
            session.id, session.payment_status
        );

        Ok(SessionDetails {
            status: session.status(),
            customer_email: session.payer_email(),
            session_id: session.id,
            payment_status: session
                .payment_status
                .unwrap_or_else(|| "unpaid".to_string()),
            amount_total: from_smallest_unit(
                session.amount_total.unwrap_or(0),
                session.currency.as_deref().unwrap_or("usd"),
            ),
            currency: session.currency,
            metadata: session.metadata,
        })
    }

    #[instrument(skip(self, payload, signature))]
    async fn verify_webhook(&self, payload: &[u8], signature: &str) -> BookingResult<WebhookEvent> {
        let secret = self.config.require_webhook_secret()?;

        verify_signature(
            payload,
            signature,
            secret,
            DEFAULT_TOLERANCE_SECS,
            Utc::now().timestamp(),
        )?;

        let event = parse_event(payload)?;
        debug!("Verified Stripe webhook: type={}", event.event_type);
        Ok(event)
    }

    fn provider_name(&self) -> &'static str {
        PROVIDER
    }

    fn is_configured(&self) -> bool {
        self.config.has_secret_key()
    }
}
