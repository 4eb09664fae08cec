//! # Request Handlers
//!
//! Axum request handlers for the booking payment API.

use crate::error::ApiError;
use crate::state::AppState;
use axum::{
    body::Bytes,
    extract::{rejection::JsonRejection, Path, State},
    http::HeaderMap,
    response::IntoResponse,
    Json,
};
use booking_core::{BookingError, CheckoutRequest, CheckoutSessionParams, PriceSource};
use booking_stripe::dispatch_webhook_event;
use serde::Serialize;
use std::collections::HashMap;
use tracing::{debug, info, instrument};

const SIGNATURE_HEADER: &str = "stripe-signature";

// =============================================================================
// Response Types
// =============================================================================

/// Create checkout response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCheckoutResponse {
    /// Provider session ID
    pub session_id: String,
    /// Hosted payment page (redirect the buyer here)
    pub url: String,
}

/// Session status response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStatusResponse {
    /// Provider payment status (`paid`, `unpaid`, ...)
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_email: Option<String>,
    /// Major units
    pub amount_total: f64,
    pub metadata: HashMap<String, String>,
}

// =============================================================================
// Handlers
// =============================================================================

/// Health check endpoint
pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "ok": true,
        "service": "travel-checkout",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Create a hosted checkout session for one travel package
#[instrument(skip(state, payload))]
pub async fn create_checkout_session(
    State(state): State<AppState>,
    payload: Result<Json<CheckoutRequest>, JsonRejection>,
) -> Result<Json<CreateCheckoutResponse>, ApiError> {
    if !state.provider.is_configured() {
        return Err(BookingError::ServiceNotConfigured(
            "Payment service not configured. Please add STRIPE_SECRET_KEY to environment variables."
                .to_string(),
        )
        .into());
    }

    let Json(request) = payload?;
    let checkout = request.validate()?;
    let charge = state.pricing.charge_for(&checkout)?;

    let params = CheckoutSessionParams::new(&checkout, charge.amount, &charge.currency, &state.urls);

    let session = state
        .provider
        .create_checkout_session(&params)
        .await
        .map_err(ApiError::during("Failed to create checkout session"))?;

    info!(
        session_id = %session.session_id,
        package_id = %checkout.package_id,
        amount = session.amount_major_units(),
        currency = %session.currency,
        catalog_price = charge.source == PriceSource::Catalog,
        "Checkout session created"
    );

    Ok(Json(CreateCheckoutResponse {
        session_id: session.session_id,
        url: session.url,
    }))
}

/// Handle Stripe webhook
///
/// The body is taken as raw bytes: the signature covers them exactly.
#[instrument(skip(state, headers, body), fields(bytes = body.len()))]
pub async fn stripe_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    if !state.provider.is_configured() {
        return Err(BookingError::ServiceNotConfigured("Webhook not configured".to_string()).into());
    }

    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| {
            BookingError::SignatureInvalid("Missing Stripe-Signature header".to_string())
        })?;

    let event = state.provider.verify_webhook(&body, signature).await?;

    info!(
        event_id = %event.event_id,
        event_type = %event.event_type,
        "Received webhook"
    );

    let outcome = dispatch_webhook_event(state.bookings.as_ref(), state.ledger.as_ref(), event);
    debug!(?outcome, "Webhook dispatched");

    Ok(Json(serde_json::json!({ "received": true })))
}

/// Look up a checkout session's payment status
#[instrument(skip(state))]
pub async fn get_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<SessionStatusResponse>, ApiError> {
    let details = state
        .provider
        .retrieve_session(&session_id)
        .await
        .map_err(ApiError::during("Failed to retrieve session"))?;

    Ok(Json(SessionStatusResponse {
        status: details.payment_status,
        customer_email: details.customer_email,
        amount_total: details.amount_total,
        metadata: details.metadata,
    }))
}

/// List bookable packages
pub async fn list_packages(State(state): State<AppState>) -> impl IntoResponse {
    let packages: Vec<_> = state.pricing.catalog().active_packages().collect();
    Json(serde_json::json!({
        "packages": packages,
        "count": packages.len()
    }))
}

/// Exchange rates used for pricing
pub async fn rates(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.pricing.rates().clone())
}
