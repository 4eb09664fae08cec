//! # Stripe Webhook Handling
//!
//! Event parsing and dispatch for verified Stripe webhooks.
//!
//! Recording a booking and notifying the buyer are left to whichever
//! `BookingHandler` is wired in; the default handler only logs. Every
//! handler sits behind the `EventLedger`, so redeliveries never reach it
//! twice.

use crate::types::{StripeCheckoutSession, StripeWebhookEvent};
use booking_core::{
    BookingError, BookingMetadata, BookingResult, Delivery, EventLedger, SessionObject,
    WebhookEvent, WebhookEventType,
};
use chrono::{DateTime, Utc};
use tracing::{error, info, warn};

/// Events that should be enabled on the Stripe webhook endpoint
pub const REQUIRED_WEBHOOK_EVENTS: &[&str] =
    &["checkout.session.completed", "checkout.session.expired"];

/// Parse a verified webhook body into a provider-neutral event
pub fn parse_event(payload: &[u8]) -> BookingResult<WebhookEvent> {
    let event: StripeWebhookEvent = serde_json::from_slice(payload)
        .map_err(|e| BookingError::WebhookPayload(format!("Failed to parse webhook: {}", e)))?;

    let event_type = WebhookEventType::parse(&event.event_type);

    let session = match &event_type {
        WebhookEventType::Unknown(_) => loose_session_object(&event.data.object),
        _ => serde_json::from_value::<StripeCheckoutSession>(event.data.object)
            .map_err(|e| {
                BookingError::WebhookPayload(format!("Invalid checkout session object: {}", e))
            })?
            .into_session_object(),
    };

    Ok(WebhookEvent {
        event_id: event.id,
        event_type,
        session,
        created: DateTime::from_timestamp(event.created, 0).unwrap_or_else(Utc::now),
    })
}

/// Best-effort view of a non-session object (charges, invoices, ...)
fn loose_session_object(object: &serde_json::Value) -> SessionObject {
    SessionObject {
        id: object.get("id").and_then(|v| v.as_str()).map(String::from),
        ..Default::default()
    }
}

/// Data handed to the booking confirmation path
#[derive(Debug, Clone, PartialEq)]
pub struct BookingConfirmation {
    pub event_id: String,
    pub session_id: String,
    pub booking: Option<BookingMetadata>,
    pub customer_email: Option<String>,
    /// Minor units
    pub amount_total: i64,
    pub currency: Option<String>,
    pub payment_status: String,
}

impl BookingConfirmation {
    pub fn from_event(event: &WebhookEvent) -> BookingResult<Self> {
        let session_id = event.session.id.clone().ok_or_else(|| {
            BookingError::WebhookPayload("Missing session id".to_string())
        })?;

        Ok(Self {
            event_id: event.event_id.clone(),
            session_id,
            booking: event.session.booking(),
            customer_email: event.session.customer_email.clone(),
            amount_total: event.session.amount_total.unwrap_or(0),
            currency: event.session.currency.clone(),
            payment_status: event
                .session
                .payment_status
                .clone()
                .unwrap_or_else(|| "unknown".to_string()),
        })
    }

    pub fn is_paid(&self) -> bool {
        self.payment_status == "paid"
    }
}

/// Webhook event handler trait
///
/// Implement this trait to record bookings or send confirmations.
#[allow(unused_variables)]
pub trait BookingHandler: Send + Sync {
    /// Called once per completed checkout session
    fn on_checkout_completed(&self, confirmation: BookingConfirmation) -> BookingResult<()> {
        info!(
            session_id = %confirmation.session_id,
            package_id = ?confirmation.booking.as_ref().map(|b| b.package_id.as_str()),
            amount_total = confirmation.amount_total,
            paid = confirmation.is_paid(),
            "Payment successful"
        );
        Ok(())
    }

    /// Called when a session expires unpaid
    fn on_checkout_expired(&self, event: &WebhookEvent) -> BookingResult<()> {
        info!(session_id = ?event.session.id, "Checkout session expired");
        Ok(())
    }

    /// Called for event types the booking flow does not handle
    fn on_unhandled(&self, event: &WebhookEvent) -> BookingResult<()> {
        info!(event_type = %event.event_type, "Unhandled event type");
        Ok(())
    }
}

/// Default handler (just logs events)
pub struct LoggingBookingHandler;

impl BookingHandler for LoggingBookingHandler {}

/// What happened to a verified event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    Dispatched,
    /// Already handled; skipped
    Duplicate,
    /// Handler returned an error (logged, still acknowledged)
    HandlerFailed(String),
}

/// Deduplicate, then dispatch an event to the matching handler method.
///
/// Never fails: the provider must get an acknowledgment for every verified
/// event, whatever the handler does.
pub fn dispatch_webhook_event(
    handler: &dyn BookingHandler,
    ledger: &dyn EventLedger,
    event: WebhookEvent,
) -> DispatchOutcome {
    match ledger.record(&event) {
        Ok(Delivery::Duplicate) => {
            info!(
                event_id = %event.event_id,
                event_type = %event.event_type,
                "Duplicate webhook delivery skipped"
            );
            return DispatchOutcome::Duplicate;
        }
        Ok(Delivery::First) => {}
        Err(e) => {
            // prefer a possible double handling over dropping the event
            warn!(event_id = %event.event_id, "Event ledger unavailable: {}", e);
        }
    }

    let result = match &event.event_type {
        WebhookEventType::CheckoutSessionCompleted => {
            BookingConfirmation::from_event(&event).and_then(|c| handler.on_checkout_completed(c))
        }
        WebhookEventType::CheckoutSessionExpired => handler.on_checkout_expired(&event),
        WebhookEventType::Unknown(_) => handler.on_unhandled(&event),
    };

    match result {
        Ok(()) => DispatchOutcome::Dispatched,
        Err(e) => {
            error!(
                event_id = %event.event_id,
                event_type = %event.event_type,
                "Webhook handler error: {}",
                e
            );
            DispatchOutcome::HandlerFailed(e.to_string())
        }
    }
}
