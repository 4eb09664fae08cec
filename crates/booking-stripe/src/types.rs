//! Stripe API wire types (only the fields the booking flow reads).

use booking_core::{SessionObject, SessionStatus};
use serde::Deserialize;
use std::collections::HashMap;

/// `checkout.session` object, as returned by create/retrieve and embedded in events
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct StripeCheckoutSession {
    pub id: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub payment_status: Option<String>,
    #[serde(default)]
    pub customer_email: Option<String>,
    #[serde(default)]
    pub customer_details: Option<StripeCustomerDetails>,
    #[serde(default)]
    pub amount_total: Option<i64>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub expires_at: Option<i64>,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct StripeCustomerDetails {
    #[serde(default)]
    pub email: Option<String>,
}

impl StripeCheckoutSession {
    pub fn status(&self) -> SessionStatus {
        self.status
            .as_deref()
            .map(SessionStatus::from_provider)
            .unwrap_or_default()
    }

    /// Payer email: customer details first, then the prefilled address
    pub fn payer_email(&self) -> Option<String> {
        self.customer_details
            .as_ref()
            .and_then(|details| details.email.clone())
            .or_else(|| self.customer_email.clone())
    }

    pub fn into_session_object(self) -> SessionObject {
        SessionObject {
            status: self.status(),
            customer_email: self.payer_email(),
            id: Some(self.id),
            payment_status: self.payment_status,
            amount_total: self.amount_total,
            currency: self.currency,
            metadata: self.metadata,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct StripeErrorResponse {
    pub error: StripeError,
}

#[derive(Debug, Deserialize)]
pub(crate) struct StripeError {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub code: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct StripeWebhookEvent {
    pub id: String,
    #[serde(rename = "type")]
    pub event_type: String,
    #[serde(default)]
    pub created: i64,
    pub data: StripeEventData,
}

#[derive(Debug, Deserialize)]
pub(crate) struct StripeEventData {
    pub object: serde_json::Value,
}
