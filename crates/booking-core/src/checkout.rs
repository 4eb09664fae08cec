//! # Checkout Types
//!
//! Request, session and status types for the booking checkout flow.

use crate::currency::{from_smallest_unit, normalize_code, to_smallest_unit};
use crate::error::{BookingError, BookingResult};
use crate::redirect::RedirectUrls;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// Metadata key carrying the package identifier
pub const METADATA_PACKAGE_ID: &str = "packageId";
/// Metadata key carrying the package display name
pub const METADATA_PACKAGE_NAME: &str = "packageName";

/// Body of `POST /api/payment/create-checkout-session`.
///
/// All fields are optional at the wire level so that missing values turn
/// into `InvalidRequest` instead of a deserialization rejection.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    /// Package identifier; JSON strings and numbers are both accepted
    #[serde(
        default,
        deserialize_with = "deserialize_package_id",
        skip_serializing_if = "Option::is_none"
    )]
    pub package_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub package_name: Option<String>,

    /// Amount in major units of `currency`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<f64>,

    #[serde(default = "default_quantity")]
    pub quantity: u32,

    /// Currency code; the rate table's base currency when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
}

fn default_quantity() -> u32 {
    1
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawPackageId {
    Text(String),
    Number(serde_json::Number),
}

fn deserialize_package_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<RawPackageId>::deserialize(deserializer)?;
    Ok(raw.and_then(|id| match id {
        RawPackageId::Text(text) => Some(text),
        // numeric zero is as falsy as an empty string
        RawPackageId::Number(n) if n.as_f64() == Some(0.0) => None,
        RawPackageId::Number(n) => Some(n.to_string()),
    }))
}

impl CheckoutRequest {
    pub fn new(package_id: impl Into<String>, package_name: impl Into<String>, amount: f64) -> Self {
        Self {
            package_id: Some(package_id.into()),
            package_name: Some(package_name.into()),
            amount: Some(amount),
            quantity: 1,
            currency: None,
        }
    }

    /// Builder: set currency
    pub fn with_currency(mut self, currency: impl Into<String>) -> Self {
        self.currency = Some(currency.into());
        self
    }

    /// Builder: set quantity
    pub fn with_quantity(mut self, quantity: u32) -> Self {
        self.quantity = quantity;
        self
    }

    /// Check required fields and produce a request with no optional parts left
    pub fn validate(&self) -> BookingResult<ValidatedCheckout> {
        let package_id = self
            .package_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty());
        let package_name = self
            .package_name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty());
        let amount = self.amount.filter(|amount| *amount != 0.0);

        let mut missing = Vec::new();
        if package_id.is_none() {
            missing.push(METADATA_PACKAGE_ID);
        }
        if package_name.is_none() {
            missing.push(METADATA_PACKAGE_NAME);
        }
        if amount.is_none() {
            missing.push("amount");
        }

        let (Some(package_id), Some(package_name), Some(amount)) = (package_id, package_name, amount)
        else {
            return Err(BookingError::InvalidRequest(format!(
                "Missing required fields: {}",
                missing.join(", ")
            )));
        };

        if !amount.is_finite() || amount < 0.0 {
            return Err(BookingError::InvalidRequest(
                "amount must be a positive number".to_string(),
            ));
        }

        if self.quantity == 0 {
            return Err(BookingError::InvalidRequest(
                "quantity must be at least 1".to_string(),
            ));
        }

        Ok(ValidatedCheckout {
            package_id: package_id.to_string(),
            package_name: package_name.to_string(),
            amount,
            quantity: self.quantity,
            currency: self
                .currency
                .as_deref()
                .map(normalize_code)
                .filter(|c| !c.is_empty()),
        })
    }
}

/// A checkout request whose required fields are present
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedCheckout {
    pub package_id: String,
    pub package_name: String,
    pub amount: f64,
    pub quantity: u32,
    pub currency: Option<String>,
}

/// Booking context carried through the provider as session metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingMetadata {
    pub package_id: String,
    pub package_name: String,
}

impl BookingMetadata {
    pub fn new(package_id: impl Into<String>, package_name: impl Into<String>) -> Self {
        Self {
            package_id: package_id.into(),
            package_name: package_name.into(),
        }
    }

    /// Recover booking context from a provider metadata map
    pub fn from_map(map: &HashMap<String, String>) -> Option<Self> {
        Some(Self {
            package_id: map.get(METADATA_PACKAGE_ID)?.clone(),
            package_name: map.get(METADATA_PACKAGE_NAME)?.clone(),
        })
    }

    pub fn to_map(&self) -> HashMap<String, String> {
        HashMap::from([
            (METADATA_PACKAGE_ID.to_string(), self.package_id.clone()),
            (METADATA_PACKAGE_NAME.to_string(), self.package_name.clone()),
        ])
    }
}

/// Everything a provider needs to open one hosted, single-use payment session
#[derive(Debug, Clone, PartialEq)]
pub struct CheckoutSessionParams {
    pub metadata: BookingMetadata,
    /// Unit price in the currency's smallest unit (cents, whole yen)
    pub unit_amount: i64,
    pub quantity: u32,
    /// Lower-case ISO 4217 code, as providers expect
    pub currency: String,
    pub success_url: String,
    pub cancel_url: String,
    pub idempotency_key: String,
}

impl CheckoutSessionParams {
    /// Build provider params for a validated request charged at `amount` (major units)
    pub fn new(
        checkout: &ValidatedCheckout,
        amount: f64,
        currency: &str,
        urls: &RedirectUrls,
    ) -> Self {
        Self {
            metadata: BookingMetadata::new(&checkout.package_id, &checkout.package_name),
            unit_amount: to_smallest_unit(amount, currency),
            quantity: checkout.quantity,
            currency: currency.trim().to_ascii_lowercase(),
            success_url: urls.success_url(),
            cancel_url: urls.cancel_url(),
            idempotency_key: Uuid::new_v4().to_string(),
        }
    }

    /// Builder: set idempotency key
    pub fn with_idempotency_key(mut self, key: impl Into<String>) -> Self {
        self.idempotency_key = key.into();
        self
    }

    /// Human-readable line item description
    pub fn description(&self) -> String {
        format!(
            "Travel package booking - Package ID: {}",
            self.metadata.package_id
        )
    }

    pub fn amount_total(&self) -> i64 {
        self.unit_amount * self.quantity as i64
    }
}

/// Status of a provider-hosted checkout session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    /// Session created, awaiting payment
    #[default]
    Pending,
    /// Payment completed
    Complete,
    /// Session expired without payment
    Expired,
}

impl SessionStatus {
    /// Map the provider's status string (`open`, `complete`, `expired`)
    pub fn from_provider(status: &str) -> Self {
        match status {
            "complete" => SessionStatus::Complete,
            "expired" => SessionStatus::Expired,
            _ => SessionStatus::Pending,
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, SessionStatus::Pending)
    }
}

/// A checkout session created by the payment provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutSession {
    /// Provider's session ID
    pub session_id: String,

    /// Hosted payment page to redirect the buyer to
    pub url: String,

    #[serde(default)]
    pub status: SessionStatus,

    pub metadata: BookingMetadata,

    /// Lower-case currency code
    pub currency: String,

    pub amount_minor_units: i64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}

impl CheckoutSession {
    pub fn amount_major_units(&self) -> f64 {
        from_smallest_unit(self.amount_minor_units, &self.currency)
    }
}

/// Read-only view of a session, returned by the status query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionDetails {
    pub session_id: String,

    /// Provider payment status (`paid`, `unpaid`, `no_payment_required`)
    pub payment_status: String,

    #[serde(default)]
    pub status: SessionStatus,

    pub customer_email: Option<String>,

    /// Charged amount in major units
    pub amount_total: f64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,

    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

impl SessionDetails {
    pub fn is_paid(&self) -> bool {
        self.payment_status == "paid"
    }

    pub fn booking(&self) -> Option<BookingMetadata> {
        BookingMetadata::from_map(&self.metadata)
    }
}
