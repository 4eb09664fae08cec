//! # Webhook Events
//!
//! Provider-neutral webhook event model and the idempotency ledger that
//! sits in front of any side-effecting handler.
//!
//! Delivery is at-least-once and unordered, so the ledger answers one
//! question per verified event: has this already been handled?

use crate::checkout::{BookingMetadata, SessionStatus};
use crate::error::{BookingError, BookingResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Mutex;

/// Webhook event types the booking flow distinguishes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum WebhookEventType {
    CheckoutSessionCompleted,
    CheckoutSessionExpired,
    /// Anything else (passthrough, logged as unhandled)
    Unknown(String),
}

impl WebhookEventType {
    pub fn parse(event_type: &str) -> Self {
        match event_type {
            "checkout.session.completed" => WebhookEventType::CheckoutSessionCompleted,
            "checkout.session.expired" => WebhookEventType::CheckoutSessionExpired,
            other => WebhookEventType::Unknown(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            WebhookEventType::CheckoutSessionCompleted => "checkout.session.completed",
            WebhookEventType::CheckoutSessionExpired => "checkout.session.expired",
            WebhookEventType::Unknown(other) => other,
        }
    }

    /// Session status this event moves the session to, if any
    pub fn settles_as(&self) -> Option<SessionStatus> {
        match self {
            WebhookEventType::CheckoutSessionCompleted => Some(SessionStatus::Complete),
            WebhookEventType::CheckoutSessionExpired => Some(SessionStatus::Expired),
            WebhookEventType::Unknown(_) => None,
        }
    }
}

impl std::fmt::Display for WebhookEventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The session object embedded in checkout events
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionObject {
    pub id: Option<String>,
    #[serde(default)]
    pub status: SessionStatus,
    pub payment_status: Option<String>,
    pub customer_email: Option<String>,
    /// Minor units
    pub amount_total: Option<i64>,
    pub currency: Option<String>,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

impl SessionObject {
    pub fn booking(&self) -> Option<BookingMetadata> {
        BookingMetadata::from_map(&self.metadata)
    }

    pub fn is_paid(&self) -> bool {
        self.payment_status.as_deref() == Some("paid")
    }
}

/// A verified, parsed webhook event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebhookEvent {
    /// Provider event ID (idempotency key)
    pub event_id: String,
    pub event_type: WebhookEventType,
    pub session: SessionObject,
    pub created: DateTime<Utc>,
}

/// Result of recording an event in the ledger
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// First time this event (or this session outcome) is seen
    First,
    /// Redelivery or stale outcome; skip side effects
    Duplicate,
}

/// Deduplication store keyed on event ID and settled session ID
pub trait EventLedger: Send + Sync {
    fn record(&self, event: &WebhookEvent) -> BookingResult<Delivery>;
}

/// Default number of keys kept before the oldest are evicted
pub const DEFAULT_LEDGER_CAPACITY: usize = 10_000;

#[derive(Debug)]
enum LedgerKey {
    Event(String),
    Session(String),
}

#[derive(Debug, Default)]
struct LedgerInner {
    events: HashSet<String>,
    settled: HashMap<String, SessionStatus>,
    order: VecDeque<LedgerKey>,
}

/// Bounded in-process ledger.
///
/// A session that completed stays completed: a late `expired` for it is a
/// duplicate, while a `completed` arriving after `expired` is still
/// dispatched.
#[derive(Debug)]
pub struct InMemoryEventLedger {
    capacity: usize,
    inner: Mutex<LedgerInner>,
}

impl InMemoryEventLedger {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_LEDGER_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            inner: Mutex::new(LedgerInner::default()),
        }
    }

    pub fn len(&self) -> usize {
        self.inner.lock().map(|inner| inner.order.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for InMemoryEventLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl LedgerInner {
    fn evict_to(&mut self, capacity: usize) {
        while self.order.len() > capacity {
            match self.order.pop_front() {
                Some(LedgerKey::Event(id)) => {
                    self.events.remove(&id);
                }
                Some(LedgerKey::Session(id)) => {
                    self.settled.remove(&id);
                }
                None => break,
            }
        }
    }
}

impl EventLedger for InMemoryEventLedger {
    fn record(&self, event: &WebhookEvent) -> BookingResult<Delivery> {
        let mut inner = self
            .inner
            .lock()
            .map_err(|_| BookingError::Internal("event ledger lock poisoned".to_string()))?;

        if inner.events.contains(&event.event_id) {
            return Ok(Delivery::Duplicate);
        }
        inner.events.insert(event.event_id.clone());
        inner.order.push_back(LedgerKey::Event(event.event_id.clone()));

        let mut delivery = Delivery::First;
        if let (Some(outcome), Some(session_id)) =
            (event.event_type.settles_as(), event.session.id.as_ref())
        {
            let previous = inner.settled.get(session_id).copied();
            let stale = match (previous, outcome) {
                (Some(SessionStatus::Complete), _) => true,
                (Some(SessionStatus::Expired), SessionStatus::Expired) => true,
                _ => false,
            };
            if stale {
                delivery = Delivery::Duplicate;
            } else {
                if previous.is_none() {
                    inner.order.push_back(LedgerKey::Session(session_id.clone()));
                }
                inner.settled.insert(session_id.clone(), outcome);
            }
        }

        let capacity = self.capacity;
        inner.evict_to(capacity);
        Ok(delivery)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(id: &str, event_type: &str, session_id: &str) -> WebhookEvent {
        WebhookEvent {
            event_id: id.to_string(),
            event_type: WebhookEventType::parse(event_type),
            session: SessionObject {
                id: Some(session_id.to_string()),
                ..Default::default()
            },
            created: Utc::now(),
        }
    }

    #[test]
    fn test_event_type_parsing() {
        assert_eq!(
            WebhookEventType::parse("checkout.session.completed"),
            WebhookEventType::CheckoutSessionCompleted
        );
        assert_eq!(
            WebhookEventType::parse("invoice.paid"),
            WebhookEventType::Unknown("invoice.paid".to_string())
        );
        assert_eq!(WebhookEventType::CheckoutSessionExpired.to_string(), "checkout.session.expired");
    }

    #[test]
    fn test_redelivered_event_is_duplicate() {
        let ledger = InMemoryEventLedger::new();
        let completed = event("evt_1", "checkout.session.completed", "cs_1");
        assert_eq!(ledger.record(&completed).unwrap(), Delivery::First);
        assert_eq!(ledger.record(&completed).unwrap(), Delivery::Duplicate);
    }

    #[test]
    fn test_second_completion_for_session_is_duplicate() {
        let ledger = InMemoryEventLedger::new();
        let first = event("evt_1", "checkout.session.completed", "cs_1");
        let second = event("evt_2", "checkout.session.completed", "cs_1");
        assert_eq!(ledger.record(&first).unwrap(), Delivery::First);
        assert_eq!(ledger.record(&second).unwrap(), Delivery::Duplicate);
    }

    #[test]
    fn test_out_of_order_outcomes() {
        let ledger = InMemoryEventLedger::new();
        // expired then completed: completion still goes through
        assert_eq!(
            ledger.record(&event("evt_1", "checkout.session.expired", "cs_1")).unwrap(),
            Delivery::First
        );
        assert_eq!(
            ledger.record(&event("evt_2", "checkout.session.completed", "cs_1")).unwrap(),
            Delivery::First
        );
        // completed then expired: the late expiry is stale
        assert_eq!(
            ledger.record(&event("evt_3", "checkout.session.expired", "cs_1")).unwrap(),
            Delivery::Duplicate
        );
    }

    #[test]
    fn test_unknown_events_only_dedupe_on_event_id() {
        let ledger = InMemoryEventLedger::new();
        assert_eq!(
            ledger.record(&event("evt_1", "charge.refunded", "cs_1")).unwrap(),
            Delivery::First
        );
        assert_eq!(
            ledger.record(&event("evt_2", "charge.refunded", "cs_1")).unwrap(),
            Delivery::First
        );
    }

    #[test]
    fn test_capacity_evicts_oldest() {
        let ledger = InMemoryEventLedger::with_capacity(2);
        ledger.record(&event("evt_1", "charge.refunded", "cs_1")).unwrap();
        ledger.record(&event("evt_2", "charge.refunded", "cs_2")).unwrap();
        ledger.record(&event("evt_3", "charge.refunded", "cs_3")).unwrap();
        assert_eq!(ledger.len(), 2);
        // evt_1 fell out of the window
        assert_eq!(
            ledger.record(&event("evt_1", "charge.refunded", "cs_1")).unwrap(),
            Delivery::First
        );
    }
}
