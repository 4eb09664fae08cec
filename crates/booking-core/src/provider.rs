//! # Payment Provider Trait
//!
//! The seam between the HTTP handlers and a hosted-checkout provider.
//! A constructed provider is injected into application state as
//! `Arc<dyn PaymentProvider>`, so tests swap in a fake without network
//! access.
//!
//! ```text
//! ┌──────────────────────────────────────────┐
//! │         PaymentProvider (trait)          │
//! │  ├── create_checkout_session()           │
//! │  ├── retrieve_session()                  │
//! │  ├── verify_webhook()                    │
//! │  └── provider_name() / is_configured()   │
//! └──────────────────────────────────────────┘
//!                     ▲
//!            ┌────────┴────────┐
//!            │ StripeCheckout  │
//!            │    Provider     │
//!            └─────────────────┘
//! ```

use crate::checkout::{CheckoutSession, CheckoutSessionParams, SessionDetails};
use crate::error::BookingResult;
use crate::events::WebhookEvent;
use async_trait::async_trait;
use std::sync::Arc;

#[async_trait]
pub trait PaymentProvider: Send + Sync {
    /// Create a hosted, single-use, payment-mode session.
    ///
    /// Fails with `ServiceNotConfigured` before any I/O when the provider
    /// credential is missing.
    async fn create_checkout_session(
        &self,
        params: &CheckoutSessionParams,
    ) -> BookingResult<CheckoutSession>;

    /// Look up a session by ID; `NotFound` if the provider has none.
    async fn retrieve_session(&self, session_id: &str) -> BookingResult<SessionDetails>;

    /// Verify the signature over the exact raw body and parse the event.
    async fn verify_webhook(&self, payload: &[u8], signature: &str) -> BookingResult<WebhookEvent>;

    /// Provider name (for logging and error attribution)
    fn provider_name(&self) -> &'static str;

    /// Whether the API credential is present
    fn is_configured(&self) -> bool {
        true
    }
}

/// Type alias for a shared payment provider (dynamic dispatch)
pub type BoxedPaymentProvider = Arc<dyn PaymentProvider>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checkout::{BookingMetadata, CheckoutRequest, SessionStatus};
    use crate::error::BookingError;
    use crate::redirect::RedirectUrls;

    struct Unconfigured;

    #[async_trait]
    impl PaymentProvider for Unconfigured {
        async fn create_checkout_session(
            &self,
            _params: &CheckoutSessionParams,
        ) -> BookingResult<CheckoutSession> {
            Err(BookingError::ServiceNotConfigured("no key".into()))
        }

        async fn retrieve_session(&self, session_id: &str) -> BookingResult<SessionDetails> {
            Err(BookingError::session_not_found(session_id))
        }

        async fn verify_webhook(&self, _payload: &[u8], _signature: &str) -> BookingResult<WebhookEvent> {
            Err(BookingError::SignatureInvalid("no secret".into()))
        }

        fn provider_name(&self) -> &'static str {
            "unconfigured"
        }

        fn is_configured(&self) -> bool {
            false
        }
    }

    struct Echo;

    #[async_trait]
    impl PaymentProvider for Echo {
        async fn create_checkout_session(
            &self,
            params: &CheckoutSessionParams,
        ) -> BookingResult<CheckoutSession> {
            Ok(CheckoutSession {
                session_id: "cs_echo".into(),
                url: "https://checkout.stripe.com/c/pay/cs_echo".into(),
                status: SessionStatus::Pending,
                metadata: params.metadata.clone(),
                currency: params.currency.clone(),
                amount_minor_units: params.amount_total(),
                expires_at: None,
            })
        }

        async fn retrieve_session(&self, session_id: &str) -> BookingResult<SessionDetails> {
            Err(BookingError::session_not_found(session_id))
        }

        async fn verify_webhook(&self, _payload: &[u8], _signature: &str) -> BookingResult<WebhookEvent> {
            Err(BookingError::SignatureInvalid("mismatch".into()))
        }

        fn provider_name(&self) -> &'static str {
            "echo"
        }
    }

    #[tokio::test]
    async fn test_boxed_provider_dispatch() {
        let provider: BoxedPaymentProvider = Arc::new(Echo);
        let checkout = CheckoutRequest::new("7", "Bali Escape", 1499.0).validate().unwrap();
        let params = CheckoutSessionParams::new(&checkout, 1499.0, "USD", &RedirectUrls::default());

        let session = provider.create_checkout_session(&params).await.unwrap();
        assert_eq!(session.amount_minor_units, 149_900);
        assert_eq!(session.metadata, BookingMetadata::new("7", "Bali Escape"));
        assert!(provider.is_configured());
    }

    #[tokio::test]
    async fn test_unconfigured_provider() {
        let provider: BoxedPaymentProvider = Arc::new(Unconfigured);
        assert!(!provider.is_configured());
        let err = provider.retrieve_session("cs_missing").await.unwrap_err();
        assert_eq!(err.status_code(), 404);
    }
}
