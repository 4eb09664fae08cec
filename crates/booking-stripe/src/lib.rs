//! # booking-stripe
//!
//! Stripe Checkout provider for travel-checkout-rs.
//!
//! `StripeCheckoutProvider` implements `booking_core::PaymentProvider`
//! against the Checkout Sessions API: one hosted, single-use payment page
//! per booked travel package.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use booking_stripe::StripeCheckoutProvider;
//! use booking_core::PaymentProvider;
//!
//! // Missing keys are fine here; calls fail with ServiceNotConfigured
//! let provider = StripeCheckoutProvider::from_env()?;
//!
//! let session = provider.create_checkout_session(&params).await?;
//! // Redirect the buyer to session.url
//! ```
//!
//! ## Webhook Handling
//!
//! ```rust,ignore
//! use booking_stripe::{dispatch_webhook_event, BookingConfirmation, BookingHandler};
//!
//! struct Bookings;
//!
//! impl BookingHandler for Bookings {
//!     fn on_checkout_completed(&self, confirmation: BookingConfirmation) -> BookingResult<()> {
//!         // Record the booking, email the traveler
//!         Ok(())
//!     }
//! }
//!
//! // In your webhook endpoint:
//! let event = provider.verify_webhook(&body, signature).await?;
//! dispatch_webhook_event(&Bookings, &ledger, event);
//! ```

pub mod checkout;
pub mod config;
pub mod signature;
mod types;
pub mod webhook;

// Re-exports
pub use checkout::StripeCheckoutProvider;
pub use config::StripeConfig;
pub use signature::{sign_payload, verify_signature, DEFAULT_TOLERANCE_SECS};
pub use webhook::{
    dispatch_webhook_event, parse_event, BookingConfirmation, BookingHandler, DispatchOutcome,
    LoggingBookingHandler, REQUIRED_WEBHOOK_EVENTS,
};
