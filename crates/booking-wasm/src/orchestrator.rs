//! # Payment Orchestrator
//!
//! Browser-side booking flow for one page load:
//!
//! ```text
//! Idle ──book_now──▶ Submitting ──ok──▶ AwaitingRedirect (page ends)
//!  ▲                     │
//!  └────────err──────────┘
//!
//! Idle ──on_page_load──▶ ShowingSuccess | ShowingCancelled ──acknowledge──▶ Idle
//! ```
//!
//! The browser is reached only through the `CheckoutApi`, `Browser`,
//! `Notifier` and `BookControl` traits, so the whole flow runs natively in
//! tests.

use async_trait::async_trait;
use booking_core::currency::normalize_code;
use booking_core::{
    round_for_currency, strip_payment_params, CheckoutRequest, Package, PaymentReturn, RateTable,
};
use serde::Deserialize;
use std::cell::RefCell;
use thiserror::Error;

/// Successful reply of the create-checkout-session route
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutResponse {
    pub session_id: String,
    pub url: String,
}

/// Why a booking attempt failed on the client
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ClientError {
    #[error("Unsupported currency: {0}")]
    UnsupportedCurrency(String),

    #[error("Network error: {0}")]
    Network(String),

    /// Non-2xx reply; `message` is the server's human-readable error
    #[error("{message}")]
    Server { status: u16, message: String },

    #[error("Unexpected response: {0}")]
    InvalidResponse(String),
}

/// Error body returned by the API: `{error, code, message?}`
#[derive(Debug, Deserialize)]
struct ServerErrorBody {
    error: String,
    #[serde(default)]
    message: Option<String>,
}

impl ClientError {
    /// Build from a non-2xx status and its body
    pub fn from_response(status: u16, body: &str) -> Self {
        let message = match serde_json::from_str::<ServerErrorBody>(body) {
            Ok(ServerErrorBody {
                error,
                message: Some(detail),
            }) => format!("{}: {}", error, detail),
            Ok(ServerErrorBody { error, .. }) => error,
            Err(_) => format!("Request failed with status {}", status),
        };
        ClientError::Server { status, message }
    }
}

/// Create-session call to the backend
#[async_trait(?Send)]
pub trait CheckoutApi {
    async fn create_checkout_session(
        &self,
        request: &CheckoutRequest,
    ) -> Result<CheckoutResponse, ClientError>;
}

/// Page location access
pub trait Browser {
    fn current_url(&self) -> String;

    /// Full-page navigation
    fn redirect(&self, url: &str);

    /// Rewrite the visible URL without reloading
    fn replace_url(&self, url: &str);
}

/// User-facing feedback
pub trait Notifier {
    fn success(&self, message: &str);
    fn info(&self, message: &str);
    fn error(&self, message: &str);
}

/// The "Book Now" control that triggered a booking
pub trait BookControl {
    fn set_enabled(&self, enabled: bool);
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum WidgetState {
    #[default]
    Idle,
    /// Create-session request in flight
    Submitting,
    /// Browser sent to the hosted payment page
    AwaitingRedirect { url: String },
    ShowingSuccess { session_id: String },
    ShowingCancelled,
}

/// Result of a `book_now` call
#[derive(Debug, Clone, PartialEq)]
pub enum BookOutcome {
    Redirected { url: String },
    Failed(ClientError),
    /// Another booking is in progress (or the page is leaving)
    Ignored,
}

pub struct PaymentOrchestrator<A, B, N> {
    api: A,
    browser: B,
    notifier: N,
    rates: RateTable,
    state: RefCell<WidgetState>,
}

impl<A, B, N> PaymentOrchestrator<A, B, N>
where
    A: CheckoutApi,
    B: Browser,
    N: Notifier,
{
    pub fn new(api: A, browser: B, notifier: N, rates: RateTable) -> Self {
        Self {
            api,
            browser,
            notifier,
            rates,
            state: RefCell::new(WidgetState::Idle),
        }
    }

    pub fn state(&self) -> WidgetState {
        self.state.borrow().clone()
    }

    pub fn browser(&self) -> &B {
        &self.browser
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    pub fn rates(&self) -> &RateTable {
        &self.rates
    }

    pub fn set_rates(&mut self, rates: RateTable) {
        self.rates = rates;
    }

    fn set_state(&self, state: WidgetState) {
        *self.state.borrow_mut() = state;
    }

    /// Build the request for a package priced in `currency`
    pub fn checkout_request(
        &self,
        package: &Package,
        currency: &str,
    ) -> Result<CheckoutRequest, ClientError> {
        let code = normalize_code(currency);
        if !self.rates.supports(&code) {
            return Err(ClientError::UnsupportedCurrency(code));
        }

        let converted = self.rates.from_base(package.price_base_currency, &code);
        let amount = round_for_currency(converted, &code);
        Ok(CheckoutRequest::new(&package.id, &package.name, amount).with_currency(code))
    }

    /// "Book Now": create a session and send the browser to it
    pub async fn book_now(
        &self,
        package: &Package,
        currency: &str,
        control: &dyn BookControl,
    ) -> BookOutcome {
        {
            let mut state = self.state.borrow_mut();
            if *state != WidgetState::Idle {
                return BookOutcome::Ignored;
            }
            *state = WidgetState::Submitting;
        }
        control.set_enabled(false);

        let result = match self.checkout_request(package, currency) {
            Ok(request) => self.api.create_checkout_session(&request).await,
            Err(e) => Err(e),
        };

        match result {
            Ok(response) => {
                self.set_state(WidgetState::AwaitingRedirect {
                    url: response.url.clone(),
                });
                self.browser.redirect(&response.url);
                BookOutcome::Redirected { url: response.url }
            }
            Err(e) => {
                control.set_enabled(true);
                self.notifier
                    .error(&format!("Could not start checkout: {}", e));
                self.set_state(WidgetState::Idle);
                BookOutcome::Failed(e)
            }
        }
    }

    /// Inspect the return-trip query and show the outcome
    pub fn on_page_load(&self) -> Option<PaymentReturn> {
        let url = self.browser.current_url();
        let payment = PaymentReturn::from_url(&url)?;

        match &payment {
            PaymentReturn::Success { session_id } => {
                self.notifier
                    .success("Payment successful! Your booking is confirmed.");
                self.set_state(WidgetState::ShowingSuccess {
                    session_id: session_id.clone(),
                });
            }
            PaymentReturn::Cancelled => {
                self.notifier
                    .info("Payment was cancelled. You can book again anytime.");
                self.set_state(WidgetState::ShowingCancelled);
            }
        }

        self.browser.replace_url(&strip_payment_params(&url));
        Some(payment)
    }

    /// Dismiss a success/cancellation notice
    pub fn acknowledge(&self) {
        let showing = matches!(
            *self.state.borrow(),
            WidgetState::ShowingSuccess { .. } | WidgetState::ShowingCancelled
        );
        if showing {
            self.set_state(WidgetState::Idle);
        }
    }
}

#[cfg(all(test, not(target_arch = "wasm32")))]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[derive(Default)]
    struct FakeApi {
        fail_with: Option<ClientError>,
        requests: RefCell<Vec<CheckoutRequest>>,
    }

    #[async_trait(?Send)]
    impl CheckoutApi for FakeApi {
        async fn create_checkout_session(
            &self,
            request: &CheckoutRequest,
        ) -> Result<CheckoutResponse, ClientError> {
            self.requests.borrow_mut().push(request.clone());
            match &self.fail_with {
                Some(e) => Err(e.clone()),
                None => Ok(CheckoutResponse {
                    session_id: "cs_test_1".into(),
                    url: "https://checkout.stripe.com/c/pay/cs_test_1".into(),
                }),
            }
        }
    }

    #[derive(Default)]
    struct FakeBrowser {
        url: RefCell<String>,
        redirects: RefCell<Vec<String>>,
    }

    impl Browser for FakeBrowser {
        fn current_url(&self) -> String {
            self.url.borrow().clone()
        }

        fn redirect(&self, url: &str) {
            self.redirects.borrow_mut().push(url.to_string());
        }

        fn replace_url(&self, url: &str) {
            *self.url.borrow_mut() = url.to_string();
        }
    }

    #[derive(Default)]
    struct FakeNotifier {
        messages: RefCell<Vec<(&'static str, String)>>,
    }

    impl Notifier for FakeNotifier {
        fn success(&self, message: &str) {
            self.messages.borrow_mut().push(("success", message.into()));
        }

        fn info(&self, message: &str) {
            self.messages.borrow_mut().push(("info", message.into()));
        }

        fn error(&self, message: &str) {
            self.messages.borrow_mut().push(("error", message.into()));
        }
    }

    struct Button(Cell<bool>);

    impl BookControl for Button {
        fn set_enabled(&self, enabled: bool) {
            self.0.set(enabled);
        }
    }

    fn bali() -> Package {
        Package::new("7", "Bali Escape", 1499.0)
    }

    fn orchestrator(api: FakeApi) -> PaymentOrchestrator<FakeApi, FakeBrowser, FakeNotifier> {
        PaymentOrchestrator::new(
            api,
            FakeBrowser::default(),
            FakeNotifier::default(),
            RateTable::default(),
        )
    }

    #[test]
    fn test_checkout_request_converts_price() {
        let o = orchestrator(FakeApi::default());

        let usd = o.checkout_request(&bali(), "USD").unwrap();
        assert_eq!(usd.amount, Some(1499.0));

        let eur = o.checkout_request(&bali(), "eur").unwrap();
        assert_eq!(eur.amount, Some(1379.08));
        assert_eq!(eur.currency.as_deref(), Some("EUR"));
        assert_eq!(eur.package_id.as_deref(), Some("7"));

        let jpy = o.checkout_request(&bali(), "JPY").unwrap();
        assert_eq!(jpy.amount, Some(224_101.0));

        assert_eq!(
            o.checkout_request(&bali(), "XYZ").unwrap_err(),
            ClientError::UnsupportedCurrency("XYZ".into())
        );
    }

    #[tokio::test]
    async fn test_book_now_redirects() {
        let o = orchestrator(FakeApi::default());
        let button = Button(Cell::new(true));

        let outcome = o.book_now(&bali(), "USD", &button).await;

        let url = "https://checkout.stripe.com/c/pay/cs_test_1".to_string();
        assert_eq!(outcome, BookOutcome::Redirected { url: url.clone() });
        assert_eq!(o.state(), WidgetState::AwaitingRedirect { url: url.clone() });
        assert_eq!(*o.browser.redirects.borrow(), vec![url]);
        // the page is leaving; the control stays disabled
        assert!(!button.0.get());
    }

    #[tokio::test]
    async fn test_book_now_failure_reenables_control() {
        let o = orchestrator(FakeApi {
            fail_with: Some(ClientError::Server {
                status: 500,
                message: "Failed to create checkout session: card declined".into(),
            }),
            ..Default::default()
        });
        let button = Button(Cell::new(true));

        let outcome = o.book_now(&bali(), "USD", &button).await;

        assert!(matches!(outcome, BookOutcome::Failed(_)));
        assert_eq!(o.state(), WidgetState::Idle);
        assert!(button.0.get());
        assert!(o.browser.redirects.borrow().is_empty());

        let messages = o.notifier.messages.borrow();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].0, "error");
        assert!(messages[0].1.contains("card declined"));
    }

    #[tokio::test]
    async fn test_book_now_ignored_while_busy() {
        let o = orchestrator(FakeApi::default());
        let button = Button(Cell::new(true));

        o.book_now(&bali(), "USD", &button).await;
        let second = o.book_now(&bali(), "USD", &button).await;

        assert_eq!(second, BookOutcome::Ignored);
        assert_eq!(o.api.requests.borrow().len(), 1);
    }

    #[tokio::test]
    async fn test_unsupported_currency_never_calls_api() {
        let o = orchestrator(FakeApi::default());
        let button = Button(Cell::new(true));

        let outcome = o.book_now(&bali(), "XYZ", &button).await;

        assert!(matches!(
            outcome,
            BookOutcome::Failed(ClientError::UnsupportedCurrency(_))
        ));
        assert!(o.api.requests.borrow().is_empty());
        assert!(button.0.get());
    }

    #[test]
    fn test_page_load_success_strips_params() {
        let o = orchestrator(FakeApi::default());
        *o.browser.url.borrow_mut() =
            "https://zeetrivago.travel/?payment=success&session_id=cs_test_1#packages".into();

        let payment = o.on_page_load();

        assert_eq!(
            payment,
            Some(PaymentReturn::Success {
                session_id: "cs_test_1".into()
            })
        );
        assert_eq!(
            o.state(),
            WidgetState::ShowingSuccess {
                session_id: "cs_test_1".into()
            }
        );
        assert_eq!(o.browser.current_url(), "https://zeetrivago.travel/#packages");
        assert_eq!(o.notifier.messages.borrow()[0].0, "success");

        o.acknowledge();
        assert_eq!(o.state(), WidgetState::Idle);
    }

    #[test]
    fn test_page_load_cancelled() {
        let o = orchestrator(FakeApi::default());
        *o.browser.url.borrow_mut() = "https://zeetrivago.travel/?lang=en&payment=cancelled".into();

        assert_eq!(o.on_page_load(), Some(PaymentReturn::Cancelled));
        assert_eq!(o.state(), WidgetState::ShowingCancelled);
        assert_eq!(o.browser.current_url(), "https://zeetrivago.travel/?lang=en");
        assert_eq!(o.notifier.messages.borrow()[0].0, "info");
    }

    #[test]
    fn test_page_load_without_params_does_nothing() {
        let o = orchestrator(FakeApi::default());
        *o.browser.url.borrow_mut() = "https://zeetrivago.travel/?lang=en".into();

        assert_eq!(o.on_page_load(), None);
        assert_eq!(o.state(), WidgetState::Idle);
        assert_eq!(o.browser.current_url(), "https://zeetrivago.travel/?lang=en");
        assert!(o.notifier.messages.borrow().is_empty());
    }

    #[test]
    fn test_error_body_message() {
        let err = ClientError::from_response(
            400,
            r#"{"error":"Missing required fields: amount","code":"invalid_request"}"#,
        );
        assert_eq!(err.to_string(), "Missing required fields: amount");

        let err = ClientError::from_response(
            500,
            r#"{"error":"Failed to create checkout session","code":"payment_provider_error","message":"declined"}"#,
        );
        assert_eq!(err.to_string(), "Failed to create checkout session: declined");

        let err = ClientError::from_response(502, "<html>Bad Gateway</html>");
        assert_eq!(err.to_string(), "Request failed with status 502");
    }
}
