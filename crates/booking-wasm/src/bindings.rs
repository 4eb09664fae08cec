//! Browser implementations of the orchestrator seams, and the exported
//! `PaymentWidget` class.

use crate::orchestrator::{
    BookControl, BookOutcome, Browser, CheckoutApi, CheckoutResponse, ClientError, Notifier,
    PaymentOrchestrator,
};
use async_trait::async_trait;
use booking_core::{
    CheckoutRequest, CurrencyPreference, Package, PaymentReturn, PreferenceStore, RateTable,
};
use std::rc::Rc;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::{future_to_promise, JsFuture};
use web_sys::{Element, HtmlButtonElement, Request, RequestInit, RequestMode, Response, Window};

fn window() -> Result<Window, JsValue> {
    web_sys::window().ok_or_else(|| JsValue::from_str("No window available"))
}

fn js_message(value: JsValue) -> String {
    value
        .as_string()
        .or_else(|| {
            value
                .dyn_ref::<js_sys::Error>()
                .map(|e| String::from(e.message()))
        })
        .unwrap_or_else(|| format!("{:?}", value))
}

/// `fetch`-backed client for the backend API
pub struct FetchCheckoutApi {
    api_base: String,
}

impl FetchCheckoutApi {
    pub fn new(api_base: impl Into<String>) -> Self {
        Self {
            api_base: api_base.into().trim_end_matches('/').to_string(),
        }
    }

    async fn post_json(&self, path: &str, body: String) -> Result<(u16, String), JsValue> {
        let opts = RequestInit::new();
        opts.set_method("POST");
        opts.set_mode(RequestMode::Cors);
        opts.set_body(&JsValue::from_str(&body));

        let url = format!("{}{}", self.api_base, path);
        let request = Request::new_with_str_and_init(&url, &opts)?;
        request.headers().set("Content-Type", "application/json")?;

        let response: Response = JsFuture::from(window()?.fetch_with_request(&request))
            .await?
            .dyn_into()?;
        let text = JsFuture::from(response.text()?).await?;

        Ok((response.status(), text.as_string().unwrap_or_default()))
    }
}

#[async_trait(?Send)]
impl CheckoutApi for FetchCheckoutApi {
    async fn create_checkout_session(
        &self,
        request: &CheckoutRequest,
    ) -> Result<CheckoutResponse, ClientError> {
        let body = serde_json::to_string(request)
            .map_err(|e| ClientError::InvalidResponse(e.to_string()))?;

        let (status, text) = self
            .post_json("/payment/create-checkout-session", body)
            .await
            .map_err(|e| ClientError::Network(js_message(e)))?;

        if !(200..300).contains(&status) {
            return Err(ClientError::from_response(status, &text));
        }

        serde_json::from_str(&text).map_err(|e| ClientError::InvalidResponse(e.to_string()))
    }
}

/// `window.location` / `window.history`
pub struct WindowBrowser;

impl Browser for WindowBrowser {
    fn current_url(&self) -> String {
        window()
            .and_then(|w| w.location().href())
            .unwrap_or_default()
    }

    fn redirect(&self, url: &str) {
        if let Err(e) = window().and_then(|w| w.location().set_href(url)) {
            web_sys::console::error_1(&e);
        }
    }

    fn replace_url(&self, url: &str) {
        let result = window()
            .and_then(|w| w.history())
            .and_then(|h| h.replace_state_with_url(&JsValue::NULL, "", Some(url)));
        if let Err(e) = result {
            web_sys::console::error_1(&e);
        }
    }
}

/// Writes into a status element, or falls back to `alert()`
pub struct DomNotifier {
    element: Option<Element>,
}

impl DomNotifier {
    pub fn new(element_id: Option<&str>) -> Self {
        let element = element_id.and_then(|id| {
            web_sys::window()
                .and_then(|w| w.document())
                .and_then(|d| d.get_element_by_id(id))
        });
        Self { element }
    }

    fn show(&self, kind: &str, message: &str) {
        match &self.element {
            Some(element) => {
                element.set_text_content(Some(message));
                element.set_class_name(&format!("payment-status payment-status--{}", kind));
            }
            None => {
                if let Err(e) = window().and_then(|w| w.alert_with_message(message)) {
                    web_sys::console::warn_1(&e);
                }
            }
        }
    }
}

impl Notifier for DomNotifier {
    fn success(&self, message: &str) {
        web_sys::console::log_1(&JsValue::from_str(message));
        self.show("success", message);
    }

    fn info(&self, message: &str) {
        web_sys::console::log_1(&JsValue::from_str(message));
        self.show("info", message);
    }

    fn error(&self, message: &str) {
        web_sys::console::error_1(&JsValue::from_str(message));
        self.show("error", message);
    }
}

impl BookControl for HtmlButtonElement {
    fn set_enabled(&self, enabled: bool) {
        self.set_disabled(!enabled);
    }
}

/// `window.localStorage`; silently empty when storage is blocked
pub struct LocalStorage;

impl PreferenceStore for LocalStorage {
    fn get(&self, key: &str) -> Option<String> {
        window()
            .ok()?
            .local_storage()
            .ok()
            .flatten()?
            .get_item(key)
            .ok()
            .flatten()
    }

    fn set(&self, key: &str, value: &str) {
        if let Some(storage) = window().ok().and_then(|w| w.local_storage().ok().flatten()) {
            if let Err(e) = storage.set_item(key, value) {
                web_sys::console::warn_1(&e);
            }
        }
    }
}

type BrowserOrchestrator = PaymentOrchestrator<FetchCheckoutApi, WindowBrowser, DomNotifier>;

/// Booking widget for the page
///
/// ```javascript
/// const widget = new PaymentWidget('http://localhost:4000/api', 'paymentStatus');
/// widget.onPageLoad();
/// button.onclick = () => widget.bookNow('7', 'Bali Escape', 1499, widget.preferredCurrency(), button);
/// ```
#[wasm_bindgen]
pub struct PaymentWidget {
    orchestrator: Rc<BrowserOrchestrator>,
}

#[wasm_bindgen]
impl PaymentWidget {
    #[wasm_bindgen(constructor)]
    pub fn new(api_base: String, status_element_id: Option<String>) -> PaymentWidget {
        let orchestrator = PaymentOrchestrator::new(
            FetchCheckoutApi::new(api_base),
            WindowBrowser,
            DomNotifier::new(status_element_id.as_deref()),
            RateTable::default(),
        );
        PaymentWidget {
            orchestrator: Rc::new(orchestrator),
        }
    }

    /// Replace the rate table with the JSON served by `GET /api/rates`
    #[wasm_bindgen(js_name = setRates)]
    pub fn set_rates(&mut self, rates_json: &str) -> Result<(), JsValue> {
        let rates: RateTable = serde_json::from_str(rates_json)
            .map_err(|e| JsValue::from_str(&format!("Invalid rate table: {}", e)))?;

        match Rc::get_mut(&mut self.orchestrator) {
            Some(orchestrator) => {
                orchestrator.set_rates(rates);
                Ok(())
            }
            None => Err(JsValue::from_str("Cannot change rates while booking")),
        }
    }

    /// Show the return-trip outcome; `"success"`, `"cancelled"` or undefined
    #[wasm_bindgen(js_name = onPageLoad)]
    pub fn on_page_load(&self) -> Option<String> {
        self.orchestrator.on_page_load().map(|payment| match payment {
            PaymentReturn::Success { .. } => "success".to_string(),
            PaymentReturn::Cancelled => "cancelled".to_string(),
        })
    }

    /// Start checkout; the promise rejects with the failure reason
    #[wasm_bindgen(js_name = bookNow)]
    pub fn book_now(
        &self,
        package_id: String,
        package_name: String,
        base_price: f64,
        currency: String,
        button: HtmlButtonElement,
    ) -> js_sys::Promise {
        let orchestrator = Rc::clone(&self.orchestrator);
        let package = Package::new(package_id, package_name, base_price);

        future_to_promise(async move {
            match orchestrator.book_now(&package, &currency, &button).await {
                BookOutcome::Redirected { url } => Ok(JsValue::from_str(&url)),
                BookOutcome::Ignored => Ok(JsValue::UNDEFINED),
                BookOutcome::Failed(e) => Err(JsValue::from_str(&e.to_string())),
            }
        })
    }

    #[wasm_bindgen]
    pub fn acknowledge(&self) {
        self.orchestrator.acknowledge();
    }

    /// Stored currency choice (base currency by default)
    #[wasm_bindgen(js_name = preferredCurrency)]
    pub fn preferred_currency(&self) -> String {
        CurrencyPreference::new(&LocalStorage, self.orchestrator.rates()).current()
    }

    /// Persist a currency choice; false for unsupported codes
    #[wasm_bindgen(js_name = selectCurrency)]
    pub fn select_currency(&self, code: &str) -> bool {
        CurrencyPreference::new(&LocalStorage, self.orchestrator.rates()).select(code)
    }

    /// Base price shown in the buyer's currency, e.g. "€1,379.08"
    #[wasm_bindgen(js_name = displayPrice)]
    pub fn display_price(&self, base_price: f64, currency: &str) -> String {
        let rates = self.orchestrator.rates();
        booking_core::format_currency(
            booking_core::round_to_cents(rates.from_base(base_price, currency)),
            currency,
        )
    }
}
