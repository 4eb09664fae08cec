//! # Redirect Contract
//!
//! URLs the provider sends the buyer back to, and the parsing of the
//! query string it appends on the return trip:
//!
//! - `?payment=success&session_id=<id>` after a completed payment
//! - `?payment=cancelled` when the buyer backs out

use serde::{Deserialize, Serialize};

/// Placeholder the provider substitutes with the real session ID
pub const SESSION_ID_PLACEHOLDER: &str = "{CHECKOUT_SESSION_ID}";

const PAYMENT_PARAM: &str = "payment";
const SESSION_ID_PARAM: &str = "session_id";

/// Success and cancel redirect targets built from the frontend origin
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedirectUrls {
    /// Frontend origin (e.g., "https://zeetrivago.travel")
    pub frontend_url: String,
}

impl RedirectUrls {
    pub fn new(frontend_url: impl Into<String>) -> Self {
        Self {
            frontend_url: frontend_url.into(),
        }
    }

    fn with_query(&self, query: &str) -> String {
        let separator = if self.frontend_url.contains('?') { '&' } else { '?' };
        format!("{}{}{}", self.frontend_url, separator, query)
    }

    /// Success URL with the provider's session ID placeholder
    pub fn success_url(&self) -> String {
        self.with_query(&format!(
            "{}=success&{}={}",
            PAYMENT_PARAM, SESSION_ID_PARAM, SESSION_ID_PLACEHOLDER
        ))
    }

    pub fn cancel_url(&self) -> String {
        self.with_query(&format!("{}=cancelled", PAYMENT_PARAM))
    }
}

impl Default for RedirectUrls {
    fn default() -> Self {
        Self::new("http://localhost:5500")
    }
}

/// Outcome reported by the provider on the return trip
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "payment", rename_all = "snake_case")]
pub enum PaymentReturn {
    Success { session_id: String },
    Cancelled,
}

impl PaymentReturn {
    /// Parse a query string (with or without the leading `?`)
    pub fn from_query(query: &str) -> Option<Self> {
        let query = query.strip_prefix('?').unwrap_or(query);
        let pairs: Vec<(String, String)> = serde_urlencoded::from_str(query).ok()?;

        let lookup = |name: &str| {
            pairs
                .iter()
                .find(|(key, _)| key == name)
                .map(|(_, value)| value.as_str())
        };

        match lookup(PAYMENT_PARAM)? {
            "success" => lookup(SESSION_ID_PARAM)
                .filter(|id| !id.is_empty())
                .map(|id| PaymentReturn::Success {
                    session_id: id.to_string(),
                }),
            "cancelled" => Some(PaymentReturn::Cancelled),
            _ => None,
        }
    }

    /// Parse the query portion of a full URL
    pub fn from_url(url: &str) -> Option<Self> {
        let without_fragment = url.split('#').next().unwrap_or(url);
        let (_, query) = without_fragment.split_once('?')?;
        Self::from_query(query)
    }
}

/// Remove the `payment` and `session_id` parameters from a URL.
///
/// Other parameters keep their original encoding and order; the fragment is
/// preserved and the `?` disappears when no parameters remain.
pub fn strip_payment_params(url: &str) -> String {
    let (without_fragment, fragment) = match url.split_once('#') {
        Some((head, frag)) => (head, Some(frag)),
        None => (url, None),
    };

    let (path, query) = match without_fragment.split_once('?') {
        Some((path, query)) => (path, query),
        None => return url.to_string(),
    };

    let kept: Vec<&str> = query
        .split('&')
        .filter(|segment| !segment.is_empty())
        .filter(|segment| {
            let key = segment.split('=').next().unwrap_or(*segment);
            key != PAYMENT_PARAM && key != SESSION_ID_PARAM
        })
        .collect();

    let mut stripped = path.to_string();
    if !kept.is_empty() {
        stripped.push('?');
        stripped.push_str(&kept.join("&"));
    }
    if let Some(fragment) = fragment {
        stripped.push('#');
        stripped.push_str(fragment);
    }
    stripped
}
