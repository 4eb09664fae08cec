//! Stripe provider against a mocked Stripe API.

use booking_core::{
    BookingError, CheckoutRequest, CheckoutSessionParams, PaymentProvider, RedirectUrls,
    SessionStatus, WebhookEventType,
};
use booking_stripe::{sign_payload, StripeCheckoutProvider, StripeConfig};
use serde_json::json;
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const SECRET_KEY: &str = "sk_test_mock123";
const WEBHOOK_SECRET: &str = "whsec_mock456";

fn provider(server: &MockServer) -> StripeCheckoutProvider {
    let config = StripeConfig::new(SECRET_KEY, WEBHOOK_SECRET).with_api_base_url(server.uri());
    StripeCheckoutProvider::new(config).unwrap()
}

fn params(amount: f64) -> CheckoutSessionParams {
    let checkout = CheckoutRequest::new("7", "Bali Escape", amount)
        .validate()
        .unwrap();
    CheckoutSessionParams::new(
        &checkout,
        checkout.amount,
        "USD",
        &RedirectUrls::new("https://zeetrivago.travel"),
    )
    .with_idempotency_key("idem-123")
}

#[tokio::test]
async fn test_create_session_posts_form_and_maps_response() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/checkout/sessions"))
        .and(header("Authorization", "Bearer sk_test_mock123"))
        .and(header("Idempotency-Key", "idem-123"))
        .and(body_string_contains("mode=payment"))
        .and(body_string_contains("unit_amount%5D=2000"))
        .and(body_string_contains("price_data%5D%5Bcurrency%5D=usd"))
        .and(body_string_contains("metadata%5BpackageId%5D=7"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "cs_test_abc",
            "object": "checkout.session",
            "url": "https://checkout.stripe.com/c/pay/cs_test_abc",
            "status": "open",
            "payment_status": "unpaid",
            "amount_total": 2000,
            "currency": "usd",
            "expires_at": 1_730_086_400,
            "metadata": { "packageId": "7", "packageName": "Bali Escape" }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let session = provider(&server)
        .create_checkout_session(&params(19.995))
        .await
        .unwrap();

    assert_eq!(session.session_id, "cs_test_abc");
    assert_eq!(session.url, "https://checkout.stripe.com/c/pay/cs_test_abc");
    assert_eq!(session.status, SessionStatus::Pending);
    assert_eq!(session.amount_minor_units, 2000);
    assert!(session.expires_at.is_some());
}

#[tokio::test]
async fn test_create_session_surfaces_stripe_error_message() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/checkout/sessions"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": {
                "type": "invalid_request_error",
                "code": "amount_too_small",
                "message": "Amount must be at least 50 cents"
            }
        })))
        .mount(&server)
        .await;

    let err = provider(&server)
        .create_checkout_session(&params(0.10))
        .await
        .unwrap_err();

    match err {
        BookingError::PaymentProviderError { provider, message } => {
            assert_eq!(provider, "stripe");
            assert_eq!(message, "Amount must be at least 50 cents");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_unconfigured_provider_makes_no_request() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let config = StripeConfig::unconfigured().with_api_base_url(server.uri());
    let provider = StripeCheckoutProvider::new(config).unwrap();

    let err = provider
        .create_checkout_session(&params(1499.0))
        .await
        .unwrap_err();
    assert_eq!(err.status_code(), 500);
    assert_eq!(err.error_code(), "service_not_configured");
}

#[tokio::test]
async fn test_retrieve_session_converts_amount_to_major_units() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/checkout/sessions/cs_test_paid"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "cs_test_paid",
            "status": "complete",
            "payment_status": "paid",
            "customer_details": { "email": "traveler@example.com" },
            "amount_total": 137908,
            "currency": "eur",
            "metadata": { "packageId": "7", "packageName": "Bali Escape" }
        })))
        .mount(&server)
        .await;

    let details = provider(&server)
        .retrieve_session("cs_test_paid")
        .await
        .unwrap();

    assert!(details.is_paid());
    assert_eq!(details.status, SessionStatus::Complete);
    assert_eq!(details.customer_email.as_deref(), Some("traveler@example.com"));
    assert_eq!(details.amount_total, 1379.08);
    assert_eq!(details.metadata.get("packageId").map(String::as_str), Some("7"));
}

#[tokio::test]
async fn test_retrieve_unknown_session_is_not_found() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/checkout/sessions/cs_missing"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "error": {
                "code": "resource_missing",
                "message": "No such checkout.session: 'cs_missing'"
            }
        })))
        .mount(&server)
        .await;

    let err = provider(&server)
        .retrieve_session("cs_missing")
        .await
        .unwrap_err();
    assert!(matches!(err, BookingError::NotFound { .. }));
    assert_eq!(err.status_code(), 404);
}

#[tokio::test]
async fn test_verify_webhook_round_trip() {
    let server = MockServer::start().await;
    let provider = provider(&server);

    let payload = serde_json::to_vec(&json!({
        "id": "evt_live_1",
        "type": "checkout.session.expired",
        "created": chrono::Utc::now().timestamp(),
        "data": { "object": { "id": "cs_test_old", "status": "expired" } }
    }))
    .unwrap();

    let now = chrono::Utc::now().timestamp();
    let header = sign_payload(WEBHOOK_SECRET, now, &payload).unwrap();

    let event = provider.verify_webhook(&payload, &header).await.unwrap();
    assert_eq!(event.event_type, WebhookEventType::CheckoutSessionExpired);
    assert_eq!(event.session.status, SessionStatus::Expired);

    let forged = sign_payload("whsec_attacker", now, &payload).unwrap();
    let err = provider.verify_webhook(&payload, &forged).await.unwrap_err();
    assert!(matches!(err, BookingError::SignatureInvalid(_)));
}

#[tokio::test]
async fn test_yen_amounts_are_whole_units() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/checkout/sessions"))
        .and(body_string_contains("price_data%5D%5Bcurrency%5D=jpy"))
        .and(body_string_contains("unit_amount%5D=224101&"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "cs_test_jpy",
            "url": "https://checkout.stripe.com/c/pay/cs_test_jpy",
            "status": "open",
            "amount_total": 224101,
            "currency": "jpy"
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v1/checkout/sessions/cs_test_jpy"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "cs_test_jpy",
            "status": "complete",
            "payment_status": "paid",
            "amount_total": 224101,
            "currency": "jpy"
        })))
        .mount(&server)
        .await;

    let checkout = CheckoutRequest::new("7", "Bali Escape", 224_100.5)
        .with_currency("JPY")
        .validate()
        .unwrap();
    let params = CheckoutSessionParams::new(
        &checkout,
        checkout.amount,
        "JPY",
        &RedirectUrls::new("https://zeetrivago.travel"),
    );

    let provider = provider(&server);
    let session = provider.create_checkout_session(&params).await.unwrap();
    assert_eq!(session.amount_minor_units, 224_101);
    assert_eq!(session.amount_major_units(), 224_101.0);

    let details = provider.retrieve_session("cs_test_jpy").await.unwrap();
    assert_eq!(details.amount_total, 224_101.0);
}

#[tokio::test]
async fn test_transport_failure_is_provider_error() {
    // a bare (non-pooled) server actually stops listening when dropped
    let server = MockServer::builder().start().await;
    let config = StripeConfig::new(SECRET_KEY, WEBHOOK_SECRET).with_api_base_url(server.uri());
    // nothing listens on the port once the server is gone
    drop(server);

    let provider = StripeCheckoutProvider::new(config).unwrap();

    let err = provider
        .create_checkout_session(&params(1499.0))
        .await
        .unwrap_err();
    assert!(matches!(err, BookingError::PaymentProviderError { .. }));
    assert_eq!(err.status_code(), 500);

    let err = provider.retrieve_session("cs_test_1").await.unwrap_err();
    assert!(matches!(err, BookingError::PaymentProviderError { .. }));
}

#[tokio::test]
async fn test_retrieve_session_server_error_is_provider_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/checkout/sessions/cs_test_busy"))
        .respond_with(ResponseTemplate::new(503).set_body_json(json!({
            "error": { "type": "api_error", "message": "Stripe is temporarily unavailable" }
        })))
        .mount(&server)
        .await;

    let err = provider(&server)
        .retrieve_session("cs_test_busy")
        .await
        .unwrap_err();

    match err {
        BookingError::PaymentProviderError { message, .. } => {
            assert_eq!(message, "Stripe is temporarily unavailable");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}
