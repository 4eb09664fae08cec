//! # Routes
//!
//! Axum router configuration for the booking payment API.

use crate::handlers;
use crate::state::AppState;
use axum::{
    http::{HeaderValue, Request},
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{info_span, warn};
use uuid::Uuid;

/// Create the main application router
///
/// Routes:
/// - GET  /health
/// - POST /api/payment/create-checkout-session
/// - POST /api/payment/webhook (raw body)
/// - GET  /api/payment/session/{session_id}
/// - GET  /api/packages
/// - GET  /api/rates
pub fn create_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config.cors_allowed_origins);

    let payment_routes = Router::new()
        .route(
            "/create-checkout-session",
            post(handlers::create_checkout_session),
        )
        .route("/webhook", post(handlers::stripe_webhook))
        .route("/session/{session_id}", get(handlers::get_session));

    let api_routes = Router::new()
        .nest("/payment", payment_routes)
        .route("/packages", get(handlers::list_packages))
        .route("/rates", get(handlers::rates));

    Router::new()
        .route("/health", get(handlers::health))
        .nest("/api", api_routes)
        // Middleware (outermost first)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http().make_span_with(
                    |request: &Request<_>| {
                        info_span!(
                            "http",
                            method = %request.method(),
                            path = %request.uri().path(),
                            request_id = %Uuid::new_v4(),
                        )
                    },
                ))
                .layer(cors),
        )
        // State
        .with_state(state)
}

/// CORS allowlist; no configured origins allows any origin
fn cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);

    if origins.is_empty() {
        return layer.allow_origin(Any);
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    layer.allow_origin(AllowOrigin::list(allowed))
}
