//! # travel-checkout
//!
//! Payment backend for the travel agency booking site.
//!
//! ## Usage
//!
//! ```bash
//! # Set environment variables
//! export STRIPE_SECRET_KEY=sk_test_...
//! export STRIPE_WEBHOOK_SECRET=whsec_...
//! export FRONTEND_URL=https://zeetrivago.travel
//!
//! # Run the server (LOG_FORMAT=json for structured logs)
//! travel-checkout
//! ```

use booking_api::{routes, state::AppState};
use booking_stripe::REQUIRED_WEBHOOK_EVENTS;
use tracing::{info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok(); // Load .env file if present
    init_tracing();

    let state = AppState::new()?;

    let addr = state.config.socket_addr()?;
    let is_prod = state.config.is_production();

    info!("Environment: {}", state.config.environment);
    info!(
        "Packages loaded: {} (strict pricing: {})",
        state.pricing.catalog().active_packages().count(),
        state.pricing.is_strict()
    );
    info!(
        "Payment provider: {} (configured: {})",
        state.provider.provider_name(),
        state.provider.is_configured()
    );

    let app = routes::create_router(state);

    info!("Travel checkout listening on http://{}", addr);

    if !is_prod {
        info!("Checkout: POST http://{}/api/payment/create-checkout-session", addr);
        info!("Webhook: POST http://{}/api/payment/webhook", addr);
        info!("Webhook events to enable: {}", REQUIRED_WEBHOOK_EVENTS.join(", "));
    }

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::builder()
        .with_default_directive(Level::INFO.into())
        .from_env_lossy();

    let json = std::env::var("LOG_FORMAT").is_ok_and(|format| format == "json");

    if json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(fmt::layer())
            .with(filter)
            .init();
    }
}
