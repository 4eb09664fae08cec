//! # Application State
//!
//! Shared state for the Axum application.
//! Everything here is immutable after startup except the event ledger,
//! which guards its own interior state.

use crate::config::AppConfig;
use booking_core::{
    BoxedPaymentProvider, EventLedger, InMemoryEventLedger, PackageCatalog, PricingPolicy,
    RedirectUrls,
};
use booking_stripe::{BookingHandler, LoggingBookingHandler, StripeCheckoutProvider};
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Hosted-checkout provider
    pub provider: BoxedPaymentProvider,
    /// Authoritative server-side pricing
    pub pricing: Arc<PricingPolicy>,
    /// Success/cancel redirect targets
    pub urls: RedirectUrls,
    /// Webhook idempotency store
    pub ledger: Arc<dyn EventLedger>,
    /// Reaction to verified webhook events
    pub bookings: Arc<dyn BookingHandler>,
    /// Application config
    pub config: AppConfig,
}

impl AppState {
    /// Create a new AppState with the Stripe provider, configured from the environment
    pub fn new() -> anyhow::Result<Self> {
        let config = AppConfig::from_env();

        let catalog = load_package_catalog(&config.catalog_path)?;
        let rates = catalog.rates.clone().unwrap_or_default();
        let pricing = PricingPolicy::new(rates, catalog).strict(config.strict_pricing);

        let provider = StripeCheckoutProvider::from_env()
            .map_err(|e| anyhow::anyhow!("Failed to initialize Stripe: {}", e))?;
        if !provider.config().has_secret_key() {
            warn!("STRIPE_SECRET_KEY not set; payment routes will answer 500");
        }
        if !provider.config().has_webhook_secret() {
            warn!("STRIPE_WEBHOOK_SECRET not set; webhook route will answer 500");
        }

        Ok(Self::with_provider(config, Arc::new(provider), pricing))
    }

    /// Assemble state around an explicit provider (tests, alternative providers)
    pub fn with_provider(
        config: AppConfig,
        provider: BoxedPaymentProvider,
        pricing: PricingPolicy,
    ) -> Self {
        Self {
            provider,
            pricing: Arc::new(pricing),
            urls: RedirectUrls::new(&config.frontend_url),
            ledger: Arc::new(InMemoryEventLedger::new()),
            bookings: Arc::new(LoggingBookingHandler),
            config,
        }
    }

    /// Builder: replace the webhook booking handler
    pub fn with_booking_handler(mut self, handler: Arc<dyn BookingHandler>) -> Self {
        self.bookings = handler;
        self
    }

    /// Builder: replace the event ledger
    pub fn with_ledger(mut self, ledger: Arc<dyn EventLedger>) -> Self {
        self.ledger = ledger;
        self
    }
}

/// Load the package catalog; a missing file yields an empty catalog
pub fn load_package_catalog(path: &Path) -> anyhow::Result<PackageCatalog> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            warn!(
                "No package catalog at {}, using empty catalog",
                path.display()
            );
            return Ok(PackageCatalog::new());
        }
        Err(e) => return Err(anyhow::anyhow!("Failed to read {}: {}", path.display(), e)),
    };

    let catalog = PackageCatalog::from_toml(&content)
        .map_err(|e| anyhow::anyhow!("Failed to parse {}: {}", path.display(), e))?;
    info!("Loaded {} packages from {}", catalog.len(), path.display());
    Ok(catalog)
}
