//! # Pricing Policy
//!
//! Decides the amount actually charged for a checkout. The browser sends a
//! converted amount, but when the package is in the catalog the server
//! recomputes it from the canonical base-currency price and charges that
//! instead.

use crate::checkout::ValidatedCheckout;
use crate::currency::{decimal_places, round_for_currency, RateTable};
use crate::error::{BookingError, BookingResult};
use crate::package::PackageCatalog;
use tracing::{debug, warn};

/// Where the charged amount came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriceSource {
    /// Recomputed from the catalog's base price
    Catalog,
    /// Package not in the catalog; client amount used as sent
    Client,
}

/// The authoritative charge for one unit
#[derive(Debug, Clone, PartialEq)]
pub struct Charge {
    /// Major units of `currency`
    pub amount: f64,
    /// Upper-case currency code
    pub currency: String,
    pub source: PriceSource,
}

/// Catalog + rates + strictness switch
#[derive(Debug, Clone, Default)]
pub struct PricingPolicy {
    rates: RateTable,
    catalog: PackageCatalog,
    strict: bool,
}

impl PricingPolicy {
    pub fn new(rates: RateTable, catalog: PackageCatalog) -> Self {
        Self {
            rates,
            catalog,
            strict: false,
        }
    }

    /// Builder: reject packages missing from the catalog
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn rates(&self) -> &RateTable {
        &self.rates
    }

    pub fn catalog(&self) -> &PackageCatalog {
        &self.catalog
    }

    pub fn is_strict(&self) -> bool {
        self.strict
    }

    /// Compute the charge for a validated checkout request
    pub fn charge_for(&self, checkout: &ValidatedCheckout) -> BookingResult<Charge> {
        let currency = checkout
            .currency
            .clone()
            .unwrap_or_else(|| self.rates.base().to_string());

        if !self.rates.supports(&currency) {
            return Err(BookingError::InvalidRequest(format!(
                "Unsupported currency: {}",
                currency
            )));
        }

        let Some(package) = self.catalog.get(&checkout.package_id) else {
            if self.strict {
                return Err(BookingError::package_not_found(&checkout.package_id));
            }
            debug!(
                package_id = %checkout.package_id,
                "package not in catalog, charging client amount"
            );
            return Ok(Charge {
                amount: checkout.amount,
                currency,
                source: PriceSource::Client,
            });
        };

        let amount = round_for_currency(
            self.rates.from_base(package.price_base_currency, &currency),
            &currency,
        );
        // one smallest unit of slack: a cent, or a whole yen
        let tolerance = 10_f64.powi(-(decimal_places(&currency) as i32));
        if (amount - checkout.amount).abs() > tolerance {
            warn!(
                package_id = %package.id,
                client_amount = checkout.amount,
                catalog_amount = amount,
                currency = %currency,
                "client amount differs from catalog price, charging catalog price"
            );
        }

        Ok(Charge {
            amount,
            currency,
            source: PriceSource::Catalog,
        })
    }
}
