//! # Travel Packages
//!
//! Package reference data. Packages are loaded from `config/packages.toml`
//! and never modified at runtime.

use crate::currency::RateTable;
use serde::{Deserialize, Serialize};

/// A bookable travel package
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Package {
    /// Package identifier (e.g., "7")
    pub id: String,

    /// Display name (e.g., "Bali Escape")
    pub name: String,

    /// Price in the rate table's base currency, major units
    pub price_base_currency: f64,

    /// Short description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Destination label shown on the card
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination: Option<String>,

    /// Whether the package can currently be booked
    #[serde(default = "default_true")]
    pub active: bool,
}

fn default_true() -> bool {
    true
}

impl Package {
    pub fn new(id: impl Into<String>, name: impl Into<String>, price_base_currency: f64) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            price_base_currency,
            description: None,
            destination: None,
            active: true,
        }
    }

    /// Builder: set description
    pub fn with_description(mut self, desc: impl Into<String>) -> Self {
        self.description = Some(desc.into());
        self
    }

    /// Builder: set destination
    pub fn with_destination(mut self, destination: impl Into<String>) -> Self {
        self.destination = Some(destination.into());
        self
    }
}

/// Package catalog (loaded from config)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PackageCatalog {
    #[serde(default)]
    pub packages: Vec<Package>,

    /// Optional rate override shipped alongside the catalog
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rates: Option<RateTable>,
}

impl PackageCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, package: Package) {
        self.packages.push(package);
    }

    /// Builder: add a package
    pub fn with_package(mut self, package: Package) -> Self {
        self.add(package);
        self
    }

    /// Find an active package by ID
    pub fn get(&self, id: &str) -> Option<&Package> {
        self.packages.iter().find(|p| p.id == id && p.active)
    }

    pub fn active_packages(&self) -> impl Iterator<Item = &Package> {
        self.packages.iter().filter(|p| p.active)
    }

    pub fn len(&self) -> usize {
        self.packages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }

    /// Load catalog from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(toml_str)
    }
}
