//! # Application Configuration
//!
//! Server settings read from the environment (and `.env`). Stripe
//! credentials are loaded separately by `booking_stripe::StripeConfig`.

use std::net::{AddrParseError, SocketAddr};
use std::path::PathBuf;

const DEFAULT_PORT: u16 = 4000;
const DEFAULT_FRONTEND_URL: &str = "http://localhost:5500";
const DEFAULT_CATALOG_PATH: &str = "config/packages.toml";

/// Application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Host to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// Frontend origin the provider redirects back to
    pub frontend_url: String,
    /// Environment (development, staging, production)
    pub environment: String,
    /// Allowed CORS origins; empty allows any origin
    pub cors_allowed_origins: Vec<String>,
    /// Package catalog (TOML)
    pub catalog_path: PathBuf,
    /// Reject checkouts for packages missing from the catalog
    pub strict_pricing: bool,
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .map(String::from)
        .collect()
}

fn parse_flag(raw: &str) -> bool {
    matches!(
        raw.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

impl AppConfig {
    /// Load from environment variables
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        Self {
            host: std::env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: std::env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(DEFAULT_PORT),
            frontend_url: std::env::var("FRONTEND_URL")
                .ok()
                .filter(|url| !url.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_FRONTEND_URL.to_string()),
            environment: std::env::var("ENVIRONMENT")
                .unwrap_or_else(|_| "development".to_string()),
            cors_allowed_origins: std::env::var("CORS_ALLOWED_ORIGINS")
                .map(|raw| parse_origins(&raw))
                .unwrap_or_default(),
            catalog_path: std::env::var("CATALOG_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(DEFAULT_CATALOG_PATH)),
            strict_pricing: std::env::var("STRICT_PRICING")
                .map(|raw| parse_flag(&raw))
                .unwrap_or(false),
        }
    }

    /// Get the socket address to bind to
    pub fn socket_addr(&self) -> Result<SocketAddr, AddrParseError> {
        format!("{}:{}", self.host, self.port).parse()
    }

    /// Check if running in production
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: DEFAULT_PORT,
            frontend_url: DEFAULT_FRONTEND_URL.to_string(),
            environment: "development".to_string(),
            cors_allowed_origins: Vec::new(),
            catalog_path: PathBuf::from(DEFAULT_CATALOG_PATH),
            strict_pricing: false,
        }
    }
}
