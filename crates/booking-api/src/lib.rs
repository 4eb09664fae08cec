//! # booking-api
//!
//! HTTP API layer for travel-checkout-rs.
//!
//! ## Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | GET | `/health` | Health check |
//! | POST | `/api/payment/create-checkout-session` | Create checkout session |
//! | POST | `/api/payment/webhook` | Stripe webhook |
//! | GET | `/api/payment/session/{session_id}` | Session payment status |
//! | GET | `/api/packages` | List packages |
//! | GET | `/api/rates` | Exchange rates |

pub mod config;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;

pub use config::AppConfig;
pub use error::ApiError;
pub use routes::create_router;
pub use state::AppState;
