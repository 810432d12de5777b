#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
//! The request pipeline in front of every business handler.
//!
//! ```text
//! request ─▶ authn_middleware ─▶ transaction_middleware ─▶ handler ─▶ commit
//!              │ token, role,        │ opens TxHandle,
//!              │ policy check        │ rolls back unless committed
//! ```
//!
//! `/login` and `/refresh` are public; everything else passes both layers.

pub mod auth;
pub mod config;
pub mod error;
mod handlers;
pub mod router;
pub mod transaction;

pub use auth::{AuthState, authn_middleware};
pub use config::ApiGatewayConfig;
pub use error::ApiError;
pub use router::{GatewayState, build_router};
pub use transaction::transaction_middleware;
