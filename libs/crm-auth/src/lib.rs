#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
//! Token issuance and verification for the CRM pipeline.
//!
//! Two token kinds are issued:
//!
//! - **Access token**: compact JWE (`RSA-OAEP-256` key wrap, `A256GCM`
//!   content encryption) carrying `user_id`, `company_id`, `role_id`, `name`.
//!   Confidential and short-lived (5 minutes by default).
//! - **Refresh token**: compact JWS (`RS256`) carrying only `user_id`.
//!   Integrity-protected, not encrypted, longer-lived (8 hours by default).
//!
//! Verification is a pure function of the token, the key, and the current
//! instant from the injected [`Clock`].

// Core modules
pub mod claims;
pub mod clock;
pub mod errors;
pub mod traits;

// Key material and token formats
pub mod config;
pub mod jwe;
pub mod keys;
pub mod refresh;

pub mod service;

#[cfg(any(test, feature = "test-util"))]
pub mod test_support;

// Core exports
pub use claims::{AccessClaims, RefreshClaims, TokenPair, TokenSubject};
pub use clock::{Clock, ManualClock, SystemClock};
pub use errors::TokenError;
pub use traits::AccessTokenVerifier;

pub use config::{AuthConfig, KeyPairConfig};
pub use service::TokenService;
