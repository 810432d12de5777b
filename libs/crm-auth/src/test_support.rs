//! Fixture keys and a ready-made service for tests in this and other crates.
//!
//! The PEM files under `tests/fixtures` are throwaway 2048-bit keys. They
//! must never be referenced from a deployed configuration.

#![allow(clippy::expect_used)]

use std::sync::Arc;

use time::macros::datetime;

use crate::claims::TokenSubject;
use crate::clock::ManualClock;
use crate::config::{AuthConfig, KeyPairConfig};
use crate::service::TokenService;

pub const ACCESS_PRIVATE_PEM: &str = include_str!("../tests/fixtures/access_private.pem");
pub const ACCESS_PUBLIC_PEM: &str = include_str!("../tests/fixtures/access_public.pem");
pub const REFRESH_PRIVATE_PEM: &str = include_str!("../tests/fixtures/refresh_private.pem");
pub const REFRESH_PUBLIC_PEM: &str = include_str!("../tests/fixtures/refresh_public.pem");

/// Default lifetimes with the fixture keys inlined.
#[must_use]
pub fn test_auth_config() -> AuthConfig {
    AuthConfig {
        access_key: KeyPairConfig::inline(ACCESS_PRIVATE_PEM, ACCESS_PUBLIC_PEM),
        refresh_key: KeyPairConfig::inline(REFRESH_PRIVATE_PEM, REFRESH_PUBLIC_PEM),
        ..AuthConfig::default()
    }
}

/// Service over the fixture keys driven by a manual clock starting at
/// 2026-01-01T00:00:00Z.
#[must_use]
pub fn test_token_service() -> (Arc<TokenService>, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new(datetime!(2026-01-01 00:00 UTC)));
    let svc = TokenService::from_config(&test_auth_config(), clock.clone())
        .expect("fixture keys must load");
    (Arc::new(svc), clock)
}

/// A representative subject: user 1 of company 1 holding role 1.
#[must_use]
pub fn subject() -> TokenSubject {
    TokenSubject {
        user_id: 1,
        company_id: 1,
        role_id: 1,
        name: "Ada Lovelace".to_owned(),
    }
}
