#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
//! Users and roles.
//!
//! [`IdentityService`] is the ORM-backed implementation of the directory
//! contracts in `crm-security`: role lookup for the auth middleware, user
//! lookup for token refresh and credential verification for login.

pub mod domain;
pub mod infra;

pub use domain::error::IdentityError;
pub use domain::password::{DEFAULT_COST, MIN_COST, hash_password, verify_password};
pub use domain::service::{IdentityService, NewRole, NewUser};
pub use infra::storage::migrations::Migrator;
