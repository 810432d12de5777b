#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
//! Identity types shared by the authentication, authorization and business
//! layers.
//!
//! - [`SecurityContext`] is the verified identity that the auth middleware
//!   attaches to every protected request.
//! - [`directory`] holds the collaborator contracts the pipeline consumes
//!   (role lookup, user lookup, credential verification).

pub mod context;
pub mod directory;

pub use context::SecurityContext;
pub use directory::{
    CredentialVerifier, LookupError, RoleLookup, RoleRecord, UserLookup, UserRecord,
};
