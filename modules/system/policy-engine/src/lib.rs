#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
//! Authorization rules: `(role, path pattern, method pattern)` triples with
//! allow-if-any-matches semantics.
//!
//! The [`PolicyEngine`] holds the live rule set and answers
//! [`enforce`](PolicyEngine::enforce) on every protected request. Rules are
//! seeded at startup from a [`PolicyStore`] and changed at runtime through
//! [`PolicyAdmin`], which keeps the engine and a durable store in step.

pub mod config;
pub mod domain;
pub mod infra;

pub use config::{PolicyConfig, PolicyStoreKind};
pub use domain::admin::PolicyAdmin;
pub use domain::engine::PolicyEngine;
pub use domain::error::PolicyError;
pub use domain::rule::PolicyRule;
pub use infra::store::{
    DbPolicyStore, EmbeddedPolicyStore, FilePolicyStore, PolicyStore, build_store, load_engine,
};
pub use infra::storage::migrations::Migrator;
