#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
//! CRM backend server: configuration, logging, migrations and the assembled
//! HTTP application. The `orders` resource is the reference business module
//! wired behind the auth and transaction pipeline.

pub mod app;
pub mod config;
pub mod logging;
pub mod migrations;
pub mod orders;

pub use app::{build_app, serve};
pub use config::AppConfig;
pub use migrations::Migrator;
