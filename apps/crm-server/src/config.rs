//! Layered server configuration: built-in defaults, then the YAML file, then
//! `CRM__`-prefixed environment variables (`CRM__SERVER__BIND_ADDR=...`).

use std::path::Path;

use anyhow::Context;
use api_gateway::ApiGatewayConfig;
use crm_auth::AuthConfig;
use crm_db::DatabaseConfig;
use figment::Figment;
use figment::providers::{Env, Format, Yaml};
use policy_engine::PolicyConfig;
use serde::Deserialize;

use crate::logging::LoggingConfig;

pub const ENV_PREFIX: &str = "CRM__";

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    pub server: ApiGatewayConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub policy: PolicyConfig,
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load the configuration. A missing file is not an error; every section
    /// has defaults, except that `auth` needs key material before `serve`.
    ///
    /// # Errors
    /// Fails on unreadable YAML, unknown fields or mistyped values.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        Self::figment(path)
            .extract()
            .with_context(|| format!("loading configuration from {}", path.display()))
    }

    fn figment(path: &Path) -> Figment {
        Figment::new()
            .merge(Yaml::file(path))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use policy_engine::PolicyStoreKind;

    #[test]
    fn yaml_then_env() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(
                "crm.yaml",
                r"
server:
  bind_addr: 0.0.0.0:9000
database:
  url: sqlite://crm.db?mode=rwc
policy:
  store: database
logging:
  level: debug
",
            )?;
            jail.set_env("CRM__SERVER__REQUEST_TIMEOUT_SECS", "5");
            jail.set_env("CRM__LOGGING__FORMAT", "json");

            let cfg = AppConfig::load(Path::new("crm.yaml")).unwrap();
            assert_eq!(cfg.server.bind_addr, "0.0.0.0:9000");
            assert_eq!(cfg.server.request_timeout_secs, 5);
            assert_eq!(cfg.database.url, "sqlite://crm.db?mode=rwc");
            assert_eq!(cfg.policy.store, PolicyStoreKind::Database);
            assert_eq!(cfg.logging.level, "debug");
            assert_eq!(cfg.logging.format, crate::logging::LogFormat::Json);
            assert_eq!(cfg.auth.access_token_ttl_secs, 300);
            Ok(())
        });
    }

    #[test]
    fn missing_file_gives_defaults() {
        figment::Jail::expect_with(|_| {
            let cfg = AppConfig::load(Path::new("absent.yaml")).unwrap();
            assert_eq!(cfg.server.bind_addr, "127.0.0.1:8080");
            assert_eq!(cfg.database.url, "sqlite::memory:");
            assert_eq!(cfg.policy.store, PolicyStoreKind::Embedded);
            Ok(())
        });
    }

    #[test]
    fn unknown_field_is_rejected() {
        figment::Jail::expect_with(|jail| {
            jail.create_file("crm.yaml", "server:\n  port: 80\n")?;
            assert!(AppConfig::load(Path::new("crm.yaml")).is_err());
            Ok(())
        });
    }
}
