use serde::Deserialize;

use crate::connect::ConnectOpts;

/// `database` section of the server configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DatabaseConfig {
    /// sea-orm connection URL (`sqlite://crm.db?mode=rwc`, `postgres://...`).
    pub url: String,
    pub max_conns: Option<u32>,
    pub min_conns: Option<u32>,
    pub acquire_timeout_secs: Option<u64>,
    /// Emit sqlx statement logs at debug level.
    pub sql_logging: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite::memory:".to_owned(),
            max_conns: None,
            min_conns: None,
            acquire_timeout_secs: None,
            sql_logging: false,
        }
    }
}

impl DatabaseConfig {
    #[must_use]
    pub fn connect_opts(&self) -> ConnectOpts {
        ConnectOpts {
            max_conns: self.max_conns,
            min_conns: self.min_conns,
            acquire_timeout: self.acquire_timeout_secs.map(std::time::Duration::from_secs),
            sql_logging: self.sql_logging,
        }
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn defaults_to_in_memory_sqlite() {
        let cfg = DatabaseConfig::default();
        assert_eq!(cfg.url, "sqlite::memory:");
        assert!(cfg.max_conns.is_none());
        assert!(!cfg.sql_logging);
    }

    #[test]
    fn parses_yaml_and_maps_to_connect_opts() {
        let yaml = r"
url: postgres://crm@localhost/crm
max_conns: 20
acquire_timeout_secs: 5
";
        let cfg: DatabaseConfig = serde_saphyr::from_str(yaml).unwrap();
        let opts = cfg.connect_opts();
        assert_eq!(opts.max_conns, Some(20));
        assert_eq!(opts.min_conns, None);
        assert_eq!(opts.acquire_timeout, Some(std::time::Duration::from_secs(5)));
    }

    #[test]
    fn rejects_unknown_fields() {
        let result: Result<DatabaseConfig, _> = serde_saphyr::from_str("pool_size: 3\n");
        assert!(result.is_err());
    }
}
