//! `policy` section of the server configuration.

use std::path::PathBuf;

use serde::Deserialize;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PolicyConfig {
    /// Where the initial rule set comes from and where admin changes go.
    pub store: PolicyStoreKind,

    /// Rule file for [`PolicyStoreKind::File`] (`.json`, `.yaml` or `.yml`).
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyStoreKind {
    /// Compiled-in default rules; admin changes live in memory only.
    #[default]
    Embedded,
    /// Rules read from `path` at startup; admin changes live in memory only.
    File,
    /// The `policy_rules` table; admin changes are persisted.
    Database,
}
