//! Sources of the initial rule set and sinks for administrative changes.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, EntityTrait,
    QueryFilter, QueryOrder, Set,
};
use tracing::{debug, info};

use crate::config::{PolicyConfig, PolicyStoreKind};
use crate::domain::engine::PolicyEngine;
use crate::domain::error::PolicyError;
use crate::domain::rule::PolicyRule;
use crate::infra::storage::entity;

const DEFAULT_POLICIES: &str = include_str!("../default_policies.json");

/// The compiled-in default rule set.
///
/// # Errors
/// `Store` if the embedded document does not parse.
pub fn default_rules() -> Result<Vec<PolicyRule>, PolicyError> {
    serde_json::from_str(DEFAULT_POLICIES).map_err(PolicyError::store)
}

/// Durable home of the rule set.
///
/// `insert` and `delete` run inside the caller's transaction. Stores that are
/// only a startup seed keep the default no-op implementations.
#[async_trait]
pub trait PolicyStore: Send + Sync {
    async fn load(&self) -> Result<Vec<PolicyRule>, PolicyError>;

    async fn insert(
        &self,
        _conn: &DatabaseTransaction,
        _rule: &PolicyRule,
    ) -> Result<(), PolicyError> {
        Ok(())
    }

    async fn delete(
        &self,
        _conn: &DatabaseTransaction,
        _rule: &PolicyRule,
    ) -> Result<(), PolicyError> {
        Ok(())
    }

    /// Whether admin changes survive a restart.
    fn is_durable(&self) -> bool {
        false
    }
}

/// Compiled-in defaults.
#[derive(Debug, Default)]
pub struct EmbeddedPolicyStore;

#[async_trait]
impl PolicyStore for EmbeddedPolicyStore {
    async fn load(&self) -> Result<Vec<PolicyRule>, PolicyError> {
        default_rules()
    }
}

/// A JSON or YAML list of `{role_name, path, method}` read at startup.
#[derive(Debug)]
pub struct FilePolicyStore {
    path: PathBuf,
}

impl FilePolicyStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl PolicyStore for FilePolicyStore {
    async fn load(&self) -> Result<Vec<PolicyRule>, PolicyError> {
        let raw = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            PolicyError::Store(format!("cannot read {}: {e}", self.path.display()))
        })?;
        parse_rules(&self.path, &raw)
    }
}

fn parse_rules(path: &Path, raw: &str) -> Result<Vec<PolicyRule>, PolicyError> {
    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    if is_json {
        serde_json::from_str(raw)
            .map_err(|e| PolicyError::Store(format!("{}: {e}", path.display())))
    } else {
        serde_saphyr::from_str(raw)
            .map_err(|e| PolicyError::Store(format!("{}: {e}", path.display())))
    }
}

/// The `policy_rules` table.
pub struct DbPolicyStore {
    db: DatabaseConnection,
}

impl DbPolicyStore {
    #[must_use]
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl PolicyStore for DbPolicyStore {
    async fn load(&self) -> Result<Vec<PolicyRule>, PolicyError> {
        let rows = entity::Entity::find()
            .order_by_asc(entity::Column::Id)
            .all(&self.db)
            .await
            .map_err(PolicyError::store)?;
        Ok(rows.into_iter().map(PolicyRule::from).collect())
    }

    async fn insert(&self, conn: &DatabaseTransaction, rule: &PolicyRule) -> Result<(), PolicyError> {
        entity::ActiveModel {
            role_name: Set(rule.subject.clone()),
            path: Set(rule.object.clone()),
            method: Set(rule.action.clone()),
            ..Default::default()
        }
        .insert(conn)
        .await
        .map_err(PolicyError::store)?;
        Ok(())
    }

    async fn delete(&self, conn: &DatabaseTransaction, rule: &PolicyRule) -> Result<(), PolicyError> {
        let res = entity::Entity::delete_many()
            .filter(entity::Column::RoleName.eq(rule.subject.as_str()))
            .filter(entity::Column::Path.eq(rule.object.as_str()))
            .filter(entity::Column::Method.eq(rule.action.as_str()))
            .exec(conn)
            .await
            .map_err(PolicyError::store)?;
        if res.rows_affected == 0 {
            debug!(rule = %rule, "policy was not in the store");
        }
        Ok(())
    }

    fn is_durable(&self) -> bool {
        true
    }
}

/// Select the store named by `cfg`.
///
/// # Errors
/// `Store` when the file store has no `path`.
pub fn build_store(
    cfg: &PolicyConfig,
    db: &DatabaseConnection,
) -> Result<Arc<dyn PolicyStore>, PolicyError> {
    Ok(match cfg.store {
        PolicyStoreKind::Embedded => Arc::new(EmbeddedPolicyStore),
        PolicyStoreKind::File => {
            let path = cfg.path.clone().ok_or_else(|| {
                PolicyError::Store("policy.path is required for the file store".to_owned())
            })?;
            Arc::new(FilePolicyStore::new(path))
        }
        PolicyStoreKind::Database => Arc::new(DbPolicyStore::new(db.clone())),
    })
}

/// Load `store` into a fresh engine.
///
/// # Errors
/// `Store` if loading fails, `InvalidPattern` if a stored rule does not compile.
pub async fn load_engine(store: &dyn PolicyStore) -> Result<PolicyEngine, PolicyError> {
    let rules = store.load().await?;
    let engine = PolicyEngine::with_rules(rules)?;
    info!(
        rules = engine.len(),
        durable = store.is_durable(),
        "policy rules loaded"
    );
    Ok(engine)
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn embedded_defaults_parse_and_compile() {
        let rules = default_rules().unwrap();
        assert!(!rules.is_empty());
        let engine = PolicyEngine::with_rules(rules).unwrap();
        assert!(engine.enforce("admin", "/crm/v1.0/orders", "GET"));
        assert!(engine.enforce("admin", "/policies", "POST"));
        assert!(!engine.enforce("manager", "/crm/v1.0/orders/1", "DELETE"));
    }

    #[test]
    fn parses_yaml_and_json_by_extension() {
        let yaml = "- role_name: admin\n  path: /crm/v1.0/*\n  method: GET\n";
        let from_yaml = parse_rules(Path::new("p.yaml"), yaml).unwrap();
        assert_eq!(from_yaml, vec![PolicyRule::new("admin", "/crm/v1.0/*", "GET")]);

        let json = r#"[{"role_name":"admin","path":"/crm/v1.0/*","method":"GET"}]"#;
        let from_json = parse_rules(Path::new("p.JSON"), json).unwrap();
        assert_eq!(from_json, from_yaml);
    }

    #[test]
    fn reports_the_file_on_parse_errors() {
        let err = parse_rules(Path::new("bad.json"), "{").unwrap_err();
        assert!(matches!(err, PolicyError::Store(msg) if msg.starts_with("bad.json")));
    }

    #[tokio::test]
    async fn file_store_reads_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("policies.yml");
        std::fs::write(&path, "- {role_name: viewer, path: /crm/v1.0/orders, method: GET}\n")
            .unwrap();

        let engine = load_engine(&FilePolicyStore::new(&path)).await.unwrap();
        assert!(engine.enforce("viewer", "/crm/v1.0/orders", "GET"));
    }

    #[tokio::test]
    async fn missing_file_is_a_store_error() {
        let err = FilePolicyStore::new("/nonexistent/policies.yaml")
            .load()
            .await
            .unwrap_err();
        assert!(matches!(err, PolicyError::Store(_)));
    }

    #[test]
    fn file_store_requires_path() {
        let cfg = PolicyConfig {
            store: PolicyStoreKind::File,
            path: None,
        };
        let err = build_store(&cfg, &DatabaseConnection::Disconnected).err().unwrap();
        assert!(matches!(err, PolicyError::Store(msg) if msg.contains("policy.path")));
    }

    #[test]
    fn only_the_database_store_is_durable() {
        let embedded =
            build_store(&PolicyConfig::default(), &DatabaseConnection::Disconnected).unwrap();
        assert!(!embedded.is_durable());

        let cfg = PolicyConfig {
            store: PolicyStoreKind::Database,
            path: None,
        };
        let db = build_store(&cfg, &DatabaseConnection::Disconnected).unwrap();
        assert!(db.is_durable());
    }
}
