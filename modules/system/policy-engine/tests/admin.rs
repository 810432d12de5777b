#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use crm_db::migration_runner::run_migrations_for_testing;
use crm_db::sea_orm::{DatabaseConnection, DatabaseTransaction};
use crm_db::sea_orm_migration::MigratorTrait;
use crm_db::{ConnectOpts, TransactionScope, TxStatus, connect_db};
use policy_engine::{
    DbPolicyStore, EmbeddedPolicyStore, Migrator, PolicyAdmin, PolicyEngine, PolicyError,
    PolicyRule, PolicyStore, load_engine,
};

async fn inmem_db() -> DatabaseConnection {
    let db = connect_db("sqlite::memory:", ConnectOpts::default())
        .await
        .expect("Failed to connect to in-memory database");
    run_migrations_for_testing(&db, Migrator::migrations())
        .await
        .expect("Failed to run migrations");
    db
}

async fn db_admin(db: &DatabaseConnection) -> PolicyAdmin {
    let store: Arc<dyn PolicyStore> = Arc::new(DbPolicyStore::new(db.clone()));
    let engine = Arc::new(load_engine(store.as_ref()).await.unwrap());
    PolicyAdmin::new(engine, store)
}

fn delete_orders(role: &str) -> PolicyRule {
    PolicyRule::new(role, "/crm/v1.0/orders/*", "DELETE")
}

#[tokio::test]
async fn database_store_is_seeded_with_defaults() {
    let db = inmem_db().await;
    let stored = DbPolicyStore::new(db).load().await.unwrap();
    assert_eq!(stored, policy_engine::infra::store::default_rules().unwrap());
}

#[tokio::test]
async fn added_rule_is_enforced_and_survives_reload() {
    let db = inmem_db().await;
    let scope = TransactionScope::new(db.clone());
    let admin = db_admin(&db).await;

    let tx = scope.open().await.unwrap();
    admin.add(&tx, delete_orders("manager")).await.unwrap();
    assert_eq!(tx.status().await, TxStatus::Committed);

    assert!(admin.engine().enforce("manager", "/crm/v1.0/orders/4", "DELETE"));

    let reloaded = load_engine(&DbPolicyStore::new(db)).await.unwrap();
    assert!(reloaded.enforce("manager", "/crm/v1.0/orders/4", "DELETE"));
}

#[tokio::test]
async fn duplicate_add_is_a_conflict_and_changes_nothing() {
    let db = inmem_db().await;
    let scope = TransactionScope::new(db.clone());
    let admin = db_admin(&db).await;
    let before = admin.list().len();

    let tx = scope.open().await.unwrap();
    let err = admin
        .add(&tx, PolicyRule::new("admin", "/crm/v1.0/*", "*"))
        .await
        .unwrap_err();
    tx.rollback().await;

    assert!(matches!(err, PolicyError::AlreadyExists(_)));
    assert_eq!(admin.list().len(), before);
}

#[tokio::test]
async fn removed_rule_is_gone_from_engine_and_store() {
    let db = inmem_db().await;
    let scope = TransactionScope::new(db.clone());
    let admin = db_admin(&db).await;
    let rule = PolicyRule::new("viewer", "/crm/v1.0/orders", "GET");

    let tx = scope.open().await.unwrap();
    admin.remove(&tx, rule.clone()).await.unwrap();

    assert!(!admin.engine().enforce("viewer", "/crm/v1.0/orders", "GET"));
    let stored = DbPolicyStore::new(db).load().await.unwrap();
    assert!(!stored.contains(&rule));
}

#[tokio::test]
async fn removing_absent_rule_is_not_found() {
    let db = inmem_db().await;
    let scope = TransactionScope::new(db.clone());
    let admin = db_admin(&db).await;

    let tx = scope.open().await.unwrap();
    let err = admin.remove(&tx, delete_orders("nobody")).await.unwrap_err();
    tx.rollback().await;

    assert!(matches!(err, PolicyError::NotFound(_)));
}

struct FailingStore;

#[async_trait]
impl PolicyStore for FailingStore {
    async fn load(&self) -> Result<Vec<PolicyRule>, PolicyError> {
        Ok(vec![PolicyRule::new("admin", "/*", "*")])
    }

    async fn insert(&self, _: &DatabaseTransaction, _: &PolicyRule) -> Result<(), PolicyError> {
        Err(PolicyError::Store("disk full".to_owned()))
    }

    async fn delete(&self, _: &DatabaseTransaction, _: &PolicyRule) -> Result<(), PolicyError> {
        Err(PolicyError::Store("disk full".to_owned()))
    }
}

#[tokio::test]
async fn failed_persist_reverts_the_engine() {
    let db = inmem_db().await;
    let scope = TransactionScope::new(db);
    let store: Arc<dyn PolicyStore> = Arc::new(FailingStore);
    let engine = Arc::new(load_engine(store.as_ref()).await.unwrap());
    let admin = PolicyAdmin::new(engine.clone(), store);

    let tx = scope.open().await.unwrap();
    let err = admin.add(&tx, delete_orders("manager")).await.unwrap_err();
    tx.rollback().await;
    assert!(matches!(err, PolicyError::Store(_)));
    assert!(!engine.enforce("manager", "/crm/v1.0/orders/1", "DELETE"));

    let tx = scope.open().await.unwrap();
    let err = admin
        .remove(&tx, PolicyRule::new("admin", "/*", "*"))
        .await
        .unwrap_err();
    tx.rollback().await;
    assert!(matches!(err, PolicyError::Store(_)));
    assert!(engine.enforce("admin", "/anything", "GET"));
}

#[tokio::test]
async fn closed_transaction_reverts_the_engine() {
    let db = inmem_db().await;
    let scope = TransactionScope::new(db);
    let store: Arc<dyn PolicyStore> = Arc::new(EmbeddedPolicyStore);
    let engine = Arc::new(load_engine(store.as_ref()).await.unwrap());
    let admin = PolicyAdmin::new(engine.clone(), store);

    let tx = scope.open().await.unwrap();
    tx.rollback().await;

    let err = admin.add(&tx, delete_orders("manager")).await.unwrap_err();
    assert!(matches!(err, PolicyError::Transaction(_)));
    assert!(!engine.enforce("manager", "/crm/v1.0/orders/1", "DELETE"));
}

/// Records whether the engine already enforced the rule while it was being
/// written, and fails the write when asked to.
struct WatchingStore {
    engine: Arc<PolicyEngine>,
    granted_during_insert: AtomicBool,
    fail: bool,
}

#[async_trait]
impl PolicyStore for WatchingStore {
    async fn load(&self) -> Result<Vec<PolicyRule>, PolicyError> {
        Ok(Vec::new())
    }

    async fn insert(&self, _: &DatabaseTransaction, _: &PolicyRule) -> Result<(), PolicyError> {
        let granted = self.engine.enforce("manager", "/crm/v1.0/orders/1", "DELETE");
        self.granted_during_insert.store(granted, Ordering::SeqCst);
        if self.fail {
            return Err(PolicyError::Store("disk full".to_owned()));
        }
        Ok(())
    }
}

#[tokio::test]
async fn grant_is_published_only_after_commit() {
    for fail in [false, true] {
        let scope = TransactionScope::new(inmem_db().await);
        let engine = Arc::new(PolicyEngine::new());
        let store = Arc::new(WatchingStore {
            engine: engine.clone(),
            granted_during_insert: AtomicBool::new(false),
            fail,
        });
        let admin = PolicyAdmin::new(engine.clone(), store.clone());

        let tx = scope.open().await.unwrap();
        let result = admin.add(&tx, delete_orders("manager")).await;
        tx.rollback().await;

        assert!(!store.granted_during_insert.load(Ordering::SeqCst));
        assert_eq!(result.is_ok(), !fail);
        assert_eq!(
            engine.enforce("manager", "/crm/v1.0/orders/1", "DELETE"),
            !fail
        );
    }
}

#[tokio::test]
async fn invalid_pattern_is_rejected_before_any_write() {
    let db = inmem_db().await;
    let scope = TransactionScope::new(db.clone());
    let admin = db_admin(&db).await;
    let before = DbPolicyStore::new(db.clone()).load().await.unwrap();

    let tx = scope.open().await.unwrap();
    let err = admin
        .add(&tx, PolicyRule::new("manager", "/crm/v1.0/orders", "(GET"))
        .await
        .unwrap_err();
    assert_eq!(tx.status().await, TxStatus::Pending);
    tx.rollback().await;

    assert!(matches!(err, PolicyError::InvalidPattern { .. }));
    assert_eq!(DbPolicyStore::new(db).load().await.unwrap(), before);
}
