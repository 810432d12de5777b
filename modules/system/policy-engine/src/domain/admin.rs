use std::sync::Arc;

use crm_db::TxHandle;
use tracing::{debug, info, instrument, warn};

use crate::domain::engine::PolicyEngine;
use crate::domain::error::PolicyError;
use crate::domain::rule::PolicyRule;
use crate::infra::store::PolicyStore;

/// Administrative rule changes.
///
/// A grant reaches the engine only after its store write has committed, so no
/// request is ever allowed by a rule that is later rolled back. A revocation
/// leaves the engine first and is restored if the store write or commit fails.
pub struct PolicyAdmin {
    engine: Arc<PolicyEngine>,
    store: Arc<dyn PolicyStore>,
}

impl PolicyAdmin {
    #[must_use]
    pub fn new(engine: Arc<PolicyEngine>, store: Arc<dyn PolicyStore>) -> Self {
        Self { engine, store }
    }

    #[must_use]
    pub fn engine(&self) -> &Arc<PolicyEngine> {
        &self.engine
    }

    #[must_use]
    pub fn list(&self) -> Vec<PolicyRule> {
        self.engine.list_policies()
    }

    /// # Errors
    /// - `InvalidPattern` if the rule does not compile.
    /// - `AlreadyExists` if an identical rule is present.
    /// - `Store` / `Transaction` if persisting fails; the engine never sees the rule.
    #[instrument(skip_all, fields(rule = %rule))]
    pub async fn add(&self, tx: &TxHandle, rule: PolicyRule) -> Result<(), PolicyError> {
        PolicyEngine::validate(&rule)?;
        if self.engine.has_policy(&rule) {
            return Err(PolicyError::AlreadyExists(rule));
        }

        if let Err(e) = self.persist_insert(tx, &rule).await {
            warn!(error = %e, "policy insert not persisted");
            return Err(e);
        }

        if !self.engine.add_policy(rule)? {
            debug!("policy was added concurrently");
        }
        info!("policy added");
        Ok(())
    }

    /// # Errors
    /// - `NotFound` if no identical rule is present.
    /// - `Store` / `Transaction` if persisting fails; the engine is left unchanged.
    #[instrument(skip_all, fields(rule = %rule))]
    pub async fn remove(&self, tx: &TxHandle, rule: PolicyRule) -> Result<(), PolicyError> {
        if !self.engine.remove_policy(&rule) {
            return Err(PolicyError::NotFound(rule));
        }

        if let Err(e) = self.persist_delete(tx, &rule).await {
            warn!(error = %e, "policy removal not persisted; reverting");
            if let Err(restore) = self.engine.add_policy(rule) {
                warn!(error = %restore, "removed policy could not be restored");
            }
            return Err(e);
        }

        info!("policy removed");
        Ok(())
    }

    async fn persist_insert(&self, tx: &TxHandle, rule: &PolicyRule) -> Result<(), PolicyError> {
        {
            let conn = tx.conn().await?;
            self.store.insert(&conn, rule).await?;
        }
        tx.commit().await?;
        Ok(())
    }

    async fn persist_delete(&self, tx: &TxHandle, rule: &PolicyRule) -> Result<(), PolicyError> {
        {
            let conn = tx.conn().await?;
            self.store.delete(&conn, rule).await?;
        }
        tx.commit().await?;
        Ok(())
    }
}
