//! Request-scoped transactions.
//!
//! A [`TxHandle`] is an explicit state machine over one database
//! transaction:
//!
//! ```text
//!            commit()            rollback()
//! Pending ─────────────▶ Committed ─────────▶ Committed   (no-op)
//!    │
//!    └──── rollback() / drop ──▶ RolledBack ─▶ RolledBack  (no-op)
//! ```
//!
//! Exactly one terminal operation reaches the database. A second terminal
//! call is handled here and never forwarded to the driver, so a deferred
//! `rollback()` after a successful `commit()` cannot undo durable writes.

use std::fmt;
use std::sync::Arc;

use sea_orm::{DatabaseConnection, DatabaseTransaction, TransactionTrait};
use tokio::sync::{MappedMutexGuard, Mutex, MutexGuard};
use tracing::{debug, warn};

use crate::errors::DbError;

/// Observable state of a [`TxHandle`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxStatus {
    Pending,
    Committed,
    RolledBack,
}

impl fmt::Display for TxStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Pending => "pending",
            Self::Committed => "committed",
            Self::RolledBack => "rolled back",
        })
    }
}

enum TxState {
    Pending(DatabaseTransaction),
    Committed,
    RolledBack,
}

impl TxState {
    fn status(&self) -> TxStatus {
        match self {
            Self::Pending(_) => TxStatus::Pending,
            Self::Committed => TxStatus::Committed,
            Self::RolledBack => TxStatus::RolledBack,
        }
    }
}

/// Exclusive access to the open transaction. Use `&*conn` wherever sea-orm
/// expects a `ConnectionTrait`.
pub type TxConn<'a> = MappedMutexGuard<'a, DatabaseTransaction>;

/// Opens one transaction per request.
#[derive(Clone)]
pub struct TransactionScope {
    db: DatabaseConnection,
}

impl TransactionScope {
    #[must_use]
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Begin a transaction.
    ///
    /// # Errors
    /// `Begin` if the database refuses to start one.
    pub async fn open(&self) -> Result<Arc<TxHandle>, DbError> {
        let tx = self.db.begin().await.map_err(DbError::Begin)?;
        debug!("transaction opened");
        Ok(Arc::new(TxHandle {
            state: Mutex::new(TxState::Pending(tx)),
        }))
    }

    /// Connection for work outside any request transaction.
    #[must_use]
    pub fn connection(&self) -> &DatabaseConnection {
        &self.db
    }
}

/// One open-or-finished transaction. See the module docs for the state machine.
pub struct TxHandle {
    state: Mutex<TxState>,
}

impl TxHandle {
    /// Borrow the open transaction.
    ///
    /// The guard serializes use of the transaction; drop it before calling
    /// [`commit`](Self::commit) or [`rollback`](Self::rollback).
    ///
    /// # Errors
    /// `Closed` if the transaction was already committed or rolled back.
    pub async fn conn(&self) -> Result<TxConn<'_>, DbError> {
        let guard = self.state.lock().await;
        MutexGuard::try_map(guard, |state| match state {
            TxState::Pending(tx) => Some(tx),
            TxState::Committed | TxState::RolledBack => None,
        })
        .map_err(|guard| DbError::Closed(guard.status()))
    }

    pub async fn status(&self) -> TxStatus {
        self.state.lock().await.status()
    }

    /// Make the transaction's writes durable.
    ///
    /// Committing twice is a no-op. Committing after a rollback fails with
    /// `Closed(RolledBack)` so a caller cannot report success for discarded
    /// writes. A failed commit leaves the handle rolled back.
    ///
    /// # Errors
    /// `Commit` if the database rejects the commit, `Closed` after rollback.
    pub async fn commit(&self) -> Result<(), DbError> {
        let mut state = self.state.lock().await;
        match std::mem::replace(&mut *state, TxState::Committed) {
            TxState::Pending(tx) => match tx.commit().await {
                Ok(()) => {
                    debug!("transaction committed");
                    Ok(())
                }
                Err(e) => {
                    *state = TxState::RolledBack;
                    warn!(error = %e, "transaction commit failed");
                    Err(DbError::Commit(e))
                }
            },
            TxState::Committed => Ok(()),
            TxState::RolledBack => {
                *state = TxState::RolledBack;
                Err(DbError::Closed(TxStatus::RolledBack))
            }
        }
    }

    /// Discard the transaction's writes. A no-op once the handle is terminal.
    ///
    /// Never fails: a rollback the driver cannot complete still leaves the
    /// transaction unusable, and the database discards uncommitted work when
    /// the connection is reset.
    pub async fn rollback(&self) {
        let mut state = self.state.lock().await;
        match std::mem::replace(&mut *state, TxState::RolledBack) {
            TxState::Pending(tx) => {
                if let Err(e) = tx.rollback().await {
                    warn!(error = %e, "transaction rollback failed");
                } else {
                    debug!("transaction rolled back");
                }
            }
            TxState::Committed => *state = TxState::Committed,
            TxState::RolledBack => {}
        }
    }
}

impl Drop for TxHandle {
    fn drop(&mut self) {
        // sea-orm rolls the inner transaction back on drop.
        if matches!(self.state.get_mut(), TxState::Pending(_)) {
            warn!("transaction dropped while pending; rolling back");
        }
    }
}

impl fmt::Debug for TxHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let status = self
            .state
            .try_lock()
            .map_or_else(|_| "locked".to_owned(), |s| s.status().to_string());
        f.debug_struct("TxHandle").field("status", &status).finish()
    }
}
