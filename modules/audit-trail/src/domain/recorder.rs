use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseTransaction, EntityTrait, QueryFilter, QueryOrder, Set,
};
use time::OffsetDateTime;
use tracing::{debug, instrument};

use crate::domain::diff::ChangeSet;
use crate::domain::error::AuditError;
use crate::domain::model::{HistoricalRecord, RecordChange};
use crate::infra::storage::entity;

/// Appends historical records.
///
/// Writes take a `DatabaseTransaction` rather than any connection: entries
/// are only ever written alongside the mutation they describe. A failed
/// write is returned to the caller, whose transaction must then roll back.
#[derive(Debug, Clone, Default)]
pub struct AuditTrailRecorder;

impl AuditTrailRecorder {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Append one entry.
    ///
    /// # Errors
    /// `Db` if the insert fails.
    pub async fn record_change(
        &self,
        tx: &DatabaseTransaction,
        change: RecordChange,
    ) -> Result<(), AuditError> {
        entity::Entity::insert(to_active(change)).exec(tx).await?;
        Ok(())
    }

    /// Append one entry per field in `set`. All entries share a single
    /// `modified_at`. An empty set writes nothing.
    ///
    /// Returns the number of entries written.
    ///
    /// # Errors
    /// `Db` if the insert fails.
    #[instrument(
        skip_all,
        fields(source_type = set.source_type, source_id = set.source_id, action = %set.action)
    )]
    pub async fn record(
        &self,
        tx: &DatabaseTransaction,
        set: &ChangeSet,
        modified_by: i32,
    ) -> Result<usize, AuditError> {
        if set.is_empty() {
            debug!("no tracked field changed");
            return Ok(0);
        }

        let modified_at = OffsetDateTime::now_utc();
        let rows = set.changes.iter().map(|c| {
            to_active(RecordChange {
                source_id: set.source_id,
                source_type: set.source_type.to_owned(),
                action: set.action,
                field: c.field.to_owned(),
                value: c.value.clone(),
                modified_by,
                modified_at,
            })
        });
        entity::Entity::insert_many(rows).exec(tx).await?;

        debug!(entries = set.changes.len(), "history recorded");
        Ok(set.changes.len())
    }

    /// Entries for one source, oldest first.
    ///
    /// # Errors
    /// `Db` on read failure, `UnknownAction` for a row with an unrecognised action.
    pub async fn history(
        &self,
        conn: &impl ConnectionTrait,
        source_type: &str,
        source_id: i32,
    ) -> Result<Vec<HistoricalRecord>, AuditError> {
        entity::Entity::find()
            .filter(entity::Column::SourceType.eq(source_type))
            .filter(entity::Column::SourceId.eq(source_id))
            .order_by_asc(entity::Column::Id)
            .all(conn)
            .await?
            .into_iter()
            .map(|m| -> Result<HistoricalRecord, AuditError> {
                Ok(HistoricalRecord {
                    action: m.action.parse()?,
                    id: m.id,
                    source_id: m.source_id,
                    source_type: m.source_type,
                    field: m.field,
                    value: m.value,
                    modified_by: m.modified_by,
                    modified_at: m.modified_at,
                })
            })
            .collect()
    }
}

fn to_active(change: RecordChange) -> entity::ActiveModel {
    entity::ActiveModel {
        source_id: Set(change.source_id),
        source_type: Set(change.source_type),
        field: Set(change.field),
        value: Set(change.value),
        action: Set(change.action.as_str().to_owned()),
        modified_by: Set(change.modified_by),
        modified_at: Set(change.modified_at),
        ..Default::default()
    }
}
