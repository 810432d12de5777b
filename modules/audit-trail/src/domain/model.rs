use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::domain::error::AuditError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    Created,
    Modified,
    Deleted,
}

impl AuditAction {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Modified => "modified",
            Self::Deleted => "deleted",
        }
    }
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AuditAction {
    type Err = AuditError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "created" => Ok(Self::Created),
            "modified" => Ok(Self::Modified),
            "deleted" => Ok(Self::Deleted),
            other => Err(AuditError::UnknownAction(other.to_owned())),
        }
    }
}

/// A single entry to append.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordChange {
    pub source_id: i32,
    pub source_type: String,
    pub action: AuditAction,
    pub field: String,
    /// Rendered value after the change; the last value for deletions.
    pub value: Option<String>,
    pub modified_by: i32,
    pub modified_at: OffsetDateTime,
}

/// A stored entry, as read back by `history`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HistoricalRecord {
    pub id: i32,
    pub source_id: i32,
    pub source_type: String,
    pub field: String,
    pub value: Option<String>,
    pub action: AuditAction,
    pub modified_by: i32,
    #[serde(with = "time::serde::rfc3339")]
    pub modified_at: OffsetDateTime,
}
