#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
//! Change history.
//!
//! An entity opts in by implementing [`Audited`]: a source type, an id and a
//! static list of [`TrackedField`]s. [`diff`] turns a before/after pair into
//! a [`ChangeSet`], and [`AuditTrailRecorder::record`] appends one
//! historical record per changed field through the caller's transaction, so
//! the mutation and its history commit or roll back together.

pub mod domain;
pub mod infra;

pub use domain::diff::{Audited, ChangeSet, FieldChange, TrackedField, diff};
pub use domain::error::AuditError;
pub use domain::model::{AuditAction, HistoricalRecord, RecordChange};
pub use domain::recorder::AuditTrailRecorder;
pub use infra::storage::migrations::Migrator;
