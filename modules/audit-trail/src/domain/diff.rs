//! Declarative field diffing.
//!
//! Values are compared by their rendered text. Two values that are equal in
//! the domain but render differently (`1.50` and `1.5`) count as a change.

use crate::domain::model::AuditAction;

/// One audited field: its name in the history and how to render it.
/// `None` means "no value" (an unset optional field).
pub struct TrackedField<T> {
    pub name: &'static str,
    pub render: fn(&T) -> Option<String>,
}

impl<T> TrackedField<T> {
    pub const fn new(name: &'static str, render: fn(&T) -> Option<String>) -> Self {
        Self { name, render }
    }
}

/// An entity whose changes are recorded.
pub trait Audited: Sized + 'static {
    /// Stored as `source_type` on every entry.
    const SOURCE_TYPE: &'static str;

    fn source_id(&self) -> i32;

    fn tracked_fields() -> &'static [TrackedField<Self>];
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldChange {
    pub field: &'static str,
    pub value: Option<String>,
}

/// Changes produced by one logical operation on one entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeSet {
    pub source_type: &'static str,
    pub source_id: i32,
    pub action: AuditAction,
    pub changes: Vec<FieldChange>,
}

impl ChangeSet {
    /// Every tracked field that has a value.
    pub fn created<T: Audited>(after: &T) -> Self {
        Self::snapshot(after, AuditAction::Created)
    }

    /// Every tracked field whose rendering differs, with its new rendering.
    pub fn modified<T: Audited>(before: &T, after: &T) -> Self {
        let changes = T::tracked_fields()
            .iter()
            .filter_map(|f| {
                let old = (f.render)(before);
                let new = (f.render)(after);
                (old != new).then_some(FieldChange {
                    field: f.name,
                    value: new,
                })
            })
            .collect();
        Self {
            source_type: T::SOURCE_TYPE,
            source_id: after.source_id(),
            action: AuditAction::Modified,
            changes,
        }
    }

    /// Every tracked field that had a value, with that last value.
    pub fn deleted<T: Audited>(before: &T) -> Self {
        Self::snapshot(before, AuditAction::Deleted)
    }

    fn snapshot<T: Audited>(entity: &T, action: AuditAction) -> Self {
        let changes = T::tracked_fields()
            .iter()
            .filter_map(|f| {
                (f.render)(entity).map(|value| FieldChange {
                    field: f.name,
                    value: Some(value),
                })
            })
            .collect();
        Self {
            source_type: T::SOURCE_TYPE,
            source_id: entity.source_id(),
            action,
            changes,
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }
}

/// `None`/`Some` → created, `Some`/`Some` → modified, `Some`/`None` → deleted.
/// Returns `None` when there is nothing on either side.
pub fn diff<T: Audited>(before: Option<&T>, after: Option<&T>) -> Option<ChangeSet> {
    match (before, after) {
        (None, Some(after)) => Some(ChangeSet::created(after)),
        (Some(before), Some(after)) => Some(ChangeSet::modified(before, after)),
        (Some(before), None) => Some(ChangeSet::deleted(before)),
        (None, None) => None,
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[derive(Clone)]
    struct Ticket {
        id: i32,
        title: String,
        assignee: Option<String>,
        priority: f64,
    }

    static TICKET_FIELDS: [TrackedField<Ticket>; 3] = [
        TrackedField::new("title", |t| Some(t.title.clone())),
        TrackedField::new("assignee", |t| t.assignee.clone()),
        TrackedField::new("priority", |t| Some(t.priority.to_string())),
    ];

    impl Audited for Ticket {
        const SOURCE_TYPE: &'static str = "ticket";

        fn source_id(&self) -> i32 {
            self.id
        }

        fn tracked_fields() -> &'static [TrackedField<Self>] {
            &TICKET_FIELDS
        }
    }

    fn ticket() -> Ticket {
        Ticket {
            id: 9,
            title: "Printer on fire".to_owned(),
            assignee: None,
            priority: 1.0,
        }
    }

    fn fields(set: &ChangeSet) -> Vec<(&str, Option<&str>)> {
        set.changes
            .iter()
            .map(|c| (c.field, c.value.as_deref()))
            .collect()
    }

    #[test]
    fn created_lists_fields_with_values() {
        let set = diff(None, Some(&ticket())).unwrap();
        assert_eq!(set.action, AuditAction::Created);
        assert_eq!(set.source_type, "ticket");
        assert_eq!(set.source_id, 9);
        assert_eq!(
            fields(&set),
            vec![("title", Some("Printer on fire")), ("priority", Some("1"))]
        );
    }

    #[test]
    fn modified_lists_only_changed_fields_with_new_values() {
        let before = ticket();
        let mut after = before.clone();
        after.assignee = Some("grace".to_owned());

        let set = diff(Some(&before), Some(&after)).unwrap();
        assert_eq!(set.action, AuditAction::Modified);
        assert_eq!(fields(&set), vec![("assignee", Some("grace"))]);
    }

    #[test]
    fn clearing_a_field_records_no_value() {
        let mut before = ticket();
        before.assignee = Some("grace".to_owned());
        let after = ticket();

        let set = ChangeSet::modified(&before, &after);
        assert_eq!(fields(&set), vec![("assignee", None)]);
    }

    #[test]
    fn unchanged_entity_yields_empty_set() {
        let t = ticket();
        assert!(ChangeSet::modified(&t, &t).is_empty());
    }

    #[test]
    fn comparison_is_textual() {
        let before = ticket();
        let mut after = before.clone();
        after.priority = 1.0 + f64::EPSILON;

        let set = ChangeSet::modified(&before, &after);
        assert_eq!(set.changes.len(), 1);
        assert_eq!(set.changes[0].field, "priority");
    }

    #[test]
    fn deleted_keeps_last_values() {
        let set = diff(Some(&ticket()), None).unwrap();
        assert_eq!(set.action, AuditAction::Deleted);
        assert_eq!(
            fields(&set),
            vec![("title", Some("Printer on fire")), ("priority", Some("1"))]
        );
    }

    #[test]
    fn nothing_to_diff() {
        assert!(diff::<Ticket>(None, None).is_none());
    }
}
