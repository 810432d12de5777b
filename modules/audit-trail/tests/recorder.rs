#![allow(clippy::unwrap_used, clippy::expect_used)]

use audit_trail::{
    AuditAction, AuditTrailRecorder, Audited, ChangeSet, Migrator, RecordChange, TrackedField,
};
use crm_db::migration_runner::run_migrations_for_testing;
use crm_db::sea_orm::{
    ActiveModelTrait, ConnectionTrait, DatabaseConnection, EntityTrait, IntoActiveModel, Set,
    Statement,
};
use crm_db::sea_orm_migration::MigratorTrait;
use crm_db::{ConnectOpts, TransactionScope, connect_db};

#[derive(Clone)]
struct Widget {
    id: i32,
    status: String,
    note: Option<String>,
}

static WIDGET_FIELDS: [TrackedField<Widget>; 2] = [
    TrackedField::new("status", |w| Some(w.status.clone())),
    TrackedField::new("note", |w| w.note.clone()),
];

impl Audited for Widget {
    const SOURCE_TYPE: &'static str = "widget";

    fn source_id(&self) -> i32 {
        self.id
    }

    fn tracked_fields() -> &'static [TrackedField<Self>] {
        &WIDGET_FIELDS
    }
}

async fn setup() -> (TransactionScope, DatabaseConnection) {
    let db = connect_db("sqlite::memory:", ConnectOpts::default())
        .await
        .expect("Failed to connect to in-memory database");
    run_migrations_for_testing(&db, Migrator::migrations())
        .await
        .expect("Failed to run migrations");
    db.execute_unprepared("CREATE TABLE widgets (id INTEGER PRIMARY KEY, status TEXT NOT NULL)")
        .await
        .unwrap();
    (TransactionScope::new(db.clone()), db)
}

async fn count(db: &DatabaseConnection, table: &str) -> i64 {
    db.query_one(Statement::from_string(
        db.get_database_backend(),
        format!("SELECT COUNT(*) AS n FROM {table}"),
    ))
    .await
    .unwrap()
    .unwrap()
    .try_get::<i64>("", "n")
    .unwrap()
}

#[tokio::test]
async fn status_change_commits_one_entry() {
    let (scope, db) = setup().await;
    let recorder = AuditTrailRecorder::new();
    let before = Widget {
        id: 1,
        status: "pending".to_owned(),
        note: Some("fragile".to_owned()),
    };
    let after = Widget {
        status: "active".to_owned(),
        ..before.clone()
    };

    let tx = scope.open().await.unwrap();
    {
        let conn = tx.conn().await.unwrap();
        conn.execute_unprepared("INSERT INTO widgets (id, status) VALUES (1, 'active')")
            .await
            .unwrap();
        let written = recorder
            .record(&conn, &ChangeSet::modified(&before, &after), 42)
            .await
            .unwrap();
        assert_eq!(written, 1);
    }
    tx.commit().await.unwrap();

    let history = recorder.history(&db, "widget", 1).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].field, "status");
    assert_eq!(history[0].value.as_deref(), Some("active"));
    assert_eq!(history[0].action, AuditAction::Modified);
    assert_eq!(history[0].modified_by, 42);
}

#[tokio::test]
async fn rollback_discards_mutation_and_history_together() {
    let (scope, db) = setup().await;
    let recorder = AuditTrailRecorder::new();
    let widget = Widget {
        id: 5,
        status: "new".to_owned(),
        note: None,
    };

    let tx = scope.open().await.unwrap();
    {
        let conn = tx.conn().await.unwrap();
        conn.execute_unprepared("INSERT INTO widgets (id, status) VALUES (5, 'new')")
            .await
            .unwrap();
        recorder
            .record(&conn, &ChangeSet::created(&widget), 1)
            .await
            .unwrap();
    }
    // Simulated failure after both writes: the request never commits.
    tx.rollback().await;

    assert_eq!(count(&db, "widgets").await, 0);
    assert_eq!(count(&db, "historical_records").await, 0);
}

#[tokio::test]
async fn failed_history_write_discards_the_mutation() {
    let (scope, db) = setup().await;
    db.execute_unprepared(
        "CREATE TRIGGER history_unavailable BEFORE INSERT ON historical_records \
         BEGIN SELECT RAISE(ABORT, 'history unavailable'); END",
    )
    .await
    .unwrap();
    let recorder = AuditTrailRecorder::new();
    let widget = Widget {
        id: 7,
        status: "new".to_owned(),
        note: None,
    };

    let tx = scope.open().await.unwrap();
    let recorded = {
        let conn = tx.conn().await.unwrap();
        conn.execute_unprepared("INSERT INTO widgets (id, status) VALUES (7, 'new')")
            .await
            .unwrap();
        recorder.record(&conn, &ChangeSet::created(&widget), 1).await
    };
    assert!(recorded.is_err());
    tx.rollback().await;

    assert_eq!(count(&db, "widgets").await, 0);
    assert_eq!(count(&db, "historical_records").await, 0);

    db.execute_unprepared("DROP TRIGGER history_unavailable")
        .await
        .unwrap();
    let tx = scope.open().await.unwrap();
    {
        let conn = tx.conn().await.unwrap();
        conn.execute_unprepared("INSERT INTO widgets (id, status) VALUES (7, 'new')")
            .await
            .unwrap();
        recorder
            .record(&conn, &ChangeSet::created(&widget), 1)
            .await
            .unwrap();
    }
    tx.commit().await.unwrap();
    assert_eq!(count(&db, "widgets").await, 1);
    assert_eq!(count(&db, "historical_records").await, 1);
}

#[tokio::test]
async fn entries_of_one_operation_share_modified_at() {
    let (scope, db) = setup().await;
    let recorder = AuditTrailRecorder::new();
    let widget = Widget {
        id: 2,
        status: "new".to_owned(),
        note: Some("rush".to_owned()),
    };

    let tx = scope.open().await.unwrap();
    {
        let conn = tx.conn().await.unwrap();
        recorder
            .record(&conn, &ChangeSet::created(&widget), 1)
            .await
            .unwrap();
    }
    tx.commit().await.unwrap();

    let history = recorder.history(&db, "widget", 2).await.unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].modified_at, history[1].modified_at);
    assert_eq!(
        history.iter().map(|h| h.field.as_str()).collect::<Vec<_>>(),
        vec!["status", "note"]
    );
}

#[tokio::test]
async fn empty_change_set_writes_nothing() {
    let (scope, db) = setup().await;
    let recorder = AuditTrailRecorder::new();
    let widget = Widget {
        id: 3,
        status: "same".to_owned(),
        note: None,
    };

    let tx = scope.open().await.unwrap();
    {
        let conn = tx.conn().await.unwrap();
        let written = recorder
            .record(&conn, &ChangeSet::modified(&widget, &widget), 1)
            .await
            .unwrap();
        assert_eq!(written, 0);
    }
    tx.commit().await.unwrap();

    assert_eq!(count(&db, "historical_records").await, 0);
}

#[tokio::test]
async fn single_entries_can_be_recorded_directly() {
    let (scope, db) = setup().await;
    let recorder = AuditTrailRecorder::new();

    let tx = scope.open().await.unwrap();
    {
        let conn = tx.conn().await.unwrap();
        recorder
            .record_change(
                &conn,
                RecordChange {
                    source_id: 8,
                    source_type: "widget".to_owned(),
                    action: AuditAction::Deleted,
                    field: "status".to_owned(),
                    value: Some("archived".to_owned()),
                    modified_by: 4,
                    modified_at: time::OffsetDateTime::now_utc(),
                },
            )
            .await
            .unwrap();
    }
    tx.commit().await.unwrap();

    let history = recorder.history(&db, "widget", 8).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].action, AuditAction::Deleted);
    assert!(recorder.history(&db, "gadget", 8).await.unwrap().is_empty());
}

#[tokio::test]
async fn stored_entries_cannot_be_updated_or_deleted() {
    use audit_trail::infra::storage::entity;

    let (scope, db) = setup().await;
    let recorder = AuditTrailRecorder::new();
    let widget = Widget {
        id: 6,
        status: "new".to_owned(),
        note: None,
    };
    let tx = scope.open().await.unwrap();
    {
        let conn = tx.conn().await.unwrap();
        recorder
            .record(&conn, &ChangeSet::created(&widget), 1)
            .await
            .unwrap();
    }
    tx.commit().await.unwrap();

    let row = entity::Entity::find().one(&db).await.unwrap().unwrap();
    let mut active = row.clone().into_active_model();
    active.value = Set(Some("tampered".to_owned()));
    assert!(active.update(&db).await.is_err());
    assert!(row.into_active_model().delete(&db).await.is_err());

    assert_eq!(count(&db, "historical_records").await, 1);
}
