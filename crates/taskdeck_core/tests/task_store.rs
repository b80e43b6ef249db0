use rusqlite::Connection;
use std::collections::HashSet;
use taskdeck_core::db::open_db_in_memory;
use taskdeck_core::db::schema::SCHEMA_VERSION;
use taskdeck_core::{RepoError, Task, TaskFilter, TaskStatus, TaskStore, TaskValidationError};

const SLOT: &str = "2024-06-01T10:00:00Z";

#[test]
fn insert_and_get_roundtrip_joins_status_name() {
    let conn = open_db_in_memory().unwrap();
    let store = TaskStore::try_new(&conn).unwrap();

    let task = Task::new("Buy milk", SLOT)
        .with_description("2 litres")
        .with_location("Corner shop");
    let id = store.insert(&task).unwrap();
    assert_eq!(id, task.id);

    let loaded = store.get_by_id(&id).unwrap().unwrap();
    assert_eq!(loaded, task);
    assert_eq!(loaded.status, TaskStatus::InProgress);
}

#[test]
fn get_by_id_returns_none_for_missing_id() {
    let conn = open_db_in_memory().unwrap();
    let store = TaskStore::try_new(&conn).unwrap();

    assert!(store.get_by_id("nonexistent").unwrap().is_none());
}

#[test]
fn insert_defaults_missing_id_and_created_at() {
    let conn = open_db_in_memory().unwrap();
    let store = TaskStore::try_new(&conn).unwrap();

    let mut task = Task::new("No identity", SLOT);
    task.id = String::new();
    task.created_at = String::new();
    let id = store.insert(&task).unwrap();

    assert!(!id.is_empty());
    let loaded = store.get_by_id(&id).unwrap().unwrap();
    assert!(!loaded.created_at.is_empty());
    assert_eq!(loaded.title, "No identity");
}

#[test]
fn duplicate_id_is_rejected_and_row_kept_once() {
    let conn = open_db_in_memory().unwrap();
    let store = TaskStore::try_new(&conn).unwrap();

    let task = Task::new("original", SLOT);
    store.insert(&task).unwrap();

    let mut clash = Task::new("impostor", SLOT);
    clash.id = task.id.clone();
    let err = store.insert(&clash).unwrap_err();
    assert!(err.is_constraint_violation(), "unexpected error: {err}");

    assert_eq!(store.count().unwrap(), 1);
    assert_eq!(store.get_by_id(&task.id).unwrap().unwrap().title, "original");
}

#[test]
fn blank_title_is_rejected_before_sql() {
    let conn = open_db_in_memory().unwrap();
    let store = TaskStore::try_new(&conn).unwrap();

    let err = store.insert(&Task::new("  ", SLOT)).unwrap_err();
    assert!(matches!(
        err,
        RepoError::Validation(TaskValidationError::EmptyTitle)
    ));
    assert_eq!(store.count().unwrap(), 0);
}

#[test]
fn engine_rejects_unknown_null_status_and_null_title() {
    let conn = open_db_in_memory().unwrap();
    let store = TaskStore::try_new(&conn).unwrap();

    let unknown_status = raw_insert(&conn, "t-1", Some("title"), Some("pending"));
    let null_status = raw_insert(&conn, "t-2", Some("title"), None);
    let null_title = raw_insert(&conn, "t-3", None, Some("in_progress"));

    for result in [unknown_status, null_status, null_title] {
        let err = RepoError::from(result.unwrap_err());
        assert!(err.is_constraint_violation(), "unexpected error: {err}");
    }
    assert_eq!(store.count().unwrap(), 0);
}

#[test]
fn update_fields_overwrites_everything_but_identity() {
    let conn = open_db_in_memory().unwrap();
    let store = TaskStore::try_new(&conn).unwrap();

    let task = Task::new("draft", SLOT);
    store.insert(&task).unwrap();

    let mut edited = task.clone();
    edited.title = "final".to_string();
    edited.description = Some("details".to_string());
    edited.date_time = "2024-07-01T08:30:00Z".to_string();
    edited.location = Some("Office".to_string());
    edited.status = TaskStatus::Cancelled;
    edited.created_at = "1999-01-01T00:00:00.000Z".to_string();
    assert_eq!(store.update_fields(&edited).unwrap(), 1);

    let loaded = store.get_by_id(&task.id).unwrap().unwrap();
    assert_eq!(loaded.title, "final");
    assert_eq!(loaded.description.as_deref(), Some("details"));
    assert_eq!(loaded.date_time, "2024-07-01T08:30:00Z");
    assert_eq!(loaded.location.as_deref(), Some("Office"));
    assert_eq!(loaded.status, TaskStatus::Cancelled);
    assert_eq!(loaded.created_at, task.created_at);
}

#[test]
fn writes_against_missing_id_are_silent_no_ops() {
    let conn = open_db_in_memory().unwrap();
    let store = TaskStore::try_new(&conn).unwrap();

    let kept = Task::new("kept", SLOT);
    store.insert(&kept).unwrap();
    let before = store.list_all(None).unwrap();

    let ghost = Task::new("ghost", SLOT);
    assert_eq!(store.update_fields(&ghost).unwrap(), 0);
    assert_eq!(
        store.update_status(&ghost.id, TaskStatus::Completed).unwrap(),
        0
    );
    assert_eq!(store.delete(&ghost.id).unwrap(), 0);

    assert_eq!(store.list_all(None).unwrap(), before);
}

#[test]
fn update_status_and_delete_target_one_row() {
    let conn = open_db_in_memory().unwrap();
    let store = TaskStore::try_new(&conn).unwrap();

    let first = Task::new("first", SLOT);
    let second = Task::new("second", SLOT);
    store.insert(&first).unwrap();
    store.insert(&second).unwrap();

    assert_eq!(
        store.update_status(&first.id, TaskStatus::Completed).unwrap(),
        1
    );
    let loaded = store.get_by_id(&first.id).unwrap().unwrap();
    assert_eq!(loaded.status, TaskStatus::Completed);
    assert_eq!(loaded.title, "first");

    assert_eq!(store.delete(&first.id).unwrap(), 1);
    assert!(store.get_by_id(&first.id).unwrap().is_none());
    assert!(store.get_by_id(&second.id).unwrap().is_some());
}

#[test]
fn list_orders_by_created_at_with_insertion_order_for_ties() {
    let conn = open_db_in_memory().unwrap();
    let store = TaskStore::try_new(&conn).unwrap();

    let late = created_at("late", "2024-06-03T09:00:00.000Z");
    let tie_a = created_at("tie a", "2024-06-02T09:00:00.000Z");
    let early = created_at("early", "2024-06-01T09:00:00.000Z");
    let tie_b = created_at("tie b", "2024-06-02T09:00:00.000Z");
    for task in [&late, &tie_a, &early, &tie_b] {
        store.insert(task).unwrap();
    }

    let titles = |tasks: Vec<Task>| tasks.into_iter().map(|task| task.title).collect::<Vec<_>>();
    let listed = titles(store.list_all(None).unwrap());
    assert_eq!(listed, vec!["early", "tie a", "tie b", "late"]);
    assert_eq!(titles(store.list_all(None).unwrap()), listed);
}

#[test]
fn status_filters_partition_the_full_list() {
    let conn = open_db_in_memory().unwrap();
    let store = TaskStore::try_new(&conn).unwrap();

    let statuses = [
        TaskStatus::InProgress,
        TaskStatus::Completed,
        TaskStatus::Completed,
        TaskStatus::InProgress,
        TaskStatus::Cancelled,
        TaskStatus::Completed,
    ];
    for (index, status) in statuses.into_iter().enumerate() {
        store
            .insert(&Task::new(format!("task {index}"), SLOT).with_status(status))
            .unwrap();
    }

    let all: HashSet<String> = store
        .list_all(None)
        .unwrap()
        .into_iter()
        .map(|task| task.id)
        .collect();
    let mut union = HashSet::new();
    for status in TaskStatus::ALL {
        let subset = store.list_all(Some(&TaskFilter::Status(status))).unwrap();
        assert!(subset.iter().all(|task| task.status == status));
        for task in subset {
            assert!(union.insert(task.id), "task listed under two statuses");
        }
    }
    assert_eq!(union, all);

    let completed = store
        .list_all(Some(&TaskFilter::Status(TaskStatus::Completed)))
        .unwrap();
    assert_eq!(completed.len(), 3);
}

#[test]
fn date_filter_is_exact_string_match() {
    let conn = open_db_in_memory().unwrap();
    let store = TaskStore::try_new(&conn).unwrap();

    store.insert(&Task::new("morning", SLOT)).unwrap();
    store
        .insert(&Task::new("evening", "2024-06-01T18:00:00Z"))
        .unwrap();

    let exact = store
        .list_all(Some(&TaskFilter::Date(SLOT.to_string())))
        .unwrap();
    assert_eq!(exact.len(), 1);
    assert_eq!(exact[0].title, "morning");

    let partial = store
        .list_all(Some(&TaskFilter::Date("2024-06-01".to_string())))
        .unwrap();
    assert!(partial.is_empty());
}

#[test]
fn iso_date_variants_are_stored_and_filtered_verbatim() {
    let conn = open_db_in_memory().unwrap();
    let store = TaskStore::try_new(&conn).unwrap();

    let variants = ["2024-06-01", "2024-06-01T10:00:00", "2024-06-01T10:00"];
    for date_time in variants {
        store.insert(&Task::new("Buy milk", date_time)).unwrap();
    }
    assert_eq!(store.count().unwrap(), 3);

    for date_time in variants {
        let matched = store
            .list_all(Some(&TaskFilter::Date(date_time.to_string())))
            .unwrap();
        assert_eq!(matched.len(), 1, "{date_time}");
        assert_eq!(matched[0].date_time, date_time);
    }
}

#[test]
fn blank_date_time_is_rejected_before_sql() {
    let conn = open_db_in_memory().unwrap();
    let store = TaskStore::try_new(&conn).unwrap();

    let err = store.insert(&Task::new("Undated", "")).unwrap_err();
    assert!(matches!(
        err,
        RepoError::Validation(TaskValidationError::EmptyDateTime)
    ));
    assert_eq!(store.count().unwrap(), 0);
}

#[test]
fn rows_with_status_outside_catalog_are_rejected() {
    let conn = open_db_in_memory().unwrap();
    let store = TaskStore::try_new(&conn).unwrap();

    conn.execute(
        "INSERT INTO statuses (id, name) VALUES ('archived', 'archived');",
        [],
    )
    .unwrap();
    raw_insert(&conn, "t-archived", Some("old"), Some("archived")).unwrap();

    let err = store.list_all(None).unwrap_err();
    assert!(matches!(err, RepoError::InvalidData(_)));
}

#[test]
fn list_statuses_returns_seeded_catalog() {
    let conn = open_db_in_memory().unwrap();
    let store = TaskStore::try_new(&conn).unwrap();

    let names = store
        .list_statuses()
        .unwrap()
        .into_iter()
        .map(|status| status.name)
        .collect::<Vec<_>>();
    assert_eq!(names, vec!["in_progress", "completed", "cancelled"]);
}

#[test]
fn clear_all_keeps_statuses() {
    let conn = open_db_in_memory().unwrap();
    let store = TaskStore::try_new(&conn).unwrap();

    store.insert(&Task::new("one", SLOT)).unwrap();
    store.insert(&Task::new("two", SLOT)).unwrap();
    assert_eq!(store.clear_all().unwrap(), 2);
    assert_eq!(store.count().unwrap(), 0);
    assert_eq!(store.list_statuses().unwrap().len(), 3);
}

#[test]
fn store_rejects_uninitialized_connection() {
    let conn = Connection::open_in_memory().unwrap();

    match TaskStore::try_new(&conn) {
        Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version: 0,
        }) => assert_eq!(expected_version, SCHEMA_VERSION),
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("expected uninitialized connection error"),
    }
}

#[test]
fn store_rejects_connection_missing_required_column() {
    let conn = Connection::open_in_memory().unwrap();
    conn.execute_batch(&format!(
        "CREATE TABLE statuses (id TEXT PRIMARY KEY, name TEXT NOT NULL UNIQUE);
         CREATE TABLE tasks (id TEXT PRIMARY KEY, title TEXT NOT NULL);
         PRAGMA user_version = {SCHEMA_VERSION};"
    ))
    .unwrap();

    assert!(matches!(
        TaskStore::try_new(&conn),
        Err(RepoError::MissingRequiredColumn {
            table: "tasks",
            column: "description"
        })
    ));
}

fn created_at(title: &str, created_at: &str) -> Task {
    let mut task = Task::new(title, SLOT);
    task.created_at = created_at.to_string();
    task
}

fn raw_insert(
    conn: &Connection,
    id: &str,
    title: Option<&str>,
    status_id: Option<&str>,
) -> rusqlite::Result<usize> {
    conn.execute(
        "INSERT INTO tasks (id, title, dateTime, status_id, createdAt)
         VALUES (?1, ?2, ?3, ?4, ?5);",
        rusqlite::params![id, title, SLOT, status_id, "2024-06-01T09:00:00.000Z"],
    )
}
