use rusqlite::Connection;
use taskdeck_core::db::schema::{current_user_version, initialize, SCHEMA_VERSION};
use taskdeck_core::db::{open_db, open_db_in_memory, DbError};

#[test]
fn open_db_in_memory_creates_and_seeds_schema() {
    let conn = open_db_in_memory().unwrap();

    assert_eq!(current_user_version(&conn).unwrap(), SCHEMA_VERSION);
    assert_table_exists(&conn, "statuses");
    assert_table_exists(&conn, "tasks");
    assert_eq!(
        status_rows(&conn),
        vec![
            ("in_progress".to_string(), "in_progress".to_string()),
            ("completed".to_string(), "completed".to_string()),
            ("cancelled".to_string(), "cancelled".to_string()),
        ]
    );
}

#[test]
fn connections_enforce_foreign_keys() {
    let conn = open_db_in_memory().unwrap();
    let enabled: i64 = conn
        .query_row("PRAGMA foreign_keys;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(enabled, 1);
}

#[test]
fn reopening_same_database_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("taskdeck.db");

    let first = open_db(&path).unwrap();
    first
        .execute(
            "INSERT INTO tasks (id, title, dateTime, status_id, createdAt)
             VALUES ('t-1', 'keep me', '2024-06-01T10:00:00Z', 'completed', '2024-06-01T09:00:00Z');",
            [],
        )
        .unwrap();
    drop(first);

    let mut second = open_db(&path).unwrap();
    initialize(&mut second).unwrap();
    assert_eq!(status_rows(&second).len(), 3);
    let kept: i64 = second
        .query_row("SELECT COUNT(*) FROM tasks;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(kept, 1);
}

#[test]
fn seeding_never_overwrites_existing_status_rows() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("renamed.db");

    let conn = open_db(&path).unwrap();
    conn.execute(
        "UPDATE statuses SET name = 'done' WHERE id = 'completed';",
        [],
    )
    .unwrap();
    drop(conn);

    let reopened = open_db(&path).unwrap();
    let rows = status_rows(&reopened);
    assert_eq!(rows.len(), 3);
    assert!(rows.contains(&("completed".to_string(), "done".to_string())));
}

#[test]
fn opening_database_with_newer_schema_version_returns_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.db");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("PRAGMA user_version = 999;").unwrap();
    drop(conn);

    let err = open_db(&path).unwrap_err();
    match err {
        DbError::UnsupportedSchemaVersion {
            db_version,
            latest_supported,
        } => {
            assert_eq!(db_version, 999);
            assert_eq!(latest_supported, SCHEMA_VERSION);
        }
        other => panic!("unexpected error: {other}"),
    }
}

fn status_rows(conn: &Connection) -> Vec<(String, String)> {
    let mut stmt = conn
        .prepare("SELECT id, name FROM statuses ORDER BY rowid;")
        .unwrap();
    stmt.query_map([], |row| Ok((row.get(0)?, row.get(1)?)))
        .unwrap()
        .collect::<rusqlite::Result<Vec<_>>>()
        .unwrap()
}

fn assert_table_exists(conn: &Connection, table_name: &str) {
    let exists: i64 = conn
        .query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM sqlite_master
                WHERE type = 'table' AND name = ?1
            );",
            [table_name],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(exists, 1, "table {table_name} does not exist");
}
