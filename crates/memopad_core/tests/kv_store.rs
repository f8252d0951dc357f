use memopad_core::db::migrations::latest_version;
use memopad_core::db::{open_db, open_db_in_memory, DbError};
use memopad_core::{KeyValueStore, SqliteKvStore, StoreError};
use rusqlite::Connection;

#[test]
fn open_db_in_memory_applies_all_migrations() {
    let conn = open_db_in_memory().unwrap();

    assert_eq!(schema_version(&conn), latest_version());
    assert_table_exists(&conn, "kv_items");
}

#[test]
fn reopening_store_file_keeps_values() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("memopad.sqlite3");

    let store = SqliteKvStore::open(&path).unwrap();
    store.set_item("memo", r#"[{"title":"a"}]"#).unwrap();
    drop(store);

    let reopened = SqliteKvStore::open(&path).unwrap();
    assert_eq!(
        reopened.get_item("memo").unwrap().as_deref(),
        Some(r#"[{"title":"a"}]"#)
    );
    assert_eq!(reopened.get_item("missing").unwrap(), None);
}

#[test]
fn opening_store_with_newer_schema_version_returns_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.sqlite3");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("PRAGMA user_version = 999;").unwrap();
    drop(conn);

    match open_db(&path).unwrap_err() {
        DbError::UnsupportedSchemaVersion {
            db_version,
            latest_supported,
        } => {
            assert_eq!(db_version, 999);
            assert_eq!(latest_supported, latest_version());
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(matches!(
        SqliteKvStore::open(&path),
        Err(StoreError::Db(DbError::UnsupportedSchemaVersion { .. }))
    ));
}

#[test]
fn blank_key_is_rejected_by_sqlite_store() {
    let store = SqliteKvStore::open_in_memory().unwrap();
    let err = store.set_item("", "[]").unwrap_err();
    assert!(matches!(err, StoreError::InvalidKey(_)));
}

fn schema_version(conn: &Connection) -> u32 {
    conn.query_row("PRAGMA user_version;", [], |row| row.get(0))
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
