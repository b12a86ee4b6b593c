use personnel_core::db::migrations::latest_version;
use personnel_core::db::{open_db, open_db_in_memory, DbError};
use rusqlite::Connection;

#[test]
fn open_db_in_memory_applies_all_migrations() {
    let conn = open_db_in_memory().unwrap();

    assert_eq!(schema_version(&conn), latest_version());
    assert_table_exists(&conn, "leagues");
    assert_table_exists(&conn, "employees");
}

#[test]
fn opening_same_database_twice_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("personnel.sqlite3");

    let conn_first = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn_first), latest_version());
    drop(conn_first);

    let conn_second = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn_second), latest_version());
    assert_table_exists(&conn_second, "employees");
}

#[test]
fn opening_database_with_newer_schema_version_returns_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.sqlite3");

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
            assert_eq!(latest_supported, latest_version());
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn schema_allows_only_one_root() {
    let conn = open_db_in_memory().unwrap();
    conn.execute(
        "INSERT INTO employees (last_name, first_name, email, password, is_root)
         VALUES ('root', 'root', 'root', 'toor', 1);",
        [],
    )
    .unwrap();

    let second_root = conn.execute(
        "INSERT INTO employees (last_name, first_name, email, password, is_root)
         VALUES ('other', 'other', 'other', 'pw', 1);",
        [],
    );
    assert!(second_root.is_err());
}

#[test]
fn schema_rejects_member_without_league() {
    let conn = open_db_in_memory().unwrap();
    let result = conn.execute(
        "INSERT INTO employees (last_name, first_name, email, password, is_root)
         VALUES ('Doe', 'Jane', 'jane@x.com', 'pw', 0);",
        [],
    );
    assert!(result.is_err());
}

#[test]
fn schema_rejects_member_without_arrival_date() {
    let conn = open_db_in_memory().unwrap();
    conn.execute(
        "INSERT INTO employees (last_name, first_name, email, password, is_root)
         VALUES ('root', 'root', 'root', 'toor', 1);",
        [],
    )
    .unwrap();
    conn.execute("INSERT INTO leagues (name) VALUES ('Darts');", [])
        .unwrap();

    let undated = conn.execute(
        "INSERT INTO employees (last_name, first_name, email, password, league_id, is_root)
         VALUES ('Doe', 'Jane', 'jane@x.com', 'pw', 1, 0);",
        [],
    );
    assert!(undated.is_err());

    conn.execute(
        "INSERT INTO employees
            (last_name, first_name, email, password, arrival_date, league_id, is_root)
         VALUES ('Doe', 'Jane', 'jane@x.com', 'pw', '2024-03-15', 1, 0);",
        [],
    )
    .unwrap();
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
