use fieldstore_core::db::{
    Connection, ConnectionConfig, ConnectionState, DbError, DbResult, DomainTable, INFO_TABLE_NAME,
};
use rusqlite::OpenFlags;
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

struct WellTable;

impl DomainTable for WellTable {
    fn name(&self) -> &str {
        "WELLS"
    }

    fn create(&self, conn: &rusqlite::Connection) -> DbResult<bool> {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS WELLS (ID INTEGER PRIMARY KEY, NAME TEXT NOT NULL);",
        )?;
        Ok(true)
    }

    fn create_index(&self, conn: &rusqlite::Connection) -> DbResult<usize> {
        conn.execute_batch("CREATE INDEX IF NOT EXISTS IDX_WELLS_NAME ON WELLS (NAME);")?;
        Ok(1)
    }
}

/// Parent/child pair whose foreign key is only checked at commit.
struct DeferredLinkTables;

impl DomainTable for DeferredLinkTables {
    fn name(&self) -> &str {
        "CHILD"
    }

    fn create(&self, conn: &rusqlite::Connection) -> DbResult<bool> {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS PARENT (ID INTEGER PRIMARY KEY);
             CREATE TABLE IF NOT EXISTS CHILD (
                 ID INTEGER PRIMARY KEY,
                 PARENT_ID INTEGER NOT NULL
                     REFERENCES PARENT (ID) DEFERRABLE INITIALLY DEFERRED
             );",
        )?;
        Ok(true)
    }

    fn create_index(&self, _conn: &rusqlite::Connection) -> DbResult<usize> {
        Ok(0)
    }
}

fn manual_config() -> ConnectionConfig {
    ConnectionConfig::default()
        .auto_flush(false)
        .table(Arc::new(WellTable))
}

fn insert_well(connection: &Connection, name: &str) {
    connection
        .with_handle(|handle| {
            handle.execute("INSERT INTO WELLS (NAME) VALUES (?1);", [name])?;
            Ok::<_, DbError>(())
        })
        .unwrap();
}

/// Counts rows through an independent read-only handle.
fn committed_wells(path: &Path) -> i64 {
    let reader = rusqlite::Connection::open_with_flags(path, OpenFlags::SQLITE_OPEN_READ_ONLY)
        .unwrap();
    reader
        .query_row("SELECT COUNT(*) FROM WELLS;", [], |row| row.get(0))
        .unwrap()
}

#[test]
fn create_on_a_new_path_builds_every_table_and_opens() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("new.db");
    let connection = Connection::new(manual_config());

    connection.create(&path).unwrap();

    assert_eq!(connection.state(), ConnectionState::Open);
    assert_eq!(connection.path().as_deref(), Some(path.as_path()));
    assert!(connection.table_exists(INFO_TABLE_NAME).unwrap());
    assert!(connection.table_exists("infotable_v1").unwrap());
    assert!(connection.table_exists("WELLS").unwrap());
}

#[test]
fn create_on_an_existing_path_fails_and_leaves_the_file_alone() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("taken.db");
    std::fs::write(&path, b"keep me").unwrap();
    let connection = Connection::new(manual_config());

    assert!(matches!(connection.create(&path), Err(DbError::FileExists(_))));
    assert_eq!(connection.state(), ConnectionState::Closed);
    assert_eq!(std::fs::read(&path).unwrap(), b"keep me");
}

#[test]
fn open_rejects_missing_and_foreign_files() {
    let dir = tempfile::tempdir().unwrap();
    let connection = Connection::new(manual_config());

    assert!(matches!(
        connection.open(dir.path().join("missing.db")),
        Err(DbError::FileNotFound(_))
    ));
    assert_eq!(connection.state(), ConnectionState::Closed);

    let foreign = dir.path().join("foreign.db");
    rusqlite::Connection::open(&foreign)
        .unwrap()
        .execute_batch("CREATE TABLE OTHER (ID INTEGER);")
        .unwrap();
    assert!(matches!(
        connection.open(&foreign),
        Err(DbError::FormatNotRecognized(_))
    ));
    assert_eq!(connection.state(), ConnectionState::Closed);
    assert!(!connection.is_open());
}

#[test]
fn writes_become_visible_to_other_readers_only_after_flush() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("batch.db");
    let connection = Connection::new(manual_config());
    connection.create(&path).unwrap();

    insert_well(&connection, "A-1");
    assert_eq!(committed_wells(&path), 0);

    connection.flush().unwrap();
    assert_eq!(committed_wells(&path), 1);
}

#[test]
fn flushed_writes_survive_close_and_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("persist.db");
    let connection = Connection::new(manual_config());
    connection.create(&path).unwrap();
    insert_well(&connection, "A-1");
    connection.flush().unwrap();
    insert_well(&connection, "A-2");
    connection.close().unwrap();
    assert_eq!(connection.state(), ConnectionState::Closed);

    connection.open(&path).unwrap();
    let count: i64 = connection
        .with_handle(|handle| {
            handle
                .query_row("SELECT COUNT(*) FROM WELLS;", [], |row| row.get(0))
                .map_err(DbError::from)
        })
        .unwrap();
    assert_eq!(count, 2);
}

#[test]
fn dropping_an_open_connection_commits_pending_work() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("drop.db");
    {
        let connection = Connection::new(manual_config());
        connection.create(&path).unwrap();
        insert_well(&connection, "B-1");
    }
    assert_eq!(committed_wells(&path), 1);
}

#[test]
fn backup_to_memory_reports_false() {
    let dir = tempfile::tempdir().unwrap();
    let connection = Connection::new(manual_config());
    connection.create(dir.path().join("mem.db")).unwrap();

    assert!(!connection.backup(":memory:").unwrap());
    assert!(connection.is_open());
}

#[test]
fn backup_produces_an_openable_copy_with_the_same_tables() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("source.db");
    let copy = dir.path().join("copy.db");
    let connection = Connection::new(manual_config());
    connection.create(&path).unwrap();
    insert_well(&connection, "C-1");

    assert!(connection.backup(&copy).unwrap());

    let restored = Connection::new(manual_config());
    restored.open(&copy).unwrap();
    assert!(restored.table_exists(INFO_TABLE_NAME).unwrap());
    assert!(restored.table_exists("WELLS").unwrap());
    assert_eq!(committed_wells(&copy), 1);

    // The source keeps batching after the copy.
    insert_well(&connection, "C-2");
    assert_eq!(committed_wells(&path), 1);
    connection.flush().unwrap();
    assert_eq!(committed_wells(&path), 2);
}

#[test]
fn scheduler_requests_flushes_until_disabled() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("auto.db");
    let config = manual_config()
        .auto_flush(true)
        .flush_interval(Duration::from_millis(20));
    let connection = Connection::new(config);
    connection.create(&path).unwrap();
    insert_well(&connection, "D-1");

    let deadline = Instant::now() + Duration::from_secs(5);
    while !connection.is_flush_pending() && Instant::now() < deadline {
        thread::sleep(Duration::from_millis(5));
    }
    assert!(connection.is_flush_pending());
    assert!(connection.execute_auto_flush().unwrap());
    assert_eq!(committed_wells(&path), 1);

    connection.disable_auto_flush();
    assert!(!connection.is_auto_flush_enabled());
    thread::sleep(Duration::from_millis(100));
    assert!(!connection.is_flush_pending());
    assert!(!connection.execute_auto_flush().unwrap());
}

#[test]
fn crash_guard_flushes_when_work_panics() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("crash.db");
    let connection = Connection::new(manual_config());
    connection.create(&path).unwrap();

    let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
        let _guard = connection.crash_guard();
        insert_well(&connection, "E-1");
        panic!("import failed halfway");
    }));

    assert!(outcome.is_err());
    assert_eq!(committed_wells(&path), 1);
    assert!(connection.is_open());
}

#[test]
fn crash_guard_does_nothing_on_normal_exit() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("calm.db");
    let connection = Connection::new(manual_config());
    connection.create(&path).unwrap();
    {
        let _guard = connection.crash_guard();
        insert_well(&connection, "F-1");
    }
    assert_eq!(committed_wells(&path), 0);
}

#[test]
fn failed_close_keeps_the_file_open_and_auto_flush_running() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("orphan.db");
    let config = ConnectionConfig::default()
        .flush_interval(Duration::from_millis(20))
        .table(Arc::new(DeferredLinkTables));
    let connection = Connection::new(config);
    connection.create(&path).unwrap();

    connection
        .with_handle(|handle| {
            handle.execute("INSERT INTO CHILD (ID, PARENT_ID) VALUES (1, 99);", [])?;
            Ok::<_, DbError>(())
        })
        .unwrap();

    assert!(matches!(connection.close(), Err(DbError::Sqlite(_))));
    assert!(connection.is_open());
    assert!(connection.is_auto_flush_enabled());

    connection
        .with_handle(|handle| {
            handle.execute("DELETE FROM CHILD WHERE ID = 1;", [])?;
            Ok::<_, DbError>(())
        })
        .unwrap();
    connection.flush().unwrap();

    // Only a running scheduler can raise the flag again after the flush.
    let deadline = Instant::now() + Duration::from_secs(5);
    while !connection.is_flush_pending() && Instant::now() < deadline {
        thread::sleep(Duration::from_millis(5));
    }
    assert!(connection.is_flush_pending());
    assert!(connection.execute_auto_flush().unwrap());
    connection.close().unwrap();
    assert_eq!(connection.state(), ConnectionState::Closed);
}
