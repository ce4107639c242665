//! SQLite handle bootstrap.
//!
//! # Responsibility
//! - Open new or existing database files with the configured pragmas.
//! - Recognise files by their marker table.
//!
//! # Invariants
//! - Returned handles have `foreign_keys=ON` and the configured busy timeout.
//! - A handle for an existing file is only returned after the marker probe
//!   succeeded.

use super::config::ConnectionConfig;
use super::schema::{table_exists, INFO_TABLE_NAME};
use super::{DbError, DbResult};
use log::{error, info};
use rusqlite::{Connection as SqliteHandle, ErrorCode, OpenFlags};
use std::path::Path;
use std::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum OpenMode {
    /// The file must not exist yet and is created.
    Create,
    /// The file must exist and carry the marker table.
    Existing,
}

impl OpenMode {
    fn as_str(self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Existing => "existing",
        }
    }

    fn flags(self) -> OpenFlags {
        let base = OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_NO_MUTEX;
        match self {
            Self::Create => base | OpenFlags::SQLITE_OPEN_CREATE,
            Self::Existing => base,
        }
    }
}

/// Opens a SQLite handle for `path`.
///
/// # Side effects
/// - `Create` mode creates the file.
/// - Emits `db_open` logging events with duration and status.
///
/// # Errors
/// - `FormatNotRecognized` when an existing file is not SQLite or has no
///   marker table.
pub(crate) fn open_handle(
    path: &Path,
    mode: OpenMode,
    config: &ConnectionConfig,
) -> DbResult<SqliteHandle> {
    let started_at = Instant::now();
    info!(
        "event=db_open module=db status=start mode={}",
        mode.as_str()
    );

    let result = SqliteHandle::open_with_flags(path, mode.flags())
        .map_err(DbError::from)
        .and_then(|handle| {
            bootstrap_handle(&handle, config)?;
            if mode == OpenMode::Existing && !table_exists(&handle, INFO_TABLE_NAME)? {
                return Err(DbError::FormatNotRecognized(path.to_path_buf()));
            }
            Ok(handle)
        })
        .map_err(|err| recognise_foreign_file(err, path));

    match result {
        Ok(handle) => {
            info!(
                "event=db_open module=db status=ok mode={} duration_ms={}",
                mode.as_str(),
                started_at.elapsed().as_millis()
            );
            Ok(handle)
        }
        Err(err) => {
            error!(
                "event=db_open module=db status=error mode={} duration_ms={} error_code={} error={}",
                mode.as_str(),
                started_at.elapsed().as_millis(),
                error_code(&err),
                err
            );
            Err(err)
        }
    }
}

fn bootstrap_handle(handle: &SqliteHandle, config: &ConnectionConfig) -> DbResult<()> {
    handle.busy_timeout(config.busy_timeout)?;
    handle.execute_batch("PRAGMA foreign_keys = ON;")?;
    Ok(())
}

fn recognise_foreign_file(err: DbError, path: &Path) -> DbError {
    match &err {
        DbError::Sqlite(inner) if inner.sqlite_error_code() == Some(ErrorCode::NotADatabase) => {
            DbError::FormatNotRecognized(path.to_path_buf())
        }
        _ => err,
    }
}

fn error_code(err: &DbError) -> &'static str {
    match err {
        DbError::FormatNotRecognized(_) => "db_format_not_recognized",
        DbError::Sqlite(_) => "db_open_failed",
        _ => "db_bootstrap_failed",
    }
}

#[cfg(test)]
mod tests {
    use super::{open_handle, OpenMode};
    use crate::db::{ConnectionConfig, DbError, DomainTable, InfoTable};
    use std::fs;

    #[test]
    fn existing_mode_rejects_file_without_marker() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plain.db");
        {
            let handle = open_handle(&path, OpenMode::Create, &ConnectionConfig::default()).unwrap();
            handle
                .execute_batch("CREATE TABLE other (id INTEGER PRIMARY KEY);")
                .unwrap();
        }

        let err = open_handle(&path, OpenMode::Existing, &ConnectionConfig::default()).unwrap_err();
        assert!(matches!(err, DbError::FormatNotRecognized(_)));
    }

    #[test]
    fn existing_mode_rejects_non_sqlite_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        fs::write(&path, "plain text, not a database\n".repeat(64)).unwrap();

        let err = open_handle(&path, OpenMode::Existing, &ConnectionConfig::default()).unwrap_err();
        assert!(matches!(err, DbError::FormatNotRecognized(_)));
    }

    #[test]
    fn existing_mode_accepts_marked_file_and_enables_foreign_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("marked.db");
        {
            let handle = open_handle(&path, OpenMode::Create, &ConnectionConfig::default()).unwrap();
            InfoTable.create(&handle).unwrap();
        }

        let handle = open_handle(&path, OpenMode::Existing, &ConnectionConfig::default()).unwrap();
        let foreign_keys: i64 = handle
            .query_row("PRAGMA foreign_keys;", [], |row| row.get(0))
            .unwrap();
        assert_eq!(foreign_keys, 1);
    }
}
