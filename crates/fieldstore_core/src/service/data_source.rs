//! Data source use-case service.
//!
//! # Responsibility
//! - Own one connection and expose its lifecycle to callers.
//! - Offer marker table reads and writes without exposing SQL.
//!
//! # Invariants
//! - A data source has at most one open file. Opening or creating another
//!   closes the current one first.
//! - Explicit flushes on a closed source fail instead of silently passing.

use crate::db::{Connection, ConnectionConfig, CrashGuard, DbError, DbResult};
use crate::model::info::InfoRecord;
use crate::repo::info_repo::{InfoRepository, RepoResult, SqliteInfoRepository};
use log::info;
use std::path::{Path, PathBuf};

/// One database file and its batching connection.
#[derive(Debug, Default)]
pub struct DataSource {
    connection: Connection,
}

impl DataSource {
    pub fn new(config: ConnectionConfig) -> Self {
        Self {
            connection: Connection::new(config),
        }
    }

    /// Creates a new database at `path` and opens it.
    ///
    /// # Errors
    /// - `FileExists` when `path` exists. The current file, if any, has
    ///   already been closed.
    pub fn create(&self, path: impl AsRef<Path>) -> DbResult<()> {
        self.close()?;
        self.connection.create(path)
    }

    /// Opens an existing database, closing the current one first.
    pub fn open(&self, path: impl AsRef<Path>) -> DbResult<()> {
        let path = path.as_ref();
        if self.connection.is_open() {
            info!("event=data_source_switch module=service status=ok");
            self.close()?;
        }
        self.connection.open(path)
    }

    pub fn close(&self) -> DbResult<()> {
        self.connection.close()
    }

    pub fn is_open(&self) -> bool {
        self.connection.is_open()
    }

    pub fn path(&self) -> Option<PathBuf> {
        self.connection.path()
    }

    /// Commits pending work.
    ///
    /// # Errors
    /// - `NotOpen` while closed.
    pub fn flush(&self) -> DbResult<()> {
        if !self.connection.is_open() {
            return Err(DbError::NotOpen);
        }
        self.connection.flush()
    }

    /// Host-loop hook: flushes when the scheduler asked for it.
    pub fn execute_auto_flush(&self) -> DbResult<bool> {
        self.connection.execute_auto_flush()
    }

    /// Copies the database to `path`. `Ok(false)` while closed.
    pub fn backup(&self, path: impl AsRef<Path>) -> DbResult<bool> {
        self.connection.backup(path)
    }

    pub fn crash_guard(&self) -> CrashGuard<'_> {
        self.connection.crash_guard()
    }

    pub fn connection(&self) -> &Connection {
        &self.connection
    }

    pub fn info_repository(&self) -> RepoResult<SqliteInfoRepository<'_>> {
        SqliteInfoRepository::new(&self.connection)
    }

    /// Reads one marker value by name, ignoring case.
    pub fn info_value(&self, name: &str) -> RepoResult<Option<String>> {
        Ok(self
            .info_repository()?
            .find_by_name(name)?
            .map(|record| record.value))
    }

    /// Inserts or replaces one marker value. Returns the row id.
    pub fn set_info_value(&self, name: &str, value: impl Into<String>) -> RepoResult<i64> {
        let repo = self.info_repository()?;
        let record = match repo.find_by_name(name)? {
            Some(existing) => InfoRecord {
                value: value.into(),
                ..existing
            },
            None => InfoRecord::new(name, value),
        };
        repo.save(&record)
    }
}

#[cfg(test)]
mod tests {
    use super::DataSource;
    use crate::db::{ConnectionConfig, DbError};

    fn manual() -> DataSource {
        DataSource::new(ConnectionConfig::default().auto_flush(false))
    }

    #[test]
    fn closed_source_rejects_flush_and_skips_backup() {
        let source = manual();
        assert!(matches!(source.flush(), Err(DbError::NotOpen)));
        assert!(!source.backup(":memory:").unwrap());
        assert!(source.info_repository().is_err());
    }

    #[test]
    fn open_switches_files() {
        let dir = tempfile::tempdir().unwrap();
        let first = dir.path().join("first.db");
        let second = dir.path().join("second.db");
        let source = manual();

        source.create(&second).unwrap();
        source.close().unwrap();
        source.create(&first).unwrap();
        source.open(&second).unwrap();

        assert_eq!(source.path().unwrap(), second);
        assert!(source.is_open());
    }

    #[test]
    fn info_values_upsert_by_name() {
        let dir = tempfile::tempdir().unwrap();
        let source = manual();
        source.create(dir.path().join("info.db")).unwrap();

        let id = source.set_info_value("Owner", "a").unwrap();
        assert_eq!(source.set_info_value("owner", "b").unwrap(), id);
        assert_eq!(source.info_value("OWNER").unwrap().as_deref(), Some("b"));
        assert_eq!(source.info_value("Missing").unwrap(), None);
    }
}
