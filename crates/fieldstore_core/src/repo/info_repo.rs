//! Marker table repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide CRUD APIs over `INFOTABLE_V1` rows.
//! - Keep SQL details inside the persistence boundary.
//!
//! # Invariants
//! - Write paths call `InfoRecord::validate()` before SQL mutations.
//! - Every statement runs inside the connection's batching transaction, so
//!   writes are durable only after the next flush.

use crate::db::{Connection, DbError};
use crate::model::info::{InfoRecord, InfoValidationError, UNSAVED_ID};
use rusqlite::{params, OptionalExtension, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};

const INFO_SELECT_SQL: &str = "SELECT INFOID, INFONAME, INFOVALUE FROM INFOTABLE_V1";

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for marker table persistence and queries.
#[derive(Debug)]
pub enum RepoError {
    Validation(InfoValidationError),
    Db(DbError),
    NotFound(i64),
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "info record not found: {id}"),
            Self::InvalidData(message) => write!(f, "invalid persisted info data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::NotFound(_) => None,
            Self::InvalidData(_) => None,
        }
    }
}

impl From<InfoValidationError> for RepoError {
    fn from(value: InfoValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Persistence contract for marker table rows.
pub trait InfoRepository {
    /// Inserts an unsaved record or updates a saved one. Returns its id.
    fn save(&self, record: &InfoRecord) -> RepoResult<i64>;
    fn get(&self, id: i64) -> RepoResult<InfoRecord>;
    /// Looks a record up by name, ignoring case.
    fn find_by_name(&self, name: &str) -> RepoResult<Option<InfoRecord>>;
    /// All records ordered by id.
    fn list(&self) -> RepoResult<Vec<InfoRecord>>;
    fn ids(&self) -> RepoResult<Vec<i64>>;
    fn remove(&self, id: i64) -> RepoResult<()>;
    fn count(&self) -> RepoResult<usize>;
}

/// SQLite-backed marker table repository.
pub struct SqliteInfoRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteInfoRepository<'conn> {
    /// Builds a repository over an open connection.
    ///
    /// # Errors
    /// - `DbError::NotOpen` when `conn` is closed.
    pub fn new(conn: &'conn Connection) -> RepoResult<Self> {
        if !conn.is_open() {
            return Err(DbError::NotOpen.into());
        }
        Ok(Self { conn })
    }
}

impl InfoRepository for SqliteInfoRepository<'_> {
    fn save(&self, record: &InfoRecord) -> RepoResult<i64> {
        record.validate()?;
        self.conn.with_handle(|handle| {
            if record.id == UNSAVED_ID {
                handle.execute(
                    "INSERT INTO INFOTABLE_V1 (INFONAME, INFOVALUE) VALUES (?1, ?2);",
                    params![record.info_name, record.value],
                )?;
                return Ok(handle.last_insert_rowid());
            }

            let changed = handle.execute(
                "UPDATE INFOTABLE_V1 SET INFONAME = ?1, INFOVALUE = ?2 WHERE INFOID = ?3;",
                params![record.info_name, record.value, record.id],
            )?;
            if changed == 0 {
                return Err(RepoError::NotFound(record.id));
            }
            Ok(record.id)
        })
    }

    fn get(&self, id: i64) -> RepoResult<InfoRecord> {
        self.conn.with_handle(|handle| {
            handle
                .query_row(
                    &format!("{INFO_SELECT_SQL} WHERE INFOID = ?1;"),
                    params![id],
                    read_row,
                )
                .optional()?
                .ok_or(RepoError::NotFound(id))?
        })
    }

    fn find_by_name(&self, name: &str) -> RepoResult<Option<InfoRecord>> {
        self.conn.with_handle(|handle| {
            handle
                .query_row(
                    &format!("{INFO_SELECT_SQL} WHERE INFONAME = ?1 COLLATE NOCASE;"),
                    params![name],
                    read_row,
                )
                .optional()?
                .transpose()
        })
    }

    fn list(&self) -> RepoResult<Vec<InfoRecord>> {
        self.conn.with_handle(|handle| {
            let mut stmt = handle.prepare(&format!("{INFO_SELECT_SQL} ORDER BY INFOID ASC;"))?;
            let rows = stmt.query_map([], read_row)?;
            let mut records = Vec::new();
            for row in rows {
                records.push(row??);
            }
            Ok(records)
        })
    }

    fn ids(&self) -> RepoResult<Vec<i64>> {
        self.conn.with_handle(|handle| {
            let mut stmt = handle.prepare("SELECT INFOID FROM INFOTABLE_V1 ORDER BY INFOID ASC;")?;
            let ids = stmt
                .query_map([], |row| row.get::<_, i64>(0))?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(ids)
        })
    }

    fn remove(&self, id: i64) -> RepoResult<()> {
        self.conn.with_handle(|handle| {
            let changed = handle.execute("DELETE FROM INFOTABLE_V1 WHERE INFOID = ?1;", params![id])?;
            if changed == 0 {
                return Err(RepoError::NotFound(id));
            }
            Ok(())
        })
    }

    fn count(&self) -> RepoResult<usize> {
        self.conn.with_handle(|handle| {
            let count: i64 =
                handle.query_row("SELECT COUNT(*) FROM INFOTABLE_V1;", [], |row| row.get(0))?;
            usize::try_from(count)
                .map_err(|_| RepoError::InvalidData(format!("negative row count {count}")))
        })
    }
}

/// Maps one row. The outer result carries SQLite errors, the inner one
/// rejects rows that would not pass validation.
fn read_row(row: &Row<'_>) -> rusqlite::Result<RepoResult<InfoRecord>> {
    let record = InfoRecord {
        id: row.get(0)?,
        info_name: row.get(1)?,
        value: row.get(2)?,
    };
    Ok(match record.validate() {
        Ok(()) => Ok(record),
        Err(err) => Err(RepoError::InvalidData(format!(
            "row {} failed validation: {err}",
            record.id
        ))),
    })
}
