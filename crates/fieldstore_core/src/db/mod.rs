//! SQLite storage: connection lifecycle, transaction batching and table
//! bootstrap.
//!
//! # Responsibility
//! - Create and open single-file databases recognised by their marker table.
//! - Keep one transaction open while connected and commit it on flush.
//! - Run the periodic flush request and the best-effort recovery flush.
//!
//! # Invariants
//! - Exactly one live transaction exists while a connection is open.
//! - A file without the marker table is never left open.
//! - No operation retries I/O on its own.

use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

mod config;
mod connection;
mod open;
mod scheduler;
mod schema;

pub use config::ConnectionConfig;
pub use connection::{Connection, ConnectionState, CrashGuard, FlushMode};
pub use schema::{
    table_exists, DomainTable, InfoTable, INFO_FIELD_NAME, INFO_FIELD_VALUE, INFO_TABLE_INDEX,
    INFO_TABLE_NAME,
};

/// Path accepted by `backup` that targets an in-memory database.
pub const MEMORY_PATH: &str = ":memory:";

pub type DbResult<T> = Result<T, DbError>;

#[derive(Debug)]
pub enum DbError {
    Sqlite(rusqlite::Error),
    Io(std::io::Error),
    AlreadyOpen,
    NotOpen,
    FileExists(PathBuf),
    FileNotFound(PathBuf),
    /// File opened but lacks the marker table or is not SQLite at all.
    FormatNotRecognized(PathBuf),
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "{err}"),
            Self::Io(err) => write!(f, "{err}"),
            Self::AlreadyOpen => write!(f, "connection is already open; close it first"),
            Self::NotOpen => write!(f, "connection is not open"),
            Self::FileExists(path) => write!(
                f,
                "database file `{}` already exists; choose a new path or open it instead",
                path.display()
            ),
            Self::FileNotFound(path) => {
                write!(f, "database file `{}` was not found", path.display())
            }
            Self::FormatNotRecognized(path) => write!(
                f,
                "database format not recognized for `{}`",
                path.display()
            ),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
            Self::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}

impl From<std::io::Error> for DbError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}
