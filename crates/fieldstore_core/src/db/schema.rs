//! Table definitions created with new databases.
//!
//! # Responsibility
//! - Define the `DomainTable` contract used by `Connection::create`.
//! - Own the marker table that identifies files written by this crate.
//!
//! # Invariants
//! - `create` and `create_index` are idempotent.
//! - The marker table name and columns never change: older files are
//!   recognised by them.

use super::DbResult;
use rusqlite::{params, Connection, OptionalExtension};

pub const INFO_TABLE_NAME: &str = "INFOTABLE_V1";
pub const INFO_TABLE_INDEX: &str = "IDX_INFOTABLE_INFONAME";
/// Field name of the marker row key, as exposed through the field layer.
pub const INFO_FIELD_NAME: &str = "InfoName";
/// Field name of the marker row value.
pub const INFO_FIELD_VALUE: &str = "Value";

const INFO_TABLE_SQL: &str = "CREATE TABLE INFOTABLE_V1 (
    INFOID INTEGER PRIMARY KEY AUTOINCREMENT,
    INFONAME TEXT NOT NULL UNIQUE COLLATE NOCASE,
    INFOVALUE TEXT NOT NULL
);";
const INFO_INDEX_SQL: &str = "CREATE INDEX IDX_INFOTABLE_INFONAME ON INFOTABLE_V1 (INFONAME);";

/// Schema owner for one table.
pub trait DomainTable: Send + Sync {
    fn name(&self) -> &str;

    /// Creates the table. Returns `false` when it already existed.
    fn create(&self, conn: &Connection) -> DbResult<bool>;

    /// Creates the table's indexes. Returns how many were created.
    fn create_index(&self, conn: &Connection) -> DbResult<usize>;
}

/// Key/value marker table present in every database this crate creates.
#[derive(Debug, Clone, Copy, Default)]
pub struct InfoTable;

impl DomainTable for InfoTable {
    fn name(&self) -> &str {
        INFO_TABLE_NAME
    }

    fn create(&self, conn: &Connection) -> DbResult<bool> {
        if table_exists(conn, INFO_TABLE_NAME)? {
            return Ok(false);
        }
        conn.execute_batch(INFO_TABLE_SQL)?;
        Ok(true)
    }

    fn create_index(&self, conn: &Connection) -> DbResult<usize> {
        if index_exists(conn, INFO_TABLE_INDEX)? {
            return Ok(0);
        }
        conn.execute_batch(INFO_INDEX_SQL)?;
        Ok(1)
    }
}

/// Returns whether `name` is an existing table, ignoring case.
pub fn table_exists(conn: &Connection, name: &str) -> rusqlite::Result<bool> {
    schema_object_exists(conn, "table", name)
}

fn index_exists(conn: &Connection, name: &str) -> rusqlite::Result<bool> {
    schema_object_exists(conn, "index", name)
}

fn schema_object_exists(conn: &Connection, kind: &str, name: &str) -> rusqlite::Result<bool> {
    conn.query_row(
        "SELECT 1 FROM sqlite_master WHERE type = ?1 AND name = ?2 COLLATE NOCASE LIMIT 1;",
        params![kind, name],
        |_| Ok(()),
    )
    .optional()
    .map(|row| row.is_some())
}

#[cfg(test)]
mod tests {
    use super::{table_exists, DomainTable, InfoTable, INFO_TABLE_NAME};
    use rusqlite::Connection;

    #[test]
    fn info_table_create_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        assert!(!table_exists(&conn, INFO_TABLE_NAME).unwrap());

        assert!(InfoTable.create(&conn).unwrap());
        assert_eq!(InfoTable.create_index(&conn).unwrap(), 1);
        assert!(!InfoTable.create(&conn).unwrap());
        assert_eq!(InfoTable.create_index(&conn).unwrap(), 0);
        assert!(table_exists(&conn, "infotable_v1").unwrap());
    }

    #[test]
    fn info_name_is_unique_without_case() {
        let conn = Connection::open_in_memory().unwrap();
        InfoTable.create(&conn).unwrap();
        conn.execute(
            "INSERT INTO INFOTABLE_V1 (INFONAME, INFOVALUE) VALUES ('Owner', 'a');",
            [],
        )
        .unwrap();
        let duplicate = conn.execute(
            "INSERT INTO INFOTABLE_V1 (INFONAME, INFOVALUE) VALUES ('OWNER', 'b');",
            [],
        );
        assert!(duplicate.is_err());
    }
}
