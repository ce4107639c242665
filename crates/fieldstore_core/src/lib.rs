//! Core of fieldstore: unit-aware field access over batched SQLite storage.
//!
//! - [`units`] converts values between units of one dimension.
//! - [`field`] reads and writes entity properties by name, in working units.
//! - [`db`] owns the SQLite file and its long-lived batching transaction.

pub mod db;
pub mod field;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;
pub mod text;
pub mod units;

pub use db::{Connection, ConnectionConfig, ConnectionState, DbError, DbResult, FlushMode};
pub use field::{Editable, Field, FieldError, FieldResult, FieldType, FieldValue, Target};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::info::InfoRecord;
pub use repo::info_repo::{InfoRepository, RepoError, RepoResult, SqliteInfoRepository};
pub use service::data_source::DataSource;
pub use text::{LabelLookup, TextCatalog};
pub use units::{NumericFormatter, Unit, UnitCatalog, UnitError, UnitIndex};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
