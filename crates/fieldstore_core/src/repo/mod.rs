//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define data access contracts for core-owned tables.
//! - Isolate SQLite query details from service orchestration.
//!
//! # Invariants
//! - Repositories never commit: durability is the connection's flush.

pub mod info_repo;
