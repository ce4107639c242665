//! Domain records persisted by core.
//!
//! # Responsibility
//! - Define records stored in core-owned tables.
//! - Expose each record's properties through the field layer.

pub mod info;
