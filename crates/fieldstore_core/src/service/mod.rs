//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate connection and repository calls into use-case level APIs.
//! - Keep CLI callers decoupled from storage details.

pub mod data_source;
