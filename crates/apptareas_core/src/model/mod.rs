//! Domain model for exam records.
//!
//! # Responsibility
//! - Define the canonical `Examen` record shared by list and detail screens.
//! - Own the fixed color palette used for record tags.
//!
//! # Invariants
//! - A persisted record is identified by a repository-assigned, immutable id.
//! - An empty id marks an unsaved draft.

pub mod examen;
