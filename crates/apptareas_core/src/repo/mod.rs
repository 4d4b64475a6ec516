//! Repository boundary consumed by the state holders.
//!
//! # Responsibility
//! - Define async auth and record contracts independent of any backend.
//! - Ship a SQLite reference backend for local runs and tests.
//!
//! # Invariants
//! - Record operations only ever see the signed-in account's records.
//! - Write paths enforce `Examen::validate()` before persistence.
//! - Failures are reported as `RepoError`; contracts never panic.

pub mod auth_repo;
pub mod examen_repo;
pub mod sqlite_repo;

use auth_repo::AuthRepository;
use examen_repo::ExamenRepository;

/// Full backend contract: authentication plus record persistence.
///
/// The session context holds one `Arc<dyn Repository>` shared by every
/// state holder.
pub trait Repository: AuthRepository + ExamenRepository {}

impl<T: AuthRepository + ExamenRepository + ?Sized> Repository for T {}
