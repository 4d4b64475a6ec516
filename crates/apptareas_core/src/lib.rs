//! Core domain logic for the exam tracker.
//! Screen state holders, the repository boundary they drive, and a SQLite
//! reference backend.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod session;
pub mod state;

pub use config::{AppConfig, ConfigError};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::examen::{Examen, ExamenId, ExamenValidationError, COLOR_PALETTE};
pub use repo::auth_repo::{AuthRepository, UserAccount};
pub use repo::examen_repo::{ExamenRepository, RepoError, RepoResult};
pub use repo::sqlite_repo::{SqliteRepository, MIN_PASSWORD_LEN};
pub use repo::Repository;
pub use session::SessionContext;
pub use state::auth::{AuthError, AuthFormState, AuthStateHolder, AuthValidationError};
pub use state::detail::{DetailError, DetailEvent, DetailFormState, DetailPhase, DetailStateHolder};
pub use state::list::{ListError, ListState, ListStateHolder, Resource};

/// Minimal health-check API for host integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
