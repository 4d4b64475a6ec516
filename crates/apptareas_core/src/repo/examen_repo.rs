//! Exam record contract and repository error taxonomy.

use crate::db::DbError;
use crate::model::examen::{Examen, ExamenId, ExamenValidationError};
use async_trait::async_trait;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for auth and record operations.
#[derive(Debug)]
pub enum RepoError {
    Validation(ExamenValidationError),
    Db(DbError),
    NotFound(ExamenId),
    NotSignedIn,
    AccountExists(String),
    InvalidUsername(String),
    WeakPassword { min_len: usize },
    InvalidData(String),
    /// Transport or service failure reported by a remote backend.
    Backend(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "examen not found: {id}"),
            Self::NotSignedIn => write!(f, "user is not signed in"),
            Self::AccountExists(username) => write!(f, "account already exists: {username}"),
            Self::InvalidUsername(value) => write!(f, "invalid username: `{value}`"),
            Self::WeakPassword { min_len } => {
                write!(f, "password must be at least {min_len} characters")
            }
            Self::InvalidData(message) => write!(f, "invalid persisted examen data: {message}"),
            Self::Backend(message) => write!(f, "{message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ExamenValidationError> for RepoError {
    fn from(value: ExamenValidationError) -> Self {
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

/// Repository interface for the signed-in account's exam records.
#[async_trait]
pub trait ExamenRepository: Send + Sync {
    /// Lists records in backend order; callers must not re-sort.
    async fn fetch_all(&self) -> RepoResult<Vec<Examen>>;

    async fn fetch_one(&self, id: &str) -> RepoResult<Examen>;

    /// Persists a draft and returns the assigned id. Any id already set on
    /// the draft is ignored.
    async fn create(&self, draft: &Examen) -> RepoResult<ExamenId>;

    /// Replaces editable fields; id, owner and creation time are preserved.
    async fn update(&self, id: &str, examen: &Examen) -> RepoResult<()>;

    async fn delete(&self, id: &str) -> RepoResult<()>;
}
