//! Authentication contract.

use crate::repo::examen_repo::RepoResult;
use async_trait::async_trait;

/// Account that owns the current session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserAccount {
    /// Stable account id stamped on owned records.
    pub id: String,
    /// Normalized login name.
    pub username: String,
}

/// Repository interface for session and account management.
#[async_trait]
pub trait AuthRepository: Send + Sync {
    /// Synchronous current-session check; re-queried on every call.
    fn has_user(&self) -> bool {
        self.current_user().is_some()
    }

    fn current_user(&self) -> Option<UserAccount>;

    /// Signs in; `Ok(false)` means the credentials were rejected.
    async fn authenticate(&self, username: &str, password: &str) -> RepoResult<bool>;

    /// Registers and signs in a new account; `Ok(false)` means the backend
    /// declined without a specific reason.
    async fn create_account(&self, username: &str, password: &str) -> RepoResult<bool>;

    async fn sign_out(&self) -> RepoResult<()>;
}
