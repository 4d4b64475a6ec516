//! Process-wide session context.
//!
//! # Responsibility
//! - Own the shared repository handle injected into every state holder.
//! - Publish signed-in/signed-out transitions to navigation consumers.
//!
//! # Invariants
//! - `has_user` is always re-queried from the repository, never cached as the
//!   source of truth; the watch value only mirrors the last observation.
//! - Only `start` and `sign_out` define the session lifecycle; state holders
//!   read the session and never create or close it.

use crate::repo::auth_repo::UserAccount;
use crate::repo::examen_repo::RepoResult;
use crate::repo::Repository;
use log::{error, info};
use std::sync::Arc;
use tokio::sync::watch;

/// Cloneable handle to the shared session.
#[derive(Clone)]
pub struct SessionContext {
    inner: Arc<SessionInner>,
}

struct SessionInner {
    repo: Arc<dyn Repository>,
    has_user: watch::Sender<bool>,
}

impl SessionContext {
    /// Starts the session over a repository, seeding the has-user signal from
    /// whatever session the backend restored.
    pub fn start(repo: Arc<dyn Repository>) -> Self {
        let has_user = repo.has_user();
        let (sender, _) = watch::channel(has_user);
        info!("event=session_start module=session status=ok has_user={has_user}");
        Self {
            inner: Arc::new(SessionInner {
                repo,
                has_user: sender,
            }),
        }
    }

    pub fn repository(&self) -> &dyn Repository {
        self.inner.repo.as_ref()
    }

    /// Re-queries the repository and publishes any transition.
    pub fn has_user(&self) -> bool {
        let has_user = self.inner.repo.has_user();
        let changed = self.inner.has_user.send_if_modified(|current| {
            if *current == has_user {
                return false;
            }
            *current = has_user;
            true
        });
        if changed {
            info!("event=session_user_changed module=session status=ok has_user={has_user}");
        }
        has_user
    }

    pub fn current_user(&self) -> Option<UserAccount> {
        self.inner.repo.current_user()
    }

    /// Receiver notified whenever an observed has-user value changes.
    pub fn subscribe_user(&self) -> watch::Receiver<bool> {
        self.inner.has_user.subscribe()
    }

    /// Tears down the signed-in session through the repository.
    pub async fn sign_out(&self) -> RepoResult<()> {
        let result = self.inner.repo.sign_out().await;
        match &result {
            Ok(()) => info!("event=sign_out module=session status=ok"),
            Err(err) => error!("event=sign_out module=session status=error error={err}"),
        }
        self.has_user();
        result
    }
}
