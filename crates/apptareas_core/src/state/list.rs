//! Home screen record list state.
//!
//! # Responsibility
//! - Track the fetched record collection as `Loading | Success | Failure`.
//! - Delete records and re-fetch so the list reflects repository truth.
//!
//! # Invariants
//! - Each fetch re-enters `Loading`, then lands in exactly one of
//!   `Success`/`Failure`.
//! - Records are shown in repository order; this holder never re-sorts.
//! - Deletion never edits the held list locally; the list is re-fetched.

use crate::model::examen::Examen;
use crate::repo::examen_repo::RepoError;
use crate::session::SessionContext;
use crate::state::observable::StateCell;
use crate::state::Generation;
use log::{debug, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use tokio::sync::watch;

/// Tri-state result wrapper for asynchronously fetched data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resource<T> {
    Loading,
    Success(T),
    Failure(String),
}

impl<T> Resource<T> {
    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    pub fn data(&self) -> Option<&T> {
        match self {
            Self::Success(data) => Some(data),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Failure(message) => Some(message.as_str()),
            _ => None,
        }
    }
}

impl<T> Default for Resource<T> {
    fn default() -> Self {
        Self::Loading
    }
}

pub type ListState = Resource<Vec<Examen>>;

#[derive(Debug)]
pub enum ListError {
    /// Delete was requested with a blank id.
    BlankId,
    NotSignedIn,
    Repo(RepoError),
}

impl Display for ListError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankId => write!(f, "examen id is required"),
            Self::NotSignedIn => write!(f, "user is not signed in"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ListError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for ListError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotSignedIn => Self::NotSignedIn,
            other => Self::Repo(other),
        }
    }
}

/// Owner of the home screen list state.
pub struct ListStateHolder {
    session: SessionContext,
    state: StateCell<ListState>,
    delete_error: StateCell<Option<String>>,
    fetches: Generation,
}

impl ListStateHolder {
    pub fn new(session: SessionContext) -> Self {
        Self {
            session,
            state: StateCell::default(),
            delete_error: StateCell::default(),
            fetches: Generation::default(),
        }
    }

    pub fn state(&self) -> ListState {
        self.state.get()
    }

    pub fn subscribe(&self) -> watch::Receiver<ListState> {
        self.state.subscribe()
    }

    /// Message of the last failed delete, cleared by the next successful one.
    pub fn delete_error(&self) -> Option<String> {
        self.delete_error.get()
    }

    pub fn subscribe_delete_error(&self) -> watch::Receiver<Option<String>> {
        self.delete_error.subscribe()
    }

    pub fn has_user(&self) -> bool {
        self.session.has_user()
    }

    /// Fetches all records of the signed-in user.
    ///
    /// Safe to call repeatedly; when calls overlap, the most recently issued
    /// one determines the final state.
    ///
    /// # Errors
    /// - `NotSignedIn` without a repository call when no user is signed in.
    /// - `Repo` when the fetch fails.
    pub async fn load_records(&self) -> Result<(), ListError> {
        let ticket = self.fetches.issue();
        if !self.session.has_user() {
            let err = ListError::NotSignedIn;
            warn!("event=list_load module=list status=rejected reason=no_user");
            self.state.set(Resource::Failure(err.to_string()));
            return Err(err);
        }

        info!("event=list_load module=list status=start ticket={ticket}");
        self.state.set(Resource::Loading);
        let result = self.session.repository().fetch_all().await;

        if !self.fetches.is_current(ticket) {
            debug!("event=list_load module=list status=stale ticket={ticket}");
            return result.map(|_| ()).map_err(ListError::from);
        }

        match result {
            Ok(examenes) => {
                info!(
                    "event=list_load module=list status=ok ticket={ticket} count={}",
                    examenes.len()
                );
                self.state.set(Resource::Success(examenes));
                Ok(())
            }
            Err(err) => {
                warn!("event=list_load module=list status=error ticket={ticket} error={err}");
                self.state.set(Resource::Failure(err.to_string()));
                Err(err.into())
            }
        }
    }

    /// Deletes one record, then re-fetches the list.
    ///
    /// # Errors
    /// - `BlankId` without a repository call.
    /// - `NotSignedIn` / `Repo` when the delete fails; the held list is left
    ///   untouched in that case.
    /// - Errors from the follow-up `load_records`.
    pub async fn delete_record(&self, id: &str) -> Result<(), ListError> {
        let id = id.trim();
        if id.is_empty() {
            let err = ListError::BlankId;
            self.delete_error.set(Some(err.to_string()));
            return Err(err);
        }

        info!("event=examen_delete module=list status=start examen_id={id}");
        match self.session.repository().delete(id).await {
            Ok(()) => {
                info!("event=examen_delete module=list status=ok examen_id={id}");
                self.delete_error.set(None);
            }
            Err(err) => {
                warn!("event=examen_delete module=list status=error examen_id={id} error={err}");
                self.delete_error.set(Some(err.to_string()));
                return Err(err.into());
            }
        }

        self.load_records().await
    }

    /// Signs out through the shared session.
    pub async fn sign_out(&self) -> Result<(), ListError> {
        self.session.sign_out().await.map_err(ListError::from)
    }
}
