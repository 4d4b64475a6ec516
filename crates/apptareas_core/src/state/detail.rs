//! Detail (create/edit) form state.
//!
//! # Responsibility
//! - Hold editable record fields and the submission phase.
//! - Load a record for editing once per screen entry.
//! - Signal successful submissions to the navigation layer.
//!
//! # Invariants
//! - Phase flow: `Blank -> Editing -> Submitting -> Done`, with failures
//!   returning to `Editing` and keeping the entered values. Edit mode passes
//!   through `Loading` before `Editing`.
//! - `editing_id` is `None` exactly in new-record mode.
//! - `submit_update` only accepts a form whose record was fetched
//!   successfully (`loaded`); a failed fetch never unlocks an overwrite.
//! - Every screen entry (`load_for_edit`, `reset`) drops completion events
//!   left over from the previous entry.
//! - Every completion is emitted once on the event queue; the `added` and
//!   `updated` flags mirror it until `reset_completion_flags`.

use crate::model::examen::{Examen, ExamenId, ExamenValidationError};
use crate::repo::examen_repo::RepoError;
use crate::session::SessionContext;
use crate::state::events::EventQueue;
use crate::state::observable::StateCell;
use crate::state::Generation;
use log::{debug, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use tokio::sync::watch;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DetailPhase {
    #[default]
    Blank,
    Loading,
    Editing,
    Submitting,
    /// Terminal for the current submission; the screen is expected to exit.
    Done,
}

/// Detail screen state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DetailFormState {
    pub subject: String,
    pub description: String,
    pub date: String,
    pub day: String,
    pub time: String,
    pub color_index: usize,
    /// Record the form is bound to; `None` in new-record mode.
    pub editing_id: Option<ExamenId>,
    /// Whether the fields were populated from the stored record.
    pub loaded: bool,
    pub phase: DetailPhase,
    pub error: Option<String>,
    pub added: bool,
    pub updated: bool,
}

impl DetailFormState {
    fn from_examen(id: &str, examen: &Examen) -> Self {
        Self {
            subject: examen.subject.clone(),
            description: examen.description.clone(),
            date: examen.date.clone(),
            day: examen.day.clone(),
            time: examen.time.clone(),
            color_index: examen.color_index,
            editing_id: Some(id.to_string()),
            loaded: true,
            phase: DetailPhase::Editing,
            ..Self::default()
        }
    }

    /// Builds the record to submit from the current field values.
    pub fn to_examen(&self) -> Examen {
        Examen {
            id: self.editing_id.clone().unwrap_or_default(),
            subject: self.subject.clone(),
            description: self.description.clone(),
            date: self.date.clone(),
            day: self.day.clone(),
            time: self.time.clone(),
            color_index: self.color_index,
            ..Examen::default()
        }
    }

    pub fn is_new_record(&self) -> bool {
        self.editing_id.is_none()
    }

    /// Whether the form holds the fetched contents of record `id`.
    pub fn is_loaded_for(&self, id: &str) -> bool {
        self.loaded && self.editing_id.as_deref() == Some(id)
    }

    /// Whether the required fields are filled; drives the submit control.
    pub fn can_submit(&self) -> bool {
        !self.subject.trim().is_empty() && !self.description.trim().is_empty()
    }
}

/// One-shot completion signal for navigation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DetailEvent {
    Added(ExamenId),
    Updated(ExamenId),
}

#[derive(Debug)]
pub enum DetailError {
    BlankId,
    /// `submit_create` called while the form is bound to a record.
    NotNewRecord,
    /// `submit_update` called for an id the form has not loaded.
    NotEditing(ExamenId),
    Validation(ExamenValidationError),
    Repo(RepoError),
}

impl Display for DetailError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankId => write!(f, "examen id is required"),
            Self::NotNewRecord => write!(f, "form is editing an existing examen"),
            Self::NotEditing(id) => write!(f, "form is not editing examen {id}"),
            Self::Validation(err) => write!(f, "{err}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for DetailError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for DetailError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::Validation(err) => Self::Validation(err),
            other => Self::Repo(other),
        }
    }
}

impl From<ExamenValidationError> for DetailError {
    fn from(value: ExamenValidationError) -> Self {
        Self::Validation(value)
    }
}

/// Owner of the detail screen state.
pub struct DetailStateHolder {
    session: SessionContext,
    state: StateCell<DetailFormState>,
    events: EventQueue<DetailEvent>,
    loads: Generation,
}

impl DetailStateHolder {
    pub fn new(session: SessionContext) -> Self {
        Self {
            session,
            state: StateCell::default(),
            events: EventQueue::new(),
            loads: Generation::default(),
        }
    }

    pub fn state(&self) -> DetailFormState {
        self.state.get()
    }

    pub fn subscribe(&self) -> watch::Receiver<DetailFormState> {
        self.state.subscribe()
    }

    /// Waits for the next completion event; each is delivered once.
    pub async fn next_event(&self) -> Option<DetailEvent> {
        self.events.recv().await
    }

    pub fn try_next_event(&self) -> Option<DetailEvent> {
        self.events.try_recv()
    }

    pub fn set_subject(&self, value: impl Into<String>) {
        let value = value.into();
        self.edit(|state| state.subject = value);
    }

    pub fn set_description(&self, value: impl Into<String>) {
        let value = value.into();
        self.edit(|state| state.description = value);
    }

    pub fn set_date(&self, value: impl Into<String>) {
        let value = value.into();
        self.edit(|state| state.date = value);
    }

    pub fn set_day(&self, value: impl Into<String>) {
        let value = value.into();
        self.edit(|state| state.day = value);
    }

    pub fn set_time(&self, value: impl Into<String>) {
        let value = value.into();
        self.edit(|state| state.time = value);
    }

    pub fn set_color_index(&self, value: usize) {
        self.edit(|state| state.color_index = value);
    }

    /// Prepares the form for a screen entry.
    ///
    /// A blank id resets to new-record mode. A non-blank id fetches the
    /// record unless the form is already bound to that id.
    ///
    /// # Errors
    /// - `Repo` when the fetch fails; the message is kept in state, the form
    ///   stays unloaded and the next call with the same id fetches again.
    pub async fn load_for_edit(&self, id: &str) -> Result<(), DetailError> {
        let id = id.trim();
        if id.is_empty() {
            self.reset();
            return Ok(());
        }
        self.drop_stale_events();

        let already_bound = self.state.with(|state| match state.phase {
            DetailPhase::Loading => state.editing_id.as_deref() == Some(id),
            DetailPhase::Editing | DetailPhase::Submitting => state.is_loaded_for(id),
            DetailPhase::Blank | DetailPhase::Done => false,
        });
        if already_bound {
            debug!("event=examen_load module=detail status=skipped examen_id={id}");
            return Ok(());
        }

        let ticket = self.loads.issue();
        info!("event=examen_load module=detail status=start examen_id={id}");
        self.state.set(DetailFormState {
            editing_id: Some(id.to_string()),
            phase: DetailPhase::Loading,
            ..DetailFormState::default()
        });

        let result = self.session.repository().fetch_one(id).await;
        if !self.loads.is_current(ticket) {
            debug!("event=examen_load module=detail status=stale examen_id={id}");
            return result.map(|_| ()).map_err(DetailError::from);
        }

        match result {
            Ok(examen) => {
                info!("event=examen_load module=detail status=ok examen_id={id}");
                self.state.set(DetailFormState::from_examen(id, &examen));
                Ok(())
            }
            Err(err) => {
                warn!("event=examen_load module=detail status=error examen_id={id} error={err}");
                self.state.update(|state| {
                    state.phase = DetailPhase::Blank;
                    state.loaded = false;
                    state.error = Some(err.to_string());
                });
                Err(err.into())
            }
        }
    }

    /// Clears the form to blank new-record mode, abandoning any pending load
    /// and any undelivered completion event.
    pub fn reset(&self) {
        self.loads.issue();
        self.drop_stale_events();
        self.state.set(DetailFormState::default());
    }

    /// Creates a record from the form in new-record mode.
    ///
    /// Returns the repository-assigned id and emits `DetailEvent::Added`.
    ///
    /// # Errors
    /// - `NotNewRecord` when the form is bound to an existing record.
    /// - `Validation` when subject or description is blank or the color is
    ///   outside the palette (no repository call).
    /// - `Repo` when the repository rejects the write.
    pub async fn submit_create(&self) -> Result<ExamenId, DetailError> {
        let form = self.state.get();
        if !form.is_new_record() {
            return Err(DetailError::NotNewRecord);
        }
        let draft = form.to_examen();
        self.validate_for_submit(&draft)?;

        info!("event=examen_create module=detail status=start");
        match self.session.repository().create(&draft).await {
            Ok(id) => {
                info!("event=examen_create module=detail status=ok examen_id={id}");
                self.state.update(|state| {
                    state.phase = DetailPhase::Done;
                    state.added = true;
                });
                self.events.emit(DetailEvent::Added(id.clone()));
                Ok(id)
            }
            Err(err) => Err(self.submission_failed("examen_create", err)),
        }
    }

    /// Saves the form over the record it is bound to.
    ///
    /// # Errors
    /// - `BlankId` for a blank id, `NotEditing` unless the form holds the
    ///   fetched contents of `id` (new-record mode, another record, or a
    ///   load that failed).
    /// - `Validation` / `Repo` as for [`Self::submit_create`].
    pub async fn submit_update(&self, id: &str) -> Result<(), DetailError> {
        let id = id.trim();
        if id.is_empty() {
            return Err(DetailError::BlankId);
        }
        let form = self.state.get();
        if !form.is_loaded_for(id) {
            return Err(DetailError::NotEditing(id.to_string()));
        }
        let examen = form.to_examen();
        self.validate_for_submit(&examen)?;

        info!("event=examen_update module=detail status=start examen_id={id}");
        match self.session.repository().update(id, &examen).await {
            Ok(()) => {
                info!("event=examen_update module=detail status=ok examen_id={id}");
                self.state.update(|state| {
                    state.phase = DetailPhase::Done;
                    state.updated = true;
                });
                self.events.emit(DetailEvent::Updated(id.to_string()));
                Ok(())
            }
            Err(err) => Err(self.submission_failed("examen_update", err)),
        }
    }

    /// Clears the `added`/`updated` flags after the consumer has reacted.
    pub fn reset_completion_flags(&self) {
        self.state.update(|state| {
            state.added = false;
            state.updated = false;
        });
    }

    fn drop_stale_events(&self) {
        let dropped = self.events.clear();
        if dropped > 0 {
            debug!("event=detail_entry module=detail status=ok dropped_events={dropped}");
        }
    }

    fn edit(&self, apply: impl FnOnce(&mut DetailFormState)) {
        self.state.update(|state| {
            apply(state);
            if matches!(state.phase, DetailPhase::Blank | DetailPhase::Done) {
                state.phase = DetailPhase::Editing;
            }
        });
    }

    fn validate_for_submit(&self, examen: &Examen) -> Result<(), DetailError> {
        if let Err(err) = examen.validate() {
            warn!("event=examen_submit module=detail status=rejected reason=validation detail={err:?}");
            self.state.update(|state| {
                state.phase = DetailPhase::Editing;
                state.error = Some(err.to_string());
            });
            return Err(err.into());
        }
        self.state.update(|state| {
            state.phase = DetailPhase::Submitting;
            state.error = None;
        });
        Ok(())
    }

    fn submission_failed(&self, event: &str, err: RepoError) -> DetailError {
        warn!("event={event} module=detail status=error error={err}");
        self.state.update(|state| {
            state.phase = DetailPhase::Editing;
            state.error = Some(err.to_string());
        });
        err.into()
    }
}
