//! FFI use-case API for Flutter-facing calls.
//!
//! # Responsibility
//! - Expose the login, home and detail state holders to Dart via FRB.
//! - Flatten core state into plain view envelopes the UI can render.
//!
//! # Invariants
//! - Exported functions must not panic across the FFI boundary.
//! - Every intent returns an envelope; failures are carried as messages.
//! - One `ExamApp` owns one session; the UI keeps a single instance.

use apptareas_core::db::{open_db, open_db_in_memory};
use apptareas_core::{
    core_version as core_version_inner, init_logging as init_logging_inner, ping as ping_inner,
    AppConfig, AuthStateHolder, DetailEvent, DetailFormState, DetailPhase, DetailStateHolder,
    Examen, ListStateHolder, Resource, SessionContext, SqliteRepository,
};
use log::info;
use std::path::PathBuf;
use std::sync::Arc;

/// Minimal health-check API for FRB smoke integration.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Exposes core crate version through FFI.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// # FFI contract
/// - Sync call; may create the log directory.
/// - Safe to repeat with the same `level + log_dir`.
/// - Returns empty string on success and the error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err.to_string(),
    }
}

/// Generic action envelope for intents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionResponse {
    /// Whether the intent succeeded.
    pub ok: bool,
    /// Record id produced by the intent, when any.
    pub examen_id: Option<String>,
    /// Human-readable message for diagnostics/UI.
    pub message: String,
}

impl ActionResponse {
    fn success(message: impl Into<String>, examen_id: Option<String>) -> Self {
        Self {
            ok: true,
            examen_id,
            message: message.into(),
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            examen_id: None,
            message: message.into(),
        }
    }

    fn from_result<E: std::fmt::Display>(
        result: Result<(), E>,
        success_message: &str,
        action: &str,
    ) -> Self {
        match result {
            Ok(()) => Self::success(success_message, None),
            Err(err) => Self::failure(format!("{action} failed: {err}")),
        }
    }
}

/// Login screen view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthView {
    pub user_name: String,
    pub user_name_sign_up: String,
    pub is_loading: bool,
    pub is_success_login: bool,
    pub has_user: bool,
    pub sign_in_error: Option<String>,
    pub sign_up_error: Option<String>,
}

/// One record as rendered by the home grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExamenItem {
    pub examen_id: String,
    pub subject: String,
    pub description: String,
    pub date: String,
    pub day: String,
    pub time: String,
    pub color_index: u32,
    /// Resolved ARGB palette color.
    pub color_argb: u32,
    pub created_at_ms: i64,
    /// Local `MM-dd-yyyy hh:mm` creation label; empty for unsaved records.
    pub created_at_label: String,
}

/// Home screen view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExamenListView {
    /// `loading|success|failure`.
    pub status: String,
    pub items: Vec<ExamenItem>,
    pub message: Option<String>,
    pub delete_error: Option<String>,
}

/// Detail screen view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailView {
    pub subject: String,
    pub description: String,
    pub date: String,
    pub day: String,
    pub time: String,
    pub color_index: u32,
    pub editing_id: Option<String>,
    /// Whether `editing_id`'s stored contents were fetched; updates need it.
    pub loaded: bool,
    /// `blank|loading|editing|submitting|done`.
    pub phase: String,
    pub error: Option<String>,
    pub can_submit: bool,
    pub added: bool,
    pub updated: bool,
}

/// Navigation signal taken from the detail screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailEventView {
    /// `added|updated`.
    pub kind: String,
    pub examen_id: String,
}

/// App facade owning the session and the three screen state holders.
pub struct ExamApp {
    session: SessionContext,
    auth: AuthStateHolder,
    list: ListStateHolder,
    detail: DetailStateHolder,
}

impl ExamApp {
    /// Opens the app over a SQLite database.
    ///
    /// # FFI contract
    /// - Blank `db_path` falls back to `APPTAREAS_DB_PATH` or the temp-dir
    ///   default.
    /// - Restores the previously signed-in account, if any.
    /// - Returns the error message on failure.
    #[flutter_rust_bridge::frb(sync)]
    pub fn open(db_path: String) -> Result<ExamApp, String> {
        let path = resolve_db_path(db_path.as_str())?;
        let conn = open_db(&path).map_err(|err| format!("database open failed: {err}"))?;
        let repo =
            SqliteRepository::new(conn).map_err(|err| format!("repository init failed: {err}"))?;
        info!(
            "event=ffi_open module=ffi status=ok db_path={}",
            path.display()
        );
        Ok(Self::with_repository(repo))
    }

    /// Opens the app over a throwaway in-memory database.
    #[flutter_rust_bridge::frb(sync)]
    pub fn open_in_memory() -> Result<ExamApp, String> {
        let conn = open_db_in_memory().map_err(|err| format!("database open failed: {err}"))?;
        let repo =
            SqliteRepository::new(conn).map_err(|err| format!("repository init failed: {err}"))?;
        Ok(Self::with_repository(repo))
    }

    fn with_repository(repo: SqliteRepository) -> Self {
        let session = SessionContext::start(Arc::new(repo));
        Self {
            auth: AuthStateHolder::new(session.clone()),
            list: ListStateHolder::new(session.clone()),
            detail: DetailStateHolder::new(session.clone()),
            session,
        }
    }

    #[flutter_rust_bridge::frb(sync)]
    pub fn has_user(&self) -> bool {
        self.session.has_user()
    }

    // --- Login ---

    #[flutter_rust_bridge::frb(sync)]
    pub fn set_user_name(&self, value: String) {
        self.auth.set_user_name(value);
    }

    #[flutter_rust_bridge::frb(sync)]
    pub fn set_password(&self, value: String) {
        self.auth.set_password(value);
    }

    #[flutter_rust_bridge::frb(sync)]
    pub fn set_sign_up_fields(&self, user_name: String, password: String, confirm: String) {
        self.auth.set_sign_up_fields(user_name, password, confirm);
    }

    #[flutter_rust_bridge::frb(sync)]
    pub fn auth_view(&self) -> AuthView {
        let state = self.auth.state();
        AuthView {
            user_name: state.user_name,
            user_name_sign_up: state.user_name_sign_up,
            is_loading: state.is_loading,
            is_success_login: state.is_success_login,
            has_user: self.session.has_user(),
            sign_in_error: state.sign_in_error,
            sign_up_error: state.sign_up_error,
        }
    }

    pub async fn sign_in(&self) -> ActionResponse {
        ActionResponse::from_result(self.auth.sign_in().await, "Signed in.", "sign_in")
    }

    pub async fn sign_up(&self) -> ActionResponse {
        ActionResponse::from_result(self.auth.sign_up().await, "Account created.", "sign_up")
    }

    pub async fn sign_out(&self) -> ActionResponse {
        ActionResponse::from_result(self.auth.sign_out().await, "Signed out.", "sign_out")
    }

    // --- Home ---

    #[flutter_rust_bridge::frb(sync)]
    pub fn list_view(&self) -> ExamenListView {
        let (status, items, message) = match self.list.state() {
            Resource::Loading => ("loading", Vec::new(), None),
            Resource::Success(examenes) => (
                "success",
                examenes.into_iter().map(to_examen_item).collect(),
                None,
            ),
            Resource::Failure(message) => ("failure", Vec::new(), Some(message)),
        };
        ExamenListView {
            status: status.to_string(),
            items,
            message,
            delete_error: self.list.delete_error(),
        }
    }

    pub async fn load_records(&self) -> ActionResponse {
        ActionResponse::from_result(self.list.load_records().await, "Loaded.", "load_records")
    }

    /// Deletes a record after the UI's confirm dialog; re-fetches the list.
    pub async fn delete_record(&self, examen_id: String) -> ActionResponse {
        match self.list.delete_record(examen_id.as_str()).await {
            Ok(()) => ActionResponse::success("Examen deleted.", Some(examen_id)),
            Err(err) => ActionResponse::failure(format!("delete_record failed: {err}")),
        }
    }

    // --- Detail ---

    #[flutter_rust_bridge::frb(sync)]
    pub fn set_subject(&self, value: String) {
        self.detail.set_subject(value);
    }

    #[flutter_rust_bridge::frb(sync)]
    pub fn set_description(&self, value: String) {
        self.detail.set_description(value);
    }

    #[flutter_rust_bridge::frb(sync)]
    pub fn set_date(&self, value: String) {
        self.detail.set_date(value);
    }

    #[flutter_rust_bridge::frb(sync)]
    pub fn set_day(&self, value: String) {
        self.detail.set_day(value);
    }

    #[flutter_rust_bridge::frb(sync)]
    pub fn set_time(&self, value: String) {
        self.detail.set_time(value);
    }

    #[flutter_rust_bridge::frb(sync)]
    pub fn set_color_index(&self, value: u32) {
        self.detail.set_color_index(value as usize);
    }

    #[flutter_rust_bridge::frb(sync)]
    pub fn detail_view(&self) -> DetailView {
        to_detail_view(self.detail.state())
    }

    /// Prepares the detail screen; blank id opens new-record mode.
    pub async fn load_for_edit(&self, examen_id: String) -> ActionResponse {
        ActionResponse::from_result(
            self.detail.load_for_edit(examen_id.as_str()).await,
            "Form ready.",
            "load_for_edit",
        )
    }

    pub async fn submit_create(&self) -> ActionResponse {
        match self.detail.submit_create().await {
            Ok(examen_id) => ActionResponse::success("Examen added.", Some(examen_id)),
            Err(err) => ActionResponse::failure(format!("submit_create failed: {err}")),
        }
    }

    pub async fn submit_update(&self, examen_id: String) -> ActionResponse {
        match self.detail.submit_update(examen_id.as_str()).await {
            Ok(()) => ActionResponse::success("Examen updated.", Some(examen_id)),
            Err(err) => ActionResponse::failure(format!("submit_update failed: {err}")),
        }
    }

    /// Takes the next navigation signal; each one is returned only once.
    #[flutter_rust_bridge::frb(sync)]
    pub fn take_detail_event(&self) -> Option<DetailEventView> {
        let event = self.detail.try_next_event()?;
        self.detail.reset_completion_flags();
        let (kind, examen_id) = match event {
            DetailEvent::Added(id) => ("added", id),
            DetailEvent::Updated(id) => ("updated", id),
        };
        Some(DetailEventView {
            kind: kind.to_string(),
            examen_id,
        })
    }
}

fn resolve_db_path(raw: &str) -> Result<PathBuf, String> {
    let trimmed = raw.trim();
    if !trimmed.is_empty() {
        return Ok(PathBuf::from(trimmed));
    }
    AppConfig::from_env()
        .map(|config| config.db_path)
        .map_err(|err| err.to_string())
}

fn to_examen_item(examen: Examen) -> ExamenItem {
    let color_argb = examen.color();
    let created_at_label = examen.created_at_label().unwrap_or_default();
    ExamenItem {
        examen_id: examen.id,
        subject: examen.subject,
        description: examen.description,
        date: examen.date,
        day: examen.day,
        time: examen.time,
        color_index: u32::try_from(examen.color_index).unwrap_or(u32::MAX),
        color_argb,
        created_at_ms: examen.created_at_ms,
        created_at_label,
    }
}

fn to_detail_view(state: DetailFormState) -> DetailView {
    let can_submit = state.can_submit();
    DetailView {
        phase: phase_label(state.phase).to_string(),
        subject: state.subject,
        description: state.description,
        date: state.date,
        day: state.day,
        time: state.time,
        color_index: u32::try_from(state.color_index).unwrap_or(u32::MAX),
        editing_id: state.editing_id,
        loaded: state.loaded,
        error: state.error,
        can_submit,
        added: state.added,
        updated: state.updated,
    }
}

fn phase_label(phase: DetailPhase) -> &'static str {
    match phase {
        DetailPhase::Blank => "blank",
        DetailPhase::Loading => "loading",
        DetailPhase::Editing => "editing",
        DetailPhase::Submitting => "submitting",
        DetailPhase::Done => "done",
    }
}
