//! Sign-in and sign-up form state.
//!
//! # Responsibility
//! - Hold login/sign-up field values, loading flag and per-form errors.
//! - Validate locally before any repository call.
//!
//! # Invariants
//! - `is_loading` is true only while the latest issued attempt is in flight;
//!   it is cleared on success, failure and validation rejection.
//! - Overlapping attempts are not deduplicated; only the latest one writes
//!   form state.

use crate::repo::examen_repo::{RepoError, RepoResult};
use crate::session::SessionContext;
use crate::state::observable::StateCell;
use crate::state::Generation;
use log::{debug, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use tokio::sync::watch;

/// Login screen state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthFormState {
    pub user_name: String,
    pub password: String,
    pub user_name_sign_up: String,
    pub password_sign_up: String,
    pub confirm_password_sign_up: String,
    pub is_loading: bool,
    /// Set by the latest successful sign-in or sign-up.
    pub is_success_login: bool,
    pub sign_in_error: Option<String>,
    pub sign_up_error: Option<String>,
}

/// Local precondition failures; these never reach the repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthValidationError {
    BlankSignInFields,
    BlankSignUpFields,
    PasswordMismatch,
}

impl Display for AuthValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankSignInFields => write!(f, "username and password are required"),
            Self::BlankSignUpFields => {
                write!(f, "username, password and confirmation are required")
            }
            Self::PasswordMismatch => write!(f, "passwords do not match"),
        }
    }
}

impl Error for AuthValidationError {}

#[derive(Debug)]
pub enum AuthError {
    Validation(AuthValidationError),
    /// The repository answered but declined the credentials.
    Rejected,
    Repo(RepoError),
}

impl Display for AuthError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Rejected => write!(f, "invalid username or password"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for AuthError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Rejected => None,
            Self::Repo(err) => Some(err),
        }
    }
}

impl From<AuthValidationError> for AuthError {
    fn from(value: AuthValidationError) -> Self {
        Self::Validation(value)
    }
}

#[derive(Debug, Clone, Copy)]
enum AuthForm {
    SignIn,
    SignUp,
}

impl AuthForm {
    fn event(self) -> &'static str {
        match self {
            Self::SignIn => "sign_in",
            Self::SignUp => "sign_up",
        }
    }

    fn set_error(self, state: &mut AuthFormState, message: Option<String>) {
        match self {
            Self::SignIn => state.sign_in_error = message,
            Self::SignUp => state.sign_up_error = message,
        }
    }
}

/// Owner of the login screen state.
pub struct AuthStateHolder {
    session: SessionContext,
    state: StateCell<AuthFormState>,
    attempts: Generation,
}

impl AuthStateHolder {
    pub fn new(session: SessionContext) -> Self {
        Self {
            session,
            state: StateCell::default(),
            attempts: Generation::default(),
        }
    }

    pub fn state(&self) -> AuthFormState {
        self.state.get()
    }

    pub fn subscribe(&self) -> watch::Receiver<AuthFormState> {
        self.state.subscribe()
    }

    /// Derived from the repository's current session on every call.
    pub fn has_user(&self) -> bool {
        self.session.has_user()
    }

    pub fn set_user_name(&self, value: impl Into<String>) {
        let value = value.into();
        self.state.update(|state| state.user_name = value);
    }

    pub fn set_password(&self, value: impl Into<String>) {
        let value = value.into();
        self.state.update(|state| state.password = value);
    }

    pub fn set_sign_up_user_name(&self, value: impl Into<String>) {
        let value = value.into();
        self.state.update(|state| state.user_name_sign_up = value);
    }

    pub fn set_sign_up_password(&self, value: impl Into<String>) {
        let value = value.into();
        self.state.update(|state| state.password_sign_up = value);
    }

    pub fn set_confirm_password(&self, value: impl Into<String>) {
        let value = value.into();
        self.state.update(|state| state.confirm_password_sign_up = value);
    }

    /// Replaces all three sign-up fields in one update.
    pub fn set_sign_up_fields(
        &self,
        user_name: impl Into<String>,
        password: impl Into<String>,
        confirm_password: impl Into<String>,
    ) {
        let (user_name, password, confirm_password) =
            (user_name.into(), password.into(), confirm_password.into());
        self.state.update(|state| {
            state.user_name_sign_up = user_name;
            state.password_sign_up = password;
            state.confirm_password_sign_up = confirm_password;
        });
    }

    /// Signs in with the current sign-in fields.
    ///
    /// # Errors
    /// - `Validation` when username or password is blank (no repository call).
    /// - `Rejected` when the repository declines the credentials.
    /// - `Repo` for repository failures.
    pub async fn sign_in(&self) -> Result<(), AuthError> {
        let form = self.state.get();
        if is_blank(&form.user_name) || is_blank(&form.password) {
            return Err(self.reject(AuthForm::SignIn, AuthValidationError::BlankSignInFields));
        }

        let ticket = self.begin(AuthForm::SignIn);
        let result = self
            .session
            .repository()
            .authenticate(&form.user_name, &form.password)
            .await;
        self.finish(AuthForm::SignIn, ticket, result)
    }

    /// Creates an account with the current sign-up fields.
    ///
    /// # Errors
    /// - `Validation` when any field is blank or the confirmation differs
    ///   (no repository call).
    /// - `Rejected` / `Repo` as for [`Self::sign_in`].
    pub async fn sign_up(&self) -> Result<(), AuthError> {
        let form = self.state.get();
        if is_blank(&form.user_name_sign_up)
            || is_blank(&form.password_sign_up)
            || is_blank(&form.confirm_password_sign_up)
        {
            return Err(self.reject(AuthForm::SignUp, AuthValidationError::BlankSignUpFields));
        }
        if form.password_sign_up != form.confirm_password_sign_up {
            return Err(self.reject(AuthForm::SignUp, AuthValidationError::PasswordMismatch));
        }

        let ticket = self.begin(AuthForm::SignUp);
        let result = self
            .session
            .repository()
            .create_account(&form.user_name_sign_up, &form.password_sign_up)
            .await;
        self.finish(AuthForm::SignUp, ticket, result)
    }

    pub async fn sign_out(&self) -> Result<(), AuthError> {
        self.session.sign_out().await.map_err(AuthError::Repo)?;
        self.state.update(|state| state.is_success_login = false);
        Ok(())
    }

    fn reject(&self, form: AuthForm, err: AuthValidationError) -> AuthError {
        // A rejected attempt still supersedes any attempt in flight.
        self.attempts.issue();
        warn!(
            "event={} module=auth status=rejected reason=validation detail={:?}",
            form.event(),
            err
        );
        self.state.update(|state| {
            state.is_loading = false;
            form.set_error(state, Some(err.to_string()));
        });
        err.into()
    }

    fn begin(&self, form: AuthForm) -> u64 {
        let ticket = self.attempts.issue();
        info!("event={} module=auth status=start", form.event());
        self.state.update(|state| {
            state.is_loading = true;
            form.set_error(state, None);
        });
        ticket
    }

    fn finish(&self, form: AuthForm, ticket: u64, result: RepoResult<bool>) -> Result<(), AuthError> {
        let outcome = match result {
            Ok(true) => Ok(()),
            Ok(false) => Err(AuthError::Rejected),
            Err(err) => Err(AuthError::Repo(err)),
        };
        self.session.has_user();

        if !self.attempts.is_current(ticket) {
            debug!("event={} module=auth status=stale ticket={ticket}", form.event());
            return outcome;
        }

        match &outcome {
            Ok(()) => info!("event={} module=auth status=ok", form.event()),
            Err(err) => warn!("event={} module=auth status=error error={err}", form.event()),
        }
        self.state.update(|state| {
            state.is_loading = false;
            match &outcome {
                Ok(()) => state.is_success_login = true,
                Err(err) => {
                    state.is_success_login = false;
                    form.set_error(state, Some(err.to_string()));
                }
            }
        });
        outcome
    }
}

fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}
