mod support;

use apptareas_core::{AuthError, AuthStateHolder, AuthValidationError};
use std::sync::Arc;
use support::{session_over, wait_for_calls, AuthResponse, ScriptedRepository};

fn holder() -> (Arc<ScriptedRepository>, AuthStateHolder) {
    let repo = Arc::new(ScriptedRepository::new());
    let holder = AuthStateHolder::new(session_over(&repo));
    (repo, holder)
}

#[tokio::test]
async fn sign_in_with_blank_fields_never_calls_repository() {
    let cases = [("", "secret1"), ("   ", "secret1"), ("ana", "\t \n"), ("", "")];

    for (user_name, password) in cases {
        let (repo, holder) = holder();
        holder.set_user_name(user_name);
        holder.set_password(password);

        let err = holder.sign_in().await.unwrap_err();
        assert!(
            matches!(
                err,
                AuthError::Validation(AuthValidationError::BlankSignInFields)
            ),
            "case ({user_name:?}, {password:?}) gave {err:?}"
        );
        assert!(repo.calls().is_empty());

        let state = holder.state();
        assert!(!state.is_loading);
        assert_eq!(
            state.sign_in_error.as_deref(),
            Some("username and password are required")
        );
        assert!(!holder.has_user());
    }
}

#[tokio::test]
async fn sign_up_rejects_mismatched_confirmation_before_repository() {
    let (repo, holder) = holder();
    holder.set_sign_up_fields("ana@example.com", "secret1", "secret2");

    let err = holder.sign_up().await.unwrap_err();
    assert!(matches!(
        err,
        AuthError::Validation(AuthValidationError::PasswordMismatch)
    ));
    assert!(repo.calls().is_empty());
    let state = holder.state();
    assert_eq!(state.sign_up_error.as_deref(), Some("passwords do not match"));
    assert!(state.sign_in_error.is_none());
    assert!(!state.is_loading);
}

#[tokio::test]
async fn sign_up_requires_all_three_fields() {
    let (repo, holder) = holder();
    holder.set_sign_up_user_name("ana@example.com");
    holder.set_sign_up_password("secret1");

    let err = holder.sign_up().await.unwrap_err();
    assert!(matches!(
        err,
        AuthError::Validation(AuthValidationError::BlankSignUpFields)
    ));
    assert!(repo.calls().is_empty());
}

#[tokio::test]
async fn successful_sign_in_publishes_has_user_transition() {
    let repo = Arc::new(ScriptedRepository::new());
    let session = session_over(&repo);
    let mut has_user = session.subscribe_user();
    let holder = AuthStateHolder::new(session);
    holder.set_user_name("ana@example.com");
    holder.set_password("secret1");

    holder.sign_in().await.unwrap();

    assert_eq!(repo.calls(), vec!["authenticate"]);
    assert!(has_user.has_changed().unwrap());
    assert!(*has_user.borrow_and_update());
    assert!(holder.has_user());

    let state = holder.state();
    assert!(!state.is_loading);
    assert!(state.is_success_login);
    assert!(state.sign_in_error.is_none());
}

#[tokio::test]
async fn rejected_credentials_surface_as_sign_in_error() {
    let (repo, holder) = holder();
    repo.set_auth_response(AuthResponse::Reject);
    holder.set_user_name("ana@example.com");
    holder.set_password("wrong-password");

    let err = holder.sign_in().await.unwrap_err();
    assert!(matches!(err, AuthError::Rejected));

    let state = holder.state();
    assert!(!state.is_loading);
    assert!(!state.is_success_login);
    assert_eq!(
        state.sign_in_error.as_deref(),
        Some("invalid username or password")
    );
    assert!(!holder.has_user());
}

#[tokio::test]
async fn repository_failure_message_is_kept_until_next_attempt_succeeds() {
    let (repo, holder) = holder();
    repo.set_auth_response(AuthResponse::Fail("network unreachable".to_string()));
    holder.set_sign_up_fields("ana@example.com", "secret1", "secret1");

    holder.sign_up().await.unwrap_err();
    assert_eq!(
        holder.state().sign_up_error.as_deref(),
        Some("network unreachable")
    );

    repo.set_auth_response(AuthResponse::Accept);
    holder.sign_up().await.unwrap();
    let state = holder.state();
    assert!(state.sign_up_error.is_none());
    assert!(state.is_success_login);
    assert_eq!(repo.call_count("create_account"), 2);
}

#[tokio::test]
async fn setters_are_idempotent_and_notify_once() {
    let (_repo, holder) = holder();
    let mut changes = holder.subscribe();

    holder.set_user_name("ana");
    let once = holder.state();
    assert!(changes.has_changed().unwrap());
    changes.borrow_and_update();

    holder.set_user_name("ana");
    assert_eq!(holder.state(), once);
    assert!(!changes.has_changed().unwrap());
}

#[tokio::test]
async fn sign_out_clears_session_user() {
    let repo = Arc::new(ScriptedRepository::signed_in());
    let holder = AuthStateHolder::new(session_over(&repo));
    assert!(holder.has_user());

    holder.sign_out().await.unwrap();

    assert!(!holder.has_user());
    assert_eq!(repo.calls(), vec!["sign_out"]);
}

#[tokio::test]
async fn superseded_sign_in_cannot_overwrite_latest_attempt() {
    let repo = Arc::new(ScriptedRepository::new());
    let holder = Arc::new(AuthStateHolder::new(session_over(&repo)));
    holder.set_user_name("ana@example.com");
    holder.set_password("secret1");

    repo.set_auth_response(AuthResponse::Fail("timeout".to_string()));
    let older_gate = repo.gate_next("authenticate");
    let older = tokio::spawn({
        let holder = holder.clone();
        async move { holder.sign_in().await }
    });
    wait_for_calls(&repo, "authenticate", 1).await;

    repo.set_auth_response(AuthResponse::Accept);
    let newer_gate = repo.gate_next("authenticate");
    let newer = tokio::spawn({
        let holder = holder.clone();
        async move { holder.sign_in().await }
    });
    wait_for_calls(&repo, "authenticate", 2).await;

    older_gate.send(()).unwrap();
    assert!(matches!(older.await.unwrap(), Err(AuthError::Repo(_))));
    let state = holder.state();
    assert!(state.is_loading);
    assert!(state.sign_in_error.is_none());

    newer_gate.send(()).unwrap();
    newer.await.unwrap().unwrap();
    let state = holder.state();
    assert!(!state.is_loading);
    assert!(state.is_success_login);
    assert!(state.sign_in_error.is_none());
}
