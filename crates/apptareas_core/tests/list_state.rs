mod support;

use apptareas_core::{ListError, ListStateHolder, Resource};
use std::sync::Arc;
use support::{examen, session_over, wait_for_calls, ScriptedRepository};

#[tokio::test]
async fn initial_state_is_loading() {
    let repo = Arc::new(ScriptedRepository::signed_in());
    let holder = ListStateHolder::new(session_over(&repo));
    assert_eq!(holder.state(), Resource::Loading);
}

#[tokio::test]
async fn load_success_keeps_repository_order() {
    let records = vec![
        examen("c", "Chemistry", "Lab quiz"),
        examen("a", "Algebra", "Final"),
        examen("b", "Biology", "Midterm"),
    ];
    let repo = Arc::new(ScriptedRepository::signed_in().with_examenes(records.clone()));
    let holder = ListStateHolder::new(session_over(&repo));

    holder.load_records().await.unwrap();

    assert_eq!(holder.state(), Resource::Success(records));
}

#[tokio::test]
async fn load_failure_exposes_message() {
    let repo = Arc::new(ScriptedRepository::signed_in());
    repo.fail_next("firestore unavailable");
    let holder = ListStateHolder::new(session_over(&repo));

    let err = holder.load_records().await.unwrap_err();

    assert!(matches!(err, ListError::Repo(_)));
    assert_eq!(
        holder.state(),
        Resource::Failure("firestore unavailable".to_string())
    );
}

#[tokio::test]
async fn reload_after_failure_reenters_loading_then_succeeds() {
    let repo = Arc::new(ScriptedRepository::signed_in());
    repo.fail_next("timeout");
    let holder = Arc::new(ListStateHolder::new(session_over(&repo)));
    holder.load_records().await.unwrap_err();

    let gate = repo.gate_next_fetch();
    let task = tokio::spawn({
        let holder = holder.clone();
        async move { holder.load_records().await }
    });
    wait_for_calls(&repo, "fetch_all", 2).await;
    assert_eq!(holder.state(), Resource::Loading);

    gate.send(()).unwrap();
    task.await.unwrap().unwrap();
    assert_eq!(holder.state(), Resource::Success(Vec::new()));
}

#[tokio::test]
async fn load_without_user_fails_without_repository_call() {
    let repo = Arc::new(ScriptedRepository::new());
    let holder = ListStateHolder::new(session_over(&repo));

    let err = holder.load_records().await.unwrap_err();

    assert!(matches!(err, ListError::NotSignedIn));
    assert!(repo.calls().is_empty());
    assert_eq!(
        holder.state(),
        Resource::Failure("user is not signed in".to_string())
    );
}

#[tokio::test]
async fn most_recently_issued_load_wins_over_late_completion() {
    let older = vec![examen("old", "History", "Essay")];
    let newer = vec![examen("new", "Physics", "Lab")];
    let repo = Arc::new(ScriptedRepository::signed_in().with_examenes(older));
    let holder = Arc::new(ListStateHolder::new(session_over(&repo)));

    let first_gate = repo.gate_next_fetch();
    let first = tokio::spawn({
        let holder = holder.clone();
        async move { holder.load_records().await }
    });
    wait_for_calls(&repo, "fetch_all", 1).await;

    repo.set_examenes(newer.clone());
    let second_gate = repo.gate_next_fetch();
    let second = tokio::spawn({
        let holder = holder.clone();
        async move { holder.load_records().await }
    });
    wait_for_calls(&repo, "fetch_all", 2).await;

    second_gate.send(()).unwrap();
    second.await.unwrap().unwrap();
    assert_eq!(holder.state(), Resource::Success(newer.clone()));

    first_gate.send(()).unwrap();
    first.await.unwrap().unwrap();
    assert_eq!(holder.state(), Resource::Success(newer));
}

#[tokio::test]
async fn delete_then_load_omits_deleted_record() {
    let repo = Arc::new(ScriptedRepository::signed_in().with_examenes(vec![
        examen("abc123", "Math", "Midterm"),
        examen("def456", "Art", "Portfolio"),
    ]));
    let holder = ListStateHolder::new(session_over(&repo));
    holder.load_records().await.unwrap();

    holder.delete_record("abc123").await.unwrap();
    holder.load_records().await.unwrap();

    let state = holder.state();
    let records = state.data().expect("list should be loaded");
    assert!(records.iter().all(|record| record.id != "abc123"));
    assert_eq!(records.len(), 1);
    assert_eq!(
        repo.calls(),
        vec!["fetch_all", "delete", "fetch_all", "fetch_all"]
    );
    assert!(holder.delete_error().is_none());
}

#[tokio::test]
async fn delete_with_blank_id_is_rejected_locally() {
    let repo = Arc::new(ScriptedRepository::signed_in());
    let holder = ListStateHolder::new(session_over(&repo));

    let err = holder.delete_record("  ").await.unwrap_err();

    assert!(matches!(err, ListError::BlankId));
    assert!(repo.calls().is_empty());
    assert_eq!(holder.delete_error().as_deref(), Some("examen id is required"));
}

#[tokio::test]
async fn failed_delete_keeps_list_and_records_error() {
    let records = vec![examen("abc123", "Math", "Midterm")];
    let repo = Arc::new(ScriptedRepository::signed_in().with_examenes(records.clone()));
    let holder = ListStateHolder::new(session_over(&repo));
    holder.load_records().await.unwrap();

    repo.fail_next("permission denied");
    holder.delete_record("abc123").await.unwrap_err();

    assert_eq!(holder.state(), Resource::Success(records));
    assert_eq!(holder.delete_error().as_deref(), Some("permission denied"));
    assert_eq!(repo.call_count("fetch_all"), 1);
}

#[tokio::test]
async fn sign_out_drops_user_for_later_loads() {
    let repo = Arc::new(ScriptedRepository::signed_in());
    let holder = ListStateHolder::new(session_over(&repo));
    assert!(holder.has_user());

    holder.sign_out().await.unwrap();

    assert!(!holder.has_user());
    assert!(matches!(
        holder.load_records().await,
        Err(ListError::NotSignedIn)
    ));
}
