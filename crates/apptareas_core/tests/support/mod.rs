#![allow(dead_code)]

use apptareas_core::{
    AuthRepository, Examen, ExamenId, ExamenRepository, RepoError, RepoResult, SessionContext,
    UserAccount,
};
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use tokio::sync::oneshot;

#[derive(Debug, Clone)]
pub enum AuthResponse {
    Accept,
    Reject,
    Fail(String),
}

/// In-memory repository with scripted responses and call recording.
pub struct ScriptedRepository {
    user: Mutex<Option<UserAccount>>,
    auth_response: Mutex<AuthResponse>,
    examenes: Mutex<Vec<Examen>>,
    next_ids: Mutex<VecDeque<String>>,
    failures: Mutex<VecDeque<String>>,
    gates: Mutex<HashMap<&'static str, VecDeque<oneshot::Receiver<()>>>>,
    calls: Mutex<Vec<&'static str>>,
}

impl ScriptedRepository {
    pub fn new() -> Self {
        Self {
            user: Mutex::new(None),
            auth_response: Mutex::new(AuthResponse::Accept),
            examenes: Mutex::new(Vec::new()),
            next_ids: Mutex::new(VecDeque::new()),
            failures: Mutex::new(VecDeque::new()),
            gates: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn signed_in() -> Self {
        let repo = Self::new();
        *repo.user.lock().unwrap() = Some(test_user());
        repo
    }

    pub fn with_examenes(self, examenes: Vec<Examen>) -> Self {
        *self.examenes.lock().unwrap() = examenes;
        self
    }

    pub fn set_examenes(&self, examenes: Vec<Examen>) {
        *self.examenes.lock().unwrap() = examenes;
    }

    pub fn set_auth_response(&self, response: AuthResponse) {
        *self.auth_response.lock().unwrap() = response;
    }

    pub fn push_next_id(&self, id: &str) {
        self.next_ids.lock().unwrap().push_back(id.to_string());
    }

    /// Makes the next record operation fail with `RepoError::Backend`.
    pub fn fail_next(&self, message: &str) {
        self.failures.lock().unwrap().push_back(message.to_string());
    }

    /// Holds the next `fetch_all` until the returned sender fires.
    pub fn gate_next_fetch(&self) -> oneshot::Sender<()> {
        self.gate_next("fetch_all")
    }

    /// Holds the next call named `name` until the returned sender fires.
    ///
    /// The call's outcome is decided when it starts; only its completion
    /// is delayed.
    pub fn gate_next(&self, name: &'static str) -> oneshot::Sender<()> {
        let (sender, receiver) = oneshot::channel();
        self.gates
            .lock()
            .unwrap()
            .entry(name)
            .or_default()
            .push_back(receiver);
        sender
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self, name: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|call| **call == name)
            .count()
    }

    fn record(&self, name: &'static str) {
        self.calls.lock().unwrap().push(name);
    }

    fn take_gate(&self, name: &'static str) -> Option<oneshot::Receiver<()>> {
        self.gates
            .lock()
            .unwrap()
            .get_mut(name)
            .and_then(VecDeque::pop_front)
    }

    fn take_failure(&self) -> RepoResult<()> {
        match self.failures.lock().unwrap().pop_front() {
            Some(message) => Err(RepoError::Backend(message)),
            None => Ok(()),
        }
    }

    fn require_user(&self) -> RepoResult<UserAccount> {
        self.user.lock().unwrap().clone().ok_or(RepoError::NotSignedIn)
    }

    fn respond_auth(&self, username: &str) -> RepoResult<bool> {
        let response = self.auth_response.lock().unwrap().clone();
        match response {
            AuthResponse::Accept => {
                *self.user.lock().unwrap() = Some(UserAccount {
                    id: "user-1".to_string(),
                    username: username.to_string(),
                });
                Ok(true)
            }
            AuthResponse::Reject => Ok(false),
            AuthResponse::Fail(message) => Err(RepoError::Backend(message)),
        }
    }
}

#[async_trait]
impl AuthRepository for ScriptedRepository {
    fn current_user(&self) -> Option<UserAccount> {
        self.user.lock().unwrap().clone()
    }

    async fn authenticate(&self, username: &str, _password: &str) -> RepoResult<bool> {
        self.record("authenticate");
        let gate = self.take_gate("authenticate");
        let outcome = self.respond_auth(username);
        if let Some(gate) = gate {
            let _ = gate.await;
        }
        outcome
    }

    async fn create_account(&self, username: &str, _password: &str) -> RepoResult<bool> {
        self.record("create_account");
        let gate = self.take_gate("create_account");
        let outcome = self.respond_auth(username);
        if let Some(gate) = gate {
            let _ = gate.await;
        }
        outcome
    }

    async fn sign_out(&self) -> RepoResult<()> {
        self.record("sign_out");
        *self.user.lock().unwrap() = None;
        Ok(())
    }
}

#[async_trait]
impl ExamenRepository for ScriptedRepository {
    async fn fetch_all(&self) -> RepoResult<Vec<Examen>> {
        self.record("fetch_all");
        let gate = self.take_gate("fetch_all");
        let outcome = self
            .take_failure()
            .and_then(|()| self.require_user())
            .map(|_| self.examenes.lock().unwrap().clone());
        if let Some(gate) = gate {
            let _ = gate.await;
        }
        outcome
    }

    async fn fetch_one(&self, id: &str) -> RepoResult<Examen> {
        self.record("fetch_one");
        let gate = self.take_gate("fetch_one");
        let outcome = self.take_failure().and_then(|()| self.require_user()).and_then(|_| {
            self.examenes
                .lock()
                .unwrap()
                .iter()
                .find(|examen| examen.id == id)
                .cloned()
                .ok_or_else(|| RepoError::NotFound(id.to_string()))
        });
        if let Some(gate) = gate {
            let _ = gate.await;
        }
        outcome
    }

    async fn create(&self, draft: &Examen) -> RepoResult<ExamenId> {
        self.record("create");
        self.take_failure()?;
        draft.validate()?;
        let user = self.require_user()?;
        let id = self
            .next_ids
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| format!("generated-{}", self.call_count("create")));
        let mut stored = draft.clone();
        stored.id = id.clone();
        stored.user_id = user.id;
        self.examenes.lock().unwrap().push(stored);
        Ok(id)
    }

    async fn update(&self, id: &str, examen: &Examen) -> RepoResult<()> {
        self.record("update");
        self.take_failure()?;
        examen.validate()?;
        self.require_user()?;
        let mut examenes = self.examenes.lock().unwrap();
        let stored = examenes
            .iter_mut()
            .find(|stored| stored.id == id)
            .ok_or_else(|| RepoError::NotFound(id.to_string()))?;
        stored.subject = examen.subject.clone();
        stored.description = examen.description.clone();
        stored.date = examen.date.clone();
        stored.day = examen.day.clone();
        stored.time = examen.time.clone();
        stored.color_index = examen.color_index;
        Ok(())
    }

    async fn delete(&self, id: &str) -> RepoResult<()> {
        self.record("delete");
        self.take_failure()?;
        self.require_user()?;
        let mut examenes = self.examenes.lock().unwrap();
        let before = examenes.len();
        examenes.retain(|examen| examen.id != id);
        if examenes.len() == before {
            return Err(RepoError::NotFound(id.to_string()));
        }
        Ok(())
    }
}

pub fn test_user() -> UserAccount {
    UserAccount {
        id: "user-1".to_string(),
        username: "ana@example.com".to_string(),
    }
}

pub fn examen(id: &str, subject: &str, description: &str) -> Examen {
    Examen {
        id: id.to_string(),
        user_id: "user-1".to_string(),
        ..Examen::draft(subject, description)
    }
}

pub fn session_over(repo: &Arc<ScriptedRepository>) -> SessionContext {
    SessionContext::start(repo.clone())
}

/// Yields until the repository has seen `count` calls named `name`.
pub async fn wait_for_calls(repo: &ScriptedRepository, name: &str, count: usize) {
    while repo.call_count(name) < count {
        tokio::task::yield_now().await;
    }
}
