//! In-memory stand-in for the backend used by unit tests.

#![allow(clippy::unwrap_used)]

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use chrono::{TimeZone, Utc};
use secrecy::{ExposeSecret, SecretString};
use upvote_core::{ApprovalState, CurrentUser, Email, Idea, IdeaDraft, IdeaId, UserId};

use super::{AdminApi, AuthApi, IdeaApi, RegisteredUser};
use crate::error::{ApiError, ErrorBody};
use crate::session::{Credentials, Session};

/// Build an idea with fixed timestamps.
pub(crate) fn idea(id: i64, title: &str, votes: u32, approval: ApprovalState) -> Idea {
    Idea {
        id: IdeaId::new(id),
        title: title.to_string(),
        description: format!("{title} description"),
        votes,
        created_at: Utc.with_ymd_and_hms(2025, 1, 1, 12, 0, 0).unwrap(),
        approval,
    }
}

pub(crate) fn approved(id: i64, title: &str, votes: u32) -> Idea {
    idea(id, title, votes, ApprovalState::Approved)
}

pub(crate) fn pending(id: i64, title: &str) -> Idea {
    idea(id, title, 0, ApprovalState::Pending)
}

struct FakeUser {
    username: String,
    password: String,
    roles: Vec<String>,
}

#[derive(Default)]
struct FakeState {
    approved: Vec<Idea>,
    pending: Vec<Idea>,
    next_id: i64,
    vote_script: VecDeque<Result<Idea, ApiError>>,
    list_failures: VecDeque<ApiError>,
    submit_failures: VecDeque<ApiError>,
    users: Vec<FakeUser>,
}

pub(crate) struct FakeApi {
    session: Session,
    state: Mutex<FakeState>,
    vote_calls: AtomicUsize,
    list_calls: AtomicUsize,
    submit_calls: AtomicUsize,
}

impl FakeApi {
    pub(crate) fn new() -> Self {
        Self {
            session: Session::new(),
            state: Mutex::new(FakeState {
                next_id: 100,
                ..FakeState::default()
            }),
            vote_calls: AtomicUsize::new(0),
            list_calls: AtomicUsize::new(0),
            submit_calls: AtomicUsize::new(0),
        }
    }

    pub(crate) fn with_approved(self, ideas: Vec<Idea>) -> Self {
        self.state.lock().unwrap().approved = ideas;
        self
    }

    pub(crate) fn with_pending(self, ideas: Vec<Idea>) -> Self {
        self.state.lock().unwrap().pending = ideas;
        self
    }

    pub(crate) fn with_user(self, username: &str, password: &str, roles: &[&str]) -> Self {
        self.state.lock().unwrap().users.push(FakeUser {
            username: username.to_string(),
            password: password.to_string(),
            roles: roles.iter().map(ToString::to_string).collect(),
        });
        self
    }

    /// Answer the next vote with `result` instead of the default behavior.
    pub(crate) fn script_vote(&self, result: Result<Idea, ApiError>) {
        self.state.lock().unwrap().vote_script.push_back(result);
    }

    pub(crate) fn fail_next_list(&self, error: ApiError) {
        self.state.lock().unwrap().list_failures.push_back(error);
    }

    pub(crate) fn fail_next_submit(&self, error: ApiError) {
        self.state.lock().unwrap().submit_failures.push_back(error);
    }

    pub(crate) fn vote_calls(&self) -> usize {
        self.vote_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn submit_calls(&self) -> usize {
        self.submit_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn pending_ideas(&self) -> Vec<Idea> {
        self.state.lock().unwrap().pending.clone()
    }

    /// Mirror `ApiClient`: a 401 clears the session first.
    fn unauthorized(&self) -> ApiError {
        self.session.expire();
        ApiError::AuthExpired
    }
}

impl IdeaApi for FakeApi {
    async fn list_approved(&self) -> Result<Vec<Idea>, ApiError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        let mut state = self.state.lock().unwrap();
        if let Some(error) = state.list_failures.pop_front() {
            return Err(error);
        }
        Ok(state.approved.clone())
    }

    async fn submit_idea(&self, draft: &IdeaDraft) -> Result<Idea, ApiError> {
        self.submit_calls.fetch_add(1, Ordering::SeqCst);
        let mut state = self.state.lock().unwrap();
        if let Some(error) = state.submit_failures.pop_front() {
            return Err(error);
        }
        state.next_id += 1;
        let mut created = pending(state.next_id, draft.title());
        created.description = draft.description().to_string();
        state.pending.push(created.clone());
        Ok(created)
    }

    async fn vote(&self, id: IdeaId) -> Result<Idea, ApiError> {
        self.vote_calls.fetch_add(1, Ordering::SeqCst);
        let mut state = self.state.lock().unwrap();
        if let Some(result) = state.vote_script.pop_front() {
            return result;
        }
        let idea = state
            .approved
            .iter_mut()
            .find(|idea| idea.id == id)
            .ok_or_else(|| ApiError::NotFound(ErrorBody::Empty))?;
        idea.votes += 1;
        Ok(idea.clone())
    }
}

impl AdminApi for FakeApi {
    async fn list_pending(&self) -> Result<Vec<Idea>, ApiError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        let mut state = self.state.lock().unwrap();
        if let Some(error) = state.list_failures.pop_front() {
            return Err(error);
        }
        Ok(state.pending.clone())
    }

    async fn approve(&self, id: IdeaId) -> Result<Idea, ApiError> {
        let mut state = self.state.lock().unwrap();
        let index = state
            .pending
            .iter()
            .position(|idea| idea.id == id)
            .ok_or_else(|| ApiError::NotFound(ErrorBody::Empty))?;
        let mut idea = state.pending.remove(index);
        idea.approval = ApprovalState::Approved;
        state.approved.push(idea.clone());
        Ok(idea)
    }

    async fn delete_idea(&self, id: IdeaId) -> Result<(), ApiError> {
        let mut state = self.state.lock().unwrap();
        state.pending.retain(|idea| idea.id != id);
        state.approved.retain(|idea| idea.id != id);
        Ok(())
    }
}

impl AuthApi for FakeApi {
    fn session(&self) -> &Session {
        &self.session
    }

    async fn register(
        &self,
        username: &str,
        email: &Email,
        password: &SecretString,
    ) -> Result<RegisteredUser, ApiError> {
        let mut state = self.state.lock().unwrap();
        if state.users.iter().any(|u| u.username == username) {
            return Err(ApiError::Conflict(ErrorBody::Text(
                "Username already exists".to_string(),
            )));
        }
        state.users.push(FakeUser {
            username: username.to_string(),
            password: password.expose_secret().to_string(),
            roles: vec!["ROLE_USER".to_string()],
        });
        Ok(RegisteredUser {
            id: UserId::new(i64::try_from(state.users.len()).unwrap()),
            username: username.to_string(),
            email: email.to_string(),
            message: Some("Registration successful".to_string()),
        })
    }

    async fn current_user(&self) -> Result<CurrentUser, ApiError> {
        let Some(auth) = self.session.authorization() else {
            return Err(self.unauthorized());
        };
        let found = {
            let state = self.state.lock().unwrap();
            state
                .users
                .iter()
                .find(|u| {
                    let expected = Credentials::basic(
                        &u.username,
                        &SecretString::from(u.password.clone()),
                    );
                    expected.authorization().expose_secret() == auth.expose_secret()
                })
                .map(|u| {
                    CurrentUser::new(
                        u.username.clone(),
                        format!("{}@example.com", u.username),
                        u.roles.clone(),
                    )
                })
        };
        found.ok_or_else(|| self.unauthorized())
    }
}
