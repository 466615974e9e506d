//! In-memory Upvote backend for end-to-end tests.
//!
//! [`FakeBackend`] serves the backend's HTTP contract from memory on an
//! ephemeral local port, so the real [`ApiClient`] can be exercised without
//! a database.
//!
//! # Route Structure
//!
//! ```text
//! POST   /api/auth/register        - Create an account (no auth)
//! GET    /api/auth/me              - Current user
//! GET    /api/ideas                - Approved ideas (votes desc, newest first)
//! POST   /api/ideas                - Submit an idea (pending)
//! GET    /api/ideas/pending        - Pending ideas (admin)
//! POST   /api/ideas/{id}/approve   - Approve (admin)
//! DELETE /api/ideas/{id}           - Delete (admin)
//! POST   /api/ideas/{id}/vote      - Vote, one per account
//! ```
//!
//! Every request is recorded so tests can assert that nothing was sent.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use axum::{
    Json, Router,
    extract::{FromRequestParts, Path, Request, State},
    http::{Method, StatusCode, header::AUTHORIZATION, request::Parts},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use chrono::{DateTime, Duration, TimeZone, Utc};
use serde::Deserialize;
use serde_json::{Map, Value, json};
use tokio::task::JoinHandle;
use upvote_client::{ApiClient, ClientConfig, Session};
use upvote_core::{ADMIN_ROLE, ApprovalState, Idea, IdeaId, USER_ROLE};

/// Prefix of the backend's already-voted message.
pub const ALREADY_VOTED_PREFIX: &str = "Már szavaztál erre az ötletre: ";
/// Title used in the message when the voted idea no longer exists.
pub const UNKNOWN_IDEA: &str = "ismeretlen ötlet";
/// Message for votes on an idea that is not approved yet.
pub const NOT_APPROVED: &str = "Ez az ötlet még nincs jóváhagyva";

/// A request as seen by the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedRequest {
    pub method: Method,
    pub path: String,
    /// Whether an `Authorization` header was present.
    pub authorized: bool,
}

#[derive(Debug, Clone)]
struct User {
    id: i64,
    username: String,
    email: String,
    password: String,
    admin: bool,
}

impl User {
    fn roles(&self) -> Vec<&'static str> {
        if self.admin {
            vec![USER_ROLE, ADMIN_ROLE]
        } else {
            vec![USER_ROLE]
        }
    }
}

#[derive(Debug, Default)]
struct Store {
    users: Vec<User>,
    ideas: Vec<Idea>,
    /// Username → idea voted for.
    votes: Vec<(String, IdeaId)>,
    next_user_id: i64,
    next_idea_id: i64,
    requests: Vec<RecordedRequest>,
    structured_conflicts: bool,
    conflict_override: Option<String>,
    submit_rejection: Option<Value>,
}

impl Store {
    fn created_at(id: i64) -> DateTime<Utc> {
        let base = Utc
            .with_ymd_and_hms(2025, 1, 1, 8, 0, 0)
            .single()
            .unwrap_or_default();
        base + Duration::minutes(id)
    }

    fn insert_idea(&mut self, title: &str, description: &str, votes: u32, approved: bool) -> Idea {
        self.next_idea_id += 1;
        let idea = Idea {
            id: IdeaId::new(self.next_idea_id),
            title: title.to_string(),
            description: description.to_string(),
            votes,
            created_at: Self::created_at(self.next_idea_id),
            approval: if approved {
                ApprovalState::Approved
            } else {
                ApprovalState::Pending
            },
        };
        self.ideas.push(idea.clone());
        idea
    }

    fn idea_mut(&mut self, id: IdeaId) -> Option<&mut Idea> {
        self.ideas.iter_mut().find(|idea| idea.id == id)
    }

    fn authenticate(&self, header: Option<&str>) -> Option<User> {
        let encoded = header?.strip_prefix("Basic ")?;
        let decoded = String::from_utf8(BASE64.decode(encoded).ok()?).ok()?;
        let (username, password) = decoded.split_once(':')?;
        self.users
            .iter()
            .find(|u| u.username == username && u.password == password)
            .cloned()
    }
}

#[derive(Clone, Default)]
struct AppState {
    store: Arc<Mutex<Store>>,
}

impl AppState {
    fn store(&self) -> MutexGuard<'_, Store> {
        self.store.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Error responses in the backend's shapes.
enum Reply {
    Unauthorized,
    Forbidden,
    NotFound,
    Conflict(Value),
    ConflictText(&'static str),
    BadRequest(Map<String, Value>),
}

impl IntoResponse for Reply {
    fn into_response(self) -> Response {
        match self {
            Self::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                Json(json!({"error": "Unauthorized", "message": "Invalid credentials"})),
            )
                .into_response(),
            Self::Forbidden => (
                StatusCode::FORBIDDEN,
                Json(json!({"error": "Forbidden", "message": "Access denied"})),
            )
                .into_response(),
            Self::NotFound => (
                StatusCode::NOT_FOUND,
                Json(json!({"error": "Not found", "message": "Idea not found"})),
            )
                .into_response(),
            Self::Conflict(body) => (StatusCode::CONFLICT, Json(body)).into_response(),
            Self::ConflictText(text) => (StatusCode::CONFLICT, text).into_response(),
            Self::BadRequest(fields) => {
                (StatusCode::BAD_REQUEST, Json(Value::Object(fields))).into_response()
            }
        }
    }
}

/// Extractor for a request with valid Basic credentials.
struct AuthUser(User);

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = Reply;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Reply> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok());
        state
            .store()
            .authenticate(header)
            .map(Self)
            .ok_or(Reply::Unauthorized)
    }
}

/// Extractor for an authenticated admin.
struct AdminUser;

impl FromRequestParts<AppState> for AdminUser {
    type Rejection = Reply;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Reply> {
        let AuthUser(user) = AuthUser::from_request_parts(parts, state).await?;
        if user.admin {
            Ok(Self)
        } else {
            Err(Reply::Forbidden)
        }
    }
}

async fn record(State(state): State<AppState>, request: Request, next: Next) -> Response {
    state.store().requests.push(RecordedRequest {
        method: request.method().clone(),
        path: request.uri().path().to_string(),
        authorized: request.headers().contains_key(AUTHORIZATION),
    });
    next.run(request).await
}

#[derive(Debug, Deserialize)]
struct RegisterBody {
    #[serde(default)]
    username: String,
    #[serde(default)]
    password: String,
    #[serde(default)]
    email: String,
}

async fn register(State(state): State<AppState>, Json(body): Json<RegisterBody>) -> Response {
    let mut fields = Map::new();
    if body.username.trim().is_empty() {
        fields.insert("username".into(), "Username is required".into());
    }
    if body.email.trim().is_empty() {
        fields.insert("email".into(), "Email is required".into());
    }
    if body.password.chars().count() < 6 {
        fields.insert(
            "password".into(),
            "Password must be at least 6 characters".into(),
        );
    }
    if !fields.is_empty() {
        return Reply::BadRequest(fields).into_response();
    }

    let mut store = state.store();
    if store.users.iter().any(|u| u.username == body.username) {
        return Reply::ConflictText("Username already exists").into_response();
    }
    if store.users.iter().any(|u| u.email == body.email) {
        return Reply::ConflictText("Email already exists").into_response();
    }

    store.next_user_id += 1;
    let user = User {
        id: store.next_user_id,
        username: body.username,
        email: body.email,
        password: body.password,
        admin: false,
    };
    let response = json!({
        "id": user.id,
        "username": user.username,
        "email": user.email,
        "message": "User registered successfully",
    });
    store.users.push(user);
    (StatusCode::CREATED, Json(response)).into_response()
}

async fn me(AuthUser(user): AuthUser) -> Json<Value> {
    Json(json!({
        "username": user.username,
        "email": user.email,
        "roles": user.roles(),
    }))
}

async fn list_approved(State(state): State<AppState>, _user: AuthUser) -> Json<Vec<Idea>> {
    let mut ideas: Vec<Idea> = state
        .store()
        .ideas
        .iter()
        .filter(|idea| idea.is_approved())
        .cloned()
        .collect();
    ideas.sort_by(|a, b| {
        b.votes
            .cmp(&a.votes)
            .then_with(|| b.created_at.cmp(&a.created_at))
    });
    Json(ideas)
}

async fn list_pending(State(state): State<AppState>, _admin: AdminUser) -> Json<Vec<Idea>> {
    let mut ideas: Vec<Idea> = state
        .store()
        .ideas
        .iter()
        .filter(|idea| !idea.is_approved())
        .cloned()
        .collect();
    ideas.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    Json(ideas)
}

#[derive(Debug, Deserialize)]
struct IdeaBody {
    #[serde(default)]
    title: String,
    #[serde(default)]
    description: String,
}

async fn submit(
    State(state): State<AppState>,
    _user: AuthUser,
    Json(body): Json<IdeaBody>,
) -> Response {
    let mut store = state.store();
    if let Some(Value::Object(fields)) = store.submit_rejection.take() {
        return Reply::BadRequest(fields).into_response();
    }

    let mut fields = Map::new();
    if body.title.trim().is_empty() {
        fields.insert("title".into(), "must not be blank".into());
    } else if body.title.chars().count() > 200 {
        fields.insert("title".into(), "size must be between 0 and 200".into());
    }
    if body.description.trim().is_empty() {
        fields.insert("description".into(), "must not be blank".into());
    } else if body.description.chars().count() > 4000 {
        fields.insert("description".into(), "size must be between 0 and 4000".into());
    }
    if !fields.is_empty() {
        return Reply::BadRequest(fields).into_response();
    }

    let idea = store.insert_idea(&body.title, &body.description, 0, false);
    tracing::debug!(id = %idea.id, "Fake backend stored idea");
    Json(idea).into_response()
}

async fn approve(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<i64>,
) -> Result<Json<Idea>, Reply> {
    let mut store = state.store();
    let idea = store.idea_mut(IdeaId::new(id)).ok_or(Reply::NotFound)?;
    idea.approval = ApprovalState::Approved;
    Ok(Json(idea.clone()))
}

async fn delete_idea(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, Reply> {
    let mut store = state.store();
    let before = store.ideas.len();
    store.ideas.retain(|idea| idea.id != IdeaId::new(id));
    if store.ideas.len() == before {
        return Err(Reply::NotFound);
    }
    Ok(StatusCode::NO_CONTENT)
}

async fn vote(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<Idea>, Reply> {
    let id = IdeaId::new(id);
    let mut store = state.store();

    let previous = store
        .votes
        .iter()
        .find(|(voter, _)| *voter == user.username)
        .map(|(_, voted)| *voted);
    if let Some(voted) = previous {
        let title = store
            .ideas
            .iter()
            .find(|idea| idea.id == voted)
            .map_or_else(|| UNKNOWN_IDEA.to_string(), |idea| idea.title.clone());
        let message = store
            .conflict_override
            .clone()
            .unwrap_or_else(|| format!("{ALREADY_VOTED_PREFIX}{title}"));
        let mut body = json!({"error": "Already voted", "message": message});
        if store.structured_conflicts {
            body["title"] = json!(title);
            body["ideaId"] = json!(voted);
        }
        return Err(Reply::Conflict(body));
    }

    let idea = store.idea_mut(id).ok_or(Reply::NotFound)?;
    if !idea.is_approved() {
        return Err(Reply::Conflict(
            json!({"error": "Already voted", "message": NOT_APPROVED}),
        ));
    }
    idea.votes += 1;
    let updated = idea.clone();
    store.votes.push((user.username, id));
    Ok(Json(updated))
}

fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/auth/register", post(register))
        .route("/api/auth/me", get(me))
        .route("/api/ideas", get(list_approved).post(submit))
        .route("/api/ideas/pending", get(list_pending))
        .route("/api/ideas/{id}/approve", post(approve))
        .route("/api/ideas/{id}", axum::routing::delete(delete_idea))
        .route("/api/ideas/{id}/vote", post(vote))
        .layer(middleware::from_fn_with_state(state.clone(), record))
        .with_state(state)
}

/// A running in-memory backend. The server stops when this is dropped.
pub struct FakeBackend {
    state: AppState,
    addr: SocketAddr,
    server: JoinHandle<()>,
}

impl Drop for FakeBackend {
    fn drop(&mut self) {
        self.server.abort();
    }
}

impl FakeBackend {
    /// Start serving on an ephemeral port on the loopback interface.
    ///
    /// # Errors
    ///
    /// Returns error if the listener cannot be bound.
    pub async fn start() -> std::io::Result<Self> {
        let state = AppState::default();
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let app = router(state.clone());

        let server = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                tracing::error!("Fake backend stopped: {e}");
            }
        });

        Ok(Self {
            state,
            addr,
            server,
        })
    }

    #[must_use]
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// A client with its own fresh session.
    ///
    /// # Panics
    ///
    /// Panics if the client cannot be built.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn client(&self) -> ApiClient {
        let config = ClientConfig::new(&self.url()).expect("loopback URL is valid");
        ApiClient::new(&config, Session::new()).expect("HTTP client builds")
    }

    pub fn add_user(&self, username: &str, password: &str, admin: bool) {
        let mut store = self.state.store();
        store.next_user_id += 1;
        let id = store.next_user_id;
        store.users.push(User {
            id,
            username: username.to_string(),
            email: format!("{username}@example.com"),
            password: password.to_string(),
            admin,
        });
    }

    /// Change a password behind the client's back, invalidating its
    /// credentials.
    pub fn change_password(&self, username: &str, password: &str) {
        let mut store = self.state.store();
        if let Some(user) = store.users.iter_mut().find(|u| u.username == username) {
            user.password = password.to_string();
        }
    }

    /// Store an idea directly. Later seeds count as newer.
    pub fn seed_idea(&self, title: &str, votes: u32, approved: bool) -> IdeaId {
        self.state
            .store()
            .insert_idea(title, &format!("{title} description"), votes, approved)
            .id
    }

    pub fn remove_idea(&self, id: IdeaId) {
        self.state.store().ideas.retain(|idea| idea.id != id);
    }

    /// Record a vote as if cast from another client.
    pub fn record_vote(&self, username: &str, id: IdeaId) {
        let mut store = self.state.store();
        if let Some(idea) = store.idea_mut(id) {
            idea.votes += 1;
        }
        store.votes.push((username.to_string(), id));
    }

    #[must_use]
    pub fn idea(&self, id: IdeaId) -> Option<Idea> {
        self.state
            .store()
            .ideas
            .iter()
            .find(|idea| idea.id == id)
            .cloned()
    }

    /// Include `title` and `ideaId` fields in already-voted conflicts.
    pub fn use_structured_conflicts(&self, enabled: bool) {
        self.state.store().structured_conflicts = enabled;
    }

    /// Replace the already-voted message.
    pub fn override_conflict_message(&self, message: &str) {
        self.state.store().conflict_override = Some(message.to_string());
    }

    /// Answer the next submission with a 400 carrying `fields`.
    pub fn reject_next_submission(&self, fields: Value) {
        self.state.store().submit_rejection = Some(fields);
    }

    #[must_use]
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.store().requests.clone()
    }

    /// Number of requests with `method` whose path ends with `suffix`.
    #[must_use]
    pub fn count(&self, method: &Method, suffix: &str) -> usize {
        self.state
            .store()
            .requests
            .iter()
            .filter(|r| r.method == *method && r.path.ends_with(suffix))
            .count()
    }

    #[must_use]
    pub fn vote_requests(&self) -> usize {
        self.count(&Method::POST, "/vote")
    }
}
