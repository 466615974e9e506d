//! Session context: the credential attached to outgoing requests.
//!
//! A [`Session`] is created by the caller and handed to
//! [`ApiClient::new`](crate::api::ApiClient::new). It has an explicit
//! lifecycle:
//!
//! 1. `Anonymous` until [`Session::sign_in`] installs [`Credentials`]
//! 2. `Active` while the credentials are attached to every request
//! 3. `Anonymous` again after [`Session::sign_out`] (explicit logout), or
//!    `Expired` after the API client saw a 401 from any call
//!
//! State changes are published on a `watch` channel so that a single
//! top-level subscriber (the [`Shell`](crate::shell::Shell)) can react to
//! expiry no matter which component issued the failing call.

use std::sync::{Arc, PoisonError, RwLock};

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use secrecy::{ExposeSecret, SecretString};
use tokio::sync::watch;
use tracing::{debug, warn};

/// A username plus the transport token derived from username and password.
#[derive(Clone)]
pub struct Credentials {
    username: String,
    /// `base64(username:password)`
    token: SecretString,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("token", &"[REDACTED]")
            .finish()
    }
}

impl Credentials {
    /// Derive Basic credentials from a username and password.
    #[must_use]
    pub fn basic(username: &str, password: &SecretString) -> Self {
        let token = BASE64.encode(format!("{username}:{}", password.expose_secret()));
        Self {
            username: username.to_string(),
            token: SecretString::from(token),
        }
    }

    /// The username these credentials were derived from.
    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }

    /// Value for the `Authorization` header.
    #[must_use]
    pub fn authorization(&self) -> SecretString {
        SecretString::from(format!("Basic {}", self.token.expose_secret()))
    }
}

/// Observable lifecycle state of a [`Session`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SessionState {
    /// No credentials installed.
    #[default]
    Anonymous,
    /// Credentials installed for `username`.
    Active {
        /// Who is signed in.
        username: String,
    },
    /// The backend rejected the credentials; they have been dropped.
    Expired,
}

impl SessionState {
    #[must_use]
    pub const fn is_active(&self) -> bool {
        matches!(self, Self::Active { .. })
    }
}

/// Shared session context.
///
/// Cloning is cheap and every clone refers to the same credentials.
#[derive(Clone)]
pub struct Session {
    inner: Arc<SessionInner>,
}

struct SessionInner {
    credentials: RwLock<Option<Credentials>>,
    state: watch::Sender<SessionState>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    /// Create an anonymous session.
    #[must_use]
    pub fn new() -> Self {
        let (state, _) = watch::channel(SessionState::Anonymous);
        Self {
            inner: Arc::new(SessionInner {
                credentials: RwLock::new(None),
                state,
            }),
        }
    }

    /// Install credentials; subsequent requests carry them.
    pub fn sign_in(&self, credentials: Credentials) {
        let username = credentials.username().to_string();
        *self
            .inner
            .credentials
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(credentials);
        debug!(%username, "Session credentials installed");
        self.inner
            .state
            .send_replace(SessionState::Active { username });
    }

    /// Drop the credentials on explicit logout.
    pub fn sign_out(&self) {
        self.take_credentials();
        self.inner.state.send_replace(SessionState::Anonymous);
        debug!("Session signed out");
    }

    /// Drop the credentials because the backend rejected them.
    ///
    /// Unconditional: the state becomes `Expired` even if no credentials
    /// were installed.
    pub fn expire(&self) {
        let previous = self.take_credentials();
        warn!(
            username = previous.as_ref().map(Credentials::username),
            "Session expired, credentials cleared"
        );
        self.inner.state.send_replace(SessionState::Expired);
    }

    /// `Authorization` header value, if signed in.
    #[must_use]
    pub fn authorization(&self) -> Option<SecretString> {
        self.inner
            .credentials
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(Credentials::authorization)
    }

    /// Username of the installed credentials, if any.
    #[must_use]
    pub fn username(&self) -> Option<String> {
        self.inner
            .credentials
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(|c| c.username().to_string())
    }

    #[must_use]
    pub fn state(&self) -> SessionState {
        self.inner.state.borrow().clone()
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.inner.state.borrow().is_active()
    }

    /// Subscribe to lifecycle changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.inner.state.subscribe()
    }

    fn take_credentials(&self) -> Option<Credentials> {
        self.inner
            .credentials
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }
}
