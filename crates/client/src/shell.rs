//! Root shell: picks the view from the session and the signed-in role.
//!
//! The shell is the single subscriber of the session's state channel. When
//! any call anywhere receives a 401, the API client expires the session and
//! the next [`Shell::view`] falls back to the sign-in view with an expiry
//! notice pending.

use tokio::sync::watch;
use tracing::info;
use upvote_core::CurrentUser;

use crate::session::{Session, SessionState};

/// The view to render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum View {
    Login,
    Register,
    Voter(CurrentUser),
    Admin(CurrentUser),
}

impl View {
    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        matches!(self, Self::Voter(_) | Self::Admin(_))
    }
}

#[derive(Debug)]
pub struct Shell {
    session: Session,
    events: watch::Receiver<SessionState>,
    user: Option<CurrentUser>,
    show_register: bool,
    expiry_notice: bool,
}

impl Shell {
    #[must_use]
    pub fn new(session: Session) -> Self {
        let events = session.subscribe();
        Self {
            session,
            events,
            user: None,
            show_register: false,
            expiry_notice: false,
        }
    }

    #[must_use]
    pub const fn session(&self) -> &Session {
        &self.session
    }

    /// The signed-in user, if the session is still active.
    #[must_use]
    pub fn user(&mut self) -> Option<&CurrentUser> {
        self.sync();
        self.user.as_ref()
    }

    /// Record the user returned by a successful sign-in or registration.
    pub fn signed_in(&mut self, user: CurrentUser) {
        self.sync();
        self.show_register = false;
        self.expiry_notice = false;
        self.user = Some(user);
    }

    /// Explicit logout.
    pub fn logout(&mut self) {
        self.session.sign_out();
        self.sync();
        self.user = None;
        self.show_register = false;
    }

    /// Switch between the sign-in and registration views.
    pub fn show_register(&mut self, show: bool) {
        self.show_register = show;
    }

    /// The view for the current session state.
    pub fn view(&mut self) -> View {
        self.sync();
        match &self.user {
            Some(user) if self.session.is_active() => {
                if user.is_admin() {
                    View::Admin(user.clone())
                } else {
                    View::Voter(user.clone())
                }
            }
            _ if self.show_register => View::Register,
            _ => View::Login,
        }
    }

    /// Returns `true` once after the session expired.
    pub fn take_expiry_notice(&mut self) -> bool {
        self.sync();
        std::mem::take(&mut self.expiry_notice)
    }

    /// Wait until the session state changes, then apply it.
    ///
    /// Returns `false` if the session can no longer change.
    pub async fn changed(&mut self) -> bool {
        if self.events.changed().await.is_err() {
            return false;
        }
        self.apply_latest();
        true
    }

    fn sync(&mut self) {
        if self.events.has_changed().unwrap_or(false) {
            self.apply_latest();
        }
    }

    fn apply_latest(&mut self) {
        let state = self.events.borrow_and_update().clone();
        match state {
            SessionState::Active { .. } => {}
            SessionState::Anonymous => self.user = None,
            SessionState::Expired => {
                if let Some(user) = self.user.take() {
                    info!(username = %user.username, "Session expired, returning to sign-in");
                }
                self.show_register = false;
                self.expiry_notice = true;
            }
        }
    }
}
