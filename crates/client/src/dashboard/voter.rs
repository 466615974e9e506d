//! Voter dashboard: approved ideas and the session vote lock.
//!
//! # States
//!
//! ```text
//! Loading ──ok──▶ Ready ◀──retry── Failed
//!    ▲              │
//!    └── refresh ───┘
//!
//! within Ready:  NotVoted ──begin──▶ Voting(id) ──ok / 409──▶ Voted(title)
//!                    ▲                   │
//!                    └── 404 / other ────┘
//! ```
//!
//! The lock is a best-effort mirror of the backend's one-vote rule: it only
//! saves a round trip and gives immediate feedback. Once set it stays set for
//! the lifetime of the [`VoterState`]; refreshing the list does not reset it.
//!
//! [`VoterState`] holds the transitions without doing I/O, so the
//! one-vote-in-flight guard can be driven directly. [`VoterDashboard`] pairs
//! it with an [`IdeaApi`] and runs the full round trip.

use thiserror::Error;
use tracing::{debug, info, warn};
use upvote_core::{Idea, IdeaId};

use super::{LOAD_FAILED_MESSAGE, LoadPhase};
use crate::api::IdeaApi;
use crate::error::{ApiError, ErrorBody};

/// Prose prefix the backend puts in front of the voted title in its 409
/// message. Only consulted when the conflict carries no `title` field.
pub const LEGACY_CONFLICT_PREFIX: &str = "Már szavaztál erre az ötletre: ";

/// Shown for a conflict without any message.
pub const ALREADY_VOTED_MESSAGE: &str = "You have already voted in this session.";

/// Where the session stands with respect to its single vote.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum VoteStatus {
    /// No vote cast yet.
    #[default]
    NotVoted,
    /// A vote request is in flight.
    Voting {
        /// Target of the in-flight vote.
        idea_id: IdeaId,
        /// Title as shown when the vote was cast.
        title: String,
    },
    /// Locked. `title` is `None` when the backend reported a prior vote
    /// without saying which idea it was for.
    Voted {
        /// Title of the idea voted for, if known.
        title: Option<String>,
    },
}

/// Proof that [`VoterState::begin_vote`] accepted a vote; hand it back to
/// [`VoterState::finish_vote`] with the backend's answer.
#[derive(Debug)]
#[must_use = "a started vote must be finished"]
pub struct VoteTicket {
    idea_id: IdeaId,
    title: String,
}

impl VoteTicket {
    #[must_use]
    pub const fn idea_id(&self) -> IdeaId {
        self.idea_id
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }
}

/// Rendering state of an idea's vote button.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteButton {
    Vote,
    Voting,
    AlreadyVoted,
}

impl VoteButton {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Vote => "Vote",
            Self::Voting => "Voting...",
            Self::AlreadyVoted => "Already voted",
        }
    }

    #[must_use]
    pub const fn is_enabled(self) -> bool {
        matches!(self, Self::Vote)
    }
}

fn voted_suffix(title: Option<&str>) -> String {
    title.map_or_else(String::new, |t| format!(" (for \"{t}\")"))
}

/// A vote attempt refused locally, without contacting the backend.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum VoteRejected {
    /// The lock is set.
    #[error("you have already voted{}", voted_suffix(.title.as_deref()))]
    AlreadyVoted {
        /// Title recorded with the lock.
        title: Option<String>,
    },
    /// Another vote has not completed yet.
    #[error("a vote for idea {idea_id} is still in progress")]
    InFlight {
        /// Target of the pending vote.
        idea_id: IdeaId,
    },
    /// The idea list is loading or failed to load.
    #[error("the idea list is not loaded")]
    NotReady,
}

/// A vote attempt that did not produce an outcome.
#[derive(Debug, Error)]
pub enum VoteError {
    /// Refused locally.
    #[error(transparent)]
    Rejected(#[from] VoteRejected),
    /// The idea vanished; the lock stays open.
    #[error("the idea could not be found")]
    NotFound,
    /// The session was cleared; the shell returns to sign-in.
    #[error("your session has expired, please sign in again")]
    AuthExpired,
    /// Anything else.
    #[error("an error occurred while voting")]
    Failed(#[source] ApiError),
}

/// Result of a vote that reached the backend and locked the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VoteOutcome {
    /// The vote counted; `idea` is the updated record.
    Recorded {
        /// The idea with its incremented count.
        idea: Idea,
    },
    /// The backend says this session already voted.
    AlreadyVoted {
        /// Title of the earlier vote, if it could be determined.
        title: Option<String>,
        /// Message to show the user.
        message: String,
    },
}

/// Extract the voted idea's title from a conflict body.
///
/// A structured `title` field wins. Otherwise the message is searched for
/// [`LEGACY_CONFLICT_PREFIX`] and the rest of that line is taken. This
/// fallback depends on the backend's wording and breaks if it changes.
#[must_use]
pub fn conflict_title(body: &ErrorBody) -> Option<String> {
    if let Some(title) = body.field("title").map(str::trim).filter(|t| !t.is_empty()) {
        return Some(title.to_string());
    }

    let message = body.message()?;
    let start = message.find(LEGACY_CONFLICT_PREFIX)? + LEGACY_CONFLICT_PREFIX.len();
    let rest = message.get(start..)?;
    let title = rest.lines().next().unwrap_or_default();
    (!title.is_empty()).then(|| title.to_string())
}

/// Voter dashboard state without I/O.
#[derive(Debug, Clone, Default)]
pub struct VoterState {
    ideas: Vec<Idea>,
    phase: LoadPhase,
    status: VoteStatus,
}

impl VoterState {
    /// Fresh state as mounted: loading, not voted.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn ideas(&self) -> &[Idea] {
        &self.ideas
    }

    #[must_use]
    pub fn idea(&self, id: IdeaId) -> Option<&Idea> {
        self.ideas.iter().find(|idea| idea.id == id)
    }

    #[must_use]
    pub const fn phase(&self) -> &LoadPhase {
        &self.phase
    }

    #[must_use]
    pub const fn status(&self) -> &VoteStatus {
        &self.status
    }

    #[must_use]
    pub const fn has_voted(&self) -> bool {
        matches!(self.status, VoteStatus::Voted { .. })
    }

    /// Title recorded with the lock, if the lock is set and the title known.
    #[must_use]
    pub fn voted_title(&self) -> Option<&str> {
        match &self.status {
            VoteStatus::Voted { title } => title.as_deref(),
            _ => None,
        }
    }

    #[must_use]
    pub const fn voting_for(&self) -> Option<IdeaId> {
        match &self.status {
            VoteStatus::Voting { idea_id, .. } => Some(*idea_id),
            _ => None,
        }
    }

    /// How the vote button of idea `id` should render.
    #[must_use]
    pub fn button(&self, id: IdeaId) -> VoteButton {
        match &self.status {
            VoteStatus::Voted { .. } => VoteButton::AlreadyVoted,
            VoteStatus::Voting { idea_id, .. } if *idea_id == id => VoteButton::Voting,
            _ => VoteButton::Vote,
        }
    }

    /// Enter `Loading`. The vote lock is untouched.
    pub fn begin_load(&mut self) {
        self.phase = LoadPhase::Loading;
    }

    /// Leave `Loading` with the fetched list or a failure message.
    pub fn finish_load(&mut self, result: Result<Vec<Idea>, String>) {
        match result {
            Ok(ideas) => {
                self.ideas = ideas;
                self.phase = LoadPhase::Ready;
            }
            Err(message) => self.phase = LoadPhase::Failed(message),
        }
    }

    /// Try to start a vote.
    ///
    /// # Errors
    ///
    /// Refuses when the lock is set, when another vote is in flight, or
    /// when the list is not ready. Nothing should be sent in that case.
    pub fn begin_vote(&mut self, idea_id: IdeaId, title: &str) -> Result<VoteTicket, VoteRejected> {
        match &self.status {
            VoteStatus::Voted { title } => {
                return Err(VoteRejected::AlreadyVoted {
                    title: title.clone(),
                });
            }
            VoteStatus::Voting { idea_id, .. } => {
                return Err(VoteRejected::InFlight { idea_id: *idea_id });
            }
            VoteStatus::NotVoted => {}
        }

        if !self.phase.is_ready() {
            return Err(VoteRejected::NotReady);
        }

        self.status = VoteStatus::Voting {
            idea_id,
            title: title.to_string(),
        };
        Ok(VoteTicket {
            idea_id,
            title: title.to_string(),
        })
    }

    /// Apply the backend's answer to a started vote.
    ///
    /// # Errors
    ///
    /// 404, 401 and any other failure return the state to `NotVoted` and
    /// are reported as [`VoteError`]. A 409 is not an error: it locks the
    /// session and yields [`VoteOutcome::AlreadyVoted`].
    pub fn finish_vote(
        &mut self,
        ticket: VoteTicket,
        result: Result<Idea, ApiError>,
    ) -> Result<VoteOutcome, VoteError> {
        match result {
            Ok(idea) => {
                if let Some(slot) = self.ideas.iter_mut().find(|i| i.id == ticket.idea_id) {
                    *slot = idea.clone();
                }
                self.status = VoteStatus::Voted {
                    title: Some(ticket.title),
                };
                Ok(VoteOutcome::Recorded { idea })
            }
            Err(ApiError::Conflict(body)) => {
                let title = conflict_title(&body).or_else(|| {
                    let id = body.field("ideaId")?.parse::<IdeaId>().ok()?;
                    self.idea(id).map(|idea| idea.title.clone())
                });
                let message = body
                    .message()
                    .map_or_else(|| ALREADY_VOTED_MESSAGE.to_string(), str::to_string);
                self.status = VoteStatus::Voted {
                    title: title.clone(),
                };
                Ok(VoteOutcome::AlreadyVoted { title, message })
            }
            Err(error) => {
                self.status = VoteStatus::NotVoted;
                Err(match error {
                    ApiError::NotFound(_) => VoteError::NotFound,
                    ApiError::AuthExpired => VoteError::AuthExpired,
                    other => VoteError::Failed(other),
                })
            }
        }
    }
}

/// Voter dashboard bound to a backend.
#[derive(Debug)]
pub struct VoterDashboard<A> {
    api: A,
    state: VoterState,
}

impl<A: IdeaApi> VoterDashboard<A> {
    /// Create a dashboard in `Loading` without fetching.
    pub fn new(api: A) -> Self {
        Self {
            api,
            state: VoterState::new(),
        }
    }

    /// Create a dashboard and fetch the approved ideas.
    ///
    /// A failed fetch leaves the dashboard in `Failed`; an expired session
    /// has already been cleared and is picked up by the shell.
    pub async fn mount(api: A) -> Self {
        let mut dashboard = Self::new(api);
        if let Err(error) = dashboard.refresh().await {
            debug!(%error, "Initial idea load failed");
        }
        dashboard
    }

    #[must_use]
    pub const fn state(&self) -> &VoterState {
        &self.state
    }

    #[must_use]
    pub const fn api(&self) -> &A {
        &self.api
    }

    /// Re-fetch the approved ideas, keeping the vote lock.
    ///
    /// # Errors
    ///
    /// Returns the API error after recording the failure in the state.
    pub async fn refresh(&mut self) -> Result<(), ApiError> {
        self.state.begin_load();
        match self.api.list_approved().await {
            Ok(ideas) => {
                self.state.finish_load(Ok(ideas));
                Ok(())
            }
            Err(error) => {
                warn!(%error, "Failed to load approved ideas");
                self.state.finish_load(Err(LOAD_FAILED_MESSAGE.to_string()));
                Err(error)
            }
        }
    }

    /// Vote for `idea_id`, shown to the user as `title`.
    ///
    /// # Errors
    ///
    /// See [`VoterState::begin_vote`] and [`VoterState::finish_vote`].
    pub async fn vote(&mut self, idea_id: IdeaId, title: &str) -> Result<VoteOutcome, VoteError> {
        let ticket = self.state.begin_vote(idea_id, title).inspect_err(|rejected| {
            debug!(%idea_id, %rejected, "Vote refused locally");
        })?;

        let result = self.api.vote(idea_id).await;
        let outcome = self.state.finish_vote(ticket, result);

        match &outcome {
            Ok(VoteOutcome::Recorded { idea }) => {
                info!(%idea_id, votes = idea.votes, "Vote recorded");
            }
            Ok(VoteOutcome::AlreadyVoted { title, .. }) => {
                info!(%idea_id, voted_for = ?title, "Backend reports an earlier vote");
            }
            Err(error) => warn!(%idea_id, %error, "Vote failed"),
        }

        outcome
    }
}
