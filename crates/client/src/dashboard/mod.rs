//! Dashboard state for the two signed-in views.
//!
//! - [`voter`] - approved ideas plus the one-vote-per-session lock
//! - [`admin`] - pending and approved lists with approve/delete commands

pub mod admin;
pub mod voter;

pub use admin::AdminDashboard;
pub use voter::{
    VoteButton, VoteError, VoteOutcome, VoteRejected, VoteStatus, VoteTicket, VoterDashboard,
    VoterState,
};

/// Loading phase of a dashboard's lists.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LoadPhase {
    /// A fetch is in progress (also the state right after mounting).
    #[default]
    Loading,
    /// Lists reflect the last successful fetch.
    Ready,
    /// The last fetch failed; retrying is a manual action.
    Failed(String),
}

impl LoadPhase {
    #[must_use]
    pub const fn is_ready(&self) -> bool {
        matches!(self, Self::Ready)
    }
}

/// Message shown when a list cannot be fetched.
pub const LOAD_FAILED_MESSAGE: &str = "Could not load the ideas.";
