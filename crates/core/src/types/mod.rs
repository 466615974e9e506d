//! Core types for Upvote.
//!
//! This module provides type-safe wrappers for the voting domain.

pub mod email;
pub mod id;
pub mod idea;
pub mod role;

pub use email::{Email, EmailError};
pub use id::{IdeaId, ParseIdError, UserId};
pub use idea::{ApprovalState, DraftError, Idea, IdeaDraft, total_votes};
pub use role::{ADMIN_ROLE, CurrentUser, Role, USER_ROLE};
