//! Ideas and idea proposals.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::id::IdeaId;

/// Where an idea sits in the approval workflow.
///
/// On the wire this is the backend's `approved` boolean.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ApprovalState {
    /// Submitted, waiting for an administrator.
    #[default]
    Pending,
    /// Visible to voters.
    Approved,
}

impl ApprovalState {
    /// Returns `true` once an administrator approved the idea.
    #[must_use]
    pub const fn is_approved(self) -> bool {
        matches!(self, Self::Approved)
    }
}

mod approved_flag {
    use serde::{Deserialize, Deserializer, Serializer};

    use super::ApprovalState;

    #[allow(clippy::trivially_copy_pass_by_ref)]
    pub fn serialize<S: Serializer>(state: &ApprovalState, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_bool(state.is_approved())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<ApprovalState, D::Error> {
        Ok(if bool::deserialize(d)? {
            ApprovalState::Approved
        } else {
            ApprovalState::Pending
        })
    }
}

/// A proposal as returned by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Idea {
    pub id: IdeaId,
    pub title: String,
    pub description: String,
    /// Number of votes received so far.
    #[serde(default)]
    pub votes: u32,
    pub created_at: DateTime<Utc>,
    #[serde(rename = "approved", with = "approved_flag", default)]
    pub approval: ApprovalState,
}

impl Idea {
    /// Returns `true` if voters can see and vote on this idea.
    #[must_use]
    pub const fn is_approved(&self) -> bool {
        self.approval.is_approved()
    }
}

/// Sum of the vote counts of `ideas`.
///
/// Always computed from the list at hand, never cached.
#[must_use]
pub fn total_votes(ideas: &[Idea]) -> u64 {
    ideas.iter().map(|idea| u64::from(idea.votes)).sum()
}

/// Errors from local validation of an [`IdeaDraft`].
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DraftError {
    /// Title or description is blank.
    #[error("both the title and the description are required")]
    MissingField,
    /// Title exceeds [`IdeaDraft::MAX_TITLE_CHARS`].
    #[error("the title can be at most {max} characters")]
    TitleTooLong {
        /// Maximum allowed length.
        max: usize,
    },
    /// Description exceeds [`IdeaDraft::MAX_DESCRIPTION_CHARS`].
    #[error("the description can be at most {max} characters")]
    DescriptionTooLong {
        /// Maximum allowed length.
        max: usize,
    },
}

/// A new idea that passed local validation and can be submitted.
///
/// Validation here only spares a round trip. The backend applies the same
/// limits and may reject a draft for reasons of its own.
///
/// ```
/// use upvote_core::{DraftError, IdeaDraft};
///
/// assert!(IdeaDraft::new("Bike racks", "More of them by the entrance").is_ok());
/// assert_eq!(IdeaDraft::new(" ", "x"), Err(DraftError::MissingField));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IdeaDraft {
    title: String,
    description: String,
}

impl IdeaDraft {
    /// Longest accepted title, in characters.
    pub const MAX_TITLE_CHARS: usize = 200;
    /// Longest accepted description, in characters.
    pub const MAX_DESCRIPTION_CHARS: usize = 4000;

    /// Validate a title and description.
    ///
    /// Text is kept exactly as typed; blankness is judged after trimming.
    ///
    /// # Errors
    ///
    /// Returns [`DraftError`] when a field is blank or too long.
    pub fn new(
        title: impl Into<String>,
        description: impl Into<String>,
    ) -> Result<Self, DraftError> {
        let title = title.into();
        let description = description.into();

        if title.trim().is_empty() || description.trim().is_empty() {
            return Err(DraftError::MissingField);
        }
        if title.chars().count() > Self::MAX_TITLE_CHARS {
            return Err(DraftError::TitleTooLong {
                max: Self::MAX_TITLE_CHARS,
            });
        }
        if description.chars().count() > Self::MAX_DESCRIPTION_CHARS {
            return Err(DraftError::DescriptionTooLong {
                max: Self::MAX_DESCRIPTION_CHARS,
            });
        }

        Ok(Self { title, description })
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }
}
