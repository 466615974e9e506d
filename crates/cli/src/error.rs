//! Errors surfaced by CLI commands.

use thiserror::Error;
use upvote_client::dashboard::VoteError;
use upvote_client::forms::{LoginError, RegisterError, SubmitError};
use upvote_client::{ApiError, ConfigError};
use upvote_core::IdeaId;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Missing credentials: pass --username/--password or set UPVOTE_USERNAME/UPVOTE_PASSWORD")]
    MissingCredentials,

    #[error("Admin role required")]
    NotAdmin,

    #[error("Idea {0} not found")]
    UnknownIdea(IdeaId),

    #[error(transparent)]
    Login(#[from] LoginError),

    #[error(transparent)]
    Register(#[from] RegisterError),

    #[error(transparent)]
    Submit(#[from] SubmitError),

    #[error(transparent)]
    Vote(#[from] VoteError),

    #[error("Backend error: {0}")]
    Api(#[from] ApiError),

    #[error("Terminal I/O error: {0}")]
    Io(#[from] std::io::Error),
}
