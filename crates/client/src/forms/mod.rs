//! Input flows: idea submission, sign-in and registration.
//!
//! Each flow validates locally first; nothing is sent when validation fails.

pub mod auth;
pub mod idea;

pub use auth::{LoginError, MIN_PASSWORD_CHARS, RegisterError, login, register};
pub use idea::{FormStatus, IdeaForm, SUBMITTED_MESSAGE, SubmitError, SubmitListener};
