//! Upvote Client - talking to the backend and holding view state.
//!
//! # Architecture
//!
//! ```text
//! Shell ── picks ──▶ Login / Register / VoterDashboard / AdminDashboard
//!   ▲                                   │
//!   │ watch<SessionState>               │ IdeaApi / AdminApi / AuthApi
//!   │                                   ▼
//! Session ◀── expire on 401 ─────── ApiClient ── HTTP ──▶ backend
//! ```
//!
//! Components never redirect on their own. A 401 from any call clears the
//! [`Session`] and surfaces as [`ApiError::AuthExpired`]; the [`Shell`]
//! observes the session and switches back to the sign-in view.
//!
//! # Modules
//!
//! - [`api`] - HTTP client and the traits dashboards are written against
//! - [`config`] - Environment configuration
//! - [`dashboard`] - Voter and admin dashboard state
//! - [`error`] - API error taxonomy
//! - [`forms`] - Idea submission, sign-in and registration
//! - [`session`] - Credential store with an observable lifecycle
//! - [`shell`] - Root view selection

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod forms;
pub mod session;
pub mod shell;

pub use api::{AdminApi, ApiClient, AuthApi, IdeaApi};
pub use config::{ClientConfig, ConfigError};
pub use dashboard::{AdminDashboard, LoadPhase, VoterDashboard, VoterState};
pub use error::{ApiError, ErrorBody};
pub use session::{Credentials, Session, SessionState};
pub use shell::{Shell, View};
