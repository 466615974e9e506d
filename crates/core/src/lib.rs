//! Upvote Core - Shared domain types.
//!
//! This crate provides the types used by every Upvote component:
//! - `client` - Session context, HTTP client and dashboard state
//! - `cli` - Terminal front-end
//! - `integration-tests` - In-memory backend and end-to-end tests
//!
//! # Architecture
//!
//! The core crate contains only types and validation - no I/O and no HTTP
//! clients. Anything that talks to the backend lives in `upvote-client`.
//!
//! # Modules
//!
//! - [`types`] - Idea records, local draft validation, roles, emails and IDs

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
