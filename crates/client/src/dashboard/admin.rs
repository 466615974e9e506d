//! Admin dashboard: the review queue and the approved list.
//!
//! Both lists are fetched together and replaced together; a failure of
//! either leaves the previous lists in place and marks the load failed.
//! Approve and delete reload both lists after the backend confirms, so the
//! view never shows an optimistic update.

use tracing::{info, instrument, warn};
use upvote_core::{Idea, IdeaId, total_votes};

use super::{LOAD_FAILED_MESSAGE, LoadPhase};
use crate::api::AdminApi;
use crate::error::ApiError;

/// Admin dashboard bound to a backend.
#[derive(Debug)]
pub struct AdminDashboard<A> {
    api: A,
    pending: Vec<Idea>,
    approved: Vec<Idea>,
    phase: LoadPhase,
}

impl<A: AdminApi> AdminDashboard<A> {
    /// Create a dashboard in `Loading` without fetching.
    pub const fn new(api: A) -> Self {
        Self {
            api,
            pending: Vec::new(),
            approved: Vec::new(),
            phase: LoadPhase::Loading,
        }
    }

    /// Create a dashboard and fetch both lists.
    pub async fn mount(api: A) -> Self {
        let mut dashboard = Self::new(api);
        // Failure is recorded in the phase
        let _ = dashboard.reload().await;
        dashboard
    }

    #[must_use]
    pub const fn api(&self) -> &A {
        &self.api
    }

    /// Ideas awaiting review, in backend order (newest first).
    #[must_use]
    pub fn pending(&self) -> &[Idea] {
        &self.pending
    }

    /// Approved ideas, in backend order (most votes first).
    #[must_use]
    pub fn approved(&self) -> &[Idea] {
        &self.approved
    }

    #[must_use]
    pub const fn phase(&self) -> &LoadPhase {
        &self.phase
    }

    /// Sum of votes over the approved list.
    #[must_use]
    pub fn total_votes(&self) -> u64 {
        total_votes(&self.approved)
    }

    /// Fetch the pending and approved lists concurrently.
    ///
    /// # Errors
    ///
    /// Returns the first API error; the lists keep their previous contents.
    #[instrument(skip(self))]
    pub async fn reload(&mut self) -> Result<(), ApiError> {
        self.phase = LoadPhase::Loading;

        match tokio::try_join!(self.api.list_pending(), self.api.list_approved()) {
            Ok((pending, approved)) => {
                self.pending = pending;
                self.approved = approved;
                self.phase = LoadPhase::Ready;
                Ok(())
            }
            Err(error) => {
                warn!(%error, "Failed to load review lists");
                self.phase = LoadPhase::Failed(LOAD_FAILED_MESSAGE.to_string());
                Err(error)
            }
        }
    }

    /// Approve a pending idea, then reload.
    ///
    /// # Errors
    ///
    /// Returns the approve error without reloading, or the reload error.
    #[instrument(skip(self))]
    pub async fn approve(&mut self, id: IdeaId) -> Result<Idea, ApiError> {
        let idea = self.api.approve(id).await.inspect_err(|error| {
            warn!(%error, "Approve failed");
        })?;
        info!(title = %idea.title, "Idea approved");
        self.reload().await?;
        Ok(idea)
    }

    /// Delete an idea (pending or approved), then reload.
    ///
    /// Confirmation is the caller's job.
    ///
    /// # Errors
    ///
    /// Returns the delete error without reloading, or the reload error.
    #[instrument(skip(self))]
    pub async fn delete(&mut self, id: IdeaId) -> Result<(), ApiError> {
        self.api.delete_idea(id).await.inspect_err(|error| {
            warn!(%error, "Delete failed");
        })?;
        info!("Idea deleted");
        self.reload().await
    }
}
