//! Idea submission form.

use thiserror::Error;
use tracing::{info, warn};
use upvote_core::{DraftError, Idea, IdeaDraft};

use crate::api::IdeaApi;
use crate::error::ApiError;

/// Confirmation shown after a successful submission.
pub const SUBMITTED_MESSAGE: &str = "Idea submitted. It will appear once an admin approves it.";

/// Callback run with the created idea after every successful submission.
pub type SubmitListener = Box<dyn FnMut(&Idea) + Send>;

/// Errors from submitting an idea.
#[derive(Debug, Error)]
pub enum SubmitError {
    /// Local validation failed; nothing was sent.
    #[error(transparent)]
    Invalid(#[from] DraftError),

    /// The backend refused the idea with a message (field errors joined).
    #[error("{0}")]
    Rejected(String),

    #[error("your session has expired, please sign in again")]
    AuthExpired,

    #[error("an error occurred while submitting the idea")]
    Failed(#[source] ApiError),
}

impl From<ApiError> for SubmitError {
    fn from(error: ApiError) -> Self {
        match error {
            ApiError::AuthExpired => Self::AuthExpired,
            ApiError::Conflict(ref body)
            | ApiError::NotFound(ref body)
            | ApiError::Rejected { ref body, .. } => match body.joined() {
                Some(message) => Self::Rejected(message),
                None => Self::Failed(error),
            },
            other => Self::Failed(other),
        }
    }
}

/// What the form shows under its fields.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum FormStatus {
    #[default]
    Idle,
    Submitting,
    Succeeded,
    Failed(String),
}

/// Title and description being edited, plus submission state.
#[derive(Default)]
pub struct IdeaForm {
    title: String,
    description: String,
    status: FormStatus,
    listeners: Vec<SubmitListener>,
}

impl std::fmt::Debug for IdeaForm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdeaForm")
            .field("title", &self.title)
            .field("description", &self.description)
            .field("status", &self.status)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl IdeaForm {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
    }

    pub fn set_description(&mut self, description: impl Into<String>) {
        self.description = description.into();
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    #[must_use]
    pub const fn status(&self) -> &FormStatus {
        &self.status
    }

    /// Register a callback for successful submissions.
    pub fn on_submitted(&mut self, listener: impl FnMut(&Idea) + Send + 'static) {
        self.listeners.push(Box::new(listener));
    }

    /// Validate and send the current fields.
    ///
    /// On success the fields are cleared and every listener is called with
    /// the created idea. On failure the fields are kept.
    ///
    /// # Errors
    ///
    /// Returns [`SubmitError::Invalid`] without contacting the backend when
    /// a field is empty or too long.
    pub async fn submit<A: IdeaApi>(&mut self, api: &A) -> Result<Idea, SubmitError> {
        let draft = match IdeaDraft::new(self.title.as_str(), self.description.as_str()) {
            Ok(draft) => draft,
            Err(error) => return Err(self.fail(error.into())),
        };

        self.status = FormStatus::Submitting;
        match api.submit_idea(&draft).await {
            Ok(idea) => {
                info!(id = %idea.id, "Idea submitted for review");
                self.title.clear();
                self.description.clear();
                self.status = FormStatus::Succeeded;
                for listener in &mut self.listeners {
                    listener(&idea);
                }
                Ok(idea)
            }
            Err(error) => {
                warn!(%error, "Idea submission failed");
                Err(self.fail(error.into()))
            }
        }
    }

    fn fail(&mut self, error: SubmitError) -> SubmitError {
        self.status = FormStatus::Failed(error.to_string());
        error
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::api::fake::FakeApi;
    use crate::error::ErrorBody;

    #[tokio::test]
    async fn test_submit_clears_form_and_notifies() {
        let api = FakeApi::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut form = IdeaForm::new();
        let sink = Arc::clone(&seen);
        form.on_submitted(move |idea| sink.lock().unwrap().push(idea.title.clone()));

        form.set_title("Bike racks");
        form.set_description("Covered racks by the entrance");
        let idea = form.submit(&api).await.unwrap();

        assert!(!idea.is_approved());
        assert_eq!(form.title(), "");
        assert_eq!(form.description(), "");
        assert_eq!(form.status(), &FormStatus::Succeeded);
        assert_eq!(*seen.lock().unwrap(), vec!["Bike racks".to_string()]);
        assert_eq!(api.pending_ideas().len(), 1);
    }

    #[tokio::test]
    async fn test_boundary_lengths_are_sent() {
        let api = FakeApi::new();
        let mut form = IdeaForm::new();
        form.set_title("t".repeat(200));
        form.set_description("d".repeat(4000));

        assert!(form.submit(&api).await.is_ok());
        assert_eq!(api.submit_calls(), 1);
    }

    #[tokio::test]
    async fn test_overlong_fields_never_reach_network() {
        let api = FakeApi::new();
        let mut form = IdeaForm::new();

        form.set_title("t".repeat(201));
        form.set_description("ok");
        let err = form.submit(&api).await.unwrap_err();
        assert!(matches!(err, SubmitError::Invalid(DraftError::TitleTooLong { .. })));

        form.set_title("ok");
        form.set_description("d".repeat(4001));
        let err = form.submit(&api).await.unwrap_err();
        assert!(matches!(
            err,
            SubmitError::Invalid(DraftError::DescriptionTooLong { .. })
        ));

        assert_eq!(api.submit_calls(), 0);
        assert!(matches!(form.status(), FormStatus::Failed(_)));
    }

    #[tokio::test]
    async fn test_empty_fields_rejected_locally() {
        let api = FakeApi::new();
        let mut form = IdeaForm::new();
        form.set_title("   ");
        form.set_description("something");

        let err = form.submit(&api).await.unwrap_err();
        assert!(matches!(err, SubmitError::Invalid(DraftError::MissingField)));
        assert_eq!(api.submit_calls(), 0);
    }

    #[tokio::test]
    async fn test_field_errors_are_joined() {
        let api = FakeApi::new();
        api.fail_next_submit(ApiError::Rejected {
            status: reqwest::StatusCode::BAD_REQUEST,
            body: ErrorBody::parse(
                r#"{"description": "must not be blank", "title": "must be unique"}"#,
            ),
        });
        let mut form = IdeaForm::new();
        form.set_title("Bike racks");
        form.set_description("Covered racks");

        let err = form.submit(&api).await.unwrap_err();

        assert_eq!(err.to_string(), "must not be blank, must be unique");
        assert_eq!(
            form.status(),
            &FormStatus::Failed("must not be blank, must be unique".to_string())
        );
        // Fields are kept for another attempt
        assert_eq!(form.title(), "Bike racks");
    }

    #[tokio::test]
    async fn test_text_and_empty_error_bodies() {
        let api = FakeApi::new();
        api.fail_next_submit(ApiError::Rejected {
            status: reqwest::StatusCode::BAD_REQUEST,
            body: ErrorBody::Text("Title is offensive".to_string()),
        });
        api.fail_next_submit(ApiError::Rejected {
            status: reqwest::StatusCode::INTERNAL_SERVER_ERROR,
            body: ErrorBody::Empty,
        });
        let mut form = IdeaForm::new();
        form.set_title("Bike racks");
        form.set_description("Covered racks");

        let err = form.submit(&api).await.unwrap_err();
        assert!(matches!(err, SubmitError::Rejected(ref m) if m == "Title is offensive"));

        let err = form.submit(&api).await.unwrap_err();
        assert!(matches!(err, SubmitError::Failed(_)));
        assert_eq!(
            err.to_string(),
            "an error occurred while submitting the idea"
        );
    }

    #[tokio::test]
    async fn test_auth_expiry_is_distinguished() {
        let api = FakeApi::new();
        api.fail_next_submit(ApiError::AuthExpired);
        let mut form = IdeaForm::new();
        form.set_title("Bike racks");
        form.set_description("Covered racks");

        assert!(matches!(
            form.submit(&api).await.unwrap_err(),
            SubmitError::AuthExpired
        ));
    }
}
