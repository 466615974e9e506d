//! Admin dashboard and idea submission against the in-memory backend.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use axum::http::{Method, StatusCode};
use secrecy::SecretString;
use serde_json::json;
use upvote_client::forms::{FormStatus, IdeaForm, SubmitError, login};
use upvote_client::{AdminApi, AdminDashboard, ApiClient, ApiError, AuthApi, LoadPhase};
use upvote_core::{DraftError, IdeaId};
use upvote_integration_tests::FakeBackend;

async fn backend() -> FakeBackend {
    let backend = FakeBackend::start().await.unwrap();
    backend.add_user("root", "hunter22", true);
    backend.add_user("alice", "wonderland", false);
    backend
}

async fn as_user(backend: &FakeBackend, username: &str, password: &str) -> ApiClient {
    let client = backend.client();
    login(&client, username, &SecretString::from(password.to_string()))
        .await
        .unwrap();
    client
}

#[tokio::test]
async fn test_overview_lists_both_and_totals_votes() {
    let backend = backend().await;
    backend.seed_idea("Bike racks", 4, true);
    backend.seed_idea("Standing desks", 3, true);
    backend.seed_idea("Rooftop garden", 0, false);
    backend.seed_idea("Nap pods", 0, false);

    let dashboard = AdminDashboard::mount(as_user(&backend, "root", "hunter22").await).await;

    assert_eq!(dashboard.phase(), &LoadPhase::Ready);
    // Newest pending first
    let pending: Vec<&str> = dashboard.pending().iter().map(|i| i.title.as_str()).collect();
    assert_eq!(pending, ["Nap pods", "Rooftop garden"]);
    assert_eq!(dashboard.approved().len(), 2);
    assert_eq!(dashboard.total_votes(), 7);
}

#[tokio::test]
async fn test_approve_moves_idea_on_reload() {
    let backend = backend().await;
    let pending = backend.seed_idea("Rooftop garden", 0, false);
    let mut dashboard = AdminDashboard::mount(as_user(&backend, "root", "hunter22").await).await;
    assert_eq!(dashboard.pending().len(), 1);

    dashboard.approve(pending).await.unwrap();

    assert!(dashboard.pending().is_empty());
    assert!(dashboard.approved().iter().any(|i| i.id == pending));
    // Approve, then both lists again
    assert_eq!(backend.count(&Method::GET, "/api/ideas/pending"), 2);
    assert_eq!(backend.count(&Method::GET, "/api/ideas"), 2);
}

#[tokio::test]
async fn test_delete_then_reload() {
    let backend = backend().await;
    let keep = backend.seed_idea("Bike racks", 4, true);
    let gone = backend.seed_idea("Standing desks", 3, true);
    let mut dashboard = AdminDashboard::mount(as_user(&backend, "root", "hunter22").await).await;

    dashboard.delete(gone).await.unwrap();

    assert_eq!(dashboard.approved().len(), 1);
    assert_eq!(dashboard.approved()[0].id, keep);
    assert_eq!(dashboard.total_votes(), 4);
    assert!(backend.idea(gone).is_none());
}

#[tokio::test]
async fn test_approving_missing_idea_reports_not_found() {
    let backend = backend().await;
    let mut dashboard = AdminDashboard::mount(as_user(&backend, "root", "hunter22").await).await;

    let err = dashboard.approve(IdeaId::new(404)).await.unwrap_err();

    assert!(matches!(err, ApiError::NotFound(ref body) if body.message() == Some("Idea not found")));
    assert_eq!(dashboard.phase(), &LoadPhase::Ready);
}

#[tokio::test]
async fn test_plain_user_is_forbidden_but_stays_signed_in() {
    let backend = backend().await;
    let client = as_user(&backend, "alice", "wonderland").await;

    let err = client.list_pending().await.unwrap_err();

    assert!(matches!(
        err,
        ApiError::Rejected { status, .. } if status == StatusCode::FORBIDDEN
    ));
    assert!(client.session().is_active());
}

#[tokio::test]
async fn test_submitted_idea_awaits_review() {
    let backend = backend().await;
    let client = as_user(&backend, "alice", "wonderland").await;
    let mut form = IdeaForm::new();
    form.set_title("Bike racks");
    form.set_description("Covered racks by the entrance");

    let idea = form.submit(&client).await.unwrap();

    assert!(!idea.is_approved());
    assert_eq!(form.status(), &FormStatus::Succeeded);

    let admin = AdminDashboard::mount(as_user(&backend, "root", "hunter22").await).await;
    assert_eq!(admin.pending().len(), 1);
    assert_eq!(admin.pending()[0].id, idea.id);
    assert!(admin.approved().is_empty());
}

#[tokio::test]
async fn test_length_limits_checked_before_sending() {
    let backend = backend().await;
    let client = as_user(&backend, "alice", "wonderland").await;
    let mut form = IdeaForm::new();

    form.set_title("t".repeat(201));
    form.set_description("fine");
    assert!(matches!(
        form.submit(&client).await.unwrap_err(),
        SubmitError::Invalid(DraftError::TitleTooLong { max: 200 })
    ));

    form.set_title("fine");
    form.set_description("d".repeat(4001));
    assert!(matches!(
        form.submit(&client).await.unwrap_err(),
        SubmitError::Invalid(DraftError::DescriptionTooLong { max: 4000 })
    ));
    assert_eq!(backend.count(&Method::POST, "/api/ideas"), 0);

    form.set_title("t".repeat(200));
    form.set_description("d".repeat(4000));
    form.submit(&client).await.unwrap();
    assert_eq!(backend.count(&Method::POST, "/api/ideas"), 1);
}

#[tokio::test]
async fn test_backend_field_errors_are_joined() {
    let backend = backend().await;
    let client = as_user(&backend, "alice", "wonderland").await;
    backend.reject_next_submission(json!({
        "description": "must not be blank",
        "title": "must be unique",
    }));
    let mut form = IdeaForm::new();
    form.set_title("Bike racks");
    form.set_description("Covered racks");

    let err = form.submit(&client).await.unwrap_err();

    assert_eq!(err.to_string(), "must not be blank, must be unique");
    assert_eq!(form.title(), "Bike racks");
}
