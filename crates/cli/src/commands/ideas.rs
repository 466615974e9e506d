//! Voter commands.
//!
//! ```bash
//! upvote ideas list
//! upvote ideas submit -t "Bike racks" -d "Covered racks by the entrance"
//! upvote vote 7
//! ```

use upvote_client::VoterDashboard;
use upvote_client::forms::{IdeaForm, SUBMITTED_MESSAGE};
use upvote_core::IdeaId;

use super::Context;
use crate::error::CliError;
use crate::render;

/// Print the approved ideas.
pub async fn list(ctx: &Context) -> Result<(), CliError> {
    ctx.sign_in().await?;
    let mut dashboard = VoterDashboard::new(ctx.client.clone());
    dashboard.refresh().await?;
    render::emit(&render::voter_view(dashboard.state()));
    Ok(())
}

/// Submit a new idea for review.
pub async fn submit(ctx: &Context, title: String, description: String) -> Result<(), CliError> {
    ctx.sign_in().await?;
    let mut form = IdeaForm::new();
    form.set_title(title);
    form.set_description(description);
    let idea = form.submit(&ctx.client).await?;
    render::emit(&format!("#{} {}: {SUBMITTED_MESSAGE}", idea.id, idea.title));
    Ok(())
}

/// Vote for an approved idea.
pub async fn vote(ctx: &Context, id: IdeaId) -> Result<(), CliError> {
    ctx.sign_in().await?;
    let mut dashboard = VoterDashboard::new(ctx.client.clone());
    dashboard.refresh().await?;

    let title = dashboard
        .state()
        .idea(id)
        .map(|idea| idea.title.clone())
        .ok_or(CliError::UnknownIdea(id))?;
    let outcome = dashboard.vote(id, &title).await?;
    render::emit(&render::vote_outcome(&outcome));
    Ok(())
}
