//! Review commands (admin role required).
//!
//! # Usage
//!
//! ```bash
//! # Pending and approved lists with total votes
//! upvote admin overview
//!
//! # Approve a pending idea
//! upvote admin approve 12
//!
//! # Delete an idea (asks for confirmation unless --yes)
//! upvote admin delete 12 --yes
//! ```

use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;
use upvote_client::{AdminApi, AdminDashboard};
use upvote_core::{Idea, IdeaId};

use super::{Context, confirm};
use crate::error::CliError;
use crate::render;

/// Render an admin dashboard.
pub fn view<A: AdminApi>(dashboard: &AdminDashboard<A>) -> String {
    render::admin_view(
        dashboard.pending(),
        dashboard.approved(),
        dashboard.phase(),
        dashboard.total_votes(),
    )
}

/// Find an idea in either list.
pub fn find<A: AdminApi>(dashboard: &AdminDashboard<A>, id: IdeaId) -> Option<&Idea> {
    dashboard
        .pending()
        .iter()
        .chain(dashboard.approved())
        .find(|idea| idea.id == id)
}

/// Print the review queue and the approved list.
pub async fn overview(ctx: &Context) -> Result<(), CliError> {
    ctx.sign_in_admin().await?;
    let mut dashboard = AdminDashboard::new(ctx.client.clone());
    dashboard.reload().await?;
    render::emit(&view(&dashboard));
    Ok(())
}

/// Approve a pending idea.
pub async fn approve(ctx: &Context, id: IdeaId) -> Result<(), CliError> {
    ctx.sign_in_admin().await?;
    let mut dashboard = AdminDashboard::new(ctx.client.clone());
    let idea = dashboard.approve(id).await?;
    render::emit(&format!("Approved \"{}\".\n", idea.title));
    render::emit(&view(&dashboard));
    Ok(())
}

/// Delete an idea after confirmation.
pub async fn delete(ctx: &Context, id: IdeaId, yes: bool) -> Result<(), CliError> {
    ctx.sign_in_admin().await?;
    let mut dashboard = AdminDashboard::new(ctx.client.clone());
    dashboard.reload().await?;

    let title = find(&dashboard, id)
        .map(|idea| idea.title.clone())
        .ok_or(CliError::UnknownIdea(id))?;

    if !yes {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        if !confirm(&mut lines, &format!("Delete \"{title}\"?")).await? {
            info!(%id, "Delete cancelled");
            render::emit("Cancelled.");
            return Ok(());
        }
    }

    dashboard.delete(id).await?;
    render::emit(&format!("Deleted \"{title}\".\n"));
    render::emit(&view(&dashboard));
    Ok(())
}
