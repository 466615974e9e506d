//! Account commands.
//!
//! ```bash
//! upvote -u dora --password explorer register -e dora@example.com
//! upvote -u dora --password explorer whoami
//! ```

use upvote_client::forms::register as register_account;

use super::Context;
use crate::error::CliError;
use crate::render;

/// Create an account and sign in with it.
pub async fn register(ctx: &Context, email: &str) -> Result<(), CliError> {
    let (username, password) = ctx.credentials()?;
    let user = register_account(&ctx.client, username, email, password).await?;
    render::emit(&format!("Account created. {}", render::user_line(&user)));
    Ok(())
}

/// Show who the configured credentials belong to.
pub async fn whoami(ctx: &Context) -> Result<(), CliError> {
    let user = ctx.sign_in().await?;
    render::emit(&render::user_line(&user));
    Ok(())
}
