//! Command implementations.

pub mod admin;
pub mod auth;
pub mod ideas;
pub mod shell;

use secrecy::SecretString;
use tokio::io::{AsyncBufRead, Lines};
use upvote_client::forms::login;
use upvote_client::{ApiClient, ClientConfig, Session};
use upvote_core::CurrentUser;

use crate::error::CliError;
use crate::render;

/// Client plus the credentials given on the command line or environment.
pub struct Context {
    pub client: ApiClient,
    credentials: Option<(String, SecretString)>,
}

impl Context {
    /// Build a client with a fresh session.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be built.
    pub fn new(
        config: &ClientConfig,
        username: Option<String>,
        password: Option<SecretString>,
    ) -> Result<Self, CliError> {
        let client = ApiClient::new(config, Session::new())?;
        Ok(Self {
            client,
            credentials: username.zip(password),
        })
    }

    /// Credentials for one-shot commands.
    ///
    /// # Errors
    ///
    /// Returns [`CliError::MissingCredentials`] unless both were given.
    pub fn credentials(&self) -> Result<(&str, &SecretString), CliError> {
        self.credentials
            .as_ref()
            .map(|(username, password)| (username.as_str(), password))
            .ok_or(CliError::MissingCredentials)
    }

    /// Sign in with the configured credentials.
    ///
    /// # Errors
    ///
    /// Returns error if credentials are missing or rejected.
    pub async fn sign_in(&self) -> Result<CurrentUser, CliError> {
        let (username, password) = self.credentials()?;
        Ok(login(&self.client, username, password).await?)
    }

    /// Sign in and require the admin role.
    ///
    /// # Errors
    ///
    /// Returns [`CliError::NotAdmin`] for a plain user.
    pub async fn sign_in_admin(&self) -> Result<CurrentUser, CliError> {
        let user = self.sign_in().await?;
        if user.is_admin() {
            Ok(user)
        } else {
            Err(CliError::NotAdmin)
        }
    }
}

/// Whether an answer to a y/N question means yes.
#[must_use]
pub fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

/// Ask a y/N question on the terminal. End of input counts as no.
///
/// # Errors
///
/// Returns error if the terminal cannot be read or written.
pub async fn confirm<R>(lines: &mut Lines<R>, question: &str) -> Result<bool, CliError>
where
    R: AsyncBufRead + Unpin,
{
    render::prompt(&format!("{question} [y/N] "))?;
    Ok(lines.next_line().await?.is_some_and(|answer| is_yes(&answer)))
}
