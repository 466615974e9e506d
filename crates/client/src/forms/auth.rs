//! Sign-in and registration.
//!
//! Sign-in installs credentials into the session and confirms them with
//! `GET /api/auth/me`. Any failure removes them again, so a failed attempt
//! never leaves a half-signed-in session behind.

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use tracing::{info, instrument, warn};
use upvote_core::{CurrentUser, Email, EmailError};

use crate::api::AuthApi;
use crate::error::ApiError;
use crate::session::Credentials;

/// Shortest accepted password at registration, in characters.
pub const MIN_PASSWORD_CHARS: usize = 6;

#[derive(Debug, Error)]
pub enum LoginError {
    #[error("both the username and the password are required")]
    MissingField,

    #[error("invalid username or password")]
    InvalidCredentials,

    #[error("an error occurred while signing in")]
    Failed(#[source] ApiError),
}

#[derive(Debug, Error)]
pub enum RegisterError {
    #[error("all fields are required")]
    MissingField,

    #[error("the password must be at least {min} characters long")]
    PasswordTooShort { min: usize },

    #[error("invalid email address: {0}")]
    InvalidEmail(#[from] EmailError),

    /// 409 from the backend.
    #[error("this username or email is already taken")]
    Taken,

    /// Any other refusal that came with a message.
    #[error("{0}")]
    Rejected(String),

    /// The account was created but the automatic sign-in failed.
    #[error("registered, but signing in failed: {0}")]
    SignIn(#[source] LoginError),

    #[error("an error occurred during registration")]
    Failed(#[source] ApiError),
}

/// Sign in with a username and password.
///
/// # Errors
///
/// Returns [`LoginError::MissingField`] without contacting the backend when
/// either field is empty; a 401 maps to [`LoginError::InvalidCredentials`].
#[instrument(skip(api, password))]
pub async fn login<A: AuthApi>(
    api: &A,
    username: &str,
    password: &SecretString,
) -> Result<CurrentUser, LoginError> {
    if username.trim().is_empty() || password.expose_secret().is_empty() {
        return Err(LoginError::MissingField);
    }

    let session = api.session();
    session.sign_in(Credentials::basic(username, password));

    match api.current_user().await {
        Ok(user) => {
            info!(role = %user.role, "Signed in");
            Ok(user)
        }
        Err(error) => {
            session.sign_out();
            warn!(%error, "Sign-in failed");
            Err(match error {
                ApiError::AuthExpired => LoginError::InvalidCredentials,
                other => LoginError::Failed(other),
            })
        }
    }
}

/// Create an account, then sign in with it.
///
/// # Errors
///
/// Local checks (required fields, password length, email shape) fail
/// without contacting the backend.
#[instrument(skip(api, email, password))]
pub async fn register<A: AuthApi>(
    api: &A,
    username: &str,
    email: &str,
    password: &SecretString,
) -> Result<CurrentUser, RegisterError> {
    if username.trim().is_empty() || email.trim().is_empty() || password.expose_secret().is_empty()
    {
        return Err(RegisterError::MissingField);
    }
    if password.expose_secret().chars().count() < MIN_PASSWORD_CHARS {
        return Err(RegisterError::PasswordTooShort {
            min: MIN_PASSWORD_CHARS,
        });
    }
    let email = Email::parse(email)?;

    let created = api
        .register(username, &email, password)
        .await
        .map_err(|error| {
            warn!(%error, "Registration failed");
            match error {
                ApiError::Conflict(_) => RegisterError::Taken,
                ApiError::NotFound(ref body) | ApiError::Rejected { ref body, .. } => {
                    match body.joined() {
                        Some(message) => RegisterError::Rejected(message),
                        None => RegisterError::Failed(error),
                    }
                }
                other => RegisterError::Failed(other),
            }
        })?;
    info!(id = %created.id, "Account created");

    login(api, username, password)
        .await
        .map_err(RegisterError::SignIn)
}
