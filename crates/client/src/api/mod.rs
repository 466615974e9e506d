//! HTTP client for the Upvote backend.
//!
//! [`ApiClient`] wraps every call listed below, attaches the session's
//! credential to each request and turns a 401 from any call into
//! [`ApiError::AuthExpired`] after clearing the session.
//!
//! | Call | Method + Path |
//! |---|---|
//! | Register | `POST /api/auth/register` |
//! | Current user | `GET /api/auth/me` |
//! | List approved ideas | `GET /api/ideas` |
//! | Submit idea | `POST /api/ideas` |
//! | List pending ideas | `GET /api/ideas/pending` |
//! | Approve idea | `POST /api/ideas/{id}/approve` |
//! | Delete idea | `DELETE /api/ideas/{id}` |
//! | Vote | `POST /api/ideas/{id}/vote` |
//!
//! Dashboards and forms are written against the [`IdeaApi`], [`AdminApi`]
//! and [`AuthApi`] traits so they can run against an in-memory fake.

#[cfg(test)]
pub(crate) mod fake;
mod types;

pub use types::{MeResponse, RegisterRequest, RegisteredUser};

use std::future::Future;
use std::sync::Arc;

use reqwest::header::{AUTHORIZATION, HeaderValue};
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use tracing::{debug, instrument, warn};
use upvote_core::{CurrentUser, Email, Idea, IdeaDraft, IdeaId};
use url::Url;

use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::session::Session;

/// Idea calls available to every signed-in user.
pub trait IdeaApi: Send + Sync {
    /// `GET /api/ideas`: approved ideas in backend order.
    fn list_approved(&self) -> impl Future<Output = Result<Vec<Idea>, ApiError>> + Send;

    /// `POST /api/ideas`: returns the created (pending) idea.
    fn submit_idea(
        &self,
        draft: &IdeaDraft,
    ) -> impl Future<Output = Result<Idea, ApiError>> + Send;

    /// `POST /api/ideas/{id}/vote`: returns the idea with its new count.
    fn vote(&self, id: IdeaId) -> impl Future<Output = Result<Idea, ApiError>> + Send;
}

/// Review calls that require the admin role.
pub trait AdminApi: IdeaApi {
    /// `GET /api/ideas/pending`
    fn list_pending(&self) -> impl Future<Output = Result<Vec<Idea>, ApiError>> + Send;

    /// `POST /api/ideas/{id}/approve`
    fn approve(&self, id: IdeaId) -> impl Future<Output = Result<Idea, ApiError>> + Send;

    /// `DELETE /api/ideas/{id}`
    fn delete_idea(&self, id: IdeaId) -> impl Future<Output = Result<(), ApiError>> + Send;
}

/// Account calls plus access to the session they act on.
pub trait AuthApi: Send + Sync {
    /// The session whose credentials this API attaches.
    fn session(&self) -> &Session;

    /// `POST /api/auth/register` (sent without credentials).
    fn register(
        &self,
        username: &str,
        email: &Email,
        password: &SecretString,
    ) -> impl Future<Output = Result<RegisteredUser, ApiError>> + Send;

    /// `GET /api/auth/me`
    fn current_user(&self) -> impl Future<Output = Result<CurrentUser, ApiError>> + Send;
}

/// Upvote backend client.
///
/// Cheap to clone; clones share the HTTP connection pool and the session.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    client: reqwest::Client,
    base_url: Url,
    session: Session,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.inner.base_url.as_str())
            .field("session", &self.inner.session)
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    /// Create a client bound to `session`.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(config: &ClientConfig, session: Session) -> Result<Self, ApiError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            inner: Arc::new(ApiClientInner {
                client: builder.build()?,
                base_url: config.api_url.clone(),
                session,
            }),
        })
    }

    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    /// Build a request, attaching the session credential when asked to.
    fn request(
        &self,
        method: Method,
        path: &str,
        authenticated: bool,
    ) -> Result<RequestBuilder, ApiError> {
        let url = self.inner.base_url.join(path)?;
        let mut request = self.inner.client.request(method, url);

        if authenticated {
            if let Some(auth) = self.inner.session.authorization() {
                let mut value = HeaderValue::from_str(auth.expose_secret())?;
                value.set_sensitive(true);
                request = request.header(AUTHORIZATION, value);
            }
        }

        Ok(request)
    }

    /// Send a request and classify the status.
    ///
    /// A 401 clears the session before the caller sees the error.
    async fn execute(&self, request: RequestBuilder) -> Result<Response, ApiError> {
        let response = request.send().await?;
        let status = response.status();

        if status.is_success() {
            return Ok(response);
        }

        if status == StatusCode::UNAUTHORIZED {
            warn!(url = %response.url(), "Backend rejected credentials");
            self.inner.session.expire();
            return Err(ApiError::AuthExpired);
        }

        let body = response.text().await.unwrap_or_default();
        debug!(%status, "Backend returned an error");
        Err(ApiError::from_status(status, &body))
    }

    /// Send a request and decode a JSON success body.
    async fn execute_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<T, ApiError> {
        let response = self.execute(request).await?;
        let body = response.text().await?;
        serde_json::from_str(&body)
            .map_err(|e| ApiError::Decode(format!("Failed to parse response: {e}")))
    }
}

impl IdeaApi for ApiClient {
    #[instrument(skip(self))]
    async fn list_approved(&self) -> Result<Vec<Idea>, ApiError> {
        let request = self.request(Method::GET, "api/ideas", true)?;
        let ideas: Vec<Idea> = self.execute_json(request).await?;
        debug!(count = ideas.len(), "Fetched approved ideas");
        Ok(ideas)
    }

    #[instrument(skip(self, draft), fields(title = %draft.title()))]
    async fn submit_idea(&self, draft: &IdeaDraft) -> Result<Idea, ApiError> {
        let request = self.request(Method::POST, "api/ideas", true)?.json(draft);
        let idea: Idea = self.execute_json(request).await?;
        debug!(id = %idea.id, "Idea submitted");
        Ok(idea)
    }

    #[instrument(skip(self))]
    async fn vote(&self, id: IdeaId) -> Result<Idea, ApiError> {
        let request = self.request(Method::POST, &format!("api/ideas/{id}/vote"), true)?;
        let idea: Idea = self.execute_json(request).await?;
        debug!(votes = idea.votes, "Vote recorded");
        Ok(idea)
    }
}

impl AdminApi for ApiClient {
    #[instrument(skip(self))]
    async fn list_pending(&self) -> Result<Vec<Idea>, ApiError> {
        let request = self.request(Method::GET, "api/ideas/pending", true)?;
        let ideas: Vec<Idea> = self.execute_json(request).await?;
        debug!(count = ideas.len(), "Fetched pending ideas");
        Ok(ideas)
    }

    #[instrument(skip(self))]
    async fn approve(&self, id: IdeaId) -> Result<Idea, ApiError> {
        let request = self.request(Method::POST, &format!("api/ideas/{id}/approve"), true)?;
        self.execute_json(request).await
    }

    #[instrument(skip(self))]
    async fn delete_idea(&self, id: IdeaId) -> Result<(), ApiError> {
        let request = self.request(Method::DELETE, &format!("api/ideas/{id}"), true)?;
        self.execute(request).await?;
        Ok(())
    }
}

impl AuthApi for ApiClient {
    fn session(&self) -> &Session {
        &self.inner.session
    }

    #[instrument(skip(self, email, password), fields(username = %username))]
    async fn register(
        &self,
        username: &str,
        email: &Email,
        password: &SecretString,
    ) -> Result<RegisteredUser, ApiError> {
        let body = RegisterRequest {
            username,
            password: password.expose_secret(),
            email: email.as_str(),
        };
        let request = self
            .request(Method::POST, "api/auth/register", false)?
            .json(&body);
        self.execute_json(request).await
    }

    #[instrument(skip(self))]
    async fn current_user(&self) -> Result<CurrentUser, ApiError> {
        let request = self.request(Method::GET, "api/auth/me", true)?;
        let me: MeResponse = self.execute_json(request).await?;
        Ok(me.into())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::session::Credentials;

    fn client() -> ApiClient {
        let config = ClientConfig::new("http://localhost:8080/").unwrap();
        ApiClient::new(&config, Session::new()).unwrap()
    }

    #[test]
    fn test_request_urls_resolve_under_base() {
        let config = ClientConfig::new("http://example.com/backend").unwrap();
        let client = ApiClient::new(&config, Session::new()).unwrap();
        let request = client
            .request(Method::POST, "api/ideas/7/vote", true)
            .unwrap()
            .build()
            .unwrap();
        assert_eq!(
            request.url().as_str(),
            "http://example.com/backend/api/ideas/7/vote"
        );
    }

    #[test]
    fn test_anonymous_requests_carry_no_credentials() {
        let request = client()
            .request(Method::GET, "api/ideas", true)
            .unwrap()
            .build()
            .unwrap();
        assert!(request.headers().get(AUTHORIZATION).is_none());
    }

    #[test]
    fn test_signed_in_requests_carry_basic_credentials() {
        let client = client();
        client.session().sign_in(Credentials::basic(
            "alice",
            &SecretString::from("wonderland".to_string()),
        ));
        let request = client
            .request(Method::GET, "api/ideas", true)
            .unwrap()
            .build()
            .unwrap();
        let header = request.headers().get(AUTHORIZATION).unwrap();
        assert_eq!(header.to_str().unwrap(), "Basic YWxpY2U6d29uZGVybGFuZA==");
        assert!(header.is_sensitive());
    }

    #[test]
    fn test_registration_is_sent_without_credentials() {
        let client = client();
        client.session().sign_in(Credentials::basic(
            "alice",
            &SecretString::from("wonderland".to_string()),
        ));
        let request = client
            .request(Method::POST, "api/auth/register", false)
            .unwrap()
            .build()
            .unwrap();
        assert!(request.headers().get(AUTHORIZATION).is_none());
    }

    #[test]
    fn test_api_client_is_clone_send_sync() {
        fn assert_traits<T: Clone + Send + Sync>() {}
        assert_traits::<ApiClient>();
    }
}
