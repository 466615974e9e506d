//! Request and response bodies of the backend's JSON API.

use serde::{Deserialize, Serialize};
use upvote_core::{CurrentUser, UserId};

/// Body of `POST /api/auth/register`.
#[derive(Debug, Serialize)]
pub struct RegisterRequest<'a> {
    pub username: &'a str,
    pub password: &'a str,
    pub email: &'a str,
}

/// Response of a successful registration (201).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RegisteredUser {
    pub id: UserId,
    pub username: String,
    pub email: String,
    #[serde(default)]
    pub message: Option<String>,
}

/// Response of `GET /api/auth/me`.
#[derive(Debug, Clone, Deserialize)]
pub struct MeResponse {
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub roles: Vec<String>,
}

impl From<MeResponse> for CurrentUser {
    fn from(me: MeResponse) -> Self {
        Self::new(me.username, me.email, me.roles)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use upvote_core::Role;

    #[test]
    fn test_me_response_into_current_user() {
        let me: MeResponse = serde_json::from_str(
            r#"{"username": "admin", "email": "admin@example.com", "roles": ["ROLE_USER", "ROLE_ADMIN"]}"#,
        )
        .unwrap();
        let user = CurrentUser::from(me);
        assert_eq!(user.username, "admin");
        assert_eq!(user.role, Role::Admin);
    }

    #[test]
    fn test_registered_user_ignores_missing_message() {
        let user: RegisteredUser =
            serde_json::from_str(r#"{"id": 3, "username": "dora", "email": "dora@example.com"}"#)
                .unwrap();
        assert_eq!(user.id, UserId::new(3));
        assert_eq!(user.message, None);
    }

    #[test]
    fn test_register_request_shape() {
        let body = RegisterRequest {
            username: "dora",
            password: "explorer",
            email: "dora@example.com",
        };
        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(value["username"], "dora");
        assert_eq!(value["password"], "explorer");
        assert_eq!(value["email"], "dora@example.com");
    }
}
