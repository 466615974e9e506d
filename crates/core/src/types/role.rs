//! Roles and the signed-in user profile.

use serde::{Deserialize, Serialize};

/// Role string that grants access to the admin view.
pub const ADMIN_ROLE: &str = "ROLE_ADMIN";

/// Role string held by every registered voter.
pub const USER_ROLE: &str = "ROLE_USER";

/// The view a signed-in user is entitled to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Reviews pending ideas, approves and deletes.
    Admin,
    /// Submits ideas and votes on approved ones.
    #[default]
    User,
}

impl Role {
    /// Derive the role from the backend's role strings.
    ///
    /// Any list containing [`ADMIN_ROLE`] selects [`Role::Admin`]; everything
    /// else (including an empty list) is a plain user.
    #[must_use]
    pub fn from_roles<S: AsRef<str>>(roles: &[S]) -> Self {
        if roles.iter().any(|r| r.as_ref() == ADMIN_ROLE) {
            Self::Admin
        } else {
            Self::User
        }
    }

    #[must_use]
    pub const fn is_admin(self) -> bool {
        matches!(self, Self::Admin)
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Admin => write!(f, "admin"),
            Self::User => write!(f, "user"),
        }
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Self::Admin),
            "user" => Ok(Self::User),
            _ => Err(format!("invalid role: {s}")),
        }
    }
}

/// The identity behind an active session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentUser {
    pub username: String,
    pub email: String,
    /// Raw role strings as reported by the backend.
    pub roles: Vec<String>,
    /// Derived from `roles`.
    pub role: Role,
}

impl CurrentUser {
    /// Build a profile, deriving [`Role`] from `roles`.
    #[must_use]
    pub fn new(username: String, email: String, roles: Vec<String>) -> Self {
        let role = Role::from_roles(&roles);
        Self {
            username,
            email,
            roles,
            role,
        }
    }

    #[must_use]
    pub const fn is_admin(&self) -> bool {
        self.role.is_admin()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_admin_marker_selects_admin() {
        assert_eq!(Role::from_roles(&[USER_ROLE, ADMIN_ROLE]), Role::Admin);
        assert_eq!(Role::from_roles(&[ADMIN_ROLE]), Role::Admin);
    }

    #[test]
    fn test_missing_marker_selects_user() {
        assert_eq!(Role::from_roles(&[USER_ROLE]), Role::User);
        assert_eq!(Role::from_roles::<&str>(&[]), Role::User);
        // Matching is exact
        assert_eq!(Role::from_roles(&["role_admin", "ADMIN"]), Role::User);
    }

    #[test]
    fn test_role_round_trips_through_str() {
        for role in [Role::Admin, Role::User] {
            assert_eq!(role.to_string().parse::<Role>().unwrap(), role);
        }
        assert!("superuser".parse::<Role>().is_err());
    }

    #[test]
    fn test_current_user_derives_role() {
        let user = CurrentUser::new(
            "admin".to_string(),
            "admin@example.com".to_string(),
            vec![ADMIN_ROLE.to_string()],
        );
        assert!(user.is_admin());
    }
}
