//! Session state and authentication wire types

use serde::{Deserialize, Serialize};

/// Reserved permission string that satisfies every permission check.
pub const WILDCARD_PERMISSION: &str = "ALL";

/// Credentials submitted to the login endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginCredentials {
    pub username: String,
    pub password: String,
}

/// Access/refresh token pair
///
/// Always replaced as a unit; the two tokens are never updated independently.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Role attached to a user profile
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRole {
    pub id: i64,
    pub name: String,
}

/// User profile as returned by the profile endpoint
///
/// Replaced wholesale on each fetch, never merged field by field.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: i64,
    pub status: String,
    pub code: String,
    pub username: String,
    pub full_name: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub superadmin: bool,
    pub image: Option<String>,
    #[serde(default)]
    pub permission: Vec<String>,
    pub roles: UserRole,
}

impl UserProfile {
    /// Check whether the profile grants a permission, honoring the wildcard
    pub fn has_permission(&self, permission: &str) -> bool {
        self.permission
            .iter()
            .any(|p| p == permission || p == WILDCARD_PERMISSION)
    }
}

/// In-memory session state
///
/// `authenticated` is true iff both tokens were written by a successful login
/// or refresh and no logout or failure has happened since.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Session {
    pub user: Option<UserProfile>,
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub authenticated: bool,
}

impl Session {
    /// Overwrite both tokens and mark the session authenticated
    pub fn apply_tokens(&mut self, tokens: TokenPair) {
        self.access_token = Some(tokens.access_token);
        self.refresh_token = Some(tokens.refresh_token);
        self.authenticated = true;
    }

    /// Reset every field to the unauthenticated state
    pub fn clear(&mut self) {
        *self = Session::default();
    }

    /// Both tokens as a pair, when present
    pub fn token_pair(&self) -> Option<TokenPair> {
        match (&self.access_token, &self.refresh_token) {
            (Some(access), Some(refresh)) => Some(TokenPair {
                access_token: access.clone(),
                refresh_token: refresh.clone(),
            }),
            _ => None,
        }
    }

    /// Check a permission against the stored profile
    ///
    /// Absent profile means no permissions, not an error.
    pub fn has_permission(&self, permission: &str) -> bool {
        match &self.user {
            Some(user) => user.has_permission(permission),
            None => false,
        }
    }
}
