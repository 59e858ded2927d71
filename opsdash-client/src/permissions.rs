//! Read-only capability checks derived from the session
//!
//! A pure projection of the session store; no side effects and no caching
//! beyond the session's own state.

use crate::session::SessionStore;

/// Permission view over a session store
#[derive(Clone)]
pub struct Permissions {
    session: SessionStore,
}

impl Permissions {
    pub fn new(session: SessionStore) -> Self {
        Self { session }
    }

    /// Check a single permission, honoring the wildcard
    pub fn has_permission(&self, permission: &str) -> bool {
        self.session.has_permission(permission)
    }

    /// True when at least one of the given permissions is granted
    pub fn has_any<I, S>(&self, permissions: I) -> bool
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        permissions
            .into_iter()
            .any(|p| self.has_permission(p.as_ref()))
    }

    /// True only when every one of the given permissions is granted
    ///
    /// Vacuously true for an empty list.
    pub fn has_all<I, S>(&self, permissions: I) -> bool
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        permissions
            .into_iter()
            .all(|p| self.has_permission(p.as_ref()))
    }

    /// Whether the current user is an administrator
    pub fn is_admin(&self) -> bool {
        self.session
            .user()
            .map(|u| u.superadmin || u.roles.name == "Superadmin")
            .unwrap_or(false)
    }

    /// Username of the current user, if a profile is loaded
    pub fn username(&self) -> Option<String> {
        self.session.user().map(|u| u.username)
    }

    /// Role name of the current user, if a profile is loaded
    pub fn role_name(&self) -> Option<String> {
        self.session.user().map(|u| u.roles.name)
    }

    /// Cloned permission list of the current user
    pub fn permissions(&self) -> Vec<String> {
        self.session
            .user()
            .map(|u| u.permission)
            .unwrap_or_default()
    }
}
