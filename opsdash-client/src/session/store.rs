//! Shared session store
//!
//! A cloneable handle to the in-memory session, written through to durable
//! storage on every mutation. The store is injected into the API client and
//! permission checks rather than living in a global.

use super::storage::SessionStorage;
use super::types::{Session, TokenPair, UserProfile};
use std::sync::{Arc, RwLock};
use tracing::{info, warn};

/// Cloneable handle to the session state
///
/// All mutation goes through this handle so the persisted record stays in
/// sync with the in-memory state. Lock sections are short and never held
/// across await points.
#[derive(Clone)]
pub struct SessionStore {
    state: Arc<RwLock<Session>>,
    storage: Option<Arc<SessionStorage>>,
}

impl SessionStore {
    /// Create an empty, non-persisted store
    pub fn new() -> Self {
        Self {
            state: Arc::new(RwLock::new(Session::default())),
            storage: None,
        }
    }

    /// Create a store backed by durable storage, rehydrating any persisted
    /// session
    ///
    /// A missing record starts the session empty; an unreadable record is
    /// logged and discarded rather than failing startup.
    pub fn with_storage(storage: SessionStorage) -> Self {
        let initial = match storage.load() {
            Ok(Some(session)) => {
                info!(
                    authenticated = session.authenticated,
                    "Rehydrated session from storage"
                );
                session
            }
            Ok(None) => Session::default(),
            Err(e) => {
                warn!("Failed to load persisted session, starting empty: {}", e);
                Session::default()
            }
        };

        Self {
            state: Arc::new(RwLock::new(initial)),
            storage: Some(Arc::new(storage)),
        }
    }

    /// Overwrite both tokens and mark the session authenticated
    ///
    /// No validation of token well-formedness is performed.
    pub fn set_tokens(&self, tokens: TokenPair) {
        let mut state = self.state.write().unwrap();
        state.apply_tokens(tokens);
        self.persist(&state);
    }

    /// Overwrite the user profile
    pub fn set_user(&self, user: UserProfile) {
        let mut state = self.state.write().unwrap();
        state.user = Some(user);
        self.persist(&state);
    }

    /// Reset the session to the unauthenticated state and drop the persisted
    /// record
    pub fn clear(&self) {
        let mut state = self.state.write().unwrap();
        state.clear();
        if let Some(storage) = &self.storage {
            if let Err(e) = storage.delete() {
                warn!("Failed to delete persisted session: {}", e);
            }
        }
    }

    /// Current access token, if any
    pub fn access_token(&self) -> Option<String> {
        self.state.read().unwrap().access_token.clone()
    }

    /// Current refresh token, if any
    pub fn refresh_token(&self) -> Option<String> {
        self.state.read().unwrap().refresh_token.clone()
    }

    /// Both tokens as a pair, when present
    pub fn token_pair(&self) -> Option<TokenPair> {
        self.state.read().unwrap().token_pair()
    }

    /// Whether the session currently holds tokens from a successful login or
    /// refresh
    pub fn is_authenticated(&self) -> bool {
        self.state.read().unwrap().authenticated
    }

    /// Cloned snapshot of the current user profile
    pub fn user(&self) -> Option<UserProfile> {
        self.state.read().unwrap().user.clone()
    }

    /// Cloned snapshot of the whole session
    pub fn snapshot(&self) -> Session {
        self.state.read().unwrap().clone()
    }

    /// Check a permission against the stored profile
    pub fn has_permission(&self, permission: &str) -> bool {
        self.state.read().unwrap().has_permission(permission)
    }

    fn persist(&self, state: &Session) {
        if let Some(storage) = &self.storage {
            // The in-memory session stays authoritative; a failed write is
            // logged, not surfaced.
            if let Err(e) = storage.save(state) {
                warn!("Failed to persist session: {}", e);
            }
        }
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}
