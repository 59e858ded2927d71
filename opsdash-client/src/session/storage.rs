//! Durable persistence for the session record
//!
//! One JSON record under a fixed file name, read at startup and rewritten on
//! every session mutation.

use super::types::{Session, UserProfile};
use opsdash_core::{ErrorContext, OpsdashError, OpsdashResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Fixed name of the persisted session record
const SESSION_FILE: &str = "auth-session.json";

/// Serializable subset of the session that survives process restarts
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistedSession {
    pub user: Option<UserProfile>,
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub authenticated: bool,
}

impl From<&Session> for PersistedSession {
    fn from(session: &Session) -> Self {
        Self {
            user: session.user.clone(),
            access_token: session.access_token.clone(),
            refresh_token: session.refresh_token.clone(),
            authenticated: session.authenticated,
        }
    }
}

impl From<PersistedSession> for Session {
    fn from(persisted: PersistedSession) -> Self {
        Self {
            user: persisted.user,
            access_token: persisted.access_token,
            refresh_token: persisted.refresh_token,
            authenticated: persisted.authenticated,
        }
    }
}

/// Storage manager for the session record
pub struct SessionStorage {
    session_file: PathBuf,
}

impl SessionStorage {
    /// Create a storage manager rooted at the given data directory
    ///
    /// The directory is created if it does not exist. A leading `~` is
    /// expanded to the user's home directory.
    pub fn new<P: AsRef<Path>>(data_dir: P) -> OpsdashResult<Self> {
        let data_dir = expand_home(data_dir.as_ref());

        std::fs::create_dir_all(&data_dir).map_err(|e| OpsdashError::Storage {
            message: format!(
                "Failed to create data directory {}: {}",
                data_dir.display(),
                e
            ),
            source: Some(Box::new(e)),
            context: ErrorContext::new("session_storage")
                .with_operation("create_dir")
                .with_suggestion("Check that the parent directory is writable"),
        })?;

        Ok(Self {
            session_file: data_dir.join(SESSION_FILE),
        })
    }

    /// Load the persisted session, if any
    pub fn load(&self) -> OpsdashResult<Option<Session>> {
        if !self.session_file.exists() {
            return Ok(None);
        }

        let json_data = std::fs::read_to_string(&self.session_file)?;
        let persisted: PersistedSession = serde_json::from_str(&json_data)?;

        debug!(
            "Loaded session record from {}",
            self.session_file.display()
        );

        Ok(Some(persisted.into()))
    }

    /// Write the persisted subset of the session
    pub fn save(&self, session: &Session) -> OpsdashResult<()> {
        let persisted = PersistedSession::from(session);
        let json_data = serde_json::to_string_pretty(&persisted)?;

        std::fs::write(&self.session_file, json_data)?;

        debug!("Saved session record to {}", self.session_file.display());
        Ok(())
    }

    /// Remove the persisted record if present
    pub fn delete(&self) -> OpsdashResult<()> {
        if self.session_file.exists() {
            std::fs::remove_file(&self.session_file)?;
            debug!(
                "Deleted session record at {}",
                self.session_file.display()
            );
        }
        Ok(())
    }
}

fn expand_home(path: &Path) -> PathBuf {
    if let Ok(stripped) = path.strip_prefix("~") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    path.to_path_buf()
}
