//! Authentication operations: login, profile fetch, logout, token refresh
//!
//! The refresh procedure lives here and is invoked by the dispatcher; it
//! talks to the wire through the raw send path so a refresh can never
//! trigger another refresh.

use super::{handle_response, ApiClient, Method, RequestOptions};
use crate::session::{LoginCredentials, TokenPair, UserProfile};
use log::{debug, info, warn};
use opsdash_core::{ErrorContext, OpsdashError, OpsdashResult};
use serde::Serialize;
use tokio::task::JoinHandle;

/// Body of the refresh endpoint request
#[derive(Debug, Serialize)]
struct RefreshRequest<'a> {
    refresh_token: &'a str,
}

/// Handle to a background profile re-fetch
///
/// Returned by [`ApiClient::spawn_profile_refresh`] so rehydration-triggered
/// fetches have an observable outcome instead of running detached.
pub struct ProfileRefresh {
    handle: JoinHandle<OpsdashResult<()>>,
}

impl ProfileRefresh {
    /// Wait for the re-fetch to finish
    pub async fn wait(self) -> OpsdashResult<()> {
        self.handle.await.map_err(|e| OpsdashError::Internal {
            message: format!("Profile refresh task failed: {}", e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("auth").with_operation("profile_refresh"),
        })?
    }

    /// Whether the task has completed
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl ApiClient {
    /// Authenticate against the login endpoint and populate the session
    ///
    /// On success the token pair is stored and the profile fetched. Any
    /// failure surfaces as a generic authentication error; the cause is
    /// logged, never detailed to the caller. A failed profile fetch after a
    /// successful token exchange clears the session again, so login is
    /// all-or-nothing.
    pub async fn login(&self, credentials: &LoginCredentials) -> OpsdashResult<()> {
        let outcome = self
            .request(
                Method::POST,
                "/auth/login",
                Some(credentials),
                RequestOptions::public(),
            )
            .await
            .and_then(|body| body.decode::<TokenPair>());

        let tokens = match outcome {
            Ok(tokens) => tokens,
            Err(e) => {
                warn!("Login failed: {}", e);
                return Err(OpsdashError::Authentication {
                    message: "Invalid credentials".to_string(),
                    context: ErrorContext::new("auth").with_operation("login"),
                });
            }
        };

        self.session().set_tokens(tokens);
        debug!("Login succeeded, fetching profile");

        self.fetch_profile().await.map_err(|e| {
            warn!("Profile fetch after login failed: {}", e);
            OpsdashError::Authentication {
                message: "Login failed".to_string(),
                context: ErrorContext::new("auth").with_operation("login_profile"),
            }
        })?;

        info!("Logged in as tenant {}", self.config().tenant_id);
        Ok(())
    }

    /// Fetch the current user's profile into the session
    ///
    /// A session without an access token makes this a no-op. A failed fetch
    /// clears the session: permission checks cannot be answered without an
    /// identity.
    pub async fn fetch_profile(&self) -> OpsdashResult<()> {
        if self.session().access_token().is_none() {
            debug!("No access token present, skipping profile fetch");
            return Ok(());
        }

        match self.get::<UserProfile>("/auth/profile").await {
            Ok(profile) => {
                debug!("Profile fetched for {}", profile.username);
                self.session().set_user(profile);
                Ok(())
            }
            Err(e) => {
                warn!("Profile fetch failed, clearing session: {}", e);
                self.session().clear();
                Err(OpsdashError::Authentication {
                    message: "Failed to fetch user profile".to_string(),
                    context: ErrorContext::new("auth").with_operation("fetch_profile"),
                })
            }
        }
    }

    /// Clear the session
    ///
    /// Synchronous and local; no network call is made.
    pub fn logout(&self) {
        info!("Logging out");
        self.session().clear();
    }

    /// Schedule the rehydration-triggered profile re-fetch
    ///
    /// Returns `None` when the session holds no access token. The outcome is
    /// observable through the returned handle; a failure clears the session
    /// like any other profile-fetch failure.
    pub fn spawn_profile_refresh(&self) -> Option<ProfileRefresh> {
        if self.session().access_token().is_none() {
            return None;
        }

        let client = self.clone();
        Some(ProfileRefresh {
            handle: tokio::spawn(async move { client.fetch_profile().await }),
        })
    }

    /// Exchange the refresh token for a new token pair
    ///
    /// `stale_token` is the access token the caller last saw rejected (or
    /// `None` from the preflight path). Concurrent callers are coalesced: the
    /// gate serializes refreshes, and a caller that waited behind an
    /// in-flight refresh adopts the pair it wrote instead of hitting the
    /// endpoint again.
    ///
    /// `Ok(None)` means no refresh was possible (no refresh token, or the
    /// endpoint rejected it and the session was cleared); the caller must
    /// treat the request as unauthenticated.
    pub(crate) async fn refresh_session(
        &self,
        stale_token: Option<&str>,
    ) -> OpsdashResult<Option<TokenPair>> {
        let _gate = self.refresh_gate.lock().await;

        // Someone else refreshed while we waited for the gate
        if self.session.access_token().as_deref() != stale_token {
            return Ok(self.session.token_pair());
        }

        let Some(refresh_token) = self.session.refresh_token() else {
            debug!("No refresh token present, cannot refresh");
            return Ok(None);
        };

        debug!("Refreshing access token");
        let response = match self
            .send(
                Method::POST,
                "/auth/refresh",
                Some(&RefreshRequest {
                    refresh_token: &refresh_token,
                }),
                None,
            )
            .await
        {
            Ok(response) => response,
            Err(e) => {
                warn!("Token refresh request failed: {}", e);
                self.session.clear();
                return Err(e);
            }
        };

        if !response.status().is_success() {
            warn!(
                "Token refresh rejected with status {}, clearing session",
                response.status()
            );
            self.session.clear();
            return Ok(None);
        }

        let tokens: TokenPair = handle_response(response).await?.decode()?;
        self.session.set_tokens(tokens.clone());
        info!("Access token refreshed");

        // Best-effort profile re-fetch. The refreshed tokens stay valid even
        // if this fails, so the failure is logged and swallowed.
        match self
            .send(
                Method::GET,
                "/auth/profile",
                None::<&()>,
                Some(&tokens.access_token),
            )
            .await
        {
            Ok(response) if response.status().is_success() => {
                match handle_response(response).await.and_then(|b| b.decode()) {
                    Ok(profile) => self.session.set_user(profile),
                    Err(e) => warn!("Failed to parse profile after refresh: {}", e),
                }
            }
            Ok(response) => warn!(
                "Profile fetch after refresh returned {}",
                response.status()
            ),
            Err(e) => warn!("Profile fetch after refresh failed: {}", e),
        }

        Ok(Some(tokens))
    }
}
