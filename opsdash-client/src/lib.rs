//! Opsdash Client - authenticated HTTP access to the opsdash API
//!
//! This crate provides the client-side session machinery for the opsdash
//! dashboard API:
//!
//! - A [`SessionStore`] holding user identity and the access/refresh token
//!   pair, persisted to a single durable record
//! - An [`ApiClient`] that attaches bearer tokens, transparently refreshes
//!   expired access tokens, and retries a rejected request exactly once
//! - CRUD access to the `/options` resource
//! - Read-only permission checks derived from the session
//!
//! ## Example
//!
//! ```no_run
//! use opsdash_client::{ApiClient, LoginCredentials, SessionStore};
//! use opsdash_core::ApiConfig;
//!
//! # async fn run() -> opsdash_core::OpsdashResult<()> {
//! let config = ApiConfig::new("https://dashboard.example.com/api", "acme");
//! let client = ApiClient::new(config, SessionStore::new())?;
//!
//! client
//!     .login(&LoginCredentials {
//!         username: "dora".to_string(),
//!         password: "secret".to_string(),
//!     })
//!     .await?;
//!
//! let options = client.options().list().await?;
//! println!("{} options visible", options.len());
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod permissions;
pub mod session;

pub use api::{
    ApiClient, Method, OptionRecord, OptionsApi, ProfileRefresh, RequestOptions, ResponseBody,
};
pub use permissions::Permissions;
pub use session::{
    LoginCredentials, PersistedSession, Session, SessionStorage, SessionStore, TokenPair,
    UserProfile, UserRole, WILDCARD_PERMISSION,
};
