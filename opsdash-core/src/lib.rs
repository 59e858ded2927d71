//! Opsdash Core - shared foundation for the opsdash client crates
//!
//! This module defines the error types, configuration structures, and logging
//! setup used across the opsdash workspace.

pub mod config;
pub mod error;
pub mod logging;
pub mod types;

pub use error::*;
pub use logging::*;
pub use types::*;

// Re-export commonly used external types
pub use tracing;
