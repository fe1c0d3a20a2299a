//! # Core Logic - Shared Utilities for the Pingers
//!
//! This crate provides the pieces every pinger binary shares: the account and
//! proxy model, file loaders, logging, request pacing and shutdown handling.
//!
//! ## Modules
//!
//! - [`config`] - Account, credential and proxy descriptor types
//! - [`error`] - Typed error handling with thiserror
//! - [`traits`] - Core trait definitions
//! - [`utils`] - Utility modules (loaders, logger, pacer, shutdown)

pub mod config;
pub mod error;
pub mod traits;
pub(crate) mod utils;

pub use config::{AccountCredential, AccountEntry, ProxyDescriptor, ProxySource};
pub use error::{ApiError, ConfigError, NetworkError, ProxyError, RequestError};
pub use traits::{AccountSource, CycleStats};

pub use utils::{
    setup_logger, AccountManager, FileAccountSource, PingPacer, ProxyAssignment, ProxyManager,
    ShutdownController, STATUS_TARGET,
};
