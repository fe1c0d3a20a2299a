//! # Utilities Module
//!
//! Internal utility modules for the core-logic crate.
//! These modules are marked as `pub(crate)` to enforce API boundaries.

pub(crate) mod account_manager;
pub(crate) mod logger;
pub(crate) mod pacer;
pub(crate) mod proxy_manager;
pub(crate) mod shutdown;

// Selective exports - only public utilities
pub use account_manager::{AccountManager, FileAccountSource};
pub use logger::{setup_logger, STATUS_TARGET};
pub use pacer::PingPacer;
pub use proxy_manager::{ProxyAssignment, ProxyManager};
pub use shutdown::ShutdownController;
