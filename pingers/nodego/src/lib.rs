//! # NodeGo Pinger
//!
//! Keeps a set of NodeGo accounts alive by pinging the rewards API on a
//! schedule, each account through its own (optional) proxy.
//!
//! ## Modules
//!
//! - [`config`] - `config.toml` + `NODEGO_*` environment settings
//! - [`transport`] - Proxy descriptor classification and per-account HTTP transports
//! - [`client`] - Authenticated API client with ping pacing
//! - [`scheduler`] - Sequential multi-account polling loop
//! - [`report`] - Outcome events and the console reporter

pub mod client;
pub mod config;
pub mod report;
pub mod scheduler;
pub mod transport;

pub use client::{ApiClient, ClientSettings, NodeInfo, PingResult, UserProfile};
pub use self::config::PingerConfig;
pub use report::{ConsoleReporter, ReportEvent, Reporter, Stage};
pub use scheduler::{AccountScheduler, CycleDelay, RunMode, RunOutcome, SchedulerSettings};
pub use transport::{ProxyTransportFactory, Transport, TransportKind};
