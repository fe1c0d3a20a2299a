use crate::client::{PingResult, UserProfile};
use crate::transport::TransportKind;
use chrono::{DateTime, Local};
use colored::*;
use core_logic::{CycleStats, RequestError, STATUS_TARGET};
use std::fmt;
use std::time::Duration;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Profile,
    Ping,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Profile => write!(f, "profile"),
            Stage::Ping => write!(f, "ping"),
        }
    }
}

/// Structured outcome stream emitted by the scheduler.
#[derive(Debug, Clone)]
pub enum ReportEvent {
    CycleStarted {
        cycle: u64,
        at: DateTime<Local>,
    },
    AccountStarted {
        index: usize,
        total: usize,
        label: String,
        transport: TransportKind,
        proxy: Option<String>,
    },
    Profile {
        index: usize,
        profile: UserProfile,
    },
    ExitIp {
        index: usize,
        ip: String,
    },
    Pinged {
        index: usize,
        result: PingResult,
    },
    AccountFailed {
        index: usize,
        stage: Stage,
        error: RequestError,
    },
    CycleFinished {
        cycle: u64,
        stats: CycleStats,
        next_delay: Option<Duration>,
    },
    Stopped {
        cycles: u64,
    },
}

/// Sink for scheduler outcomes.
pub trait Reporter: Send + Sync {
    fn report(&self, event: &ReportEvent);
}

/// Prints colored status lines through the `task_result` log target.
pub struct ConsoleReporter;

fn account_tag(index: usize) -> String {
    format!("[AC:{:03}]", index + 1)
}

impl Reporter for ConsoleReporter {
    fn report(&self, event: &ReportEvent) {
        match event {
            ReportEvent::CycleStarted { cycle, at } => {
                info!(
                    target: STATUS_TARGET,
                    "\n⏰ Ping Cycle #{} at {}",
                    cycle,
                    at.format("%Y-%m-%d %H:%M:%S").to_string().white().bold()
                );
            }
            ReportEvent::AccountStarted {
                index,
                total,
                label,
                transport,
                proxy,
            } => {
                let route = match proxy {
                    Some(p) => format!("{} {}", transport, p).cyan().to_string(),
                    None => "direct".dimmed().to_string(),
                };
                info!(target: STATUS_TARGET, "{}", "=".repeat(50));
                info!(
                    target: STATUS_TARGET,
                    "{} Account {}/{} {} via {}",
                    account_tag(*index),
                    index + 1,
                    total,
                    label,
                    route
                );
            }
            ReportEvent::Profile { index, profile } => {
                let active = profile.nodes.iter().filter(|n| n.is_active).count();
                info!(
                    target: STATUS_TARGET,
                    "{} Email: {} | Nodes: {} ({} active) | Total Points: {}",
                    account_tag(*index),
                    profile.email.yellow(),
                    profile.nodes.len(),
                    active,
                    profile.total_point.to_string().green()
                );
            }
            ReportEvent::ExitIp { index, ip } => {
                info!(
                    target: STATUS_TARGET,
                    "{} Start Ping IP: {}",
                    account_tag(*index),
                    ip.yellow()
                );
            }
            ReportEvent::Pinged { index, result } => {
                info!(
                    target: STATUS_TARGET,
                    "{} SUCCESS ping | Status Code: {} | Message: {} | Metadata ID: {}",
                    account_tag(*index),
                    result.status_code.to_string().green(),
                    result.message,
                    result.metadata_id.white()
                );
            }
            ReportEvent::AccountFailed {
                index,
                stage,
                error,
            } => {
                warn!(
                    target: STATUS_TARGET,
                    "{} FAILED {} [{}] {}",
                    account_tag(*index),
                    stage,
                    error.kind(),
                    error.to_string().red()
                );
            }
            ReportEvent::CycleFinished {
                cycle,
                stats,
                next_delay,
            } => {
                let next = match next_delay {
                    Some(d) => format!("Next cycle in {}s", d.as_secs()),
                    None => "No further cycles".to_string(),
                };
                info!(target: STATUS_TARGET, "{}", "=".repeat(50));
                info!(
                    target: STATUS_TARGET,
                    "Cycle #{} done: {} ok / {} failed ({:.2}%). {}",
                    cycle,
                    stats.success,
                    stats.failed,
                    stats.success_rate(),
                    next
                );
            }
            ReportEvent::Stopped { cycles } => {
                info!(
                    target: STATUS_TARGET,
                    "🛑 Pinger stopped after {} cycle(s).",
                    cycles
                );
            }
        }
    }
}
