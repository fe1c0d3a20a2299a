use crate::client::{ApiClient, ClientSettings};
use crate::report::{ReportEvent, Reporter, Stage};
use crate::transport::ProxyTransportFactory;
use anyhow::Result;
use chrono::Local;
use core_logic::{AccountEntry, CycleStats, ShutdownController};
use rand::Rng;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn, Instrument};

/// What one account does per cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum RunMode {
    /// Fetch the profile (and exit IP), then ping.
    #[default]
    Profile,
    /// Ping only.
    Ping,
}

/// Pause between two cycles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleDelay {
    Fixed(Duration),
    /// Uniform in `min..=max`, so independent instances drift apart.
    Random { min: Duration, max: Duration },
}

impl CycleDelay {
    pub fn next(&self) -> Duration {
        match *self {
            CycleDelay::Fixed(d) => d,
            CycleDelay::Random { min, max } => {
                if max <= min {
                    return min;
                }
                let ms = rand::thread_rng().gen_range(min.as_millis()..=max.as_millis());
                Duration::from_millis(ms as u64)
            }
        }
    }
}

/// How a supervised run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// The scheduler returned on its own.
    Completed,
    /// Shutdown was requested and the grace period ran out first.
    GraceElapsed,
}

#[derive(Debug, Clone)]
pub struct SchedulerSettings {
    pub mode: RunMode,
    pub account_delay: Duration,
    pub cycle_delay: CycleDelay,
    pub show_exit_ip: bool,
}

/// Walks the accounts strictly one after another, forever, until cancelled.
pub struct AccountScheduler {
    clients: Vec<ApiClient>,
    settings: SchedulerSettings,
    reporter: Arc<dyn Reporter>,
    token: CancellationToken,
    cycles: u64,
}

impl AccountScheduler {
    /// Builds one client per account entry. Clients are reused across cycles.
    pub fn new(
        entries: Vec<AccountEntry>,
        client_settings: ClientSettings,
        settings: SchedulerSettings,
        reporter: Arc<dyn Reporter>,
        token: CancellationToken,
    ) -> Result<Self> {
        let factory = ProxyTransportFactory::new(client_settings.timeout);
        let mut clients = Vec::with_capacity(entries.len());
        for entry in entries {
            let transport = factory.create(entry.proxy.as_ref())?;
            clients.push(ApiClient::new(
                entry.credential,
                transport,
                client_settings.clone(),
            ));
        }
        Ok(Self::from_clients(clients, settings, reporter, token))
    }

    pub fn from_clients(
        clients: Vec<ApiClient>,
        settings: SchedulerSettings,
        reporter: Arc<dyn Reporter>,
        token: CancellationToken,
    ) -> Self {
        Self {
            clients,
            settings,
            reporter,
            token,
            cycles: 0,
        }
    }

    pub fn clients(&self) -> &[ApiClient] {
        &self.clients
    }

    /// Runs cycles until the token is cancelled. Returns the number of cycles started.
    pub async fn run(&mut self) -> u64 {
        info!(
            "Scheduler started: {} accounts, mode {:?}",
            self.clients.len(),
            self.settings.mode
        );

        while !self.token.is_cancelled() {
            let stats = self.run_cycle().await;

            if self.token.is_cancelled() {
                self.finish_cycle(stats, None);
                break;
            }

            let delay = self.settings.cycle_delay.next();
            self.finish_cycle(stats, Some(delay));
            if !self.pause(delay).await {
                break;
            }
        }

        self.reporter.report(&ReportEvent::Stopped {
            cycles: self.cycles,
        });
        self.cycles
    }

    /// Runs one cycle (`once`) or cycles until cancelled, raced against the
    /// shutdown grace period. An in-flight request never holds the process
    /// past `shutdown.terminated()`.
    pub async fn run_supervised(
        &mut self,
        once: bool,
        shutdown: &ShutdownController,
    ) -> RunOutcome {
        let work = async {
            if once {
                let stats = self.run_once().await;
                info!("Single cycle finished: {} ok / {} failed", stats.success, stats.failed);
            } else {
                let cycles = self.run().await;
                info!("Scheduler exited after {} cycles", cycles);
            }
        };

        tokio::select! {
            _ = work => RunOutcome::Completed,
            _ = shutdown.terminated() => {
                warn!("Grace period elapsed with a request in flight; exiting");
                RunOutcome::GraceElapsed
            }
        }
    }

    /// Runs a single cycle and reports it as final.
    pub async fn run_once(&mut self) -> CycleStats {
        let stats = self.run_cycle().await;
        self.finish_cycle(stats, None);
        stats
    }

    async fn run_cycle(&mut self) -> CycleStats {
        self.cycles += 1;
        let cycle = self.cycles;
        self.reporter.report(&ReportEvent::CycleStarted {
            cycle,
            at: Local::now(),
        });

        let mut stats = CycleStats::default();
        for index in 0..self.clients.len() {
            if self.token.is_cancelled() {
                info!("Shutdown requested; skipping remaining accounts");
                break;
            }
            if index > 0 && !self.pause(self.settings.account_delay).await {
                info!("Shutdown requested during account delay");
                break;
            }

            let span = tracing::info_span!("account", account_id = format!("{:03}", index + 1));
            if self.process_account(index).instrument(span).await {
                stats.success += 1;
            } else {
                stats.failed += 1;
            }
        }
        stats
    }

    /// One account's unit of work. Errors are reported, never propagated.
    async fn process_account(&mut self, index: usize) -> bool {
        let total = self.clients.len();
        let mode = self.settings.mode;
        let show_exit_ip = self.settings.show_exit_ip;
        let reporter = &self.reporter;
        let client = &mut self.clients[index];

        reporter.report(&ReportEvent::AccountStarted {
            index,
            total,
            label: client.label(),
            transport: client.transport().kind(),
            proxy: client.transport().proxy().map(|p| p.redacted()),
        });

        if mode == RunMode::Profile {
            match client.fetch_profile().await {
                Ok(profile) => reporter.report(&ReportEvent::Profile { index, profile }),
                Err(error) => {
                    reporter.report(&ReportEvent::AccountFailed {
                        index,
                        stage: Stage::Profile,
                        error,
                    });
                    return false;
                }
            }

            if show_exit_ip {
                match client.fetch_exit_ip().await {
                    Ok(ip) => reporter.report(&ReportEvent::ExitIp { index, ip }),
                    Err(e) => warn!("Exit IP lookup failed for {}: {}", client.label(), e),
                }
            }
        }

        match client.ping().await {
            Ok(result) => {
                reporter.report(&ReportEvent::Pinged { index, result });
                true
            }
            Err(error) => {
                reporter.report(&ReportEvent::AccountFailed {
                    index,
                    stage: Stage::Ping,
                    error,
                });
                false
            }
        }
    }

    fn finish_cycle(&self, stats: CycleStats, next_delay: Option<Duration>) {
        self.reporter.report(&ReportEvent::CycleFinished {
            cycle: self.cycles,
            stats,
            next_delay,
        });
    }

    /// Sleeps unless cancelled first. Returns false when cancelled.
    async fn pause(&self, duration: Duration) -> bool {
        if duration.is_zero() {
            return !self.token.is_cancelled();
        }
        tokio::select! {
            _ = self.token.cancelled() => false,
            _ = sleep(duration) => true,
        }
    }
}
