use crate::client::ClientSettings;
use crate::scheduler::{CycleDelay, RunMode, SchedulerSettings};
use anyhow::Result;
use ::config::{Config, Environment, File};
use core_logic::{ConfigError, FileAccountSource, ProxySource};
use serde::Deserialize;
use std::time::Duration;

pub const DEFAULT_API_BASE_URL: &str = "https://nodego.ai/api";
pub const DEFAULT_IP_CHECK_URL: &str = "http://httpbin.org/ip";

#[derive(Debug, Deserialize, Clone)]
pub struct PingerConfig {
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    #[serde(default = "default_ip_check_url")]
    pub ip_check_url: String,
    #[serde(default = "default_credentials_file")]
    pub credentials_file: String,
    #[serde(default = "default_proxy_file")]
    pub proxy_file: String,
    #[serde(default = "default_proxy_json_file")]
    pub proxy_json_file: String,
    #[serde(default)]
    pub proxy_source: ProxySource,
    #[serde(default)]
    pub mode: RunMode,
    #[serde(default = "default_cycle_delay_secs")]
    pub cycle_delay_secs: u64,
    pub cycle_delay_min_secs: Option<u64>,
    pub cycle_delay_max_secs: Option<u64>,
    #[serde(default = "default_account_delay_ms")]
    pub account_delay_ms: u64,
    #[serde(default = "default_ping_interval_ms")]
    pub ping_interval_ms: u64,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_true")]
    pub randomize_user_agent: bool,
    #[serde(default = "default_shutdown_grace_ms")]
    pub shutdown_grace_ms: u64,
    #[serde(default = "default_true")]
    pub show_exit_ip: bool,
}

fn default_api_base_url() -> String {
    DEFAULT_API_BASE_URL.to_string()
}
fn default_ip_check_url() -> String {
    DEFAULT_IP_CHECK_URL.to_string()
}
fn default_credentials_file() -> String {
    "data.txt".to_string()
}
fn default_proxy_file() -> String {
    "proxies.txt".to_string()
}
fn default_proxy_json_file() -> String {
    "proxy.json".to_string()
}
fn default_cycle_delay_secs() -> u64 {
    15
}
fn default_account_delay_ms() -> u64 {
    5000
}
fn default_ping_interval_ms() -> u64 {
    3000
}
fn default_request_timeout_secs() -> u64 {
    30
}
fn default_shutdown_grace_ms() -> u64 {
    1000
}
fn default_true() -> bool {
    true
}

impl Default for PingerConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            ip_check_url: default_ip_check_url(),
            credentials_file: default_credentials_file(),
            proxy_file: default_proxy_file(),
            proxy_json_file: default_proxy_json_file(),
            proxy_source: ProxySource::default(),
            mode: RunMode::default(),
            cycle_delay_secs: default_cycle_delay_secs(),
            cycle_delay_min_secs: None,
            cycle_delay_max_secs: None,
            account_delay_ms: default_account_delay_ms(),
            ping_interval_ms: default_ping_interval_ms(),
            request_timeout_secs: default_request_timeout_secs(),
            randomize_user_agent: true,
            shutdown_grace_ms: default_shutdown_grace_ms(),
            show_exit_ip: true,
        }
    }
}

impl PingerConfig {
    /// Loads `path` (optional) with `NODEGO_*` environment overrides on top.
    pub fn load(path: &str) -> Result<Self> {
        let settings = Config::builder()
            .add_source(File::with_name(path).required(false))
            .add_source(Environment::with_prefix("NODEGO").try_parsing(true))
            .build()?;

        let config: PingerConfig = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api_base_url.trim().is_empty() {
            return Err(ConfigError::MissingField {
                field: "api_base_url".to_string(),
            });
        }
        if url::Url::parse(&self.api_base_url).is_err() {
            return Err(ConfigError::InvalidValue {
                field: "api_base_url".to_string(),
                reason: format!("'{}' is not a URL", self.api_base_url),
            });
        }
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "request_timeout_secs".to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }
        if let (Some(min), Some(max)) = (self.cycle_delay_min_secs, self.cycle_delay_max_secs) {
            if min > max {
                return Err(ConfigError::InvalidValue {
                    field: "cycle_delay_min_secs".to_string(),
                    reason: format!("min ({}) is greater than max ({})", min, max),
                });
            }
        }
        Ok(())
    }

    pub fn cycle_delay(&self) -> CycleDelay {
        match (self.cycle_delay_min_secs, self.cycle_delay_max_secs) {
            (Some(min), Some(max)) => CycleDelay::Random {
                min: Duration::from_secs(min),
                max: Duration::from_secs(max),
            },
            _ => CycleDelay::Fixed(Duration::from_secs(self.cycle_delay_secs)),
        }
    }

    pub fn client_settings(&self) -> ClientSettings {
        ClientSettings {
            base_url: self.api_base_url.trim_end_matches('/').to_string(),
            ip_check_url: self.ip_check_url.clone(),
            timeout: Duration::from_secs(self.request_timeout_secs),
            ping_interval: Duration::from_millis(self.ping_interval_ms),
            randomize_user_agent: self.randomize_user_agent,
        }
    }

    pub fn scheduler_settings(&self) -> SchedulerSettings {
        SchedulerSettings {
            mode: self.mode,
            account_delay: Duration::from_millis(self.account_delay_ms),
            cycle_delay: self.cycle_delay(),
            show_exit_ip: self.show_exit_ip,
        }
    }

    pub fn account_source(&self) -> FileAccountSource {
        FileAccountSource {
            credentials_file: self.credentials_file.clone(),
            proxy_file: self.proxy_file.clone(),
            proxy_json_file: self.proxy_json_file.clone(),
            proxy_source: self.proxy_source,
        }
    }
}
