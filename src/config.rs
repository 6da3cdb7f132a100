// Copyright (c) 2025 - Cowboy AI, Inc.
//! Service Configuration
//!
//! Configuration is an explicit value handed to constructors. The binary
//! builds it from `<PREFIX>_*` environment variables:
//!
//! | variable                | field                      | default                 |
//! |-------------------------|----------------------------|-------------------------|
//! | `_LOG_LEVEL`            | `log_level`                | `info`                  |
//! | `_NETBOX_ENDPOINT`      | `netbox.endpoint`          | `http://localhost:8000` |
//! | `_NETBOX_TOKEN`         | `netbox.api_token`         | empty                   |
//! | `_NETBOX_TIMEOUT_SECS`  | `netbox.timeout_secs`      | `30`                    |
//! | `_NATS_URL`             | `nats.servers` (comma list)| `nats://localhost:4222` |
//! | `_NATS_SUBJECT`         | `nats.subject`             | `diode.discovery.>`     |
//! | `_CONCURRENCY`          | `reconcile.concurrency`    | `4`                     |
//! | `_REMOTE_RETRIES`       | `reconcile.remote_retries` | `1`                     |

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Environment prefix used by the service binary
pub const DEFAULT_ENV_PREFIX: &str = "DIODE_SERVICE";

/// Configuration error
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid value for {variable}: {value:?} ({reason})")]
    InvalidValue {
        variable: String,
        value: String,
        reason: String,
    },

    #[error("Invalid NetBox endpoint {0:?}")]
    InvalidEndpoint(String),

    #[error("{0} must not be empty")]
    Empty(&'static str),

    #[error("{0} must be greater than zero")]
    Zero(&'static str),
}

/// Log verbosity accepted by the service
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug,
    #[default]
    Info,
    Warn,
}

impl LogLevel {
    /// Parse a level name; anything unrecognized is `Info`
    pub fn parse_lenient(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "debug" => LogLevel::Debug,
            "warn" => LogLevel::Warn,
            _ => LogLevel::Info,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
        }
    }
}

/// Configuration for the NetBox connection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetBoxConfig {
    /// NetBox base URL (e.g., "http://netbox.local:8000")
    pub endpoint: String,

    /// API token sent as `Authorization: Token <token>`
    #[serde(default)]
    pub api_token: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

fn default_timeout() -> u64 {
    30
}

impl Default for NetBoxConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:8000".to_string(),
            api_token: String::new(),
            timeout_secs: default_timeout(),
        }
    }
}

/// Configuration for the NATS discovery subscription
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NatsSourceConfig {
    /// NATS server URLs
    pub servers: Vec<String>,
    /// Subject carrying discovery batches, wildcards allowed
    pub subject: String,
    /// Client name reported to the server
    pub name: String,
    pub connect_timeout_secs: u64,
    pub request_timeout_secs: u64,
}

impl NatsSourceConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Default for NatsSourceConfig {
    fn default() -> Self {
        Self {
            servers: vec!["nats://localhost:4222".to_string()],
            subject: "diode.discovery.>".to_string(),
            name: "netbox-reconciler".to_string(),
            connect_timeout_secs: 10,
            request_timeout_secs: 5,
        }
    }
}

/// Tuning for the reconcile pipeline
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconcileConfig {
    /// Upserts dispatched concurrently within a stage
    pub concurrency: usize,
    /// Additional attempts after a retryable remote failure
    pub remote_retries: u32,
    /// Capacity of the batch report broadcast channel
    pub report_buffer: usize,
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            concurrency: 4,
            remote_retries: 1,
            report_buffer: 64,
        }
    }
}

/// Complete service configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceConfig {
    #[serde(default)]
    pub log_level: LogLevel,
    #[serde(default)]
    pub netbox: NetBoxConfig,
    #[serde(default)]
    pub nats: NatsSourceConfig,
    #[serde(default)]
    pub reconcile: ReconcileConfig,
}

impl ServiceConfig {
    /// Load from `<prefix>_*` environment variables, then validate
    pub fn from_env(prefix: &str) -> Result<Self, ConfigError> {
        Self::from_lookup(prefix, |name| std::env::var(name).ok())
    }

    /// Load from an arbitrary variable lookup, then validate
    pub fn from_lookup<F>(prefix: &str, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |suffix: &str| {
            let name = format!("{}_{}", prefix, suffix);
            lookup(&name).map(|value| (name, value))
        };

        let mut config = Self::default();

        if let Some((_, value)) = var("LOG_LEVEL") {
            config.log_level = LogLevel::parse_lenient(&value);
        }
        if let Some((_, value)) = var("NETBOX_ENDPOINT") {
            config.netbox.endpoint = value.trim().to_string();
        }
        if let Some((_, value)) = var("NETBOX_TOKEN") {
            config.netbox.api_token = value.trim().to_string();
        }
        if let Some((name, value)) = var("NETBOX_TIMEOUT_SECS") {
            config.netbox.timeout_secs = parse_number(&name, &value)?;
        }
        if let Some((_, value)) = var("NATS_URL") {
            config.nats.servers = value
                .split(',')
                .map(str::trim)
                .filter(|server| !server.is_empty())
                .map(str::to_string)
                .collect();
        }
        if let Some((_, value)) = var("NATS_SUBJECT") {
            config.nats.subject = value.trim().to_string();
        }
        if let Some((name, value)) = var("CONCURRENCY") {
            config.reconcile.concurrency = parse_number(&name, &value)?;
        }
        if let Some((name, value)) = var("REMOTE_RETRIES") {
            config.reconcile.remote_retries = parse_number(&name, &value)?;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let endpoint = self.netbox.endpoint.trim();
        if endpoint.is_empty() {
            return Err(ConfigError::Empty("netbox.endpoint"));
        }
        let url = Url::parse(endpoint)
            .map_err(|_| ConfigError::InvalidEndpoint(endpoint.to_string()))?;
        if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
            return Err(ConfigError::InvalidEndpoint(endpoint.to_string()));
        }

        if self.netbox.timeout_secs == 0 {
            return Err(ConfigError::Zero("netbox.timeout_secs"));
        }
        if self.nats.servers.is_empty() {
            return Err(ConfigError::Empty("nats.servers"));
        }
        if self.nats.subject.trim().is_empty() {
            return Err(ConfigError::Empty("nats.subject"));
        }
        if self.reconcile.concurrency == 0 {
            return Err(ConfigError::Zero("reconcile.concurrency"));
        }
        if self.reconcile.report_buffer == 0 {
            return Err(ConfigError::Zero("reconcile.report_buffer"));
        }
        Ok(())
    }
}

fn parse_number<N>(variable: &str, value: &str) -> Result<N, ConfigError>
where
    N: FromStr,
    N::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e: N::Err| ConfigError::InvalidValue {
            variable: variable.to_string(),
            value: value.to_string(),
            reason: e.to_string(),
        })
}
