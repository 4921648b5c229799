// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
use crate::errors::ReporterError;
use std::path::PathBuf;
use std::time::Duration;

/// Which side of the cluster this process is on. Fixed for the process lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Owns the event log and the reporter actor
    Master,
    /// Forwards events to the master
    Worker,
}

/// What a full mailbox does to a sender.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backpressure {
    /// Sender waits for capacity
    Block,
    /// Event is discarded and a warning logged
    DropWithWarning,
}

#[derive(Debug, Clone)]
pub struct ReporterConfig {
    pub role: Role,
    pub enabled: bool,
    pub checksumming_enabled: bool,
    /// Master's reporting endpoint. The master binds it, workers connect to it.
    pub host: String,
    pub port: Option<u16>,
    pub event_log_path: PathBuf,
    pub mailbox_capacity: usize,
    pub backpressure: Backpressure,
    pub connect_timeout: Duration,
    pub connect_attempts: u32,
    pub retry_backoff: Duration,
    pub stop_timeout: Duration,
}

impl Default for ReporterConfig {
    fn default() -> Self {
        Self {
            role: Role::Master,
            enabled: true,
            checksumming_enabled: true,
            host: "127.0.0.1".to_string(),
            port: None,
            event_log_path: PathBuf::from("events.log"),
            mailbox_capacity: 1024,
            backpressure: Backpressure::Block,
            connect_timeout: Duration::from_secs(5),
            connect_attempts: 3,
            retry_backoff: Duration::from_millis(200),
            stop_timeout: Duration::from_secs(10),
        }
    }
}

impl ReporterConfig {
    pub fn master(port: u16) -> Self {
        Self {
            role: Role::Master,
            port: Some(port),
            ..Default::default()
        }
    }

    pub fn worker(host: impl Into<String>, port: u16) -> Self {
        Self {
            role: Role::Worker,
            host: host.into(),
            port: Some(port),
            ..Default::default()
        }
    }

    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Default::default()
        }
    }

    /// Read the process environment once. Unset variables keep their defaults.
    ///
    /// `REPLAY_ROLE` (master|worker), `REPLAY_ENABLED`, `REPLAY_CHECKSUMS`,
    /// `REPLAY_HOST`, `REPLAY_PORT`, `REPLAY_EVENT_LOG`.
    pub fn from_env() -> Result<Self, ReporterError> {
        let mut cfg = Self::default();

        if let Ok(role) = std::env::var("REPLAY_ROLE") {
            cfg.role = match role.to_ascii_lowercase().as_str() {
                "master" => Role::Master,
                "worker" => Role::Worker,
                other => {
                    return Err(ReporterError::Configuration(format!("unknown role '{other}'")));
                }
            };
        }
        if let Ok(v) = std::env::var("REPLAY_ENABLED") {
            cfg.enabled = parse_flag("REPLAY_ENABLED", &v)?;
        }
        if let Ok(v) = std::env::var("REPLAY_CHECKSUMS") {
            cfg.checksumming_enabled = parse_flag("REPLAY_CHECKSUMS", &v)?;
        }
        if let Ok(host) = std::env::var("REPLAY_HOST") {
            cfg.host = host;
        }
        if let Ok(port) = std::env::var("REPLAY_PORT") {
            let port = port
                .parse::<u16>()
                .map_err(|e| ReporterError::Configuration(format!("REPLAY_PORT '{port}': {e}")))?;
            cfg.port = Some(port);
        }
        if let Ok(path) = std::env::var("REPLAY_EVENT_LOG") {
            cfg.event_log_path = PathBuf::from(path);
        }

        Ok(cfg)
    }

    /// Check the settings the configured role depends on.
    ///
    /// A disabled reporter needs nothing. Port 0 asks the OS for a free port
    /// and is only meaningful on the master.
    pub fn validate(&self) -> Result<(), ReporterError> {
        if !self.enabled {
            return Ok(());
        }
        if self.host.trim().is_empty() {
            return Err(ReporterError::Configuration("reporting host is empty".into()));
        }
        match (self.role, self.port) {
            (_, None) => {
                return Err(ReporterError::Configuration(format!(
                    "{:?} reporter requires a port",
                    self.role
                )));
            }
            (Role::Worker, Some(0)) => {
                return Err(ReporterError::Configuration("worker cannot connect to port 0".into()));
            }
            _ => {}
        }
        if self.mailbox_capacity == 0 {
            return Err(ReporterError::Configuration("mailbox capacity must be positive".into()));
        }
        if self.connect_attempts == 0 {
            return Err(ReporterError::Configuration("connect_attempts must be at least 1".into()));
        }
        Ok(())
    }

    /// `host:port` of the master endpoint. Call after `validate`.
    pub fn endpoint(&self) -> Result<String, ReporterError> {
        let port = self
            .port
            .ok_or_else(|| ReporterError::Configuration("reporting port is not set".into()))?;
        Ok(format!("{}:{}", self.host, port))
    }
}

fn parse_flag(name: &str, value: &str) -> Result<bool, ReporterError> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ReporterError::Configuration(format!("{name} must be a boolean, got '{value}'"))),
    }
}
