//! Event-log and heartbeat collaborators.
//!
//! Where events end up (a log table, a monitoring service) is owned by whoever implements these
//! traits. [`TracingTelemetry`] forwards both to `tracing`.

use std::fmt;

/// Severity of a logged event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warning => "WARNING",
            LogLevel::Error => "ERROR",
        })
    }
}

/// Liveness state reported by a heartbeat.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeartbeatStatus {
    Running,
    Stopped,
    Failed,
}

impl fmt::Display for HeartbeatStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            HeartbeatStatus::Running => "RUNNING",
            HeartbeatStatus::Stopped => "STOPPED",
            HeartbeatStatus::Failed => "FAILED",
        })
    }
}

pub trait EventLog: Send + Sync {
    fn log_event(&self, level: LogLevel, message: &str, context: &str);
}

pub trait Heartbeat: Send + Sync {
    fn send_heartbeat(&self, service_name: &str, status: HeartbeatStatus, details: &str);
}

/// Sends events and heartbeats to the active `tracing` subscriber.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingTelemetry;

impl EventLog for TracingTelemetry {
    fn log_event(&self, level: LogLevel, message: &str, context: &str) {
        match level {
            LogLevel::Debug => tracing::debug!(context, "{message}"),
            LogLevel::Info => tracing::info!(context, "{message}"),
            LogLevel::Warning => tracing::warn!(context, "{message}"),
            LogLevel::Error => tracing::error!(context, "{message}"),
        }
    }
}

impl Heartbeat for TracingTelemetry {
    fn send_heartbeat(&self, service_name: &str, status: HeartbeatStatus, details: &str) {
        tracing::info!(service = service_name, status = %status, details, "heartbeat");
    }
}
