use std::fmt;

use clap::ValueEnum;

use crate::error::SprocError;

/// Connection descriptor handed to a backend on every call.
///
/// The contents are opaque to the executor; for SQL Server it is an ADO.NET-style connection
/// string (`server=tcp:host,1433;database=..;user id=..;password=..`). `Debug` never prints it
/// since it usually carries a password.
#[derive(Clone, PartialEq, Eq)]
pub struct ConnectionInfo {
    connection_string: String,
}

impl ConnectionInfo {
    /// # Errors
    /// Returns `SprocError::ConfigError` if the connection string is empty.
    pub fn new(connection_string: impl Into<String>) -> Result<Self, SprocError> {
        let connection_string = connection_string.into();
        if connection_string.trim().is_empty() {
            return Err(SprocError::ConfigError(
                "connection string is empty".to_string(),
            ));
        }
        Ok(Self { connection_string })
    }

    #[must_use]
    pub fn connection_string(&self) -> &str {
        &self.connection_string
    }
}

impl fmt::Debug for ConnectionInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionInfo")
            .field("connection_string", &"<redacted>")
            .finish()
    }
}

/// What to do with a parameter whose type tag is not one of the known tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum UnknownTypePolicy {
    /// Bind the raw value unchanged and log a warning.
    #[default]
    PassThrough,
    /// Fail the call with a value error.
    Reject,
}

/// Per-executor options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ExecOptions {
    pub unknown_types: UnknownTypePolicy,
}

impl ExecOptions {
    #[must_use]
    pub fn with_unknown_types(mut self, policy: UnknownTypePolicy) -> Self {
        self.unknown_types = policy;
        self
    }
}
