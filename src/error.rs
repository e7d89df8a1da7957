use serde::Serialize;
use thiserror::Error;

use crate::types::ParamType;

#[derive(Debug, Error)]
pub enum SprocError {
    #[error("Each parameter value must be a (type, actual_value) pair; `{name}` was {found}")]
    InvalidParameterShape { name: String, found: String },

    #[error("Procedure name must not be empty")]
    InvalidProcedureName,

    #[error("Could not convert parameter `{name}` to {target}: {reason}")]
    TypeCoercion {
        name: String,
        target: ParamType,
        reason: String,
    },

    #[error("Unknown parameter type `{tag}` for `{name}`")]
    UnknownParamType { name: String, tag: String },

    #[cfg(feature = "mssql")]
    #[error(transparent)]
    MssqlError(#[from] tiberius::error::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("SQL execution error: {0}")]
    ExecutionError(String),

    #[error("{0}")]
    Unexpected(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Coarse error categories surfaced on an [`ExecutionResult`](crate::ExecutionResult).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// A parameter entry (or the procedure name) did not have the expected shape.
    InvalidParameterShape,
    /// A raw value could not be converted to its declared type.
    TypeCoercion,
    /// Connectivity, syntax, constraint, or any other driver-reported failure.
    Database,
    /// Anything not otherwise classified, including panics.
    Unexpected,
}

impl ErrorKind {
    /// Prefix placed in front of the error detail in a failed result.
    #[must_use]
    pub fn prefix(self) -> &'static str {
        match self {
            ErrorKind::InvalidParameterShape | ErrorKind::TypeCoercion => "Value error",
            ErrorKind::Database => "Database error",
            ErrorKind::Unexpected => "An unexpected error occurred",
        }
    }
}

impl SprocError {
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            SprocError::InvalidParameterShape { .. } | SprocError::InvalidProcedureName => {
                ErrorKind::InvalidParameterShape
            }
            SprocError::TypeCoercion { .. } | SprocError::UnknownParamType { .. } => {
                ErrorKind::TypeCoercion
            }
            #[cfg(feature = "mssql")]
            SprocError::MssqlError(_) => ErrorKind::Database,
            SprocError::ConfigError(_)
            | SprocError::ConnectionError(_)
            | SprocError::ExecutionError(_) => ErrorKind::Database,
            SprocError::Unexpected(_) => ErrorKind::Unexpected,
        }
    }

    /// Wrap a message as an unexpected error.
    pub fn unexpected(msg: impl Into<String>) -> Self {
        let msg: String = msg.into();
        SprocError::Unexpected(msg.into())
    }
}
