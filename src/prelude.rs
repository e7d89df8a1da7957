//! Convenient imports for common functionality.

pub use crate::backend::{Connect, ProcedureConnection};
pub use crate::coerce::coerce;
pub use crate::config::{ConnectionInfo, ExecOptions, UnknownTypePolicy};
pub use crate::error::{ErrorKind, SprocError};
pub use crate::executor::Executor;
pub use crate::lister::ProcedureLister;
pub use crate::result::ExecutionResult;
pub use crate::statement::{BoundStatement, build_statement};
pub use crate::telemetry::{EventLog, Heartbeat, HeartbeatStatus, LogLevel, TracingTelemetry};
pub use crate::types::{ParamType, ParameterSet, ParameterSpec, ProcedureName, SqlValue};

#[cfg(feature = "mssql")]
pub use crate::mssql::{MssqlConnector, MssqlOptions, MssqlOptionsBuilder};
