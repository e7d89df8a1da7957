//! Execute SQL Server stored procedures with typed, named parameters and get a structured
//! [`ExecutionResult`] back instead of an error.
//!
//! ```rust,no_run
//! # #[cfg(feature = "mssql")]
//! # fn demo() -> Result<(), sproc_middleware::SprocError> {
//! use serde_json::json;
//! use sproc_middleware::prelude::*;
//!
//! let info = ConnectionInfo::new(std::env::var("DbConnectionString").unwrap_or_default())?;
//! let params = ParameterSet::from_json(&json!({
//!     "FormId": ["int", "1042"],
//!     "PurgedAt": ["datetime", "2024-05-01T08:00:00"],
//! }))?;
//! let result = Executor::new(MssqlConnector).execute_blocking(
//!     &info,
//!     &ProcedureName::new("journalizing.sp_UpdatePurgeMarker")?,
//!     &params,
//! );
//! println!("{}", serde_json::to_string(&result).unwrap_or_default());
//! # Ok(())
//! # }
//! ```

pub mod backend;
pub mod coerce;
pub mod config;
pub mod error;
pub mod executor;
pub mod lister;
pub mod prelude;
pub mod result;
pub mod statement;
pub mod telemetry;
pub mod translation;
pub mod types;

#[cfg(feature = "mssql")]
pub mod mssql;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use config::{ConnectionInfo, ExecOptions, UnknownTypePolicy};
pub use error::{ErrorKind, SprocError};
pub use executor::Executor;
pub use lister::ProcedureLister;
pub use result::ExecutionResult;
pub use types::{ParamType, ParameterSet, ParameterSpec, ProcedureName, SqlValue};

#[cfg(feature = "mssql")]
pub use mssql::MssqlConnector;
