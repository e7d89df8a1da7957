use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures_util::FutureExt;

use crate::backend::{Connect, Tx};
use crate::coerce::coerce_all;
use crate::config::{ConnectionInfo, ExecOptions};
use crate::error::SprocError;
use crate::result::ExecutionResult;
use crate::statement::BoundStatement;
use crate::telemetry::{EventLog, LogLevel, TracingTelemetry};
use crate::types::{ParameterSet, ProcedureName};

/// Runs stored procedures through a backend and reports every outcome as an
/// [`ExecutionResult`].
///
/// Each call opens its own connection and transaction, so one executor can be shared across
/// threads and tasks.
/// ```rust,no_run
/// # #[cfg(feature = "mssql")]
/// # async fn demo() -> Result<(), sproc_middleware::SprocError> {
/// use serde_json::json;
/// use sproc_middleware::prelude::*;
///
/// let info = ConnectionInfo::new("server=tcp:db.local,1433;database=rpa;user id=svc;password=secret")?;
/// let executor = Executor::new(MssqlConnector);
/// let params = ParameterSet::new()
///     .with("FormId", ParamType::Int, json!(42))
///     .with("Payload", ParamType::Json, json!({"state": "done"}));
/// let result = executor
///     .execute(&info, &ProcedureName::new("journalizing.sp_MarkForm")?, &params)
///     .await;
/// if !result.success() {
///     eprintln!("{}", result.error_message().unwrap_or_default());
/// }
/// # Ok(())
/// # }
/// ```
pub struct Executor<K: Connect> {
    connector: K,
    options: ExecOptions,
    events: Arc<dyn EventLog>,
    log_context: String,
}

impl<K: Connect> Executor<K> {
    pub fn new(connector: K) -> Self {
        Self {
            connector,
            options: ExecOptions::default(),
            events: Arc::new(TracingTelemetry),
            log_context: String::new(),
        }
    }

    #[must_use]
    pub fn with_options(mut self, options: ExecOptions) -> Self {
        self.options = options;
        self
    }

    /// Report outcomes to `events`, tagged with `context`.
    #[must_use]
    pub fn with_event_log(mut self, events: Arc<dyn EventLog>, context: impl Into<String>) -> Self {
        self.events = events;
        self.log_context = context.into();
        self
    }

    #[must_use]
    pub fn options(&self) -> ExecOptions {
        self.options
    }

    pub fn connector(&self) -> &K {
        &self.connector
    }

    /// Execute `procedure` and return the affected-row count or the typed error.
    ///
    /// Parameters are bound in name order. The connection and transaction are released on
    /// every path; nothing is committed unless execution succeeds.
    ///
    /// # Errors
    /// Returns `SprocError` for malformed or unconvertible parameters and for any backend
    /// failure.
    pub async fn try_execute(
        &self,
        info: &ConnectionInfo,
        procedure: &ProcedureName,
        params: &ParameterSet,
    ) -> Result<u64, SprocError> {
        let mut conn = self.connector.connect(info).await?;
        let mut tx = Tx::begin(&mut conn).await?;

        let coerced = if params.is_empty() {
            Vec::new()
        } else {
            coerce_all(params, self.options.unknown_types)?
        };
        let bound = BoundStatement::from_coerced(procedure, coerced);
        tracing::debug!(sql = %bound.sql, params = bound.params.len(), "executing stored procedure");

        let rows = tx.execute(&bound.sql, &bound.params).await?;
        tx.commit().await?;
        Ok(rows)
    }

    /// Execute `procedure`; never fails and never panics.
    ///
    /// Errors, including panics raised by the backend, come back as a failed result whose
    /// message is prefixed by its category (`Value error`, `Database error`,
    /// `An unexpected error occurred`).
    #[tracing::instrument(skip(self, info, params), fields(procedure = %procedure))]
    pub async fn execute(
        &self,
        info: &ConnectionInfo,
        procedure: &ProcedureName,
        params: &ParameterSet,
    ) -> ExecutionResult {
        let outcome = AssertUnwindSafe(self.try_execute(info, procedure, params))
            .catch_unwind()
            .await
            .unwrap_or_else(|panic| Err(SprocError::unexpected(panic_message(panic.as_ref()))));

        let result = ExecutionResult::from(outcome);
        self.report(procedure, &result);
        result
    }

    /// Blocking form of [`execute`](Self::execute) for synchronous callers.
    ///
    /// Runs the call on a private current-thread runtime. Must not be called from inside an
    /// async runtime; doing so returns a failed result instead of blocking.
    pub fn execute_blocking(
        &self,
        info: &ConnectionInfo,
        procedure: &ProcedureName,
        params: &ParameterSet,
    ) -> ExecutionResult {
        if tokio::runtime::Handle::try_current().is_ok() {
            let err = SprocError::unexpected(
                "execute_blocking called from within an async runtime; use execute instead",
            );
            return ExecutionResult::failed(&err);
        }

        match tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
        {
            Ok(rt) => rt.block_on(self.execute(info, procedure, params)),
            Err(e) => ExecutionResult::failed(&SprocError::Unexpected(Box::new(e))),
        }
    }

    fn report(&self, procedure: &ProcedureName, result: &ExecutionResult) {
        match (result.rows_affected(), result.error_message()) {
            (Some(rows), _) => self.events.log_event(
                LogLevel::Info,
                &format!("Executed {procedure}: {rows} rows affected"),
                &self.log_context,
            ),
            (None, Some(message)) => self.events.log_event(
                LogLevel::Error,
                &format!("Executing {procedure} failed: {message}"),
                &self.log_context,
            ),
            (None, None) => {}
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "panic with a non-string payload".to_string()
    }
}
