//! In-memory backend and collaborators for tests.
//!
//! [`RecordingConnector`] behaves like a database that accepts every statement: it records what
//! the executor sends, tracks how many connections are alive, and can be told to fail or panic
//! at a given step.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;

use crate::backend::{Connect, ProcedureConnection};
use crate::config::ConnectionInfo;
use crate::error::SprocError;
use crate::telemetry::{EventLog, Heartbeat, HeartbeatStatus, LogLevel};
use crate::translation::count_placeholders;
use crate::types::SqlValue;

/// Step at which a [`RecordingConnector`] misbehaves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Failure {
    Connect(String),
    Begin(String),
    Execute(String),
    Commit(String),
    /// Panic with this message while executing.
    Panic(String),
}

/// One call received by a recording connection, tagged with the connection number.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Begin { conn: usize },
    Execute { conn: usize, sql: String, params: Vec<SqlValue> },
    Commit { conn: usize },
    Query { conn: usize, sql: String },
}

type RowsFn = dyn Fn(&str, &[SqlValue]) -> u64 + Send + Sync;

#[derive(Clone)]
pub struct RecordingConnector {
    calls: Arc<Mutex<Vec<Call>>>,
    opened: Arc<AtomicUsize>,
    alive: Arc<AtomicUsize>,
    rows: Arc<RowsFn>,
    failure: Option<Failure>,
    catalog: Arc<Vec<String>>,
}

impl Default for RecordingConnector {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for RecordingConnector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordingConnector")
            .field("opened", &self.connections_opened())
            .field("alive", &self.connections_alive())
            .field("failure", &self.failure)
            .finish_non_exhaustive()
    }
}

impl RecordingConnector {
    #[must_use]
    pub fn new() -> Self {
        Self {
            calls: Arc::new(Mutex::new(Vec::new())),
            opened: Arc::new(AtomicUsize::new(0)),
            alive: Arc::new(AtomicUsize::new(0)),
            rows: Arc::new(|_, _| 0),
            failure: None,
            catalog: Arc::new(Vec::new()),
        }
    }

    /// Report `rows` affected rows for every statement.
    #[must_use]
    pub fn with_rows_affected(self, rows: u64) -> Self {
        self.with_rows_fn(move |_, _| rows)
    }

    /// Compute the affected-row count from the executed statement.
    #[must_use]
    pub fn with_rows_fn(
        mut self,
        rows: impl Fn(&str, &[SqlValue]) -> u64 + Send + Sync + 'static,
    ) -> Self {
        self.rows = Arc::new(rows);
        self
    }

    #[must_use]
    pub fn failing(mut self, failure: Failure) -> Self {
        self.failure = Some(failure);
        self
    }

    /// Names returned by catalog queries.
    #[must_use]
    pub fn with_catalog(mut self, names: &[&str]) -> Self {
        self.catalog = Arc::new(names.iter().map(|n| (*n).to_string()).collect());
        self
    }

    #[must_use]
    pub fn calls(&self) -> Vec<Call> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Statements executed, with their bound values.
    #[must_use]
    pub fn executed(&self) -> Vec<(String, Vec<SqlValue>)> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Execute { sql, params, .. } => Some((sql, params)),
                _ => None,
            })
            .collect()
    }

    #[must_use]
    pub fn commits(&self) -> usize {
        self.calls()
            .iter()
            .filter(|call| matches!(call, Call::Commit { .. }))
            .count()
    }

    #[must_use]
    pub fn connections_opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    /// Connections opened and not yet dropped.
    #[must_use]
    pub fn connections_alive(&self) -> usize {
        self.alive.load(Ordering::SeqCst)
    }

    fn fails_at(&self, step: impl Fn(&Failure) -> Option<&String>) -> Option<SprocError> {
        self.failure
            .as_ref()
            .and_then(step)
            .map(|msg| SprocError::ExecutionError(msg.clone()))
    }
}

#[async_trait]
impl Connect for RecordingConnector {
    type Connection = RecordingConnection;

    async fn connect(&self, _info: &ConnectionInfo) -> Result<RecordingConnection, SprocError> {
        if let Some(Failure::Connect(msg)) = &self.failure {
            return Err(SprocError::ConnectionError(msg.clone()));
        }
        let id = self.opened.fetch_add(1, Ordering::SeqCst);
        self.alive.fetch_add(1, Ordering::SeqCst);
        Ok(RecordingConnection {
            id,
            owner: self.clone(),
        })
    }
}

/// Connection handed out by [`RecordingConnector`].
pub struct RecordingConnection {
    id: usize,
    owner: RecordingConnector,
}

impl RecordingConnection {
    fn record(&self, call: Call) {
        self.owner
            .calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(call);
    }
}

impl Drop for RecordingConnection {
    fn drop(&mut self) {
        self.owner.alive.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl ProcedureConnection for RecordingConnection {
    async fn begin(&mut self) -> Result<(), SprocError> {
        if let Some(err) = self.owner.fails_at(|f| match f {
            Failure::Begin(msg) => Some(msg),
            _ => None,
        }) {
            return Err(err);
        }
        self.record(Call::Begin { conn: self.id });
        Ok(())
    }

    async fn execute(&mut self, sql: &str, params: &[SqlValue]) -> Result<u64, SprocError> {
        if let Some(Failure::Panic(msg)) = &self.owner.failure {
            panic!("{msg}");
        }
        if let Some(err) = self.owner.fails_at(|f| match f {
            Failure::Execute(msg) => Some(msg),
            _ => None,
        }) {
            return Err(err);
        }
        let placeholders = count_placeholders(sql);
        if placeholders != params.len() {
            return Err(SprocError::ExecutionError(format!(
                "statement has {placeholders} placeholders but {} values were bound",
                params.len()
            )));
        }
        self.record(Call::Execute {
            conn: self.id,
            sql: sql.to_string(),
            params: params.to_vec(),
        });
        Ok((self.owner.rows)(sql, params))
    }

    async fn commit(&mut self) -> Result<(), SprocError> {
        if let Some(err) = self.owner.fails_at(|f| match f {
            Failure::Commit(msg) => Some(msg),
            _ => None,
        }) {
            return Err(err);
        }
        self.record(Call::Commit { conn: self.id });
        Ok(())
    }

    async fn query_column(&mut self, sql: &str) -> Result<Vec<String>, SprocError> {
        if let Some(err) = self.owner.fails_at(|f| match f {
            Failure::Execute(msg) => Some(msg),
            _ => None,
        }) {
            return Err(err);
        }
        self.record(Call::Query {
            conn: self.id,
            sql: sql.to_string(),
        });
        Ok(self.owner.catalog.as_ref().clone())
    }
}

/// Event or heartbeat captured by [`RecordingTelemetry`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Recorded {
    Event {
        level: LogLevel,
        message: String,
        context: String,
    },
    Heartbeat {
        service_name: String,
        status: HeartbeatStatus,
        details: String,
    },
}

/// Collaborator that keeps everything it is sent.
#[derive(Debug, Clone, Default)]
pub struct RecordingTelemetry {
    recorded: Arc<Mutex<Vec<Recorded>>>,
}

impl RecordingTelemetry {
    #[must_use]
    pub fn recorded(&self) -> Vec<Recorded> {
        self.recorded
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn push(&self, entry: Recorded) {
        self.recorded
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(entry);
    }
}

impl EventLog for RecordingTelemetry {
    fn log_event(&self, level: LogLevel, message: &str, context: &str) {
        self.push(Recorded::Event {
            level,
            message: message.to_string(),
            context: context.to_string(),
        });
    }
}

impl Heartbeat for RecordingTelemetry {
    fn send_heartbeat(&self, service_name: &str, status: HeartbeatStatus, details: &str) {
        self.push(Recorded::Heartbeat {
            service_name: service_name.to_string(),
            status,
            details: details.to_string(),
        });
    }
}
