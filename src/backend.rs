//! Driver seam used by the executor and the procedure lister.
//!
//! A [`Connect`] implementation opens one connection per call. The connection is owned by the
//! call and dropped on every exit path; statements run inside a [`Tx`] borrowed from it.

use async_trait::async_trait;

use crate::config::ConnectionInfo;
use crate::error::SprocError;
use crate::types::SqlValue;

/// Opens connections for a backend.
#[async_trait]
pub trait Connect: Send + Sync {
    type Connection: ProcedureConnection;

    /// Open a new connection described by `info`.
    async fn connect(&self, info: &ConnectionInfo) -> Result<Self::Connection, SprocError>;
}

/// The operations a backend connection must support.
#[async_trait]
pub trait ProcedureConnection: Send {
    /// Start an explicit transaction.
    async fn begin(&mut self) -> Result<(), SprocError>;

    /// Run `sql` with `?` placeholders bound positionally to `params` and return the number of
    /// rows the driver reports as affected.
    async fn execute(&mut self, sql: &str, params: &[SqlValue]) -> Result<u64, SprocError>;

    /// Commit the open transaction.
    async fn commit(&mut self) -> Result<(), SprocError>;

    /// Run a query and return the first column of every row as text.
    async fn query_column(&mut self, sql: &str) -> Result<Vec<String>, SprocError>;
}

/// Open transaction on a borrowed connection.
///
/// Dropping a `Tx` without calling [`commit`](Tx::commit) issues no rollback; the owning
/// connection is dropped right after, and the server discards the uncommitted work when the
/// session closes.
pub struct Tx<'c, C: ProcedureConnection + ?Sized> {
    conn: &'c mut C,
    open: bool,
}

impl<'c, C: ProcedureConnection + ?Sized> Tx<'c, C> {
    /// Begin a transaction on `conn`.
    ///
    /// # Errors
    /// Returns the backend error if the transaction cannot be started.
    pub async fn begin(conn: &'c mut C) -> Result<Self, SprocError> {
        conn.begin().await?;
        Ok(Self { conn, open: true })
    }

    /// # Errors
    /// Returns the backend error if execution fails.
    pub async fn execute(&mut self, sql: &str, params: &[SqlValue]) -> Result<u64, SprocError> {
        self.conn.execute(sql, params).await
    }

    /// # Errors
    /// Returns the backend error if the commit fails.
    pub async fn commit(mut self) -> Result<(), SprocError> {
        self.conn.commit().await?;
        self.open = false;
        Ok(())
    }
}

impl<C: ProcedureConnection + ?Sized> Drop for Tx<'_, C> {
    fn drop(&mut self) {
        if self.open {
            tracing::debug!("transaction released without commit");
        }
    }
}
