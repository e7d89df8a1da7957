use crate::backend::{Connect, ProcedureConnection};
use crate::config::ConnectionInfo;
use crate::error::SprocError;

const LIST_SQL: &str = "SELECT name FROM sys.procedures";
const LIST_QUALIFIED_SQL: &str = "SELECT SCHEMA_NAME(schema_id) + '.' + name FROM sys.procedures";

/// Reads stored-procedure names from the catalog.
///
/// Opens its own connection per call, independent of any [`Executor`](crate::Executor).
#[derive(Debug, Clone, Default)]
pub struct ProcedureLister<K: Connect> {
    connector: K,
}

impl<K: Connect> ProcedureLister<K> {
    pub fn new(connector: K) -> Self {
        Self { connector }
    }

    /// Procedure names, in the order the catalog returns them.
    ///
    /// # Errors
    /// Returns `SprocError` if connecting or querying fails.
    pub async fn list(&self, info: &ConnectionInfo) -> Result<Vec<String>, SprocError> {
        self.query(info, LIST_SQL).await
    }

    /// Procedure names qualified with their schema (`dbo.sp_Purge`).
    ///
    /// # Errors
    /// Returns `SprocError` if connecting or querying fails.
    pub async fn list_qualified(&self, info: &ConnectionInfo) -> Result<Vec<String>, SprocError> {
        self.query(info, LIST_QUALIFIED_SQL).await
    }

    async fn query(&self, info: &ConnectionInfo, sql: &str) -> Result<Vec<String>, SprocError> {
        let mut conn = self.connector.connect(info).await?;
        let names = conn.query_column(sql).await?;
        tracing::debug!(count = names.len(), "listed stored procedures");
        Ok(names)
    }
}
