// MSSQL module - SQL Server backend via Tiberius
//
// - config: connection options and their connection-string form
// - client: raw client creation
// - params: binding of coerced values
// - query: statement execution and catalog reads
// - transaction: explicit BEGIN/COMMIT on a client

pub mod client;
pub mod config;
pub mod params;
pub mod query;
pub mod transaction;

use async_trait::async_trait;

use crate::backend::{Connect, ProcedureConnection};
use crate::config::ConnectionInfo;
use crate::error::SprocError;
use crate::types::SqlValue;

pub use client::create_mssql_client;
pub use config::{MssqlClient, MssqlOptions, MssqlOptionsBuilder};

/// [`Connect`] implementation for SQL Server.
#[derive(Debug, Clone, Copy, Default)]
pub struct MssqlConnector;

#[async_trait]
impl Connect for MssqlConnector {
    type Connection = MssqlConnection;

    async fn connect(&self, info: &ConnectionInfo) -> Result<MssqlConnection, SprocError> {
        let client = create_mssql_client(info).await?;
        Ok(MssqlConnection { client })
    }
}

/// One SQL Server session. Dropping it closes the session.
pub struct MssqlConnection {
    client: MssqlClient,
}

impl std::fmt::Debug for MssqlConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MssqlConnection")
            .field("client", &"<MssqlClient>")
            .finish()
    }
}

#[async_trait]
impl ProcedureConnection for MssqlConnection {
    async fn begin(&mut self) -> Result<(), SprocError> {
        transaction::begin_transaction(&mut self.client).await
    }

    async fn execute(&mut self, sql: &str, params: &[SqlValue]) -> Result<u64, SprocError> {
        query::execute_statement(&mut self.client, sql, params).await
    }

    async fn commit(&mut self) -> Result<(), SprocError> {
        transaction::commit_transaction(&mut self.client).await
    }

    async fn query_column(&mut self, sql: &str) -> Result<Vec<String>, SprocError> {
        query::first_column(&mut self.client, sql).await
    }
}
