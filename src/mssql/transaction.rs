use super::config::MssqlClient;
use crate::error::SprocError;

/// Start an explicit transaction on `client`.
///
/// Sent as a plain batch so the transaction outlives the request that opened it.
///
/// # Errors
///
/// Returns `SprocError::ExecutionError` if issuing the BEGIN statement fails.
pub async fn begin_transaction(client: &mut MssqlClient) -> Result<(), SprocError> {
    run_batch(client, "BEGIN TRANSACTION")
        .await
        .map_err(|e| SprocError::ExecutionError(format!("MSSQL begin transaction error: {e}")))
}

/// Commit the transaction open on `client`.
///
/// # Errors
///
/// Returns `SprocError::ExecutionError` if commit fails.
pub async fn commit_transaction(client: &mut MssqlClient) -> Result<(), SprocError> {
    run_batch(client, "COMMIT TRANSACTION")
        .await
        .map_err(|e| SprocError::ExecutionError(format!("MSSQL commit error: {e}")))
}

async fn run_batch(client: &mut MssqlClient, sql: &str) -> Result<(), tiberius::error::Error> {
    client.simple_query(sql).await?.into_results().await?;
    Ok(())
}
