use super::config::MssqlClient;
use super::params::bind_query_params;
use crate::error::SprocError;
use crate::translation::{count_placeholders, translate_placeholders};
use crate::types::SqlValue;

/// Execute `sql` with `?` placeholders bound positionally to `params`.
///
/// Returns the sum of the row counts the server reports for the batch; a procedure running with
/// `SET NOCOUNT ON` reports none and yields 0.
///
/// # Errors
///
/// Returns `SprocError::ExecutionError` if the placeholder count does not match `params`, or the
/// Tiberius error if execution fails.
pub async fn execute_statement(
    client: &mut MssqlClient,
    sql: &str,
    params: &[SqlValue],
) -> Result<u64, SprocError> {
    let placeholders = count_placeholders(sql);
    if placeholders != params.len() {
        return Err(SprocError::ExecutionError(format!(
            "statement has {placeholders} placeholders but {} values were bound",
            params.len()
        )));
    }

    let translated = translate_placeholders(sql);
    let exec_result = bind_query_params(&translated, params).execute(client).await?;
    Ok(exec_result.rows_affected().iter().sum())
}

/// Run `sql` and collect the first column of the first result set as text.
///
/// # Errors
///
/// Returns the Tiberius error if the query fails or a value is not textual.
pub async fn first_column(client: &mut MssqlClient, sql: &str) -> Result<Vec<String>, SprocError> {
    let rows = client.simple_query(sql).await?.into_first_result().await?;

    let mut values = Vec::with_capacity(rows.len());
    for row in &rows {
        if let Some(value) = row.try_get::<&str, _>(0)? {
            values.push(value.to_string());
        }
    }
    Ok(values)
}
