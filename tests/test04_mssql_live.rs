#![cfg(feature = "mssql")]

//! Runs against a real SQL Server when `TESTING_MSSQL_CONNECTION` holds an ADO.NET connection
//! string; otherwise every test returns early.

use serde_json::json;
use sproc_middleware::prelude::*;

fn live_info() -> Option<ConnectionInfo> {
    let conn_str = std::env::var("TESTING_MSSQL_CONNECTION").ok()?;
    ConnectionInfo::new(conn_str).ok()
}

#[tokio::test]
async fn creates_and_executes_a_procedure() -> Result<(), SprocError> {
    let Some(info) = live_info() else {
        eprintln!("TESTING_MSSQL_CONNECTION not set; skipping");
        return Ok(());
    };

    // Each call runs on its own connection, so the procedure has to be a permanent one.
    let setup = Executor::new(MssqlConnector);
    let create = setup
        .execute(
            &info,
            &ProcedureName::new("sp_executesql")?,
            &ParameterSet::new().with(
                "stmt",
                ParamType::Str,
                json!(
                    "CREATE OR ALTER PROCEDURE dbo.sproc_middleware_echo @Id INT, @Note NVARCHAR(100) \
                     AS BEGIN SET NOCOUNT ON; SELECT @Id AS Id, @Note AS Note; END"
                ),
            ),
        )
        .await;
    assert!(create.success(), "{:?}", create.error_message());

    let params = ParameterSet::new()
        .with("Id", ParamType::Int, json!("7"))
        .with("Note", ParamType::Str, json!("hello"));
    let result = setup
        .execute(&info, &ProcedureName::new("dbo.sproc_middleware_echo")?, &params)
        .await;
    assert!(result.success(), "{:?}", result.error_message());
    assert!(result.rows_affected().is_some());

    let names = ProcedureLister::new(MssqlConnector).list(&info).await?;
    assert!(names.iter().any(|n| n == "sproc_middleware_echo"));
    Ok(())
}

#[tokio::test]
async fn missing_procedure_is_a_database_error() -> Result<(), SprocError> {
    let Some(info) = live_info() else {
        return Ok(());
    };

    let result = Executor::new(MssqlConnector)
        .execute(
            &info,
            &ProcedureName::new("dbo.sproc_middleware_does_not_exist")?,
            &ParameterSet::new(),
        )
        .await;

    assert!(!result.success());
    let message = result.error_message().unwrap_or_default();
    assert!(message.starts_with("Database error:"), "{message}");
    Ok(())
}

#[tokio::test]
async fn unreachable_server_is_a_database_error() -> Result<(), SprocError> {
    if live_info().is_none() {
        return Ok(());
    }
    let info = ConnectionInfo::new(
        "server=tcp:127.0.0.1,1;database=none;user id=nobody;password=nothing",
    )?;

    let result = Executor::new(MssqlConnector)
        .execute(&info, &ProcedureName::new("dbo.sp_Any")?, &ParameterSet::new())
        .await;

    assert_eq!(result.error_kind(), Some(ErrorKind::Database));
    Ok(())
}
