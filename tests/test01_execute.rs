use std::sync::Arc;

use serde_json::json;
use sproc_middleware::prelude::*;
use sproc_middleware::test_utils::{Call, Failure, RecordingConnector, RecordingTelemetry, Recorded};

fn info() -> ConnectionInfo {
    ConnectionInfo::new("server=tcp:localhost,1433;database=testing").unwrap()
}

#[tokio::test]
async fn no_parameters_commits_and_reports_rows() -> Result<(), SprocError> {
    let backend = RecordingConnector::new();
    let executor = Executor::new(backend.clone());
    let proc_name = ProcedureName::new("RPA.journalizing.sp_UpdatePurgeMarker")?;

    let result = executor.execute(&info(), &proc_name, &ParameterSet::new()).await;

    assert!(result.success());
    assert_eq!(result.error_message(), None);
    assert_eq!(result.rows_affected(), Some(0));
    assert_eq!(
        backend.calls(),
        vec![
            Call::Begin { conn: 0 },
            Call::Execute {
                conn: 0,
                sql: "EXEC RPA.journalizing.sp_UpdatePurgeMarker".into(),
                params: vec![],
            },
            Call::Commit { conn: 0 },
        ]
    );
    assert_eq!(backend.connections_alive(), 0);
    Ok(())
}

#[tokio::test]
async fn parameters_bind_in_name_order() -> Result<(), SprocError> {
    let backend = RecordingConnector::new().with_rows_affected(4);
    let executor = Executor::new(backend.clone());
    let params = ParameterSet::from_json(&json!({
        "Status": ["str", "purged"],
        "Count": ["int", "12"],
        "Payload": ["json", {"a": "b"}],
        "Ratio": ["float", 0.5],
    }))?;

    let result = executor
        .execute(&info(), &ProcedureName::new("dbo.sp_Mark")?, &params)
        .await;

    assert!(result.success(), "{:?}", result.error_message());
    assert_eq!(result.rows_affected(), Some(4));
    let executed = backend.executed();
    assert_eq!(executed.len(), 1);
    let (sql, bound) = &executed[0];
    assert_eq!(
        sql,
        "EXEC dbo.sp_Mark @Count = ?, @Payload = ?, @Ratio = ?, @Status = ?"
    );
    assert_eq!(
        bound,
        &vec![
            SqlValue::Int(12),
            SqlValue::Json(r#"{"a": "b"}"#.into()),
            SqlValue::Float(0.5),
            SqlValue::Text("purged".into()),
        ]
    );
    assert_eq!(backend.commits(), 1);
    Ok(())
}

#[tokio::test]
async fn malformed_entry_is_a_value_error() -> Result<(), SprocError> {
    let backend = RecordingConnector::new();
    let executor = Executor::new(backend.clone());
    let mut params = ParameterSet::new().with("Id", ParamType::Int, json!(1));
    params.insert_entry("Broken", json!(["int", 1, "extra"]));

    let result = executor
        .execute(&info(), &ProcedureName::new("dbo.sp_Mark")?, &params)
        .await;

    assert!(!result.success());
    assert_eq!(result.rows_affected(), None);
    assert_eq!(result.error_kind(), Some(ErrorKind::InvalidParameterShape));
    let message = result.error_message().unwrap_or_default();
    assert!(message.starts_with("Value error:"), "{message}");
    assert!(backend.executed().is_empty());
    assert_eq!(backend.commits(), 0);
    assert_eq!(backend.connections_opened(), 1);
    assert_eq!(backend.connections_alive(), 0);
    Ok(())
}

#[tokio::test]
async fn unparsable_datetime_is_a_coercion_error() -> Result<(), SprocError> {
    let backend = RecordingConnector::new();
    let executor = Executor::new(backend.clone());
    let params = ParameterSet::new().with("PurgedAt", ParamType::DateTime, json!("next tuesday"));

    let result = executor
        .execute(&info(), &ProcedureName::new("dbo.sp_Mark")?, &params)
        .await;

    assert!(!result.success());
    assert_eq!(result.error_kind(), Some(ErrorKind::TypeCoercion));
    let message = result.error_message().unwrap_or_default();
    assert!(message.starts_with("Value error:"), "{message}");
    assert!(message.contains("PurgedAt"), "{message}");
    assert_eq!(backend.commits(), 0);
    assert_eq!(backend.connections_alive(), 0);
    Ok(())
}

#[tokio::test]
async fn driver_failures_are_database_errors() -> Result<(), SprocError> {
    let proc_name = ProcedureName::new("dbo.sp_Missing")?;
    for failure in [
        Failure::Connect("login failed".into()),
        Failure::Begin("session killed".into()),
        Failure::Execute("Could not find stored procedure 'dbo.sp_Missing'".into()),
        Failure::Commit("transaction doomed".into()),
    ] {
        let backend = RecordingConnector::new().failing(failure.clone());
        let executor = Executor::new(backend.clone());

        let result = executor.execute(&info(), &proc_name, &ParameterSet::new()).await;

        assert!(!result.success(), "{failure:?}");
        assert_eq!(result.error_kind(), Some(ErrorKind::Database));
        let message = result.error_message().unwrap_or_default();
        assert!(message.starts_with("Database error:"), "{message}");
        assert_eq!(backend.commits(), 0);
        assert_eq!(backend.connections_alive(), 0, "{failure:?}");
    }
    Ok(())
}

#[tokio::test]
async fn panics_become_unexpected_errors() -> Result<(), SprocError> {
    let backend = RecordingConnector::new().failing(Failure::Panic("driver exploded".into()));
    let executor = Executor::new(backend.clone());

    let result = executor
        .execute(&info(), &ProcedureName::new("dbo.sp_Mark")?, &ParameterSet::new())
        .await;

    assert!(!result.success());
    assert_eq!(result.error_kind(), Some(ErrorKind::Unexpected));
    assert_eq!(
        result.error_message(),
        Some("An unexpected error occurred: driver exploded")
    );
    assert_eq!(backend.connections_alive(), 0);
    Ok(())
}

#[tokio::test]
async fn unknown_types_follow_the_executor_policy() -> Result<(), SprocError> {
    let params = ParameterSet::new().with("Amount", ParamType::from_tag("money"), json!("12.50"));
    let proc_name = ProcedureName::new("dbo.sp_Pay")?;

    let lenient_backend = RecordingConnector::new();
    let lenient = Executor::new(lenient_backend.clone());
    let result = lenient.execute(&info(), &proc_name, &params).await;
    assert!(result.success());
    assert_eq!(
        lenient_backend.executed()[0].1,
        vec![SqlValue::Text("12.50".into())]
    );

    let strict_backend = RecordingConnector::new();
    let strict = Executor::new(strict_backend.clone())
        .with_options(ExecOptions::default().with_unknown_types(UnknownTypePolicy::Reject));
    let result = strict.execute(&info(), &proc_name, &params).await;
    assert!(!result.success());
    let message = result.error_message().unwrap_or_default();
    assert!(message.starts_with("Value error:"), "{message}");
    assert!(message.contains("money"), "{message}");
    assert!(strict_backend.executed().is_empty());
    Ok(())
}

#[tokio::test]
async fn outcomes_are_reported_to_the_event_log() -> Result<(), SprocError> {
    let telemetry = RecordingTelemetry::default();
    let proc_name = ProcedureName::new("dbo.sp_Mark")?;

    let ok = Executor::new(RecordingConnector::new().with_rows_affected(2))
        .with_event_log(Arc::new(telemetry.clone()), "purge-job");
    ok.execute(&info(), &proc_name, &ParameterSet::new()).await;

    let failing = Executor::new(RecordingConnector::new().failing(Failure::Execute("nope".into())))
        .with_event_log(Arc::new(telemetry.clone()), "purge-job");
    failing.execute(&info(), &proc_name, &ParameterSet::new()).await;

    let recorded = telemetry.recorded();
    assert_eq!(
        recorded[0],
        Recorded::Event {
            level: LogLevel::Info,
            message: "Executed dbo.sp_Mark: 2 rows affected".into(),
            context: "purge-job".into(),
        }
    );
    assert!(matches!(
        &recorded[1],
        Recorded::Event { level: LogLevel::Error, message, .. }
            if message.contains("Database error: SQL execution error: nope")
    ));
    Ok(())
}

#[tokio::test]
async fn try_execute_exposes_the_typed_error() -> Result<(), SprocError> {
    let executor = Executor::new(RecordingConnector::new());
    let params = ParameterSet::new().with("Id", ParamType::Int, json!("not a number"));

    let err = executor
        .try_execute(&info(), &ProcedureName::new("dbo.sp_Mark")?, &params)
        .await
        .unwrap_err();

    assert!(matches!(err, SprocError::TypeCoercion { ref name, .. } if name == "Id"));
    Ok(())
}

#[tokio::test]
async fn blocking_form_refuses_to_run_inside_a_runtime() -> Result<(), SprocError> {
    let executor = Executor::new(RecordingConnector::new());
    let result =
        executor.execute_blocking(&info(), &ProcedureName::new("dbo.sp_Mark")?, &ParameterSet::new());
    assert_eq!(result.error_kind(), Some(ErrorKind::Unexpected));
    Ok(())
}

#[tokio::test]
async fn non_string_type_tags_are_unknown_types() -> Result<(), SprocError> {
    let mut params = ParameterSet::new();
    params.insert_entry("X", json!([1, "x"]));
    let proc_name = ProcedureName::new("dbo.sp_Mark")?;

    let backend = RecordingConnector::new();
    let result = Executor::new(backend.clone())
        .execute(&info(), &proc_name, &params)
        .await;
    assert!(result.success(), "{:?}", result.error_message());
    assert_eq!(
        backend.executed(),
        vec![("EXEC dbo.sp_Mark @X = ?".to_string(), vec![SqlValue::Text("x".into())])]
    );

    let strict = Executor::new(RecordingConnector::new())
        .with_options(ExecOptions::default().with_unknown_types(UnknownTypePolicy::Reject));
    let result = strict.execute(&info(), &proc_name, &params).await;
    assert_eq!(result.error_kind(), Some(ErrorKind::TypeCoercion));
    Ok(())
}
