use sproc_middleware::prelude::*;
use sproc_middleware::test_utils::{Call, Failure, RecordingConnector};

fn info() -> ConnectionInfo {
    ConnectionInfo::new("server=tcp:localhost,1433;database=testing").unwrap()
}

#[tokio::test]
async fn lists_names_in_catalog_order() -> Result<(), SprocError> {
    let backend =
        RecordingConnector::new().with_catalog(&["sp_UpdatePurgeMarker", "sp_Archive", "sp_Mark"]);
    let lister = ProcedureLister::new(backend.clone());

    let names = lister.list(&info()).await?;

    assert_eq!(names, ["sp_UpdatePurgeMarker", "sp_Archive", "sp_Mark"]);
    assert_eq!(
        backend.calls(),
        vec![Call::Query {
            conn: 0,
            sql: "SELECT name FROM sys.procedures".into(),
        }]
    );
    assert_eq!(backend.connections_alive(), 0);
    Ok(())
}

#[tokio::test]
async fn qualified_listing_asks_for_schema_names() -> Result<(), SprocError> {
    let backend = RecordingConnector::new().with_catalog(&["journalizing.sp_UpdatePurgeMarker"]);
    let lister = ProcedureLister::new(backend.clone());

    let names = lister.list_qualified(&info()).await?;

    assert_eq!(names, ["journalizing.sp_UpdatePurgeMarker"]);
    assert!(matches!(
        &backend.calls()[..],
        [Call::Query { sql, .. }] if sql.contains("SCHEMA_NAME(schema_id)")
    ));
    Ok(())
}

#[tokio::test]
async fn empty_catalog_is_an_empty_list() -> Result<(), SprocError> {
    let lister = ProcedureLister::new(RecordingConnector::new());
    assert!(lister.list(&info()).await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn listing_failures_propagate_and_release_the_connection() {
    let backend = RecordingConnector::new().failing(Failure::Execute("permission denied".into()));
    let lister = ProcedureLister::new(backend.clone());

    let err = lister.list(&info()).await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Database);
    assert_eq!(backend.connections_opened(), 1);
    assert_eq!(backend.connections_alive(), 0);
}

#[tokio::test]
async fn lister_does_not_touch_executor_connections() -> Result<(), SprocError> {
    let backend = RecordingConnector::new().with_catalog(&["sp_Mark"]);
    let executor = Executor::new(backend.clone());
    let lister = ProcedureLister::new(backend.clone());

    let result = executor
        .execute(&info(), &ProcedureName::new("sp_Mark")?, &ParameterSet::new())
        .await;
    let names = lister.list(&info()).await?;

    assert!(result.success());
    assert_eq!(names, ["sp_Mark"]);
    assert_eq!(backend.connections_opened(), 2);
    assert!(matches!(backend.calls().last(), Some(Call::Query { conn: 1, .. })));
    Ok(())
}
