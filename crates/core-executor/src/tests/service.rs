#![allow(clippy::unwrap_used, clippy::expect_used)]

use super::fake::{FakeEngine, Step};
use crate::engine::MockEngine;
use crate::error::ExecutionError;
use crate::models::{CellValue, ColumnDescriptor, LogicalType, RequestContext};
use crate::service::{CoreExecutionService, ExecutionService};
use crate::utils::Config;
use serde_json::json;
use std::sync::Arc;

fn columns() -> Vec<ColumnDescriptor> {
    vec![
        ColumnDescriptor::new("n", LogicalType::BigInt),
        ColumnDescriptor::new("tags", LogicalType::List),
    ]
}

fn rows(range: std::ops::Range<i64>) -> Step {
    Step::Batch(
        range
            .map(|n| {
                vec![
                    CellValue::BigInt(n),
                    CellValue::List(vec![CellValue::Varchar(format!("t{n}"))]),
                ]
            })
            .collect(),
    )
}

fn service(engine: &FakeEngine) -> CoreExecutionService {
    CoreExecutionService::new(Arc::new(engine.clone()), Arc::new(Config::default()))
}

#[tokio::test]
async fn test_query_materializes_all_batches() {
    let engine = FakeEngine::new(columns(), vec![rows(0..2), rows(2..3)]);
    let output = service(&engine)
        .query(RequestContext::new("SELECT n, tags FROM t").with_columns(true))
        .await
        .expect("query should succeed");

    assert_eq!(output.rows.len(), 3);
    assert_eq!(
        serde_json::Value::Object(output.rows[2].clone()),
        json!({"n": "2", "tags": "{\"items\":[\"t2\"]}"})
    );
    assert_eq!(output.columns, columns());
    assert_eq!(engine.acquired(), 1);
    assert_eq!(engine.released(), 1);
}

#[tokio::test]
async fn test_query_omits_columns_unless_asked() {
    let engine = FakeEngine::new(columns(), vec![rows(0..1)]);
    let output = service(&engine)
        .query(RequestContext::new("SELECT 1"))
        .await
        .unwrap();
    assert!(output.columns.is_empty());
    assert_eq!(output.rows.len(), 1);
}

#[tokio::test]
async fn test_query_error_returns_no_rows_and_releases() {
    let engine = FakeEngine::new(
        columns(),
        vec![rows(0..5), Step::Fail("Conversion Error: could not cast".into())],
    );
    let err = service(&engine)
        .query(RequestContext::new("SELECT CAST('x' AS INT)"))
        .await
        .unwrap_err();
    assert!(matches!(err, ExecutionError::QueryExecution { .. }));
    assert_eq!(err.to_string(), "Conversion Error: could not cast");
    assert_eq!(engine.released(), 1);
}

#[tokio::test]
async fn test_describe_releases_on_success_and_failure() {
    let engine = FakeEngine::new(columns(), Vec::new());
    let described = service(&engine).describe("SELECT n, tags FROM t").await.unwrap();
    assert_eq!(described, columns());
    assert_eq!(engine.released(), 1);

    let engine = FakeEngine::failing("Parser Error: syntax error at or near \"SELEC\"");
    let err = service(&engine).describe("SELEC 1").await.unwrap_err();
    assert!(err.to_string().starts_with("Parser Error"));
    assert_eq!(engine.acquired(), 1);
    assert_eq!(engine.released(), 1);
}

#[tokio::test]
async fn test_engine_unavailable_is_reported() {
    let mut engine = MockEngine::new();
    engine
        .expect_connect()
        .returning(|| Err(ExecutionError::unavailable("too many open files")));
    let service = CoreExecutionService::new(Arc::new(engine), Arc::new(Config::default()));

    let err = service
        .query(RequestContext::new("SELECT 1"))
        .await
        .unwrap_err();
    assert!(matches!(err, ExecutionError::EngineUnavailable { .. }));

    let err = service
        .stream(RequestContext::new("SELECT 1").streaming())
        .await
        .unwrap_err();
    assert!(matches!(err, ExecutionError::EngineUnavailable { .. }));
}

#[tokio::test]
async fn test_engine_version() {
    let mut engine = MockEngine::new();
    engine.expect_version().return_const("v1.2.2".to_string());
    let service = CoreExecutionService::new(Arc::new(engine), Arc::new(Config::default()));
    assert_eq!(service.engine_version().await.unwrap(), "v1.2.2");
}

#[tokio::test]
async fn test_concurrent_requests_use_their_own_sessions() {
    let engine = FakeEngine::new(columns(), vec![rows(0..10)]);
    let service = Arc::new(service(&engine));
    let tasks: Vec<_> = (0..8)
        .map(|_| {
            let service = Arc::clone(&service);
            tokio::spawn(async move {
                service
                    .query(RequestContext::new("SELECT * FROM t"))
                    .await
                    .unwrap()
                    .rows
                    .len()
            })
        })
        .collect();
    for task in tasks {
        assert_eq!(task.await.unwrap(), 10);
    }
    assert_eq!(engine.acquired(), 8);
    assert_eq!(engine.released(), 8);
}
