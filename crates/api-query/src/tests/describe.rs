#![allow(clippy::unwrap_used, clippy::expect_used)]

use super::common::{endpoint, http_req};
use crate::test_server::run_test_server;
use http::{Method, StatusCode};
use serde_json::{Value, json};

async fn describe(addr: std::net::SocketAddr, query: &str) -> Result<Value, super::common::TestHttpError> {
    http_req(
        &reqwest::Client::new(),
        Method::POST,
        &endpoint(addr, "/describe"),
        json!({ "query": query }).to_string(),
    )
    .await
}

#[tokio::test]
async fn test_describe_lists_columns() {
    let addr = run_test_server().await;
    let res = describe(addr, "SELECT 1 AS a, 'x' AS b, [1, 2] AS c").await.unwrap();
    assert_eq!(
        res,
        json!([
            {"name": "a", "typeId": 4, "typeName": "INTEGER"},
            {"name": "b", "typeId": 17, "typeName": "VARCHAR"},
            {"name": "c", "typeId": 24, "typeName": "LIST"},
        ])
    );
}

#[tokio::test]
async fn test_describe_error_does_not_leak_connections() {
    let addr = run_test_server().await;
    for _ in 0..50 {
        let err = describe(addr, "SELECT * FROM missing").await.unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
    }
    // still serving after repeated failures
    let res = describe(addr, "SELECT 1 AS ok").await.unwrap();
    assert_eq!(res[0]["name"], json!("ok"));
}
