#![allow(clippy::unwrap_used, clippy::expect_used)]

use super::common::{endpoint, req};
use crate::test_server::run_test_server;
use http::{Method, StatusCode, header};
use serde_json::{Value, json};

async fn post_stream(addr: std::net::SocketAddr, payload: &Value) -> reqwest::Response {
    req(
        &reqwest::Client::new(),
        Method::POST,
        &endpoint(addr, "/stream"),
        payload.to_string(),
    )
    .await
    .unwrap()
}

#[tokio::test]
async fn test_stream_sends_newline_terminated_segments() {
    let addr = run_test_server().await;
    let mut res = post_stream(
        addr,
        &json!({"query": "SELECT range AS n, range::VARCHAR AS s FROM range(10000)"}),
    )
    .await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(
        res.headers()[header::CONTENT_TYPE].to_str().unwrap(),
        "application/json"
    );

    let mut body = Vec::new();
    while let Some(chunk) = res.chunk().await.unwrap() {
        body.extend_from_slice(&chunk);
    }
    let body = String::from_utf8(body).unwrap();
    assert!(body.ends_with('\n'));

    let mut total = 0;
    for segment in body.lines() {
        let rows: Vec<Value> = serde_json::from_str(segment).unwrap();
        for row in &rows {
            assert_eq!(row["n"].as_str(), row["s"].as_str());
        }
        total += rows.len();
    }
    assert_eq!(total, 10000);
}

#[tokio::test]
async fn test_stream_empty_result_has_empty_body() {
    let addr = run_test_server().await;
    let res = post_stream(addr, &json!({"query": "SELECT 1 AS x WHERE false"})).await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.text().await.unwrap(), "");
}

#[tokio::test]
async fn test_stream_accepts_buffer_size() {
    let addr = run_test_server().await;
    let res = post_stream(addr, &json!({"query": "SELECT 1 AS x", "bufferSize": 5})).await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.text().await.unwrap(), "[{\"x\":1}]\n");
}

#[tokio::test]
async fn test_stream_failure_before_first_segment_is_400() {
    let addr = run_test_server().await;
    let res = post_stream(addr, &json!({"query": "SELECT * FROM nowhere"})).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert!(body["error"].as_str().unwrap().contains("nowhere"), "{body}");
}

#[tokio::test]
async fn test_abandoned_stream_frees_the_server() {
    let addr = run_test_server().await;
    for _ in 0..10 {
        let mut res = post_stream(addr, &json!({"query": "SELECT * FROM range(10000000)"})).await;
        assert_eq!(res.status(), StatusCode::OK);
        assert!(res.chunk().await.unwrap().is_some());
        drop(res);
    }
    let res = post_stream(addr, &json!({"query": "SELECT 2 AS y"})).await;
    assert_eq!(res.text().await.unwrap(), "[{\"y\":2}]\n");
}
