#![allow(clippy::unwrap_used, clippy::expect_used)]

use http::{Method, StatusCode};
use serde_json::Value;
use std::net::SocketAddr;

#[derive(Debug)]
pub struct TestHttpError {
    pub method: Method,
    pub url: String,
    pub status: StatusCode,
    pub body: String,
}

impl TestHttpError {
    /// The `error` field of a JSON error body.
    pub fn message(&self) -> String {
        let body: Value = serde_json::from_str(&self.body).expect("Error body is not JSON");
        body["error"].as_str().expect("Error body has no message").to_string()
    }
}

pub fn endpoint(addr: SocketAddr, path: &str) -> String {
    format!("http://{addr}{path}")
}

pub async fn req(
    client: &reqwest::Client,
    method: Method,
    url: &str,
    payload: String,
) -> Result<reqwest::Response, reqwest::Error> {
    client
        .request(method, url)
        .header("Content-Type", "application/json")
        .body(payload)
        .send()
        .await
}

/// Sends a JSON request; non-200 responses come back as `TestHttpError`.
pub async fn http_req<T: serde::de::DeserializeOwned>(
    client: &reqwest::Client,
    method: Method,
    url: &str,
    payload: String,
) -> Result<T, TestHttpError> {
    let response = req(client, method.clone(), url, payload).await.unwrap();
    let status = response.status();
    let body = response.text().await.expect("Failed to get response text");
    if status != StatusCode::OK {
        return Err(TestHttpError {
            method,
            url: url.to_string(),
            status,
            body,
        });
    }
    Ok(serde_json::from_str::<T>(&body).expect("Failed to parse response"))
}

pub async fn post_query(addr: SocketAddr, payload: &Value) -> Result<Value, TestHttpError> {
    http_req(
        &reqwest::Client::new(),
        Method::POST,
        &endpoint(addr, "/query"),
        payload.to_string(),
    )
    .await
}
