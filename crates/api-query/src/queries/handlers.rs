use crate::error::{ApiResult, ErrorResponse};
use crate::queries::models::{
    DescribePayload, QueryPayload, QueryResponse, StreamPayload, VersionResponse, column_infos,
};
use crate::state::AppState;
use axum::body::Body;
use axum::extract::rejection::JsonRejection;
use axum::response::{IntoResponse, Response};
use axum::{Json, extract::State};
use core_executor::models::{ColumnInfo, RequestContext};
use http::header;
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(query, stream, describe, version),
    components(schemas(
        QueryPayload,
        StreamPayload,
        DescribePayload,
        QueryResponse,
        VersionResponse,
        ColumnInfo,
        ErrorResponse
    )),
    tags(
      (name = "queries", description = "SQL execution endpoints"),
    )
)]
pub struct ApiDoc;

#[utoipa::path(
    post,
    path = "/query",
    operation_id = "runQuery",
    tags = ["queries"],
    request_body = QueryPayload,
    responses(
        (status = 200, description = "All rows of the result", body = QueryResponse),
        (status = 400, description = "Bad payload or query error", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[tracing::instrument(name = "api_query::query", level = "debug", skip(state, payload), err)]
pub async fn query(
    State(state): State<AppState>,
    payload: Result<Json<QueryPayload>, JsonRejection>,
) -> ApiResult<Json<QueryResponse>> {
    let Json(payload) = payload?;
    tracing::debug!(query = %payload.query, with_columns = payload.with_columns, "query");
    let output = state
        .execution_svc
        .query(RequestContext::new(payload.query).with_columns(payload.with_columns))
        .await?;
    Ok(Json(output.into()))
}

#[utoipa::path(
    post,
    path = "/stream",
    operation_id = "streamQuery",
    tags = ["queries"],
    request_body = StreamPayload,
    responses(
        (status = 200,
         description = "Chunked body, one newline-terminated JSON array of rows per engine batch",
         content_type = "application/json"),
        (status = 400, description = "Bad payload or query failed before streaming", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[tracing::instrument(name = "api_query::stream", level = "debug", skip(state, payload), err)]
pub async fn stream(
    State(state): State<AppState>,
    payload: Result<Json<StreamPayload>, JsonRejection>,
) -> ApiResult<Response> {
    let Json(payload) = payload?;
    tracing::debug!(query = %payload.query, buffer_size = ?payload.buffer_size, "stream");
    let stream = state
        .execution_svc
        .stream(RequestContext::new(payload.query).streaming())
        .await?;
    Ok((
        [(header::CONTENT_TYPE, "application/json")],
        Body::from_stream(stream),
    )
        .into_response())
}

#[utoipa::path(
    post,
    path = "/describe",
    operation_id = "describeQuery",
    tags = ["queries"],
    request_body = DescribePayload,
    responses(
        (status = 200, description = "Result columns of the query", body = Vec<ColumnInfo>),
        (status = 400, description = "Bad payload or query error", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[tracing::instrument(name = "api_query::describe", level = "debug", skip(state, payload), err)]
pub async fn describe(
    State(state): State<AppState>,
    payload: Result<Json<DescribePayload>, JsonRejection>,
) -> ApiResult<Json<Vec<ColumnInfo>>> {
    let Json(payload) = payload?;
    let columns = state.execution_svc.describe(&payload.query).await?;
    Ok(Json(column_infos(columns)))
}

#[utoipa::path(
    get,
    path = "/duckdb",
    operation_id = "engineVersion",
    tags = ["queries"],
    responses(
        (status = 200, description = "Embedded engine version", body = VersionResponse),
    )
)]
#[tracing::instrument(name = "api_query::version", level = "debug", skip(state), err)]
pub async fn version(State(state): State<AppState>) -> ApiResult<Json<VersionResponse>> {
    let version = state.execution_svc.engine_version().await?;
    Ok(Json(VersionResponse { version }))
}
