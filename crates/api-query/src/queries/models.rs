use core_executor::models::{ColumnDescriptor, ColumnInfo, JsonRow, QueryOutput};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct QueryPayload {
    pub query: String,
    /// Include column names and types in the response.
    #[serde(default)]
    pub with_columns: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StreamPayload {
    pub query: String,
    /// Accepted for older clients; segments always follow engine batches.
    #[serde(default)]
    pub buffer_size: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct DescribePayload {
    pub query: String,
}

#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct QueryResponse {
    #[schema(value_type = Vec<Object>)]
    pub result: Vec<JsonRow>,
    /// Empty unless `withColumns` was set.
    pub columns: Vec<ColumnInfo>,
}

impl From<QueryOutput> for QueryResponse {
    fn from(output: QueryOutput) -> Self {
        Self {
            result: output.rows,
            columns: output.columns.into_iter().map(ColumnInfo::from).collect(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct VersionResponse {
    pub version: String,
}

#[must_use]
pub fn column_infos(columns: Vec<ColumnDescriptor>) -> Vec<ColumnInfo> {
    columns.into_iter().map(ColumnInfo::from).collect()
}
