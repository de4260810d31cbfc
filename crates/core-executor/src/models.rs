use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt::{self, Display};
use std::sync::Arc;
use utoipa::ToSchema;

/// Column type tag as reported by the engine, independent of the in-memory layout.
///
/// `type_id` values are DuckDB's C API `DUCKDB_TYPE` numbers so that clients
/// comparing against the engine's own enumeration keep working.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogicalType {
    Boolean,
    TinyInt,
    SmallInt,
    Integer,
    BigInt,
    UTinyInt,
    USmallInt,
    UInteger,
    UBigInt,
    Float,
    Double,
    Timestamp,
    Date,
    Time,
    Interval,
    HugeInt,
    UHugeInt,
    Varchar,
    Blob,
    Decimal,
    TimestampS,
    TimestampMs,
    TimestampNs,
    Enum,
    List,
    Struct,
    Map,
    Array,
    Uuid,
    Union,
    Bit,
    TimeTz,
    TimestampTz,
    VarInt,
    SqlNull,
    Unknown,
}

impl LogicalType {
    #[must_use]
    pub const fn type_id(self) -> u32 {
        match self {
            Self::Unknown => 0,
            Self::Boolean => 1,
            Self::TinyInt => 2,
            Self::SmallInt => 3,
            Self::Integer => 4,
            Self::BigInt => 5,
            Self::UTinyInt => 6,
            Self::USmallInt => 7,
            Self::UInteger => 8,
            Self::UBigInt => 9,
            Self::Float => 10,
            Self::Double => 11,
            Self::Timestamp => 12,
            Self::Date => 13,
            Self::Time => 14,
            Self::Interval => 15,
            Self::HugeInt => 16,
            Self::Varchar => 17,
            Self::Blob => 18,
            Self::Decimal => 19,
            Self::TimestampS => 20,
            Self::TimestampMs => 21,
            Self::TimestampNs => 22,
            Self::Enum => 23,
            Self::List => 24,
            Self::Struct => 25,
            Self::Map => 26,
            Self::Uuid => 27,
            Self::Union => 28,
            Self::Bit => 29,
            Self::TimeTz => 30,
            Self::TimestampTz => 31,
            Self::UHugeInt => 32,
            Self::Array => 33,
            Self::VarInt => 35,
            Self::SqlNull => 36,
        }
    }

    #[must_use]
    pub const fn from_type_id(type_id: u32) -> Self {
        match type_id {
            1 => Self::Boolean,
            2 => Self::TinyInt,
            3 => Self::SmallInt,
            4 => Self::Integer,
            5 => Self::BigInt,
            6 => Self::UTinyInt,
            7 => Self::USmallInt,
            8 => Self::UInteger,
            9 => Self::UBigInt,
            10 => Self::Float,
            11 => Self::Double,
            12 => Self::Timestamp,
            13 => Self::Date,
            14 => Self::Time,
            15 => Self::Interval,
            16 => Self::HugeInt,
            17 => Self::Varchar,
            18 => Self::Blob,
            19 => Self::Decimal,
            20 => Self::TimestampS,
            21 => Self::TimestampMs,
            22 => Self::TimestampNs,
            23 => Self::Enum,
            24 => Self::List,
            25 => Self::Struct,
            26 => Self::Map,
            27 => Self::Uuid,
            28 => Self::Union,
            29 => Self::Bit,
            30 => Self::TimeTz,
            31 => Self::TimestampTz,
            32 => Self::UHugeInt,
            33 => Self::Array,
            35 => Self::VarInt,
            36 => Self::SqlNull,
            _ => Self::Unknown,
        }
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Boolean => "BOOLEAN",
            Self::TinyInt => "TINYINT",
            Self::SmallInt => "SMALLINT",
            Self::Integer => "INTEGER",
            Self::BigInt => "BIGINT",
            Self::UTinyInt => "UTINYINT",
            Self::USmallInt => "USMALLINT",
            Self::UInteger => "UINTEGER",
            Self::UBigInt => "UBIGINT",
            Self::Float => "FLOAT",
            Self::Double => "DOUBLE",
            Self::Timestamp => "TIMESTAMP",
            Self::Date => "DATE",
            Self::Time => "TIME",
            Self::Interval => "INTERVAL",
            Self::HugeInt => "HUGEINT",
            Self::UHugeInt => "UHUGEINT",
            Self::Varchar => "VARCHAR",
            Self::Blob => "BLOB",
            Self::Decimal => "DECIMAL",
            Self::TimestampS => "TIMESTAMP_S",
            Self::TimestampMs => "TIMESTAMP_MS",
            Self::TimestampNs => "TIMESTAMP_NS",
            Self::Enum => "ENUM",
            Self::List => "LIST",
            Self::Struct => "STRUCT",
            Self::Map => "MAP",
            Self::Array => "ARRAY",
            Self::Uuid => "UUID",
            Self::Union => "UNION",
            Self::Bit => "BIT",
            Self::TimeTz => "TIME WITH TIME ZONE",
            Self::TimestampTz => "TIMESTAMP WITH TIME ZONE",
            Self::VarInt => "VARINT",
            Self::SqlNull => "NULL",
            Self::Unknown => "UNKNOWN",
        }
    }

    /// Parses the engine's textual rendering of a column type, e.g. `INTEGER[]`,
    /// `DECIMAL(18,3)`, `STRUCT(a INTEGER, b VARCHAR)` or `TIMESTAMP WITH TIME ZONE`.
    #[must_use]
    pub fn from_type_name(type_name: &str) -> Self {
        let name = type_name.trim();
        if let Some(inner) = trailing_brackets(name) {
            return if inner.trim().is_empty() {
                Self::List
            } else {
                Self::Array
            };
        }

        let upper = name.to_ascii_uppercase();
        let head = upper.split('(').next().unwrap_or_default().trim();
        match head {
            "BOOLEAN" | "BOOL" | "LOGICAL" => Self::Boolean,
            "TINYINT" | "INT1" => Self::TinyInt,
            "SMALLINT" | "INT2" | "SHORT" => Self::SmallInt,
            "INTEGER" | "INT" | "INT4" | "SIGNED" => Self::Integer,
            "BIGINT" | "INT8" | "LONG" => Self::BigInt,
            "UTINYINT" => Self::UTinyInt,
            "USMALLINT" => Self::USmallInt,
            "UINTEGER" => Self::UInteger,
            "UBIGINT" => Self::UBigInt,
            "HUGEINT" | "INT128" => Self::HugeInt,
            "UHUGEINT" | "UINT128" => Self::UHugeInt,
            "FLOAT" | "FLOAT4" | "REAL" => Self::Float,
            "DOUBLE" | "FLOAT8" => Self::Double,
            "DECIMAL" | "NUMERIC" => Self::Decimal,
            "VARCHAR" | "TEXT" | "STRING" | "CHAR" | "BPCHAR" | "JSON" => Self::Varchar,
            "BLOB" | "BYTEA" | "BINARY" | "VARBINARY" => Self::Blob,
            "DATE" => Self::Date,
            "TIME" => Self::Time,
            "TIME WITH TIME ZONE" | "TIMETZ" => Self::TimeTz,
            "TIMESTAMP" | "DATETIME" | "TIMESTAMP_US" => Self::Timestamp,
            "TIMESTAMP WITH TIME ZONE" | "TIMESTAMPTZ" => Self::TimestampTz,
            "TIMESTAMP_S" => Self::TimestampS,
            "TIMESTAMP_MS" => Self::TimestampMs,
            "TIMESTAMP_NS" => Self::TimestampNs,
            "INTERVAL" => Self::Interval,
            "UUID" => Self::Uuid,
            "BIT" | "BITSTRING" => Self::Bit,
            "VARINT" | "BIGNUM" => Self::VarInt,
            "ENUM" => Self::Enum,
            "STRUCT" | "ROW" => Self::Struct,
            "MAP" => Self::Map,
            "UNION" => Self::Union,
            "LIST" => Self::List,
            "NULL" | "\"NULL\"" => Self::SqlNull,
            _ => Self::Unknown,
        }
    }
}

// Returns the contents of a trailing `[...]` that sits outside any parentheses.
fn trailing_brackets(name: &str) -> Option<&str> {
    let body = name.strip_suffix(']')?;
    let mut depth = 0_i32;
    for (idx, ch) in body.char_indices().rev() {
        match ch {
            ']' | ')' => depth += 1,
            '(' => depth -= 1,
            '[' if depth == 0 => return Some(&body[idx + 1..]),
            '[' => depth -= 1,
            _ => {}
        }
    }
    None
}

impl Display for LogicalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Wire shape of a column descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ColumnInfo {
    pub name: String,
    pub type_id: u32,
    pub type_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "ColumnInfo", from = "ColumnInfo")]
pub struct ColumnDescriptor {
    pub name: String,
    pub logical_type: LogicalType,
}

impl ColumnDescriptor {
    #[must_use]
    pub fn new(name: impl Into<String>, logical_type: LogicalType) -> Self {
        Self {
            name: name.into(),
            logical_type,
        }
    }
}

impl From<ColumnDescriptor> for ColumnInfo {
    fn from(column: ColumnDescriptor) -> Self {
        Self {
            name: column.name,
            type_id: column.logical_type.type_id(),
            type_name: column.logical_type.name().to_string(),
        }
    }
}

impl From<ColumnInfo> for ColumnDescriptor {
    fn from(info: ColumnInfo) -> Self {
        let by_id = LogicalType::from_type_id(info.type_id);
        let logical_type = if by_id == LogicalType::Unknown {
            LogicalType::from_type_name(&info.type_name)
        } else {
            by_id
        };
        Self {
            name: info.name,
            logical_type,
        }
    }
}

/// Renames repeated column names so rows can be keyed by name: the second `a`
/// becomes `a:1`, the third `a:2`, skipping names that are already taken.
#[must_use]
pub fn deduplicate_column_names(names: &[String]) -> Vec<String> {
    let mut taken: std::collections::HashSet<String> = names.iter().cloned().collect();
    let mut seen = std::collections::HashSet::with_capacity(names.len());
    let mut result = Vec::with_capacity(names.len());
    for name in names {
        if seen.insert(name.clone()) {
            result.push(name.clone());
            continue;
        }
        let mut suffix = 1_usize;
        let mut candidate = format!("{name}:{suffix}");
        while taken.contains(&candidate) {
            suffix += 1;
            candidate = format!("{name}:{suffix}");
        }
        taken.insert(candidate.clone());
        seen.insert(candidate.clone());
        result.push(candidate);
    }
    result
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeUnit {
    Second,
    Millisecond,
    Microsecond,
    Nanosecond,
}

impl TimeUnit {
    #[must_use]
    pub const fn raw_field(self) -> &'static str {
        match self {
            Self::Second => "seconds",
            Self::Millisecond => "milliseconds",
            Self::Microsecond => "micros",
            Self::Nanosecond => "nanoseconds",
        }
    }

    /// Converts a value in this unit to whole milliseconds, truncating toward zero.
    #[must_use]
    pub const fn to_millis(self, value: i64) -> i128 {
        let value = value as i128;
        match self {
            Self::Second => value * 1000,
            Self::Millisecond => value,
            Self::Microsecond => value / 1000,
            Self::Nanosecond => value / 1_000_000,
        }
    }
}

/// One value as read out of an engine result chunk.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Null,
    Boolean(bool),
    /// 8 to 32 bit integers.
    Int(i64),
    UInt(u64),
    BigInt(i64),
    UBigInt(u64),
    HugeInt(i128),
    UHugeInt(u128),
    Float(f64),
    Decimal { value: i128, width: u8, scale: i8 },
    Varchar(String),
    Enum(String),
    Blob(Vec<u8>),
    Uuid(uuid::Uuid),
    Date { days: i32 },
    Time { micros: i64 },
    TimeTz { micros: i64, offset_seconds: i32 },
    Timestamp { value: i64, unit: TimeUnit },
    Interval { months: i32, days: i32, micros: i64 },
    Bit(Vec<bool>),
    List(Vec<CellValue>),
    Array(Vec<CellValue>),
    Struct(Vec<(String, CellValue)>),
    Map(Vec<(CellValue, CellValue)>),
    Union { tag: String, value: Box<CellValue> },
}

impl CellValue {
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    #[must_use]
    pub const fn days(&self) -> Option<i32> {
        match self {
            Self::Date { days } => Some(*days),
            _ => None,
        }
    }

    /// Milliseconds since the epoch for any timestamp-like value.
    #[must_use]
    pub const fn epoch_millis(&self) -> Option<i128> {
        match self {
            Self::Timestamp { value, unit } => Some(unit.to_millis(*value)),
            Self::Date { days } => Some(*days as i128 * 86_400_000),
            _ => None,
        }
    }

    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn to_double(&self) -> Option<f64> {
        match self {
            Self::Decimal { value, scale, .. } => Some(*value as f64 / 10_f64.powi(i32::from(*scale))),
            Self::Float(value) => Some(*value),
            Self::Int(value) | Self::BigInt(value) => Some(*value as f64),
            Self::UInt(value) | Self::UBigInt(value) => Some(*value as f64),
            Self::HugeInt(value) => Some(*value as f64),
            Self::UHugeInt(value) => Some(*value as f64),
            _ => None,
        }
    }

    #[must_use]
    pub fn bits(&self) -> Option<Vec<bool>> {
        match self {
            Self::Bit(bits) => Some(bits.clone()),
            Self::Varchar(text) if text.chars().all(|c| c == '0' || c == '1') => {
                Some(text.chars().map(|c| c == '1').collect())
            }
            _ => None,
        }
    }
}

/// A chunk of rows delivered together by the engine. Rows are positional and
/// line up with `columns`.
#[derive(Debug, Clone)]
pub struct ResultBatch {
    columns: Arc<[ColumnDescriptor]>,
    rows: Vec<Vec<CellValue>>,
}

impl ResultBatch {
    #[must_use]
    pub const fn new(columns: Arc<[ColumnDescriptor]>, rows: Vec<Vec<CellValue>>) -> Self {
        Self { columns, rows }
    }

    #[must_use]
    pub fn columns(&self) -> &[ColumnDescriptor] {
        &self.columns
    }

    #[must_use]
    pub fn rows(&self) -> &[Vec<CellValue>] {
        &self.rows
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[derive(Default, Debug, Clone, PartialEq, Eq)]
pub struct RequestContext {
    pub query: String,
    pub streaming: bool,
    pub emit_column_metadata: bool,
}

impl RequestContext {
    #[must_use]
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub const fn with_columns(mut self, emit_column_metadata: bool) -> Self {
        self.emit_column_metadata = emit_column_metadata;
        self
    }

    #[must_use]
    pub const fn streaming(mut self) -> Self {
        self.streaming = true;
        self
    }
}

pub type JsonRow = Map<String, Value>;

#[derive(Debug, Clone, PartialEq)]
pub struct QueryOutput {
    pub rows: Vec<JsonRow>,
    /// Empty unless the caller asked for column metadata.
    pub columns: Vec<ColumnDescriptor>,
}
