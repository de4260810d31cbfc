use super::type_tree::TypeNode;
use super::{BatchCursor, Engine, Session};
use crate::error::{ExecutionError, ExecutionResult, OpenDatabaseSnafu};
use crate::models::{
    CellValue, ColumnDescriptor, LogicalType, ResultBatch, TimeUnit, deduplicate_column_names,
};
use duckdb::arrow::array::{Array, ArrayRef, AsArray, StructArray};
use duckdb::arrow::datatypes::{
    DataType, Date32Type, Date64Type, Decimal128Type, Float32Type, Float64Type, Int8Type,
    Int16Type, Int32Type, Int64Type, IntervalDayTimeType, IntervalMonthDayNanoType, IntervalUnit,
    IntervalYearMonthType, Time32MillisecondType, Time32SecondType, Time64MicrosecondType,
    Time64NanosecondType, TimeUnit as ArrowTimeUnit, TimestampMicrosecondType,
    TimestampMillisecondType, TimestampNanosecondType, TimestampSecondType, UInt8Type, UInt16Type,
    UInt32Type, UInt64Type,
};
use duckdb::arrow::util::display::array_value_to_string;
use duckdb::{Connection, Statement};
use parking_lot::Mutex;
use snafu::ResultExt;
use std::sync::Arc;

pub const IN_MEMORY: &str = ":memory:";

/// DuckDB database opened once per process. Every session is an independent
/// connection cloned from the root one, so sessions run concurrently against
/// the same database instance.
pub struct DuckDbEngine {
    target: String,
    root: Mutex<Connection>,
    version: String,
}

impl DuckDbEngine {
    #[tracing::instrument(name = "DuckDbEngine::open", level = "info", err)]
    pub fn open(target: &str) -> ExecutionResult<Self> {
        let conn = if target.is_empty() || target == IN_MEMORY {
            Connection::open_in_memory()
        } else {
            Connection::open(target)
        }
        .context(OpenDatabaseSnafu { target })?;

        let version = conn
            .query_row("SELECT library_version FROM pragma_version()", [], |row| {
                row.get::<_, String>(0)
            })
            .context(OpenDatabaseSnafu { target })?;
        tracing::info!(target = %target, version = %version, "database opened");

        Ok(Self {
            target: target.to_string(),
            root: Mutex::new(conn),
            version,
        })
    }

    #[must_use]
    pub fn target(&self) -> &str {
        &self.target
    }

    /// Installs and loads community extensions. Failures are logged and
    /// skipped so an offline host still starts.
    pub fn load_extensions(&self, extensions: &[String]) {
        let conn = {
            let root = self.root.lock();
            match root.try_clone() {
                Ok(conn) => conn,
                Err(error) => {
                    tracing::warn!(%error, "no connection available for extension setup");
                    return;
                }
            }
        };
        for extension in extensions {
            if extension.is_empty()
                || !extension
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '_')
            {
                tracing::warn!(extension = %extension, "skipping invalid extension name");
                continue;
            }
            match conn.execute_batch(&format!(
                "INSTALL {extension} FROM community; LOAD {extension};"
            )) {
                Ok(()) => tracing::info!(extension = %extension, "extension loaded"),
                Err(error) => {
                    tracing::warn!(extension = %extension, %error, "failed to load extension");
                }
            }
        }
    }
}

impl Engine for DuckDbEngine {
    fn connect(&self) -> ExecutionResult<Box<dyn Session>> {
        let conn = self
            .root
            .lock()
            .try_clone()
            .map_err(ExecutionError::unavailable)?;
        Ok(Box::new(DuckDbSession { conn }))
    }

    fn version(&self) -> String {
        self.version.clone()
    }
}

pub struct DuckDbSession {
    conn: Connection,
}

impl Session for DuckDbSession {
    fn execute(&mut self, query: &str) -> ExecutionResult<Box<dyn BatchCursor + '_>> {
        let (leading, last) = split_last_statement(query);
        if !leading.trim().is_empty() {
            self.conn
                .execute_batch(leading)
                .map_err(ExecutionError::query)?;
        }
        let described = match describe_columns(&self.conn, last) {
            Ok(columns) => Some(columns),
            Err(error) => {
                tracing::trace!(%error, "statement not describable, using result schema types");
                None
            }
        };

        let mut statement = prepare_result(&self.conn, last, described.as_deref())?;
        let schema = statement
            .stream_arrow([])
            .map_err(ExecutionError::query)?
            .get_schema();
        let names: Vec<String> = schema.fields().iter().map(|f| f.name().clone()).collect();
        let names = deduplicate_column_names(&names);
        let types: Vec<TypeNode> = match described {
            Some(described) if described.len() == names.len() => described
                .iter()
                .zip(schema.fields().iter())
                .map(|((_, type_name), field)| match TypeNode::parse(type_name) {
                    // user type aliases render under their own name
                    node if node.logical_type == LogicalType::Unknown => {
                        TypeNode::leaf(logical_type_of(field.data_type()))
                    }
                    node => node,
                })
                .collect(),
            _ => schema
                .fields()
                .iter()
                .map(|field| TypeNode::leaf(logical_type_of(field.data_type())))
                .collect(),
        };
        let columns: Arc<[ColumnDescriptor]> = names
            .into_iter()
            .zip(&types)
            .map(|(name, node)| ColumnDescriptor::new(name, node.logical_type))
            .collect();

        Ok(Box::new(DuckDbCursor {
            statement,
            columns,
            types,
            finished: false,
        }))
    }

    fn describe(&mut self, query: &str) -> ExecutionResult<Vec<ColumnDescriptor>> {
        // Surface the engine's own parse/bind error before trying DESCRIBE.
        self.conn.prepare(query).map_err(ExecutionError::query)?;
        let Ok(described) = describe_columns(&self.conn, query) else {
            return Ok(Vec::new());
        };
        let names: Vec<String> = described.iter().map(|(name, _)| name.clone()).collect();
        Ok(deduplicate_column_names(&names)
            .into_iter()
            .zip(described)
            .map(|(name, (_, type_name))| {
                ColumnDescriptor::new(name, LogicalType::from_type_name(&type_name))
            })
            .collect())
    }

    fn close(self: Box<Self>) {
        drop(self);
    }
}

struct DuckDbCursor<'conn> {
    statement: Statement<'conn>,
    columns: Arc<[ColumnDescriptor]>,
    types: Vec<TypeNode>,
    finished: bool,
}

impl BatchCursor for DuckDbCursor<'_> {
    fn columns(&self) -> &[ColumnDescriptor] {
        &self.columns
    }

    fn next_batch(&mut self) -> ExecutionResult<Option<ResultBatch>> {
        if self.finished {
            return Ok(None);
        }
        let chunk = match self.statement.step() {
            Ok(Some(chunk)) => chunk,
            Ok(None) => {
                self.finished = true;
                return Ok(None);
            }
            Err(error) => {
                self.finished = true;
                return Err(ExecutionError::query(error));
            }
        };
        Ok(Some(ResultBatch::new(
            Arc::clone(&self.columns),
            rows_of(&chunk, &self.types),
        )))
    }
}

/// Prepares the last statement. Top-level `TIME WITH TIME ZONE` columns lose
/// their offset in the columnar export, so those are read back as text.
fn prepare_result<'conn>(
    conn: &'conn Connection,
    query: &str,
    described: Option<&[(String, String)]>,
) -> ExecutionResult<Statement<'conn>> {
    if let Some(wrapped) = described.and_then(|columns| time_tz_as_text(query, columns)) {
        match conn.prepare(&wrapped) {
            Ok(statement) => return Ok(statement),
            Err(error) => tracing::debug!(%error, "reading TIMETZ columns natively"),
        }
    }
    conn.prepare(query).map_err(ExecutionError::query)
}

fn time_tz_as_text(query: &str, columns: &[(String, String)]) -> Option<String> {
    let has_time_tz = columns
        .iter()
        .any(|(_, type_name)| LogicalType::from_type_name(type_name) == LogicalType::TimeTz);
    let unique = columns
        .iter()
        .map(|(name, _)| name)
        .collect::<std::collections::HashSet<_>>()
        .len()
        == columns.len();
    if !has_time_tz || !unique {
        return None;
    }
    let projection: Vec<String> = columns
        .iter()
        .map(|(name, type_name)| {
            let ident = format!("\"{}\"", name.replace('"', "\"\""));
            if LogicalType::from_type_name(type_name) == LogicalType::TimeTz {
                format!("CAST({ident} AS VARCHAR) AS {ident}")
            } else {
                ident
            }
        })
        .collect();
    let body = query.trim().trim_end_matches(';');
    Some(format!(
        "SELECT {} FROM (\n{body}\n) AS timetz_source",
        projection.join(", ")
    ))
}

fn describe_columns(conn: &Connection, query: &str) -> duckdb::Result<Vec<(String, String)>> {
    let query = query.trim().trim_end_matches(';');
    let mut statement = conn.prepare(&format!("DESCRIBE {query}"))?;
    let rows = statement.query_map([], |row| {
        Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
    })?;
    rows.collect()
}

/// Splits SQL text into everything before the last statement and the last
/// statement itself, honouring quotes and comments.
fn split_last_statement(sql: &str) -> (&str, &str) {
    let bytes = sql.as_bytes();
    let mut last_start = 0;
    let mut candidate_start = 0;
    let mut has_content = false;
    let mut idx = 0;
    while idx < bytes.len() {
        match bytes[idx] {
            quote @ (b'\'' | b'"') => {
                has_content = true;
                idx += 1;
                while idx < bytes.len() && bytes[idx] != quote {
                    idx += 1;
                }
            }
            b'-' if bytes.get(idx + 1) == Some(&b'-') => {
                while idx < bytes.len() && bytes[idx] != b'\n' {
                    idx += 1;
                }
            }
            b'/' if bytes.get(idx + 1) == Some(&b'*') => {
                idx += 2;
                while idx + 1 < bytes.len() && !(bytes[idx] == b'*' && bytes[idx + 1] == b'/') {
                    idx += 1;
                }
                idx += 1;
            }
            b';' => {
                if has_content {
                    last_start = candidate_start;
                }
                candidate_start = idx + 1;
                has_content = false;
            }
            byte if !byte.is_ascii_whitespace() => has_content = true,
            _ => {}
        }
        idx += 1;
    }
    if has_content {
        last_start = candidate_start;
    }
    sql.split_at(last_start.min(sql.len()))
}

fn rows_of(chunk: &StructArray, types: &[TypeNode]) -> Vec<Vec<CellValue>> {
    let arrays = chunk.columns();
    (0..chunk.len())
        .map(|row| {
            arrays
                .iter()
                .zip(types)
                .map(|(array, node)| cell_at(array.as_ref(), row, Some(node)))
                .collect()
        })
        .collect()
}

fn children(array: &ArrayRef, node: Option<&TypeNode>) -> Vec<CellValue> {
    (0..array.len())
        .map(|row| cell_at(array.as_ref(), row, node))
        .collect()
}

fn display(array: &dyn Array, row: usize, hint: LogicalType) -> CellValue {
    match array_value_to_string(array, row) {
        Ok(text) => from_text(&text, hint),
        Err(error) => {
            tracing::warn!(%error, data_type = %array.data_type(), "unreadable cell");
            CellValue::Null
        }
    }
}

fn from_text(text: &str, hint: LogicalType) -> CellValue {
    let fallback = || CellValue::Varchar(text.to_string());
    match hint {
        LogicalType::Uuid => uuid::Uuid::parse_str(text).map_or_else(|_| fallback(), CellValue::Uuid),
        LogicalType::Bit => fallback().bits().map_or_else(fallback, CellValue::Bit),
        LogicalType::HugeInt => text.parse().map_or_else(|_| fallback(), CellValue::HugeInt),
        LogicalType::UHugeInt => text.parse().map_or_else(|_| fallback(), CellValue::UHugeInt),
        LogicalType::TimeTz => time_tz_from_text(text).unwrap_or_else(fallback),
        LogicalType::Enum => CellValue::Enum(text.to_string()),
        _ => fallback(),
    }
}

fn from_bytes(bytes: &[u8], hint: LogicalType) -> CellValue {
    let fallback = || {
        std::str::from_utf8(bytes).map_or_else(
            |_| CellValue::Blob(bytes.to_vec()),
            |text| from_text(text, hint),
        )
    };
    match hint {
        LogicalType::Uuid => uuid::Uuid::from_slice(bytes)
            .map_or_else(|_| CellValue::Blob(bytes.to_vec()), CellValue::Uuid),
        LogicalType::Bit => bitstring(bytes).map_or_else(fallback, CellValue::Bit),
        LogicalType::VarInt => bignum_text(bytes).map_or_else(fallback, CellValue::Varchar),
        LogicalType::HugeInt => <[u8; 16]>::try_from(bytes)
            .map_or_else(|_| fallback(), |raw| CellValue::HugeInt(i128::from_le_bytes(raw))),
        LogicalType::UHugeInt => <[u8; 16]>::try_from(bytes)
            .map_or_else(|_| fallback(), |raw| CellValue::UHugeInt(u128::from_le_bytes(raw))),
        LogicalType::Varchar | LogicalType::TimeTz => fallback(),
        _ => CellValue::Blob(bytes.to_vec()),
    }
}

/// Engine bitstring layout: the first byte counts the padding bits at the
/// front of the second byte, the rest are the bits most significant first.
fn bitstring(bytes: &[u8]) -> Option<Vec<bool>> {
    let (&padding, data) = bytes.split_first()?;
    let padding = usize::from(padding);
    if padding >= 8 || (data.is_empty() && padding != 0) {
        return None;
    }
    Some(
        data.iter()
            .flat_map(|byte| (0..8).rev().map(move |shift| ((byte >> shift) & 1) == 1))
            .skip(padding)
            .collect(),
    )
}

/// Engine arbitrary-precision integer layout: a 3 byte header with the sign in
/// the top bit and the magnitude length below it, then the magnitude big-endian.
/// Negative numbers store every byte inverted.
fn bignum_text(bytes: &[u8]) -> Option<String> {
    const LIMB: u64 = 1_000_000_000;

    if bytes.len() < 4 {
        return None;
    }
    let negative = (bytes[0] & 0x80) == 0;
    let flip = |byte: u8| if negative { !byte } else { byte };
    let declared = (usize::from(flip(bytes[0]) & 0x7F) << 16)
        | (usize::from(flip(bytes[1])) << 8)
        | usize::from(flip(bytes[2]));
    let magnitude = &bytes[3..];
    if declared != magnitude.len() {
        return None;
    }

    // base 10^9, least significant limb first
    let mut limbs: Vec<u64> = vec![0];
    for byte in magnitude {
        let mut carry = u64::from(flip(*byte));
        for limb in &mut limbs {
            let value = *limb * 256 + carry;
            *limb = value % LIMB;
            carry = value / LIMB;
        }
        while carry > 0 {
            limbs.push(carry % LIMB);
            carry /= LIMB;
        }
    }
    while limbs.len() > 1 && limbs.last() == Some(&0) {
        limbs.pop();
    }

    let mut digits = String::new();
    if negative && limbs != [0] {
        digits.push('-');
    }
    let mut limbs = limbs.iter().rev();
    if let Some(head) = limbs.next() {
        digits.push_str(&head.to_string());
    }
    for limb in limbs {
        digits.push_str(&format!("{limb:09}"));
    }
    Some(digits)
}

// `12:34:56.5+02:30` as rendered by the engine's VARCHAR cast.
fn time_tz_from_text(text: &str) -> Option<CellValue> {
    let split = text.rfind(['+', '-'])?;
    let (clock, offset) = text.split_at(split);
    let micros = clock_micros(clock)?;
    let sign = if offset.starts_with('-') { -1 } else { 1 };
    let mut parts = offset[1..].split(':');
    let hours: i32 = parts.next()?.parse().ok()?;
    let minutes: i32 = parts.next().map_or(Ok(0), str::parse).ok()?;
    let seconds: i32 = parts.next().map_or(Ok(0), str::parse).ok()?;
    Some(CellValue::TimeTz {
        micros,
        offset_seconds: sign * (hours * 3600 + minutes * 60 + seconds),
    })
}

fn clock_micros(clock: &str) -> Option<i64> {
    let mut parts = clock.split(':');
    let hours: i64 = parts.next()?.parse().ok()?;
    let minutes: i64 = parts.next()?.parse().ok()?;
    let seconds = parts.next()?;
    let (seconds, fraction) = seconds.split_once('.').unwrap_or((seconds, ""));
    let seconds: i64 = seconds.parse().ok()?;
    let fraction: i64 = if fraction.is_empty() {
        0
    } else {
        format!("{fraction:0<6}").get(..6)?.parse().ok()?
    };
    Some(((hours * 60 + minutes) * 60 + seconds) * 1_000_000 + fraction)
}

#[allow(clippy::too_many_lines)]
fn cell_at(array: &dyn Array, row: usize, node: Option<&TypeNode>) -> CellValue {
    if array.is_null(row) {
        return CellValue::Null;
    }
    let hint = node.map_or_else(|| logical_type_of(array.data_type()), |node| node.logical_type);
    let child = |idx: usize| node.and_then(|node| node.child(idx));
    match array.data_type() {
        DataType::Null => CellValue::Null,
        DataType::Boolean => CellValue::Boolean(array.as_boolean().value(row)),
        DataType::Int8 => CellValue::Int(array.as_primitive::<Int8Type>().value(row).into()),
        DataType::Int16 => CellValue::Int(array.as_primitive::<Int16Type>().value(row).into()),
        DataType::Int32 => CellValue::Int(array.as_primitive::<Int32Type>().value(row).into()),
        DataType::Int64 => CellValue::BigInt(array.as_primitive::<Int64Type>().value(row)),
        DataType::UInt8 => CellValue::UInt(array.as_primitive::<UInt8Type>().value(row).into()),
        DataType::UInt16 => CellValue::UInt(array.as_primitive::<UInt16Type>().value(row).into()),
        DataType::UInt32 => CellValue::UInt(array.as_primitive::<UInt32Type>().value(row).into()),
        DataType::UInt64 => CellValue::UBigInt(array.as_primitive::<UInt64Type>().value(row)),
        DataType::Float32 => {
            CellValue::Float(array.as_primitive::<Float32Type>().value(row).into())
        }
        DataType::Float64 => CellValue::Float(array.as_primitive::<Float64Type>().value(row)),
        DataType::Decimal128(width, scale) => {
            let value = array.as_primitive::<Decimal128Type>().value(row);
            match hint {
                LogicalType::HugeInt if *scale == 0 => CellValue::HugeInt(value),
                // unsigned 128 bit values travel as the same bits in a signed decimal
                LogicalType::UHugeInt if *scale == 0 => {
                    CellValue::UHugeInt(u128::from_le_bytes(value.to_le_bytes()))
                }
                _ => CellValue::Decimal {
                    value,
                    width: *width,
                    scale: *scale,
                },
            }
        }
        DataType::Utf8 => from_text(array.as_string::<i32>().value(row), hint),
        DataType::LargeUtf8 => from_text(array.as_string::<i64>().value(row), hint),
        DataType::Utf8View => from_text(array.as_string_view().value(row), hint),
        DataType::BinaryView => from_bytes(array.as_binary_view().value(row), hint),
        DataType::Binary => from_bytes(array.as_binary::<i32>().value(row), hint),
        DataType::LargeBinary => from_bytes(array.as_binary::<i64>().value(row), hint),
        DataType::FixedSizeBinary(_) => {
            from_bytes(array.as_fixed_size_binary().value(row), hint)
        }
        DataType::Date32 => CellValue::Date {
            days: array.as_primitive::<Date32Type>().value(row),
        },
        DataType::Date64 => CellValue::Timestamp {
            value: array.as_primitive::<Date64Type>().value(row),
            unit: TimeUnit::Millisecond,
        },
        DataType::Time32(ArrowTimeUnit::Second) => CellValue::Time {
            micros: i64::from(array.as_primitive::<Time32SecondType>().value(row)) * 1_000_000,
        },
        DataType::Time32(_) => CellValue::Time {
            micros: i64::from(array.as_primitive::<Time32MillisecondType>().value(row)) * 1000,
        },
        DataType::Time64(ArrowTimeUnit::Nanosecond) => CellValue::Time {
            micros: array.as_primitive::<Time64NanosecondType>().value(row) / 1000,
        },
        DataType::Time64(_) => CellValue::Time {
            micros: array.as_primitive::<Time64MicrosecondType>().value(row),
        },
        DataType::Timestamp(unit, _) => {
            let (value, unit) = match unit {
                ArrowTimeUnit::Second => (
                    array.as_primitive::<TimestampSecondType>().value(row),
                    TimeUnit::Second,
                ),
                ArrowTimeUnit::Millisecond => (
                    array.as_primitive::<TimestampMillisecondType>().value(row),
                    TimeUnit::Millisecond,
                ),
                ArrowTimeUnit::Microsecond => (
                    array.as_primitive::<TimestampMicrosecondType>().value(row),
                    TimeUnit::Microsecond,
                ),
                ArrowTimeUnit::Nanosecond => (
                    array.as_primitive::<TimestampNanosecondType>().value(row),
                    TimeUnit::Nanosecond,
                ),
            };
            CellValue::Timestamp { value, unit }
        }
        DataType::Interval(IntervalUnit::MonthDayNano) => {
            let interval = array.as_primitive::<IntervalMonthDayNanoType>().value(row);
            CellValue::Interval {
                months: interval.months,
                days: interval.days,
                micros: interval.nanoseconds / 1000,
            }
        }
        DataType::Interval(IntervalUnit::DayTime) => {
            let interval = array.as_primitive::<IntervalDayTimeType>().value(row);
            CellValue::Interval {
                months: 0,
                days: interval.days,
                micros: i64::from(interval.milliseconds) * 1000,
            }
        }
        DataType::Interval(IntervalUnit::YearMonth) => CellValue::Interval {
            months: array.as_primitive::<IntervalYearMonthType>().value(row),
            days: 0,
            micros: 0,
        },
        DataType::List(_) => {
            CellValue::List(children(&array.as_list::<i32>().value(row), child(0)))
        }
        DataType::LargeList(_) => {
            CellValue::List(children(&array.as_list::<i64>().value(row), child(0)))
        }
        DataType::FixedSizeList(_, _) => {
            CellValue::Array(children(&array.as_fixed_size_list().value(row), child(0)))
        }
        DataType::Struct(fields) => {
            let array = array.as_struct();
            CellValue::Struct(
                fields
                    .iter()
                    .zip(array.columns())
                    .enumerate()
                    .map(|(idx, (field, column))| {
                        (
                            field.name().clone(),
                            cell_at(column.as_ref(), row, child(idx)),
                        )
                    })
                    .collect(),
            )
        }
        DataType::Map(_, _) => {
            let entries = array.as_map().value(row);
            let (keys, values) = (entries.column(0), entries.column(1));
            CellValue::Map(
                (0..entries.len())
                    .map(|idx| {
                        (
                            cell_at(keys.as_ref(), idx, child(0)),
                            cell_at(values.as_ref(), idx, child(1)),
                        )
                    })
                    .collect(),
            )
        }
        DataType::Union(fields, _) => {
            let array = array.as_union();
            let type_id = array.type_id(row);
            let member = fields.iter().position(|(id, _)| id == type_id);
            let tag = member
                .and_then(|idx| fields.iter().nth(idx))
                .map(|(_, field)| field.name().clone())
                .unwrap_or_default();
            let value = array.value(row);
            CellValue::Union {
                tag,
                value: Box::new(cell_at(value.as_ref(), 0, member.and_then(child))),
            }
        }
        DataType::Dictionary(_, _) => display(array, row, LogicalType::Enum),
        _ => display(array, row, hint),
    }
}

/// Best-effort logical type for a column the engine could not describe.
#[must_use]
pub fn logical_type_of(data_type: &DataType) -> LogicalType {
    match data_type {
        DataType::Null => LogicalType::SqlNull,
        DataType::Boolean => LogicalType::Boolean,
        DataType::Int8 => LogicalType::TinyInt,
        DataType::Int16 => LogicalType::SmallInt,
        DataType::Int32 => LogicalType::Integer,
        DataType::Int64 => LogicalType::BigInt,
        DataType::UInt8 => LogicalType::UTinyInt,
        DataType::UInt16 => LogicalType::USmallInt,
        DataType::UInt32 => LogicalType::UInteger,
        DataType::UInt64 => LogicalType::UBigInt,
        DataType::Float16 | DataType::Float32 => LogicalType::Float,
        DataType::Float64 => LogicalType::Double,
        DataType::Decimal128(_, _) | DataType::Decimal256(_, _) => LogicalType::Decimal,
        DataType::Utf8 | DataType::LargeUtf8 | DataType::Utf8View => LogicalType::Varchar,
        DataType::Binary
        | DataType::LargeBinary
        | DataType::BinaryView
        | DataType::FixedSizeBinary(_) => LogicalType::Blob,
        DataType::Date32 | DataType::Date64 => LogicalType::Date,
        DataType::Time32(_) | DataType::Time64(_) => LogicalType::Time,
        DataType::Timestamp(ArrowTimeUnit::Second, _) => LogicalType::TimestampS,
        DataType::Timestamp(ArrowTimeUnit::Millisecond, _) => LogicalType::TimestampMs,
        DataType::Timestamp(ArrowTimeUnit::Nanosecond, _) => LogicalType::TimestampNs,
        DataType::Timestamp(ArrowTimeUnit::Microsecond, Some(_)) => LogicalType::TimestampTz,
        DataType::Timestamp(ArrowTimeUnit::Microsecond, None) => LogicalType::Timestamp,
        DataType::Interval(_) | DataType::Duration(_) => LogicalType::Interval,
        DataType::List(_) | DataType::LargeList(_) => LogicalType::List,
        DataType::FixedSizeList(_, _) => LogicalType::Array,
        DataType::Struct(_) => LogicalType::Struct,
        DataType::Map(_, _) => LogicalType::Map,
        DataType::Union(_, _) => LogicalType::Union,
        DataType::Dictionary(_, _) => LogicalType::Enum,
        _ => LogicalType::Unknown,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn splits_off_last_statement() {
        assert_eq!(split_last_statement("SELECT 1"), ("", "SELECT 1"));
        assert_eq!(
            split_last_statement("CREATE TABLE t (a INT); SELECT * FROM t;"),
            ("CREATE TABLE t (a INT);", " SELECT * FROM t;")
        );
        assert_eq!(
            split_last_statement("SELECT 'a;b' AS x -- trailing; comment"),
            ("", "SELECT 'a;b' AS x -- trailing; comment")
        );
        assert_eq!(
            split_last_statement("SELECT 1; /* ; */ SELECT 2"),
            ("SELECT 1;", " /* ; */ SELECT 2")
        );
    }

    #[test]
    fn decodes_engine_bitstrings() {
        assert_eq!(bitstring(b"\x05\xFD"), Some(vec![true, false, true]));
        assert_eq!(
            from_bytes(b"\x05\xFD\x07", LogicalType::Bit),
            CellValue::Bit(vec![
                true, false, true, false, false, false, false, false, true, true, true
            ])
        );
        assert_eq!(bitstring(b"\x09\xFF"), None);
        assert_eq!(
            from_bytes(b"0110", LogicalType::Bit),
            CellValue::Bit(vec![false, true, true, false])
        );
    }

    #[test]
    fn decodes_engine_bignums() {
        let mut positive = vec![0x80, 0x00, 0x0D];
        positive.extend_from_slice(&123_456_789_012_345_678_901_234_567_890_u128.to_be_bytes()[3..]);
        assert_eq!(
            bignum_text(&positive).as_deref(),
            Some("123456789012345678901234567890")
        );

        let negative: Vec<u8> = positive.iter().map(|byte| !byte).collect();
        assert_eq!(
            bignum_text(&negative).as_deref(),
            Some("-123456789012345678901234567890")
        );

        assert_eq!(bignum_text(&[0x80, 0x00, 0x01, 0x00]).as_deref(), Some("0"));
        assert_eq!(bignum_text(&[0x80, 0x00, 0x02, 0x00]), None);
    }

    #[test]
    fn wide_integers_from_raw_bytes() {
        assert_eq!(
            from_bytes(&12_u128.to_le_bytes(), LogicalType::UHugeInt),
            CellValue::UHugeInt(12)
        );
        assert_eq!(
            from_bytes(&(-7_i128).to_le_bytes(), LogicalType::HugeInt),
            CellValue::HugeInt(-7)
        );
    }

    #[test]
    fn parses_time_with_offset() {
        assert_eq!(
            from_text("12:34:56+02", LogicalType::TimeTz),
            CellValue::TimeTz {
                micros: 45_296_000_000,
                offset_seconds: 7200
            }
        );
        assert_eq!(
            from_text("01:02:03.5-05:30", LogicalType::TimeTz),
            CellValue::TimeTz {
                micros: 3_723_500_000,
                offset_seconds: -19_800
            }
        );
        assert_eq!(
            from_text("noon", LogicalType::TimeTz),
            CellValue::Varchar("noon".to_string())
        );
    }

    #[test]
    fn wraps_time_tz_columns_as_text() {
        let columns = vec![
            ("t".to_string(), "TIME WITH TIME ZONE".to_string()),
            ("a \"b\"".to_string(), "INTEGER".to_string()),
        ];
        assert_eq!(
            time_tz_as_text("SELECT 1;", &columns).as_deref(),
            Some(
                "SELECT CAST(\"t\" AS VARCHAR) AS \"t\", \"a \"\"b\"\"\" FROM (\nSELECT 1\n) AS timetz_source"
            )
        );
        assert_eq!(time_tz_as_text("SELECT 1", &columns[1..]), None);
    }

    #[test]
    fn arrow_types_fall_back_to_logical_types() {
        assert_eq!(logical_type_of(&DataType::Int64), LogicalType::BigInt);
        assert_eq!(
            logical_type_of(&DataType::Timestamp(ArrowTimeUnit::Microsecond, None)),
            LogicalType::Timestamp
        );
        assert_eq!(
            logical_type_of(&DataType::Timestamp(
                ArrowTimeUnit::Microsecond,
                Some("UTC".into())
            )),
            LogicalType::TimestampTz
        );
        assert_eq!(logical_type_of(&DataType::Utf8), LogicalType::Varchar);
    }
}
