//! Conversion of engine cell values into JSON.
//!
//! [`convert`] is total: every `(CellValue, LogicalType)` pair yields a JSON
//! value, and a cell whose shape does not match the declared type falls back
//! to the identity rendering instead of failing.

use crate::models::{CellValue, ColumnDescriptor, JsonRow, LogicalType};
use chrono::{DateTime, Datelike, Timelike};
use serde_json::{Map, Number, Value, json};

const MILLIS_PER_DAY: i128 = 86_400_000;
// Largest instant representable as an ISO-8601 date, in milliseconds.
const MAX_INSTANT_MILLIS: i128 = 8_640_000_000_000_000;

#[must_use]
pub fn convert(value: &CellValue, logical_type: LogicalType) -> Value {
    if value.is_null() {
        return Value::Null;
    }
    match logical_type {
        LogicalType::Date => match value.days() {
            Some(days) if is_infinite_date(days) => infinity_text(i64::from(days)),
            Some(days) => iso_instant(i128::from(days) * MILLIS_PER_DAY),
            None => identity(value),
        },
        LogicalType::Timestamp
        | LogicalType::TimestampTz
        | LogicalType::TimestampMs
        | LogicalType::TimestampS
        | LogicalType::TimestampNs => match value {
            CellValue::Timestamp { value: raw, .. } if is_infinity(*raw) => infinity_text(*raw),
            _ => value
                .epoch_millis()
                .map_or_else(|| identity(value), iso_instant),
        },
        LogicalType::Time | LogicalType::TimeTz => Value::String(text(value)),
        LogicalType::Array
        | LogicalType::List
        | LogicalType::Struct
        | LogicalType::Map
        | LogicalType::Union => Value::String(raw_json(value).to_string()),
        LogicalType::Decimal => value
            .to_double()
            .map_or_else(|| identity(value), float_value),
        LogicalType::Uuid | LogicalType::Interval | LogicalType::Blob => {
            Value::String(text(value))
        }
        LogicalType::BigInt
        | LogicalType::UBigInt
        | LogicalType::HugeInt
        | LogicalType::UHugeInt
        | LogicalType::VarInt => match value {
            CellValue::Int(int) => Value::String(int.to_string()),
            CellValue::UInt(uint) => Value::String(uint.to_string()),
            _ => identity(value),
        },
        LogicalType::Bit => value.bits().map_or_else(
            || identity(value),
            |bits| Value::Array(bits.into_iter().map(Value::Bool).collect()),
        ),
        _ => identity(value),
    }
}

/// Converts one positional row into a JSON object keyed by column name.
#[must_use]
pub fn convert_row(columns: &[ColumnDescriptor], row: &[CellValue]) -> JsonRow {
    let mut object = Map::with_capacity(columns.len());
    for (column, cell) in columns.iter().zip(row) {
        object.insert(column.name.clone(), convert(cell, column.logical_type));
    }
    object
}

/// The value as-is: numbers and strings pass through, 64-bit and wider
/// integers become numeric strings so no precision is lost. Non-finite floats
/// become `null`.
#[must_use]
pub fn identity(value: &CellValue) -> Value {
    match value {
        CellValue::Null => Value::Null,
        CellValue::Boolean(flag) => Value::Bool(*flag),
        CellValue::Int(int) => Value::Number((*int).into()),
        CellValue::UInt(uint) => Value::Number((*uint).into()),
        CellValue::BigInt(int) => Value::String(int.to_string()),
        CellValue::UBigInt(uint) => Value::String(uint.to_string()),
        CellValue::HugeInt(int) => Value::String(int.to_string()),
        CellValue::UHugeInt(uint) => Value::String(uint.to_string()),
        CellValue::Float(float) => float_value(*float),
        CellValue::Varchar(s) | CellValue::Enum(s) => Value::String(s.clone()),
        other => raw_json(other),
    }
}

/// JSON shape of the engine's own value object, used inside double-encoded
/// composites.
#[must_use]
pub fn raw_json(value: &CellValue) -> Value {
    match value {
        CellValue::Null => Value::Null,
        CellValue::Boolean(_)
        | CellValue::Int(_)
        | CellValue::UInt(_)
        | CellValue::BigInt(_)
        | CellValue::UBigInt(_)
        | CellValue::HugeInt(_)
        | CellValue::UHugeInt(_)
        | CellValue::Float(_)
        | CellValue::Varchar(_)
        | CellValue::Enum(_) => identity(value),
        CellValue::Decimal {
            value,
            width,
            scale,
        } => json!({"width": width, "scale": scale, "value": value.to_string()}),
        CellValue::Date { days } => json!({ "days": days }),
        CellValue::Time { micros } => json!({ "micros": micros.to_string() }),
        CellValue::TimeTz {
            micros,
            offset_seconds,
        } => json!({"micros": micros.to_string(), "offset": offset_seconds}),
        CellValue::Timestamp { value, unit } => {
            let mut object = Map::new();
            object.insert(unit.raw_field().to_string(), Value::String(value.to_string()));
            Value::Object(object)
        }
        CellValue::Interval {
            months,
            days,
            micros,
        } => json!({"months": months, "days": days, "micros": micros.to_string()}),
        CellValue::Uuid(_) | CellValue::Blob(_) | CellValue::Bit(_) => Value::String(text(value)),
        CellValue::List(items) | CellValue::Array(items) => {
            json!({ "items": items.iter().map(raw_json).collect::<Vec<_>>() })
        }
        CellValue::Struct(fields) => {
            let entries: Map<String, Value> = fields
                .iter()
                .map(|(name, field)| (name.clone(), raw_json(field)))
                .collect();
            json!({ "entries": entries })
        }
        CellValue::Map(entries) => {
            let entries: Vec<Value> = entries
                .iter()
                .map(|(key, value)| json!({"key": raw_json(key), "value": raw_json(value)}))
                .collect();
            json!({ "entries": entries })
        }
        CellValue::Union { tag, value } => json!({"tag": tag, "value": raw_json(value)}),
    }
}

/// The engine's canonical text rendering of a value.
#[must_use]
pub fn text(value: &CellValue) -> String {
    match value {
        CellValue::Null => "NULL".to_string(),
        CellValue::Time { micros } => time_text(*micros),
        CellValue::TimeTz {
            micros,
            offset_seconds,
        } => format!("{}{}", time_text(*micros), offset_text(*offset_seconds)),
        CellValue::Interval {
            months,
            days,
            micros,
        } => interval_text(*months, *days, *micros),
        CellValue::Uuid(uuid) => uuid.hyphenated().to_string(),
        CellValue::Blob(bytes) => blob_text(bytes),
        CellValue::Bit(bits) => bits.iter().map(|bit| if *bit { '1' } else { '0' }).collect(),
        CellValue::Varchar(s) | CellValue::Enum(s) => s.clone(),
        CellValue::Timestamp { .. } | CellValue::Date { .. } => {
            let logical_type = if value.days().is_some() {
                LogicalType::Date
            } else {
                LogicalType::Timestamp
            };
            match convert(value, logical_type) {
                Value::String(s) => s,
                other => other.to_string(),
            }
        }
        other => match identity(other) {
            Value::String(s) => s,
            json => json.to_string(),
        },
    }
}

fn float_value(float: f64) -> Value {
    Number::from_f64(float).map_or(Value::Null, Value::Number)
}

const fn is_infinity(raw: i64) -> bool {
    raw == i64::MAX || raw == -i64::MAX
}

const fn is_infinite_date(days: i32) -> bool {
    days == i32::MAX || days == -i32::MAX
}

fn infinity_text(raw: i64) -> Value {
    Value::String(if raw > 0 { "infinity" } else { "-infinity" }.to_string())
}

/// Renders milliseconds since the epoch as `YYYY-MM-DDTHH:mm:ss.sssZ`.
#[must_use]
pub fn iso_instant(millis: i128) -> Value {
    if millis.abs() > MAX_INSTANT_MILLIS {
        return Value::String(millis.to_string());
    }
    let Some(instant) = i64::try_from(millis)
        .ok()
        .and_then(DateTime::from_timestamp_millis)
    else {
        return Value::String(millis.to_string());
    };
    let year = instant.year();
    let year = if (0..=9999).contains(&year) {
        format!("{year:04}")
    } else {
        format!("{year:+07}")
    };
    Value::String(format!(
        "{year}-{:02}-{:02}T{:02}:{:02}:{:02}.{:03}Z",
        instant.month(),
        instant.day(),
        instant.hour(),
        instant.minute(),
        instant.second(),
        instant.timestamp_subsec_millis()
    ))
}

fn fraction_text(micros: i64) -> String {
    if micros == 0 {
        return String::new();
    }
    let digits = format!("{micros:06}");
    format!(".{}", digits.trim_end_matches('0'))
}

fn clock_text(total_micros: i64) -> String {
    let micros = total_micros % 1_000_000;
    let total_seconds = total_micros / 1_000_000;
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;
    format!(
        "{hours:02}:{minutes:02}:{seconds:02}{}",
        fraction_text(micros)
    )
}

// TIME spans 00:00:00 through 24:00:00 inclusive, so no wrap-around.
fn time_text(micros: i64) -> String {
    clock_text(micros.max(0))
}

fn offset_text(offset_seconds: i32) -> String {
    let sign = if offset_seconds < 0 { '-' } else { '+' };
    let offset = offset_seconds.unsigned_abs();
    let hours = offset / 3600;
    let minutes = (offset % 3600) / 60;
    let seconds = offset % 60;
    match (minutes, seconds) {
        (0, 0) => format!("{sign}{hours:02}"),
        (_, 0) => format!("{sign}{hours:02}:{minutes:02}"),
        _ => format!("{sign}{hours:02}:{minutes:02}:{seconds:02}"),
    }
}

fn plural(count: i64, unit: &str) -> String {
    if count == 1 || count == -1 {
        format!("{count} {unit}")
    } else {
        format!("{count} {unit}s")
    }
}

fn interval_text(months: i32, days: i32, micros: i64) -> String {
    let mut parts = Vec::new();
    let years = months / 12;
    let months = months % 12;
    if years != 0 {
        parts.push(plural(i64::from(years), "year"));
    }
    if months != 0 {
        parts.push(plural(i64::from(months), "month"));
    }
    if days != 0 {
        parts.push(plural(i64::from(days), "day"));
    }
    if micros != 0 {
        let sign = if micros < 0 { "-" } else { "" };
        parts.push(format!("{sign}{}", clock_text(micros.saturating_abs())));
    }
    if parts.is_empty() {
        "00:00:00".to_string()
    } else {
        parts.join(" ")
    }
}

fn blob_text(bytes: &[u8]) -> String {
    let mut rendered = String::with_capacity(bytes.len());
    for byte in bytes {
        match byte {
            b'\\' | b'\'' | b'"' => rendered.push_str(&format!("\\x{byte:02X}")),
            0x20..=0x7E => rendered.push(char::from(*byte)),
            _ => rendered.push_str(&format!("\\x{byte:02X}")),
        }
    }
    rendered
}
