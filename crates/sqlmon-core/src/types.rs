//! Core types for SQLMon

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A database value that can represent any SQL type a driver hands back
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    /// NULL value
    Null,
    /// Boolean
    Bool(bool),
    /// 8-bit signed integer
    Int8(i8),
    /// 16-bit signed integer
    Int16(i16),
    /// 32-bit signed integer
    Int32(i32),
    /// 64-bit signed integer
    Int64(i64),
    /// 32-bit floating point
    Float32(f32),
    /// 64-bit floating point
    Float64(f64),
    /// Decimal/Numeric (stored as string for precision)
    Decimal(String),
    /// UTF-8 string
    String(String),
    /// Binary data
    Bytes(Vec<u8>),
    /// UUID
    Uuid(Uuid),
    /// Date (year, month, day)
    Date(NaiveDate),
    /// Time (hour, minute, second, nanosecond)
    Time(NaiveTime),
    /// DateTime without timezone
    DateTime(NaiveDateTime),
    /// DateTime with timezone (UTC)
    DateTimeUtc(DateTime<Utc>),
    /// JSON value
    Json(serde_json::Value),
    /// Array of values
    Array(Vec<Value>),
}

impl Value {
    /// Check if the value is NULL
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// String form of the value as reported to a metrics backend.
    ///
    /// Returns `None` for SQL NULL. Binary data is decoded as lossy UTF-8 rather
    /// than summarised, since a metric value must carry the actual content.
    pub fn to_metric_string(&self) -> Option<String> {
        match self {
            Value::Null => None,
            Value::Bytes(b) => Some(String::from_utf8_lossy(b).into_owned()),
            other => Some(other.to_string()),
        }
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Null => write!(f, "NULL"),
            Value::Bool(v) => write!(f, "{}", v),
            Value::Int8(v) => write!(f, "{}", v),
            Value::Int16(v) => write!(f, "{}", v),
            Value::Int32(v) => write!(f, "{}", v),
            Value::Int64(v) => write!(f, "{}", v),
            Value::Float32(v) => write!(f, "{}", v),
            Value::Float64(v) => write!(f, "{}", v),
            Value::Decimal(v) => write!(f, "{}", v),
            Value::String(v) => write!(f, "{}", v),
            Value::Bytes(v) => write!(f, "<{} bytes>", v.len()),
            Value::Uuid(v) => write!(f, "{}", v),
            Value::Date(v) => write!(f, "{}", v),
            Value::Time(v) => write!(f, "{}", v),
            Value::DateTime(v) => write!(f, "{}", v),
            Value::DateTimeUtc(v) => write!(f, "{}", v.to_rfc3339()),
            Value::Json(v) => write!(f, "{}", v),
            Value::Array(items) => {
                write!(f, "[")?;
                for (idx, item) in items.iter().enumerate() {
                    if idx > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int64(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float64(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

/// A row from a query result
#[derive(Debug, Clone)]
pub struct Row {
    /// Column values, in result-set order
    pub values: Vec<Value>,
}

impl Row {
    /// Create a new row
    pub fn new(values: Vec<Value>) -> Self {
        Self { values }
    }

    /// Get a value by 0-based column index
    pub fn get(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    /// Number of values in the row
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Column metadata reported by the driver for a result set
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ColumnMeta {
    /// Column name (or alias) as declared by the query
    #[serde(default)]
    pub name: String,
    /// Data type (database-specific string)
    #[serde(default)]
    pub data_type: String,
    /// Column ordinal position (0-based)
    #[serde(default)]
    pub ordinal: usize,
}

impl ColumnMeta {
    pub fn new(name: impl Into<String>, data_type: impl Into<String>, ordinal: usize) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
            ordinal,
        }
    }
}

/// A fully fetched query result
#[derive(Debug, Clone, Default)]
pub struct QueryResult {
    /// Column metadata
    pub columns: Vec<ColumnMeta>,
    /// Result rows
    pub rows: Vec<Row>,
}

impl QueryResult {
    /// Create a result from columns and rows
    pub fn new(columns: Vec<ColumnMeta>, rows: Vec<Row>) -> Self {
        Self { columns, rows }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metric_string_renders_null_as_absent() {
        assert_eq!(Value::Null.to_metric_string(), None);
    }

    #[test]
    fn test_metric_string_for_scalars() {
        assert_eq!(Value::Int64(10).to_metric_string().as_deref(), Some("10"));
        assert_eq!(Value::Float64(1.5).to_metric_string().as_deref(), Some("1.5"));
        assert_eq!(Value::Bool(true).to_metric_string().as_deref(), Some("true"));
        assert_eq!(
            Value::Decimal("12.50".into()).to_metric_string().as_deref(),
            Some("12.50")
        );
    }

    #[test]
    fn test_metric_string_matches_server_text() {
        // Floats use the shortest round-trip form, as servers print them
        assert_eq!(Value::Float64(1.0).to_metric_string().as_deref(), Some("1"));
        assert_eq!(Value::Float32(0.25).to_metric_string().as_deref(), Some("0.25"));
        // Decimals keep their declared scale
        assert_eq!(Value::Decimal("3.000".into()).to_metric_string().as_deref(), Some("3.000"));
    }

    #[test]
    fn test_metric_string_decodes_bytes() {
        let v = Value::Bytes(b"ok".to_vec());
        assert_eq!(v.to_metric_string().as_deref(), Some("ok"));
        assert_eq!(v.to_string(), "<2 bytes>");
    }

    #[test]
    fn test_array_display() {
        let v = Value::Array(vec![Value::Int32(1), Value::String("a".into())]);
        assert_eq!(v.to_string(), "[1, a]");
    }

    #[test]
    fn test_row_get_by_index() {
        let row = Row::new(vec![Value::from("db1"), Value::Int64(10)]);
        assert_eq!(row.get(1), Some(&Value::Int64(10)));
        assert_eq!(row.get(2), None);
        assert_eq!(row.len(), 2);
    }
}
