use std::{borrow::Cow, fmt, time::Duration};

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Serialize;

/// Type label used when the driver exposes no portable type information.
pub const UNKNOWN_TYPE: &str = "unknown";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Column {
    pub name: String,
    pub type_label: String,
    pub size: usize,
    pub nullable: bool,
}

impl Column {
    /// Builds a column from driver metadata, falling back to conservative defaults.
    pub fn from_driver(name: impl Into<String>, decl_type: Option<&str>) -> Self {
        Self {
            name: name.into(),
            type_label: decl_type
                .filter(|t| !t.trim().is_empty())
                .unwrap_or(UNKNOWN_TYPE)
                .to_string(),
            size: 0,
            nullable: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Numeric {
    Int(i64),
    Float(f64),
}

impl fmt::Display for Numeric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Numeric::Int(v) => write!(f, "{v}"),
            Numeric::Float(v) => write!(f, "{v}"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum CellValue {
    #[default]
    Null,
    Text(String),
    Number(Numeric),
    Bytes(Vec<u8>),
    Boolean(bool),
    Temporal(NaiveDateTime),
}

impl CellValue {
    /// Textual form used by every renderer. Byte sequences are shown as text.
    pub fn display_text(&self) -> Cow<'_, str> {
        match self {
            CellValue::Null => Cow::Borrowed("NULL"),
            CellValue::Text(s) => Cow::Borrowed(s),
            CellValue::Number(n) => Cow::Owned(n.to_string()),
            CellValue::Bytes(b) => String::from_utf8_lossy(b),
            CellValue::Boolean(b) => Cow::Owned(b.to_string()),
            CellValue::Temporal(t) => Cow::Owned(t.to_string()),
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display_text())
    }
}

impl From<i64> for CellValue {
    fn from(v: i64) -> Self {
        CellValue::Number(Numeric::Int(v))
    }
}

impl From<f64> for CellValue {
    fn from(v: f64) -> Self {
        CellValue::Number(Numeric::Float(v))
    }
}

impl From<&str> for CellValue {
    fn from(v: &str) -> Self {
        CellValue::Text(v.to_string())
    }
}

impl From<String> for CellValue {
    fn from(v: String) -> Self {
        CellValue::Text(v)
    }
}

impl From<bool> for CellValue {
    fn from(v: bool) -> Self {
        CellValue::Boolean(v)
    }
}

impl From<Vec<u8>> for CellValue {
    fn from(v: Vec<u8>) -> Self {
        CellValue::Bytes(v)
    }
}

impl<T: Into<CellValue>> From<Option<T>> for CellValue {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(CellValue::Null)
    }
}

pub type Row = Vec<CellValue>;

/// Fully materialized result of one statement.
///
/// Every row is exactly as wide as `columns`, and a result carrying an error
/// has no rows. Both hold by construction.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryResult {
    columns: Vec<Column>,
    rows: Vec<Row>,
    row_count: usize,
    #[serde(rename = "execution_time_ms", serialize_with = "duration_ms::serialize")]
    execution_time: Duration,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl QueryResult {
    /// Rows whose width does not match the column list are dropped.
    pub fn from_rows(columns: Vec<Column>, rows: Vec<Row>, execution_time: Duration) -> Self {
        let width = columns.len();
        let rows: Vec<Row> = rows.into_iter().filter(|r| r.len() == width).collect();
        Self {
            row_count: rows.len(),
            columns,
            rows,
            execution_time,
            error: None,
        }
    }

    pub fn failed(
        columns: Vec<Column>,
        error: impl Into<String>,
        execution_time: Duration,
    ) -> Self {
        Self {
            columns,
            rows: Vec::new(),
            row_count: 0,
            execution_time,
            error: Some(error.into()),
        }
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.row_count
    }

    pub fn execution_time(&self) -> Duration {
        self.execution_time
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConnectionInfo {
    pub dsn: String,
    pub is_connected: bool,
    pub connect_time: Option<DateTime<Utc>>,
    pub last_query_time: Option<DateTime<Utc>>,
    #[serde(
        rename = "connection_duration_ms",
        serialize_with = "duration_ms::serialize_opt",
        skip_serializing_if = "Option::is_none"
    )]
    pub connection_duration: Option<Duration>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    pub shown: usize,
    pub truncated: bool,
}

pub(crate) mod duration_ms {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_f64(d.as_secs_f64() * 1000.0)
    }

    pub fn serialize_opt<S: Serializer>(d: &Option<Duration>, s: S) -> Result<S::Ok, S::Error> {
        match d {
            Some(d) => serialize(d, s),
            None => s.serialize_none(),
        }
    }

    /// Whole milliseconds, for config files.
    pub fn serialize_whole<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }

    pub fn deserialize_whole<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_millis(u64::deserialize(d)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn column_defaults_to_unknown_type() {
        let col = Column::from_driver("id", None);
        assert_eq!(col.type_label, UNKNOWN_TYPE);
        assert_eq!(col.size, 0);
        assert!(col.nullable);

        let col = Column::from_driver("name", Some("TEXT"));
        assert_eq!(col.type_label, "TEXT");
    }

    #[test]
    fn bytes_render_as_text() {
        let v = CellValue::Bytes(b"hello".to_vec());
        assert_eq!(v.to_string(), "hello");
        assert_eq!(CellValue::Null.to_string(), "NULL");
        assert_eq!(CellValue::from(1i64).to_string(), "1");
        assert_eq!(CellValue::from(2.5f64).to_string(), "2.5");
        assert_eq!(CellValue::from(true).to_string(), "true");
        assert_eq!(CellValue::from(None::<i64>), CellValue::Null);
    }

    #[test]
    fn result_rows_match_column_width() {
        let columns = vec![Column::from_driver("a", None), Column::from_driver("b", None)];
        let rows = vec![
            vec![CellValue::from(1i64), CellValue::from("x")],
            vec![CellValue::from(2i64)],
        ];
        let result = QueryResult::from_rows(columns, rows, Duration::from_millis(3));
        assert_eq!(result.row_count(), 1);
        assert_eq!(result.rows().len(), result.row_count());
        assert!(result.rows().iter().all(|r| r.len() == result.columns().len()));
        assert!(result.error().is_none());
    }

    #[test]
    fn failed_result_has_no_rows() {
        let result = QueryResult::failed(Vec::new(), "boom", Duration::ZERO);
        assert_eq!(result.error(), Some("boom"));
        assert!(result.is_empty());
        assert_eq!(result.row_count(), 0);
    }

    #[test]
    fn result_serializes_to_json() {
        let result = QueryResult::from_rows(
            vec![Column::from_driver("n", Some("INTEGER"))],
            vec![vec![CellValue::from(7i64)], vec![CellValue::Null]],
            Duration::from_millis(2),
        );
        let v = serde_json::to_value(&result).unwrap();
        assert_eq!(v["row_count"], 2);
        assert_eq!(v["columns"][0]["name"], "n");
        assert_eq!(v["rows"][0][0]["type"], "number");
        assert_eq!(v["rows"][0][0]["value"], 7);
        assert_eq!(v["rows"][1][0]["type"], "null");
        assert_eq!(v["execution_time_ms"], 2.0);
        assert!(v.get("error").is_none());
    }
}
