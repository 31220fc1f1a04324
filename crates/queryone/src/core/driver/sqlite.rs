use std::{collections::VecDeque, time::Duration};

use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::{types::ValueRef, Batch, Connection, OpenFlags, Row};

use super::{Driver, DriverError, DriverHandle, DriverResult, RowCursor};
use crate::core::types::CellValue;

const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(30);

/// Opens SQLite databases. The DSN is a path, `:memory:` or a `file:` URI.
#[derive(Debug, Clone)]
pub struct SqliteDriver {
    busy_timeout: Duration,
}

impl SqliteDriver {
    pub fn new(busy_timeout: Duration) -> Self {
        Self { busy_timeout }
    }
}

impl Default for SqliteDriver {
    fn default() -> Self {
        Self::new(DEFAULT_BUSY_TIMEOUT)
    }
}

impl Driver for SqliteDriver {
    fn open(&self, dsn: &str) -> DriverResult<Box<dyn DriverHandle>> {
        let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
            | OpenFlags::SQLITE_OPEN_CREATE
            | OpenFlags::SQLITE_OPEN_URI
            | OpenFlags::SQLITE_OPEN_NO_MUTEX;
        let conn = Connection::open_with_flags(dsn, flags)?;
        conn.busy_timeout(self.busy_timeout)?;
        Ok(Box::new(SqliteHandle { conn }))
    }
}

struct SqliteHandle {
    conn: Connection,
}

impl DriverHandle for SqliteHandle {
    fn ping(&mut self) -> DriverResult<()> {
        self.conn.query_row("SELECT 1", [], |r| r.get::<_, i64>(0))?;
        Ok(())
    }

    fn query<'a>(&'a mut self, statement: &str) -> DriverResult<Box<dyn RowCursor + 'a>> {
        let mut batch = Batch::new(&self.conn, statement);
        let mut stmt = batch
            .next()?
            .ok_or_else(|| DriverError::Other("no statement to execute".into()))?;
        // `prepare` compiles only the first statement and ignores the rest.
        if !matches!(batch.next(), Ok(None)) {
            return Err(DriverError::Other(
                "multiple statements are not supported; submit one at a time".into(),
            ));
        }

        let names: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
        let decl_types: Vec<Option<String>> = stmt
            .columns()
            .iter()
            .map(|c| c.decl_type().map(str::to_string))
            .collect();

        // SQLite rows borrow the statement, so the statement is stepped here and
        // the cursor hands the rows out one at a time.
        let mut pending = VecDeque::new();
        let mut failure = None;
        let mut rows = stmt.query([])?;
        loop {
            match rows.next() {
                Ok(Some(row)) => pending.push_back(read_row(row, &decl_types)),
                Ok(None) => break,
                // The first step is where the statement executes.
                Err(e) if pending.is_empty() => return Err(DriverError::Sqlite(e)),
                Err(e) => {
                    failure = Some(DriverError::Cursor(e.to_string()));
                    break;
                }
            }
        }

        Ok(Box::new(SqliteCursor {
            names,
            decl_types,
            pending,
            current: None,
            failure,
        }))
    }

    fn close(self: Box<Self>) -> DriverResult<()> {
        let SqliteHandle { conn } = *self;
        conn.close().map_err(|(_, e)| DriverError::Sqlite(e))
    }
}

struct SqliteCursor {
    names: Vec<String>,
    decl_types: Vec<Option<String>>,
    pending: VecDeque<Result<Vec<CellValue>, String>>,
    current: Option<Result<Vec<CellValue>, String>>,
    failure: Option<DriverError>,
}

impl RowCursor for SqliteCursor {
    fn column_names(&self) -> DriverResult<Vec<String>> {
        Ok(self.names.clone())
    }

    fn column_types(&self) -> Vec<Option<String>> {
        self.decl_types.clone()
    }

    fn next(&mut self) -> bool {
        self.current = self.pending.pop_front();
        self.current.is_some()
    }

    fn scan_into(&mut self, buf: &mut [CellValue]) -> DriverResult<()> {
        match &self.current {
            None => Err(DriverError::Scan("no current row".into())),
            Some(Err(e)) => Err(DriverError::Scan(e.clone())),
            Some(Ok(row)) if row.len() != buf.len() => Err(DriverError::Scan(format!(
                "expected {} destination slots, got {}",
                row.len(),
                buf.len()
            ))),
            Some(Ok(row)) => {
                buf.clone_from_slice(row);
                Ok(())
            }
        }
    }

    fn err(&self) -> Option<&DriverError> {
        self.failure.as_ref()
    }

    fn close(&mut self) {
        self.pending.clear();
        self.current = None;
    }
}

fn read_row(row: &Row<'_>, decl_types: &[Option<String>]) -> Result<Vec<CellValue>, String> {
    (0..decl_types.len())
        .map(|i| {
            row.get_ref(i)
                .map(|v| to_cell(v, decl_types[i].as_deref()))
                .map_err(|e| e.to_string())
        })
        .collect()
}

fn to_cell(value: ValueRef<'_>, decl_type: Option<&str>) -> CellValue {
    let decl = decl_type.map(str::to_ascii_uppercase).unwrap_or_default();
    match value {
        ValueRef::Null => CellValue::Null,
        ValueRef::Integer(i) if is_bool(&decl) && (i == 0 || i == 1) => CellValue::Boolean(i == 1),
        ValueRef::Integer(i) => CellValue::from(i),
        ValueRef::Real(f) => CellValue::from(f),
        ValueRef::Text(t) => match std::str::from_utf8(t) {
            Ok(s) if is_temporal(&decl) => parse_timestamp(s)
                .map(CellValue::Temporal)
                .unwrap_or_else(|| CellValue::from(s)),
            Ok(s) => CellValue::from(s),
            Err(_) => CellValue::Bytes(t.to_vec()),
        },
        ValueRef::Blob(b) => CellValue::Bytes(b.to_vec()),
    }
}

fn is_bool(decl: &str) -> bool {
    decl == "BOOL" || decl == "BOOLEAN"
}

/// DATE, DATETIME and TIMESTAMP declarations.
fn is_temporal(decl: &str) -> bool {
    decl.starts_with("DATE") || decl.starts_with("TIMESTAMP")
}

/// Date-only text is read as midnight.
fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}
