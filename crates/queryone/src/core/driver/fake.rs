//! Scripted in-memory driver for exercising failure paths.

use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc, Mutex,
};

use super::{Driver, DriverError, DriverHandle, DriverResult, RowCursor};
use crate::core::types::CellValue;

/// One scripted row: either values to hand out or a scan failure.
#[derive(Debug, Clone)]
pub enum FakeRow {
    Values(Vec<CellValue>),
    ScanError(String),
}

#[derive(Debug, Clone, Default)]
pub struct FakeScript {
    pub fail_open: Option<String>,
    pub fail_ping: Option<String>,
    pub fail_close: Option<String>,
    pub fail_query: Option<String>,
    pub fail_columns: Option<String>,
    pub fail_cursor_after: Option<usize>,
    pub columns: Vec<String>,
    pub rows: Vec<FakeRow>,
}

impl FakeScript {
    pub fn table(columns: &[&str], rows: Vec<Vec<CellValue>>) -> Self {
        Self {
            columns: columns.iter().map(|c| c.to_string()).collect(),
            rows: rows.into_iter().map(FakeRow::Values).collect(),
            ..Self::default()
        }
    }
}

/// Counters shared between the driver and every handle/cursor it creates.
#[derive(Debug, Default)]
pub struct FakeStats {
    pub opened: AtomicUsize,
    pub closed: AtomicUsize,
    pub queries: AtomicUsize,
    pub cursors_closed: AtomicUsize,
    pub statements: Mutex<Vec<String>>,
}

impl FakeStats {
    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    pub fn closed(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }

    pub fn queries(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }

    pub fn cursors_closed(&self) -> usize {
        self.cursors_closed.load(Ordering::SeqCst)
    }

    pub fn statements(&self) -> Vec<String> {
        self.statements.lock().map(|s| s.clone()).unwrap_or_default()
    }
}

#[derive(Debug, Clone)]
pub struct FakeDriver {
    script: Arc<Mutex<FakeScript>>,
    pub stats: Arc<FakeStats>,
}

impl FakeDriver {
    pub fn new(script: FakeScript) -> Self {
        Self {
            script: Arc::new(Mutex::new(script)),
            stats: Arc::new(FakeStats::default()),
        }
    }

    /// Replaces the script seen by handles on their next call.
    pub fn set_script(&self, script: FakeScript) {
        if let Ok(mut s) = self.script.lock() {
            *s = script;
        }
    }

    fn script(&self) -> FakeScript {
        self.script.lock().map(|s| s.clone()).unwrap_or_default()
    }
}

impl Driver for FakeDriver {
    fn open(&self, _dsn: &str) -> DriverResult<Box<dyn DriverHandle>> {
        if let Some(msg) = self.script().fail_open {
            return Err(DriverError::Other(msg));
        }
        self.stats.opened.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(FakeHandle {
            driver: self.clone(),
        }))
    }
}

struct FakeHandle {
    driver: FakeDriver,
}

impl DriverHandle for FakeHandle {
    fn ping(&mut self) -> DriverResult<()> {
        match self.driver.script().fail_ping {
            Some(msg) => Err(DriverError::Other(msg)),
            None => Ok(()),
        }
    }

    fn query<'a>(&'a mut self, statement: &str) -> DriverResult<Box<dyn RowCursor + 'a>> {
        let script = self.driver.script();
        if let Ok(mut s) = self.driver.stats.statements.lock() {
            s.push(statement.to_string());
        }
        if let Some(msg) = script.fail_query {
            return Err(DriverError::Other(msg));
        }
        self.driver.stats.queries.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(FakeCursor {
            script,
            stats: Arc::clone(&self.driver.stats),
            position: 0,
            current: None,
            failure: None,
        }))
    }

    fn close(self: Box<Self>) -> DriverResult<()> {
        self.driver.stats.closed.fetch_add(1, Ordering::SeqCst);
        match self.driver.script().fail_close {
            Some(msg) => Err(DriverError::Other(msg)),
            None => Ok(()),
        }
    }
}

struct FakeCursor {
    script: FakeScript,
    stats: Arc<FakeStats>,
    position: usize,
    current: Option<FakeRow>,
    failure: Option<DriverError>,
}

impl RowCursor for FakeCursor {
    fn column_names(&self) -> DriverResult<Vec<String>> {
        match &self.script.fail_columns {
            Some(msg) => Err(DriverError::Other(msg.clone())),
            None => Ok(self.script.columns.clone()),
        }
    }

    fn next(&mut self) -> bool {
        if self.script.fail_cursor_after == Some(self.position) {
            self.failure = Some(DriverError::Cursor("connection reset".into()));
            self.current = None;
            return false;
        }
        self.current = self.script.rows.get(self.position).cloned();
        self.position += 1;
        self.current.is_some()
    }

    fn scan_into(&mut self, buf: &mut [CellValue]) -> DriverResult<()> {
        match &self.current {
            Some(FakeRow::Values(values)) if values.len() == buf.len() => {
                buf.clone_from_slice(values);
                Ok(())
            }
            Some(FakeRow::Values(values)) => Err(DriverError::Scan(format!(
                "expected {} destination slots, got {}",
                values.len(),
                buf.len()
            ))),
            Some(FakeRow::ScanError(msg)) => Err(DriverError::Scan(msg.clone())),
            None => Err(DriverError::Scan("no current row".into())),
        }
    }

    fn err(&self) -> Option<&DriverError> {
        self.failure.as_ref()
    }

    fn close(&mut self) {
        self.stats.cursors_closed.fetch_add(1, Ordering::SeqCst);
    }
}
