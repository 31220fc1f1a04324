use std::{sync::Arc, time::Instant};

use chrono::Utc;

use crate::{
    core::{
        connection::Connection,
        driver::{DriverHandle, RowCursor},
        observer::{ConnectionEvent, ConnectionObserver},
        types::{CellValue, Column, QueryResult, Row},
    },
    error::{AppError, AppResult},
};

impl Connection {
    /// Runs one statement and materializes its full output in memory.
    ///
    /// A failure leaves the connection as it was, so further queries may be tried.
    pub fn execute_query(&mut self, statement: &str) -> AppResult<QueryResult> {
        if !self.is_connected() {
            return Err(self.not_connected());
        }

        let start = Instant::now();
        self.emit(ConnectionEvent::QueryStarted {
            statement: statement.to_string(),
        });

        let observer = Arc::clone(&self.observer);
        let outcome = match self.handle.as_mut() {
            Some(handle) => run_statement(handle.as_mut(), statement, start, observer.as_ref()),
            None => Err(AppError::NotConnected {
                dsn: self.dsn.clone(),
            }),
        };

        match outcome {
            Ok(result) => {
                self.last_query_time = Some(Utc::now());
                self.emit(ConnectionEvent::QueryFinished {
                    rows: result.row_count(),
                    elapsed: result.execution_time(),
                });
                Ok(result)
            }
            Err(err) => {
                self.emit(ConnectionEvent::QueryFailed {
                    statement: statement.to_string(),
                    error: err.to_string(),
                });
                Err(err)
            }
        }
    }

    /// Submits the whole script as a single statement. No splitting is done.
    pub fn execute_script(&mut self, script: &str) -> AppResult<Vec<QueryResult>> {
        if !self.is_connected() {
            return Err(self.not_connected());
        }

        self.emit(ConnectionEvent::ScriptSubmitted {
            chars: script.chars().count(),
        });
        let result = self.execute_query(script)?;
        Ok(vec![result])
    }
}

/// Closes the cursor on every exit path.
struct CursorGuard<'a>(Box<dyn RowCursor + 'a>);

impl Drop for CursorGuard<'_> {
    fn drop(&mut self) {
        self.0.close();
    }
}

fn run_statement(
    handle: &mut dyn DriverHandle,
    statement: &str,
    start: Instant,
    observer: &dyn ConnectionObserver,
) -> AppResult<QueryResult> {
    let cursor = handle
        .query(statement)
        .map_err(|source| AppError::QueryExecutionFailed {
            statement: statement.to_string(),
            source,
        })?;
    let mut guard = CursorGuard(cursor);
    let cursor = guard.0.as_mut();

    let names = cursor
        .column_names()
        .map_err(|source| AppError::ColumnMetadataUnavailable {
            statement: statement.to_string(),
            source,
        })?;
    let types = cursor.column_types();
    let columns: Vec<Column> = names
        .iter()
        .enumerate()
        .map(|(i, name)| Column::from_driver(name, types.get(i).and_then(|t| t.as_deref())))
        .collect();

    let mut rows: Vec<Row> = Vec::new();
    let mut index = 0usize;
    while cursor.next() {
        let mut buf = vec![CellValue::Null; columns.len()];
        match cursor.scan_into(&mut buf) {
            Ok(()) => rows.push(buf),
            // Skipped rows are not reported in the result, only to the observer.
            Err(e) => observer.on_event(&ConnectionEvent::RowSkipped {
                index,
                error: e.to_string(),
            }),
        }
        index += 1;
    }
    if let Some(e) = cursor.err() {
        tracing::warn!(error = %e, collected = rows.len(), "row iteration ended early");
    }

    Ok(QueryResult::from_rows(columns, rows, start.elapsed()))
}
