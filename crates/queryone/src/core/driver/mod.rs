//! Boundary to the database driver.
//!
//! The connection state machine and the materializer only see these traits;
//! `SqliteDriver` is the concrete adapter the binary ships with.

#[cfg(test)]
pub mod fake;
pub mod sqlite;

use thiserror::Error;

use crate::core::types::CellValue;

pub use sqlite::SqliteDriver;

#[derive(Debug, Error)]
pub enum DriverError {
    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),

    #[error("failed to scan row: {0}")]
    Scan(String),

    #[error("cursor failed: {0}")]
    Cursor(String),

    #[error("{0}")]
    Other(String),
}

pub type DriverResult<T> = Result<T, DriverError>;

/// Opens handles from a connection string.
pub trait Driver: Send + Sync {
    fn open(&self, dsn: &str) -> DriverResult<Box<dyn DriverHandle>>;
}

/// A live, exclusively owned driver connection.
pub trait DriverHandle: Send {
    fn ping(&mut self) -> DriverResult<()>;

    fn query<'a>(&'a mut self, statement: &str) -> DriverResult<Box<dyn RowCursor + 'a>>;

    fn close(self: Box<Self>) -> DriverResult<()>;
}

/// Forward-only row iteration over one statement's output.
pub trait RowCursor {
    fn column_names(&self) -> DriverResult<Vec<String>>;

    /// Declared type per column, `None` where the driver has nothing portable.
    fn column_types(&self) -> Vec<Option<String>> {
        Vec::new()
    }

    /// Advances to the next row. `false` on exhaustion or cursor-level failure.
    fn next(&mut self) -> bool;

    /// Copies the current row into `buf`, which must be exactly one slot per column.
    fn scan_into(&mut self, buf: &mut [CellValue]) -> DriverResult<()>;

    /// Cursor-level failure that ended iteration early, if any.
    fn err(&self) -> Option<&DriverError> {
        None
    }

    fn close(&mut self);
}
