use thiserror::Error;

use crate::core::driver::DriverError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("already connected to {dsn}")]
    AlreadyConnected { dsn: String },

    #[error("not connected to {dsn}")]
    NotConnected { dsn: String },

    #[error("failed to connect to {dsn}: {source}")]
    ConnectionFailed {
        dsn: String,
        #[source]
        source: DriverError,
    },

    #[error("failed to close connection to {dsn}: {source}")]
    DisconnectFailed {
        dsn: String,
        #[source]
        source: DriverError,
    },

    #[error("connection test failed for {dsn}: {source}")]
    ConnectionTestFailed {
        dsn: String,
        #[source]
        source: Box<AppError>,
    },

    #[error("failed to execute query `{statement}`: {source}")]
    QueryExecutionFailed {
        statement: String,
        #[source]
        source: DriverError,
    },

    #[error("failed to get column information for `{statement}`: {source}")]
    ColumnMetadataUnavailable {
        statement: String,
        #[source]
        source: DriverError,
    },

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn code(&self) -> &'static str {
        match self {
            AppError::AlreadyConnected { .. } => "ALREADY_CONNECTED",
            AppError::NotConnected { .. } => "NOT_CONNECTED",
            AppError::ConnectionFailed { .. } => "CONNECTION_FAILED",
            AppError::DisconnectFailed { .. } => "DISCONNECT_FAILED",
            AppError::ConnectionTestFailed { .. } => "CONNECTION_TEST_FAILED",
            AppError::QueryExecutionFailed { .. } => "QUERY_EXECUTION_FAILED",
            AppError::ColumnMetadataUnavailable { .. } => "COLUMN_METADATA_UNAVAILABLE",
            AppError::InvalidConfig(_) => "INVALID_CONFIG",
            AppError::InvalidRequest(_) => "INVALID_REQUEST",
            AppError::Io(_) => "IO_ERROR",
            AppError::Json(_) => "JSON_ERROR",
            AppError::Internal(_) => "INTERNAL",
        }
    }
}

pub type AppResult<T> = Result<T, AppError>;
