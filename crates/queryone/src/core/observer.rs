use std::time::Duration;

/// Lifecycle and query events raised by a `Connection`.
#[derive(Debug, Clone, PartialEq)]
pub enum ConnectionEvent {
    Connecting { dsn: String },
    Connected { dsn: String },
    ConnectFailed { dsn: String, error: String },
    Disconnecting { dsn: String },
    Disconnected { dsn: String },
    DisconnectFailed { dsn: String, error: String },
    QueryStarted { statement: String },
    QueryFinished { rows: usize, elapsed: Duration },
    QueryFailed { statement: String, error: String },
    /// A single row could not be scanned and was left out of the result.
    RowSkipped { index: usize, error: String },
    ScriptSubmitted { chars: usize },
    ConnectionTested { dsn: String, ok: bool },
}

pub trait ConnectionObserver: Send + Sync {
    fn on_event(&self, event: &ConnectionEvent);
}

/// Forwards events to `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl ConnectionObserver for TracingObserver {
    fn on_event(&self, event: &ConnectionEvent) {
        match event {
            ConnectionEvent::Connecting { dsn } => tracing::info!(%dsn, "connecting"),
            ConnectionEvent::Connected { dsn } => tracing::info!(%dsn, "connected"),
            ConnectionEvent::ConnectFailed { dsn, error } => {
                tracing::error!(%dsn, %error, "connect failed")
            }
            ConnectionEvent::Disconnecting { dsn } => tracing::info!(%dsn, "disconnecting"),
            ConnectionEvent::Disconnected { dsn } => tracing::info!(%dsn, "disconnected"),
            ConnectionEvent::DisconnectFailed { dsn, error } => {
                tracing::error!(%dsn, %error, "failed to close connection")
            }
            ConnectionEvent::QueryStarted { statement } => {
                tracing::info!(%statement, "executing query")
            }
            ConnectionEvent::QueryFinished { rows, elapsed } => {
                tracing::info!(rows, elapsed = ?elapsed, "query executed")
            }
            ConnectionEvent::QueryFailed { statement, error } => {
                tracing::error!(%statement, %error, "query failed")
            }
            ConnectionEvent::RowSkipped { index, error } => {
                tracing::warn!(index, %error, "failed to scan row; skipping")
            }
            ConnectionEvent::ScriptSubmitted { chars } => {
                tracing::info!(chars, "executing script as a single statement")
            }
            ConnectionEvent::ConnectionTested { dsn, ok } => {
                if *ok {
                    tracing::info!(%dsn, "connection test successful")
                } else {
                    tracing::error!(%dsn, "connection test failed")
                }
            }
        }
    }
}
