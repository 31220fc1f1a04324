use std::{sync::Arc, time::Instant};

use chrono::{DateTime, Utc};

use crate::{
    core::{
        driver::{Driver, DriverHandle},
        observer::{ConnectionEvent, ConnectionObserver, TracingObserver},
        types::ConnectionInfo,
    },
    error::{AppError, AppResult},
};

/// Canary statement used by `test_connection`.
pub const CANARY_STATEMENT: &str = "SELECT 1";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connected,
}

/// One DSN and at most one live driver handle.
///
/// Not meant to be shared across concurrent callers; wrap it in a
/// `ConnectionWorker` (or a mutex) when several tasks need it.
pub struct Connection {
    pub(crate) dsn: String,
    driver: Arc<dyn Driver>,
    pub(crate) observer: Arc<dyn ConnectionObserver>,
    pub(crate) handle: Option<Box<dyn DriverHandle>>,
    connect_time: Option<DateTime<Utc>>,
    connected_at: Option<Instant>,
    pub(crate) last_query_time: Option<DateTime<Utc>>,
}

impl Connection {
    pub fn new(dsn: impl Into<String>, driver: Arc<dyn Driver>) -> Self {
        Self {
            dsn: dsn.into(),
            driver,
            observer: Arc::new(TracingObserver),
            handle: None,
            connect_time: None,
            connected_at: None,
            last_query_time: None,
        }
    }

    pub fn with_observer(mut self, observer: Arc<dyn ConnectionObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn dsn(&self) -> &str {
        &self.dsn
    }

    pub fn state(&self) -> ConnectionState {
        if self.handle.is_some() {
            ConnectionState::Connected
        } else {
            ConnectionState::Disconnected
        }
    }

    pub fn is_connected(&self) -> bool {
        self.state() == ConnectionState::Connected
    }

    pub fn connect(&mut self) -> AppResult<()> {
        if self.is_connected() {
            let err = AppError::AlreadyConnected {
                dsn: self.dsn.clone(),
            };
            self.emit_connect_failed(&err);
            return Err(err);
        }

        self.emit(ConnectionEvent::Connecting {
            dsn: self.dsn.clone(),
        });

        let mut handle = match self.driver.open(&self.dsn) {
            Ok(h) => h,
            Err(source) => return Err(self.connect_failed(source)),
        };
        if let Err(source) = handle.ping() {
            // The handle is unusable; release it and report the ping failure.
            let _ = handle.close();
            return Err(self.connect_failed(source));
        }

        self.handle = Some(handle);
        self.connect_time = Some(Utc::now());
        self.connected_at = Some(Instant::now());
        self.emit(ConnectionEvent::Connected {
            dsn: self.dsn.clone(),
        });
        Ok(())
    }

    /// Closes the handle. State ends up `Disconnected` even if the close fails.
    pub fn disconnect(&mut self) -> AppResult<()> {
        let Some(handle) = self.handle.take() else {
            return Err(self.not_connected());
        };
        self.connected_at = None;

        self.emit(ConnectionEvent::Disconnecting {
            dsn: self.dsn.clone(),
        });
        match handle.close() {
            Ok(()) => {
                self.emit(ConnectionEvent::Disconnected {
                    dsn: self.dsn.clone(),
                });
                Ok(())
            }
            Err(source) => {
                self.emit(ConnectionEvent::DisconnectFailed {
                    dsn: self.dsn.clone(),
                    error: source.to_string(),
                });
                Err(AppError::DisconnectFailed {
                    dsn: self.dsn.clone(),
                    source,
                })
            }
        }
    }

    pub fn test_connection(&mut self) -> AppResult<()> {
        if !self.is_connected() {
            return Err(self.not_connected());
        }

        let outcome = self.execute_query(CANARY_STATEMENT);
        self.emit(ConnectionEvent::ConnectionTested {
            dsn: self.dsn.clone(),
            ok: outcome.is_ok(),
        });
        outcome.map(|_| ()).map_err(|e| AppError::ConnectionTestFailed {
            dsn: self.dsn.clone(),
            source: Box::new(e),
        })
    }

    pub fn connection_info(&self) -> ConnectionInfo {
        ConnectionInfo {
            dsn: self.dsn.clone(),
            is_connected: self.is_connected(),
            connect_time: self.connect_time,
            last_query_time: self.last_query_time,
            connection_duration: self
                .connected_at
                .filter(|_| self.is_connected())
                .map(|t| t.elapsed()),
        }
    }

    pub(crate) fn not_connected(&self) -> AppError {
        let err = AppError::NotConnected {
            dsn: self.dsn.clone(),
        };
        tracing::debug!(dsn = %self.dsn, "operation rejected: not connected");
        err
    }

    pub(crate) fn emit(&self, event: ConnectionEvent) {
        self.observer.on_event(&event);
    }

    fn connect_failed(&self, source: crate::core::driver::DriverError) -> AppError {
        let err = AppError::ConnectionFailed {
            dsn: self.dsn.clone(),
            source,
        };
        self.emit_connect_failed(&err);
        err
    }

    fn emit_connect_failed(&self, err: &AppError) {
        self.emit(ConnectionEvent::ConnectFailed {
            dsn: self.dsn.clone(),
            error: err.to_string(),
        });
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("dsn", &self.dsn)
            .field("state", &self.state())
            .field("connect_time", &self.connect_time)
            .field("last_query_time", &self.last_query_time)
            .finish()
    }
}
