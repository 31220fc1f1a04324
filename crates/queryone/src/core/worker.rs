use std::thread;

use tokio::sync::oneshot;

use crate::{
    core::{
        connection::Connection,
        types::{ConnectionInfo, QueryResult},
    },
    error::{AppError, AppResult},
};

/// Async front for a `Connection` owned by a dedicated thread.
///
/// Tasks run one at a time in arrival order, so callers on different tasks
/// never touch the connection concurrently.
#[derive(Debug, Clone)]
pub struct ConnectionWorker {
    tx: std::sync::mpsc::Sender<DbTask>,
}

impl ConnectionWorker {
    pub fn spawn(conn: Connection) -> Self {
        let (tx, rx) = std::sync::mpsc::channel::<DbTask>();
        thread::spawn(move || db_worker_main(conn, rx));
        Self { tx }
    }

    pub async fn connect(&self) -> AppResult<()> {
        self.request(|respond_to| DbTask::Connect { respond_to }).await?
    }

    pub async fn disconnect(&self) -> AppResult<()> {
        self.request(|respond_to| DbTask::Disconnect { respond_to }).await?
    }

    pub async fn test_connection(&self) -> AppResult<()> {
        self.request(|respond_to| DbTask::Test { respond_to }).await?
    }

    pub async fn query(&self, sql: String) -> AppResult<QueryResult> {
        self.request(|respond_to| DbTask::Query { sql, respond_to }).await?
    }

    pub async fn script(&self, script: String) -> AppResult<Vec<QueryResult>> {
        self.request(|respond_to| DbTask::Script { script, respond_to })
            .await?
    }

    pub async fn info(&self) -> AppResult<ConnectionInfo> {
        self.request(|respond_to| DbTask::Info { respond_to }).await
    }

    async fn request<T>(&self, task: impl FnOnce(oneshot::Sender<T>) -> DbTask) -> AppResult<T> {
        let (tx, rx) = oneshot::channel();
        self.tx
            .send(task(tx))
            .map_err(|_| AppError::Internal("db worker unavailable".into()))?;
        rx.await
            .map_err(|_| AppError::Internal("db worker dropped response".into()))
    }
}

enum DbTask {
    Connect {
        respond_to: oneshot::Sender<AppResult<()>>,
    },
    Disconnect {
        respond_to: oneshot::Sender<AppResult<()>>,
    },
    Test {
        respond_to: oneshot::Sender<AppResult<()>>,
    },
    Query {
        sql: String,
        respond_to: oneshot::Sender<AppResult<QueryResult>>,
    },
    Script {
        script: String,
        respond_to: oneshot::Sender<AppResult<Vec<QueryResult>>>,
    },
    Info {
        respond_to: oneshot::Sender<ConnectionInfo>,
    },
}

fn db_worker_main(mut conn: Connection, rx: std::sync::mpsc::Receiver<DbTask>) {
    while let Ok(task) = rx.recv() {
        match task {
            DbTask::Connect { respond_to } => {
                let _ = respond_to.send(conn.connect());
            }
            DbTask::Disconnect { respond_to } => {
                let _ = respond_to.send(conn.disconnect());
            }
            DbTask::Test { respond_to } => {
                let _ = respond_to.send(conn.test_connection());
            }
            DbTask::Query { sql, respond_to } => {
                let _ = respond_to.send(conn.execute_query(&sql));
            }
            DbTask::Script { script, respond_to } => {
                let _ = respond_to.send(conn.execute_script(&script));
            }
            DbTask::Info { respond_to } => {
                let _ = respond_to.send(conn.connection_info());
            }
        }
    }

    // Every sender is gone; release the handle if the caller never did.
    if conn.is_connected() {
        if let Err(e) = conn.disconnect() {
            tracing::warn!(error = %e, "failed to disconnect on worker shutdown");
        }
    }
}
