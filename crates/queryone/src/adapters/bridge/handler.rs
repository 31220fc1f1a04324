use std::sync::Arc;

use serde::de::DeserializeOwned;

use crate::{
    core::{
        connection::Connection,
        driver::Driver,
        format::format_result_as_csv_like,
        types::{ConnectionInfo, QueryResult},
        worker::ConnectionWorker,
    },
    error::{AppError, AppResult},
};

use super::protocol::*;

pub struct BridgeHandler {
    driver: Arc<dyn Driver>,
    default_dsn: Option<String>,
    max_rows: usize,
    active: Option<ActiveConnection>,
    /// DSN of the most recent successful connect, kept after disconnect.
    last_dsn: Option<String>,
}

struct ActiveConnection {
    dsn: String,
    worker: ConnectionWorker,
}

impl BridgeHandler {
    pub fn new(driver: Arc<dyn Driver>, default_dsn: Option<String>, max_rows: usize) -> Self {
        Self {
            driver,
            default_dsn,
            max_rows,
            active: None,
            last_dsn: None,
        }
    }

    pub async fn handle(&mut self, req: BridgeRequest) -> BridgeResponse<serde_json::Value> {
        if req.v != PROTOCOL_VERSION {
            return BridgeResponse::err(
                req.v,
                req.id,
                "INVALID_REQUEST",
                format!("unsupported protocol version: {}", req.v),
            );
        }

        let outcome = match req.cmd.as_str() {
            "connect" => self.handle_connect(&req.payload).await,
            "disconnect" => self.handle_disconnect().await,
            "query" => self.handle_query(&req.payload).await,
            "script" => self.handle_script(&req.payload).await,
            "test" => self.handle_test().await,
            "info" => self.handle_info().await,
            other => Err(AppError::InvalidRequest(format!("unknown cmd: {other}"))),
        };

        match outcome {
            Ok(data) => BridgeResponse::ok(req.v, req.id, data),
            Err(e) => BridgeResponse::from_error(req.v, req.id, &e),
        }
    }

    /// Disconnects on shutdown if the caller left a connection open.
    pub async fn shutdown(&mut self) {
        if let Some(active) = self.active.take() {
            if let Err(e) = active.worker.disconnect().await {
                tracing::warn!(error = %e, dsn = %active.dsn, "failed to disconnect on shutdown");
            }
        }
    }

    async fn handle_connect(
        &mut self,
        payload: &serde_json::Value,
    ) -> AppResult<serde_json::Value> {
        let p: ConnectPayload = if payload.is_null() {
            ConnectPayload::default()
        } else {
            parse(payload)?
        };

        if let Some(active) = &self.active {
            // Same rule as a single connection: no second connect while connected.
            return Err(AppError::AlreadyConnected {
                dsn: active.dsn.clone(),
            });
        }

        let dsn = p
            .dsn
            .or_else(|| self.default_dsn.clone())
            .filter(|d| !d.trim().is_empty())
            .ok_or_else(|| AppError::InvalidRequest("a DSN is required to connect".into()))?;

        let conn = Connection::new(dsn.clone(), Arc::clone(&self.driver));
        let worker = ConnectionWorker::spawn(conn);
        worker.connect().await?;
        let info = worker.info().await?;
        self.last_dsn = Some(dsn.clone());
        self.active = Some(ActiveConnection { dsn, worker });
        to_value(&info)
    }

    async fn handle_disconnect(&mut self) -> AppResult<serde_json::Value> {
        let Some(active) = self.active.take() else {
            return Err(self.not_connected());
        };
        // The worker is dropped either way; a failed close still leaves us disconnected.
        active.worker.disconnect().await?;
        Ok(serde_json::Value::Bool(true))
    }

    async fn handle_query(&mut self, payload: &serde_json::Value) -> AppResult<serde_json::Value> {
        let p: QueryPayload = parse(payload)?;
        let worker = self.worker()?;
        let result = worker.query(p.sql).await?;
        to_value(&self.render(result, p.max_rows))
    }

    async fn handle_script(&mut self, payload: &serde_json::Value) -> AppResult<serde_json::Value> {
        let p: ScriptPayload = parse(payload)?;
        let worker = self.worker()?;
        let results = worker.script(p.sql).await?;
        let rendered: Vec<RenderedResult> = results
            .into_iter()
            .map(|r| self.render(r, p.max_rows))
            .collect();
        to_value(&rendered)
    }

    async fn handle_test(&mut self) -> AppResult<serde_json::Value> {
        self.worker()?.test_connection().await?;
        Ok(serde_json::Value::Bool(true))
    }

    async fn handle_info(&mut self) -> AppResult<serde_json::Value> {
        let info = match &self.active {
            Some(active) => active.worker.info().await?,
            None => ConnectionInfo {
                dsn: self.known_dsn(),
                is_connected: false,
                connect_time: None,
                last_query_time: None,
                connection_duration: None,
            },
        };
        to_value(&info)
    }

    fn worker(&self) -> AppResult<ConnectionWorker> {
        self.active
            .as_ref()
            .map(|a| a.worker.clone())
            .ok_or_else(|| self.not_connected())
    }

    fn not_connected(&self) -> AppError {
        AppError::NotConnected {
            dsn: self.known_dsn(),
        }
    }

    fn known_dsn(&self) -> String {
        self.last_dsn
            .as_ref()
            .or(self.default_dsn.as_ref())
            .cloned()
            .unwrap_or_default()
    }

    fn render(&self, result: QueryResult, max_rows: Option<usize>) -> RenderedResult {
        let text = format_result_as_csv_like(Some(&result), max_rows.unwrap_or(self.max_rows));
        RenderedResult { result, text }
    }
}

fn parse<T: DeserializeOwned>(payload: &serde_json::Value) -> AppResult<T> {
    serde_json::from_value(payload.clone()).map_err(|e| AppError::InvalidRequest(e.to_string()))
}

fn to_value<T: serde::Serialize>(v: &T) -> AppResult<serde_json::Value> {
    Ok(serde_json::to_value(v)?)
}
