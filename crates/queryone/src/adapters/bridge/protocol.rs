use serde::{Deserialize, Serialize};

use crate::{core::types::QueryResult, error::AppError};

pub const PROTOCOL_VERSION: u32 = 1;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct BridgeRequest {
    pub v: u32,
    pub id: String,
    pub cmd: String,
    #[serde(default)]
    pub payload: serde_json::Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Ok,
    Error,
}

/// One response line. Carries `data` on success, `error` and `code` on failure.
#[derive(Debug, Serialize)]
pub struct BridgeResponse<T> {
    pub v: u32,
    pub id: String,
    pub status: Status,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<&'static str>,
}

impl<T> BridgeResponse<T> {
    pub fn ok(v: u32, id: String, data: T) -> Self {
        Self {
            v,
            id,
            status: Status::Ok,
            data: Some(data),
            error: None,
            code: None,
        }
    }

    pub fn err(v: u32, id: String, code: &'static str, error: String) -> Self {
        Self {
            v,
            id,
            status: Status::Error,
            data: None,
            error: Some(error),
            code: Some(code),
        }
    }

    pub fn from_error(v: u32, id: String, e: &AppError) -> Self {
        Self::err(v, id, e.code(), e.to_string())
    }
}

// Payloads

#[derive(Debug, Default, Deserialize)]
pub struct ConnectPayload {
    #[serde(default)]
    pub dsn: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct QueryPayload {
    pub sql: String,
    #[serde(default)]
    pub max_rows: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct ScriptPayload {
    pub sql: String,
    #[serde(default)]
    pub max_rows: Option<usize>,
}

// Response data

/// A result together with its delimited-text rendering.
#[derive(Debug, Serialize)]
pub struct RenderedResult {
    pub result: QueryResult,
    pub text: String,
}
