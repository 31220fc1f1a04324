use std::{fs, path::Path, time::Duration};

use serde::{Deserialize, Serialize};

use crate::{
    core::types::duration_ms,
    error::{AppError, AppResult},
};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub app: AppSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub dsn: String,
    /// Accepted for compatibility; SQLite has no authentication, so neither is sent.
    pub username: String,
    pub password: String,
    #[serde(
        rename = "timeout_ms",
        serialize_with = "duration_ms::serialize_whole",
        deserialize_with = "duration_ms::deserialize_whole"
    )]
    pub timeout: Duration,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    pub log_level: String,
    /// Validated but not applied to query execution.
    #[serde(
        rename = "query_timeout_ms",
        serialize_with = "duration_ms::serialize_whole",
        deserialize_with = "duration_ms::deserialize_whole"
    )]
    pub query_timeout: Duration,
    pub max_rows: usize,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            dsn: String::new(),
            username: String::new(),
            password: String::new(),
            timeout: Duration::from_secs(30),
        }
    }
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            log_level: "info".into(),
            query_timeout: Duration::from_secs(60),
            max_rows: 1000,
        }
    }
}

impl AppConfig {
    /// Reads a JSON config file; keys it leaves out keep their defaults.
    pub fn load(path: &Path) -> AppResult<Self> {
        let raw = fs::read_to_string(path)?;
        let cfg = serde_json::from_str(&raw)?;
        Ok(cfg)
    }

    pub fn save(&self, path: &Path) -> AppResult<()> {
        let mut raw = serde_json::to_string_pretty(self)?;
        raw.push('\n');
        fs::write(path, raw)?;
        Ok(())
    }

    /// Reports the first violated constraint.
    pub fn validate(&self) -> AppResult<()> {
        if self.database.dsn.trim().is_empty() {
            return Err(AppError::InvalidConfig("database DSN is required".into()));
        }
        if self.database.timeout.is_zero() {
            return Err(AppError::InvalidConfig(
                "database timeout must be positive".into(),
            ));
        }
        if self.app.query_timeout.is_zero() {
            return Err(AppError::InvalidConfig("query timeout must be positive".into()));
        }
        if self.app.max_rows == 0 {
            return Err(AppError::InvalidConfig("max rows must be positive".into()));
        }
        Ok(())
    }
}
