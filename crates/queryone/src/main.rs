mod adapters;
mod cli;
mod config;
mod core;
mod error;
mod logging;

use std::sync::Arc;

use clap::Parser;

use crate::{cli::Args, config::AppConfig, core::driver::SqliteDriver, error::AppResult};

fn main() -> AppResult<()> {
    let args = Args::parse();

    let (mut cfg, load_err) = match &args.config {
        Some(path) => match AppConfig::load(path) {
            Ok(cfg) => (cfg, None),
            Err(e) => (AppConfig::default(), Some(e)),
        },
        None => (AppConfig::default(), None),
    };
    logging::init(args.log_level.as_deref().unwrap_or(&cfg.app.log_level));
    if let Some(e) = load_err {
        tracing::warn!(error = %e, "failed to load config file; using defaults");
    }

    if let Some(path) = &args.init_config {
        AppConfig::default().save(path)?;
        tracing::info!(path = %path.display(), "wrote default config");
        return Ok(());
    }

    if let Some(dsn) = &args.dsn {
        cfg.database.dsn = dsn.clone();
    }
    if let Some(max_rows) = args.max_rows {
        cfg.app.max_rows = max_rows;
    }

    let driver = Arc::new(SqliteDriver::new(cfg.database.timeout));
    if args.bridge {
        let dsn = Some(cfg.database.dsn.clone()).filter(|d| !d.trim().is_empty());
        return adapters::bridge::run(driver, dsn, cfg.app.max_rows);
    }

    if let Err(e) = cfg.validate() {
        tracing::error!(error = %e, "configuration error");
        return Err(e);
    }
    adapters::oneshot::run(&args, &cfg, driver)
}
