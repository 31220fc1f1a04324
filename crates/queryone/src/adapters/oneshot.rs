//! Connect, run one statement (or the connection test), print, disconnect.

use std::{io::Write, sync::Arc};

use crate::{
    cli::{Args, OutputFormat},
    config::AppConfig,
    core::{
        connection::Connection,
        driver::Driver,
        format::{display_result, format_result_as_csv_like},
        types::QueryResult,
    },
    error::{AppError, AppResult},
};

pub fn run(args: &Args, cfg: &AppConfig, driver: Arc<dyn Driver>) -> AppResult<()> {
    let mut conn = connection(cfg, driver);
    conn.connect()?;

    let stdout = std::io::stdout();
    let outcome = run_connected(&mut conn, args, cfg, &mut stdout.lock());

    if let Err(e) = conn.disconnect() {
        tracing::warn!(error = %e, dsn = %conn.dsn(), "failed to disconnect");
    }
    outcome
}

/// Credentials stay out of the DSN, which every connection event and error carries.
fn connection(cfg: &AppConfig, driver: Arc<dyn Driver>) -> Connection {
    Connection::new(cfg.database.dsn.clone(), driver)
}

fn run_connected(
    conn: &mut Connection,
    args: &Args,
    cfg: &AppConfig,
    out: &mut dyn Write,
) -> AppResult<()> {
    if args.test_connection {
        conn.test_connection()?;
        return Ok(());
    }

    let results = if let Some(path) = &args.script {
        let script = std::fs::read_to_string(path)?;
        conn.execute_script(&script)?
    } else {
        let query = args
            .query
            .as_deref()
            .filter(|q| !q.trim().is_empty())
            .ok_or_else(|| {
                AppError::InvalidRequest("a query is required (--query or --script)".into())
            })?;
        vec![conn.execute_query(query)?]
    };

    for result in &results {
        render(result, args.format, cfg.app.max_rows, out)?;
    }
    tracing::info!("query execution completed successfully");
    Ok(())
}

fn render(
    result: &QueryResult,
    format: OutputFormat,
    max_rows: usize,
    out: &mut dyn Write,
) -> AppResult<()> {
    match format {
        OutputFormat::Log => display_result(Some(result)),
        OutputFormat::Text => {
            out.write_all(format_result_as_csv_like(Some(result), max_rows).as_bytes())?
        }
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut *out, result)?;
            out.write_all(b"\n")?;
        }
    }
    out.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;
    use crate::core::driver::SqliteDriver;

    fn connected() -> Connection {
        let mut conn = Connection::new(":memory:", Arc::new(SqliteDriver::default()));
        conn.connect().unwrap();
        conn
    }

    fn args(extra: &[&str]) -> Args {
        let mut argv = vec!["queryone", "--dsn", ":memory:"];
        argv.extend_from_slice(extra);
        Args::try_parse_from(argv).unwrap()
    }

    fn capture(conn: &mut Connection, args: &Args, cfg: &AppConfig) -> AppResult<String> {
        let mut out = Vec::new();
        run_connected(conn, args, cfg, &mut out)?;
        Ok(String::from_utf8(out).unwrap())
    }

    #[test]
    fn text_output_for_select_one() {
        let mut conn = connected();
        let args = args(&["-q", "SELECT 1", "--format", "text"]);
        let out = capture(&mut conn, &args, &AppConfig::default()).unwrap();
        let lines: Vec<_> = out.lines().collect();
        assert_eq!(lines[0], "1");
        assert_eq!(lines[1], "1");
        assert!(lines[2].starts_with("Execution time: "));
        assert_eq!(lines[3], "Rows: 1");
    }

    #[test]
    fn text_output_uses_configured_max_rows() {
        let mut conn = connected();
        let mut cfg = AppConfig::default();
        cfg.app.max_rows = 2;
        let sql = "WITH RECURSIVE n(x) AS (SELECT 1 UNION ALL SELECT x + 1 FROM n WHERE x < 5) \
                   SELECT x FROM n";
        let out = capture(&mut conn, &args(&["-q", sql, "--format", "text"]), &cfg).unwrap();
        assert!(out.starts_with("x\n1\n2\n... (truncated to 2 rows)\n"));
        assert!(out.ends_with("Rows: 5\n"));
    }

    #[test]
    fn json_output() {
        let mut conn = connected();
        let args = args(&["-q", "SELECT 'a' AS letter", "--format", "json"]);
        let out = capture(&mut conn, &args, &AppConfig::default()).unwrap();
        let v: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(v["columns"][0]["name"], "letter");
        assert_eq!(v["rows"][0][0]["value"], "a");
    }

    #[test]
    fn script_file_runs_as_one_statement() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.sql");
        std::fs::write(&path, "SELECT 2 AS two\n").unwrap();
        let path_arg = path.to_string_lossy().to_string();

        let mut conn = connected();
        let args = args(&["--script", &path_arg, "--format", "text"]);
        let out = capture(&mut conn, &args, &AppConfig::default()).unwrap();
        assert!(out.starts_with("two\n2\n"));
    }

    #[test]
    fn missing_query_is_an_error() {
        let mut conn = connected();
        let err = capture(&mut conn, &args(&[]), &AppConfig::default()).unwrap_err();
        assert!(matches!(err, AppError::InvalidRequest(_)));
        assert!(conn.is_connected());
    }

    #[test]
    fn test_connection_prints_nothing() {
        let mut conn = connected();
        let out = capture(&mut conn, &args(&["--test-connection"]), &AppConfig::default()).unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn run_reports_unreachable_dsn() {
        let mut cfg = AppConfig::default();
        cfg.database.dsn = "/nonexistent/queryone/dir/db.sqlite".into();
        let driver = Arc::new(SqliteDriver::default());
        let err = run(&args(&["-q", "SELECT 1"]), &cfg, driver).unwrap_err();
        assert!(matches!(err, AppError::ConnectionFailed { .. }));
    }

    #[test]
    fn credentials_never_reach_the_dsn() {
        let mut cfg = AppConfig::default();
        cfg.database.dsn = "file:/nonexistent/queryone/dir/db.sqlite?mode=rw".into();
        cfg.database.username = "reader".into();
        cfg.database.password = "s3cret".into();

        let conn = connection(&cfg, Arc::new(SqliteDriver::default()));
        assert_eq!(conn.dsn(), cfg.database.dsn);

        let driver = Arc::new(SqliteDriver::default());
        let err = run(&args(&["-q", "SELECT 1"]), &cfg, driver).unwrap_err();
        assert!(matches!(err, AppError::ConnectionFailed { .. }));
        assert!(!err.to_string().contains("s3cret"));
        assert!(!err.to_string().contains("reader"));
    }
}
