use std::path::PathBuf;

use clap::{Parser, ValueEnum};

#[derive(Parser, Debug, Clone)]
#[command(name = "queryone", about = "Run one SQL statement and print the result as text")]
pub struct Args {
    /// JSON config file. Flags below override its values.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Connection string (SQLite path, `:memory:` or `file:` URI).
    #[arg(long)]
    pub dsn: Option<String>,

    /// Statement to execute.
    #[arg(long, short = 'q', conflicts_with = "script")]
    pub query: Option<String>,

    /// File whose whole content is submitted as a single statement.
    #[arg(long)]
    pub script: Option<PathBuf>,

    /// Only check that the connection answers a canary query.
    #[arg(long)]
    pub test_connection: bool,

    /// Maximum rows printed in text output.
    #[arg(long)]
    pub max_rows: Option<usize>,

    #[arg(long, value_enum, default_value_t = OutputFormat::Log)]
    pub format: OutputFormat,

    /// Logging level (stderr). Also supports RUST_LOG.
    #[arg(long)]
    pub log_level: Option<String>,

    /// Write a default config file to this path and exit.
    #[arg(long)]
    pub init_config: Option<PathBuf>,

    /// Serve connect/query/disconnect requests as NDJSON over stdio.
    #[arg(long)]
    pub bridge: bool,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Result lines through the logger.
    Log,
    /// Delimited text on stdout.
    Text,
    /// Result as JSON on stdout.
    Json,
}
