//! Text renderings of a `QueryResult`.

use std::fmt::Write as _;

use crate::core::{limits::effective_limit, types::QueryResult};

pub const DELIMITER: &str = ",";

/// Header, body (at most `max_rows` rows, 0 for all), truncation notice and footer.
///
/// Truncation only affects the body; the footer always reports the full row count.
pub fn format_result_as_csv_like(result: Option<&QueryResult>, max_rows: usize) -> String {
    let Some(result) = result else {
        return String::new();
    };

    let mut out = String::new();
    out.push_str(&header_line(result));
    out.push('\n');

    let limits = effective_limit(result.row_count(), max_rows);
    for row in result.rows().iter().take(limits.shown) {
        out.push_str(&row_line(row));
        out.push('\n');
    }

    if limits.truncated {
        let _ = writeln!(out, "... (truncated to {} rows)", limits.shown);
    }
    let _ = writeln!(out, "Execution time: {:?}", result.execution_time());
    let _ = writeln!(out, "Rows: {}", result.row_count());
    out
}

/// Lines emitted by `display_result`.
pub fn display_lines(result: Option<&QueryResult>) -> Vec<String> {
    let Some(result) = result else {
        return vec!["No result to display".to_string()];
    };
    if let Some(error) = result.error() {
        return vec![format!("Error: {error}")];
    }

    let mut lines = vec![
        format!("Query executed in {:?}", result.execution_time()),
        format!(
            "Returned {} rows with {} columns",
            result.row_count(),
            result.columns().len()
        ),
    ];
    if result.is_empty() {
        lines.push("No rows returned".to_string());
        return lines;
    }

    lines.push(header_line(result));
    lines.extend(result.rows().iter().map(|row| row_line(row)));
    lines.push(format!("Total: {} rows", result.row_count()));
    lines
}

/// Logs a result line by line.
pub fn display_result(result: Option<&QueryResult>) {
    let failed = result.and_then(|r| r.error()).is_some();
    for line in display_lines(result) {
        if failed {
            tracing::error!(target: "queryone::display", "{line}");
        } else {
            tracing::info!(target: "queryone::display", "{line}");
        }
    }
}

fn header_line(result: &QueryResult) -> String {
    result
        .columns()
        .iter()
        .map(|c| c.name.as_str())
        .collect::<Vec<_>>()
        .join(DELIMITER)
}

fn row_line(row: &[crate::core::types::CellValue]) -> String {
    row.iter()
        .map(|cell| cell.display_text())
        .collect::<Vec<_>>()
        .join(DELIMITER)
}
