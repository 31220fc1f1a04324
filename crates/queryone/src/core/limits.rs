use super::types::Limits;

/// Rows to display out of `row_count`. A `max_rows` of 0 means no limit.
pub fn effective_limit(row_count: usize, max_rows: usize) -> Limits {
    if max_rows > 0 && row_count > max_rows {
        Limits {
            shown: max_rows,
            truncated: true,
        }
    } else {
        Limits {
            shown: row_count,
            truncated: false,
        }
    }
}
