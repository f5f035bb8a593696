//! Column-pattern filter.
//!
//! Read-only: the source table is never mutated. Results keep the source
//! table's shape and original row order; a `Rows` result keeps its header row.

use crate::error::EngineError;
use crate::table::TypedTable;
use crate::value::Value;

/// Rows whose `column` value equals `pattern` (type-aware, see [`Value::matches`]).
pub fn filter_by_column(
    table: &TypedTable,
    column: &str,
    pattern: &Value,
) -> Result<TypedTable, EngineError> {
    if pattern.is_null() || pattern.as_str() == Some("") {
        return Err(EngineError::InvalidArgument("pattern cannot be empty".into()));
    }
    filter_rows(table, column, |v| v.matches(pattern))
}

/// Rows whose `column` display text contains `needle` (case-sensitive).
/// Null cells never match.
pub fn filter_by_column_containing(
    table: &TypedTable,
    column: &str,
    needle: &str,
) -> Result<TypedTable, EngineError> {
    if needle.is_empty() {
        return Err(EngineError::InvalidArgument("pattern cannot be empty".into()));
    }
    filter_rows(table, column, |v| !v.is_null() && v.display_text().contains(needle))
}

fn filter_rows(
    table: &TypedTable,
    column: &str,
    predicate: impl Fn(&Value) -> bool,
) -> Result<TypedTable, EngineError> {
    if column.is_empty() {
        return Err(EngineError::InvalidArgument("column cannot be empty".into()));
    }
    let frame = table.to_frame()?;
    let col = frame
        .column(column)
        .ok_or_else(|| EngineError::ColumnNotFound(column.to_string()))?;

    let keep: Vec<usize> = col
        .values()
        .iter()
        .enumerate()
        .filter(|&(_, v)| predicate(v))
        .map(|(i, _)| i)
        .collect();

    Ok(TypedTable::from_frame(frame.select_rows(&keep), table.format()))
}
