//! Row update-or-insert keyed on one column.

use crate::error::EngineError;
use crate::table::{Frame, TypedTable};
use crate::value::Value;

/// What [`update_or_insert`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    /// The first matching row (data-row index) was updated in place.
    Updated(usize),
    /// No row matched; a new row was appended at this index.
    Inserted(usize),
}

impl UpsertOutcome {
    pub fn row(&self) -> usize {
        match self {
            UpsertOutcome::Updated(r) | UpsertOutcome::Inserted(r) => *r,
        }
    }
}

/// Update the first row whose `column` matches `match_value`, or append one.
///
/// Only the columns named in `updates` are touched on a match. On insert the
/// new row gets `column = match_value`, the update values, and nulls
/// elsewhere. Missing columns are created. Values that do not fit a column's
/// type widen the whole column. The table keeps its shape; nothing is
/// written to the backend.
pub fn update_or_insert<K, V>(
    table: &mut TypedTable,
    column: &str,
    match_value: impl Into<Value>,
    updates: impl IntoIterator<Item = (K, V)>,
) -> Result<UpsertOutcome, EngineError>
where
    K: Into<String>,
    V: Into<Value>,
{
    if column.is_empty() {
        return Err(EngineError::InvalidArgument("column cannot be empty".into()));
    }
    let updates: Vec<(String, Value)> = updates
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect();
    if updates.is_empty() {
        return Err(EngineError::InvalidArgument("updates cannot be empty".into()));
    }
    if updates.iter().any(|(k, _)| k.is_empty()) {
        return Err(EngineError::InvalidArgument("update column names cannot be empty".into()));
    }
    let match_value = match_value.into();

    table.with_frame_mut(|frame| Ok(upsert_frame(frame, column, match_value, updates)))
}

fn upsert_frame(
    frame: &mut Frame,
    column: &str,
    match_value: Value,
    updates: Vec<(String, Value)>,
) -> UpsertOutcome {
    let key_col = frame.ensure_column(column);
    let targets: Vec<(usize, Value)> = updates
        .into_iter()
        .map(|(name, value)| (frame.ensure_column(&name), value))
        .collect();

    let found = frame.columns()[key_col]
        .values()
        .iter()
        .position(|v| v.matches(&match_value));

    let (row, outcome) = match found {
        Some(row) => (row, UpsertOutcome::Updated(row)),
        None => {
            // Width never exceeds the frame, so push_row cannot fail here.
            let row = frame.height();
            let _ = frame.push_row(Vec::new());
            frame.set(row, key_col, match_value);
            (row, UpsertOutcome::Inserted(row))
        }
    };

    for (col, value) in targets {
        frame.set(row, col, value);
    }
    outcome
}
