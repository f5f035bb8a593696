//! Grid Normalizer: text grid → typed table.

use crate::error::EngineError;
use crate::grid::Grid;
use crate::table::{DataFormat, Frame, TypedTable};

/// Convert a raw grid into a typed table of the requested shape.
///
/// Column types are inferred from the non-header cells on every call.
/// A grid without a header row is an error, distinct from a header-only
/// grid, which yields a table with zero rows.
pub fn normalize(grid: &Grid, format: DataFormat) -> Result<TypedTable, EngineError> {
    let frame = frame_from_grid(grid)?;
    Ok(TypedTable::from_frame(frame, format))
}

/// Tabular form of `grid`. See [`normalize`].
pub fn frame_from_grid(grid: &Grid) -> Result<Frame, EngineError> {
    let Some((header, body)) = grid.split_first() else {
        return Err(EngineError::EmptyTab);
    };
    if header.iter().all(String::is_empty) {
        return Err(EngineError::EmptyTab);
    }
    Frame::from_text_rows(header, body)
}
