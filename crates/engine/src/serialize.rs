//! Typed table → text grid, the only shape the backend accepts.

use crate::error::EngineError;
use crate::grid::Grid;
use crate::table::{Frame, TypedTable};

/// Render every value to its display text: `Null` → `""`, numbers →
/// canonical decimal text, text → itself.
///
/// A table without columns is `EmptyData`; a table with headers but no
/// rows serializes to a header-only grid.
pub fn to_grid(table: &TypedTable) -> Result<Grid, EngineError> {
    frame_to_grid(&table.to_frame()?)
}

pub fn frame_to_grid(frame: &Frame) -> Result<Grid, EngineError> {
    if frame.width() == 0 {
        return Err(EngineError::EmptyData);
    }
    let header = frame.headers().into_iter().map(String::from).collect();
    let body = frame
        .rows()
        .map(|row| row.into_iter().map(|v| v.display_text()).collect());
    Ok(std::iter::once(header).chain(body).collect())
}
