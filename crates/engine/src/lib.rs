//! `smartspread-engine`: typed tables over plain-text spreadsheet grids.
//!
//! Pure data crate: receives grids, returns typed tables and back.
//! No network, no file I/O, no logging.

pub mod column;
pub mod error;
pub mod filter;
pub mod fingerprint;
pub mod grid;
pub mod normalize;
pub mod serialize;
pub mod table;
pub mod upsert;
pub mod value;

pub use column::{Column, ColumnType};
pub use error::EngineError;
pub use filter::{filter_by_column, filter_by_column_containing};
pub use fingerprint::Fingerprint;
pub use grid::{occupied_range, trim_grid, Grid};
pub use normalize::normalize;
pub use serialize::to_grid;
pub use table::{DataFormat, Frame, Record, TypedTable};
pub use upsert::{update_or_insert, UpsertOutcome};
pub use value::Value;
