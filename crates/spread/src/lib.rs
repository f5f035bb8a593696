//! `smartspread`: typed, change-gated access to spreadsheet tabs.
//!
//! Open a [`Spreadsheet`] over any [`SheetBackend`], get a [`Tab`], edit
//! its typed table locally, and write it back. Writes whose content
//! matches what the tab is known to hold are skipped.

mod cache;
mod error;
mod spreadsheet;
mod tab;
mod writer;

pub use cache::FingerprintCache;
pub use error::Error;
pub use spreadsheet::{Spreadsheet, SpreadsheetOptions};
pub use tab::{Tab, TabOptions};
pub use writer::{write_if_changed, WriteOptions, WriteOutcome};

pub use smartspread_backend::{
    BackendError, MemoryBackend, Principal, Role, SheetBackend, ValueRender, WriteMode,
};
pub use smartspread_engine::{DataFormat, EngineError, Record, TypedTable, UpsertOutcome, Value};
