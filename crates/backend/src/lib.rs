//! Spreadsheet service backends.
//!
//! [`SheetBackend`] is the seam the rest of the workspace talks to.
//! [`GoogleSheets`] speaks the Sheets and Drive HTTP APIs;
//! [`MemoryBackend`] keeps everything in process.
//!
//! Text grids in, text grids out. No typing, no change detection.

mod auth;
mod backend;
mod error;
mod http;
mod memory;
mod sheets;

pub use auth::{
    auth_file_path, delete_auth, load_auth, load_auth_from, save_auth, save_auth_to,
    AuthCredentials, DEFAULT_DRIVE_BASE, DEFAULT_SHEETS_BASE, TOKEN_ENV,
};
pub use backend::{Principal, Role, SheetBackend, TabInfo, ValueRender, WriteMode};
pub use error::BackendError;
pub use http::ClientOptions;
pub use memory::MemoryBackend;
pub use sheets::{quote_tab, GoogleSheets, SheetsClient};
