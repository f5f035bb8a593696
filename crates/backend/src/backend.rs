//! The seam between typed tables and a spreadsheet service.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use smartspread_engine::Grid;

use crate::error::BackendError;

/// How cell values are rendered on read.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueRender {
    /// Raw values: numbers come back as numbers, whatever their display format.
    #[default]
    Unformatted,
    /// Values as displayed in the UI ("1,234.50", "12%").
    Formatted,
}

impl ValueRender {
    pub fn from_keep_formatting(keep: bool) -> Self {
        if keep {
            ValueRender::Formatted
        } else {
            ValueRender::Unformatted
        }
    }
}

/// How a grid lands in a tab.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WriteMode {
    /// Clear the whole tab, then write the grid from A1.
    Overwrite,
    /// Write only the rectangle the grid covers; cells outside it are kept.
    #[default]
    Range,
}

/// Tab metadata returned by [`SheetBackend::create_tab`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TabInfo {
    pub id: i64,
    pub title: String,
}

/// Who receives access in [`SheetBackend::grant_access`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Principal {
    User(String),
    Anyone,
}

impl Principal {
    /// `None` or an empty address means anyone with the link.
    pub fn from_email(email: Option<&str>) -> Self {
        match email {
            Some(e) if !e.is_empty() => Principal::User(e.to_string()),
            _ => Principal::Anyone,
        }
    }
}

impl fmt::Display for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Principal::User(email) => f.write_str(email),
            Principal::Anyone => f.write_str("anyone"),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    Owner,
    Writer,
    Reader,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Owner => "owner",
            Role::Writer => "writer",
            Role::Reader => "reader",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = BackendError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "owner" => Ok(Role::Owner),
            "writer" => Ok(Role::Writer),
            "reader" => Ok(Role::Reader),
            other => Err(BackendError::Validation(format!(
                "unknown role '{}' (expected owner, writer, or reader)",
                other
            ))),
        }
    }
}

/// One open spreadsheet on some service.
///
/// Implementations are synchronous and single-threaded. Grids cross this
/// boundary as plain text; typing happens on our side.
pub trait SheetBackend {
    /// All cell values of `tab`. Trailing empty rows and cells may be
    /// omitted. `NotFound` if the tab does not exist.
    fn read_grid(&self, tab: &str, render: ValueRender) -> Result<Grid, BackendError>;

    fn write_grid(&self, tab: &str, grid: &Grid, mode: WriteMode) -> Result<(), BackendError>;

    /// Tab titles in display order.
    fn list_tabs(&self) -> Result<Vec<String>, BackendError>;

    fn create_tab(&self, name: &str, rows: usize, cols: usize) -> Result<TabInfo, BackendError>;

    fn grant_access(&self, principal: &Principal, role: Role) -> Result<(), BackendError>;

    /// Basic filter over the first `cols` columns, header row frozen and bold.
    fn format_as_table(&self, tab: &str, cols: usize) -> Result<(), BackendError>;

    fn title(&self) -> &str;

    fn url(&self) -> &str;
}
