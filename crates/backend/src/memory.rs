//! In-memory backend for tests and offline use.

use std::cell::{Cell, RefCell};

use indexmap::IndexMap;
use log::debug;
use smartspread_engine::{trim_grid, Grid};

use crate::backend::{Principal, Role, SheetBackend, TabInfo, ValueRender, WriteMode};
use crate::error::BackendError;

/// A spreadsheet held in memory. Behaves like the real service where it
/// matters: range writes keep cells outside the range, and reads drop
/// trailing empty rows and cells.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    title: String,
    url: String,
    tabs: RefCell<IndexMap<String, Grid>>,
    next_tab_id: Cell<i64>,
    writes: Cell<usize>,
    fail_next_write: RefCell<Option<BackendError>>,
    grants: RefCell<Vec<(Principal, Role)>>,
    formatted: RefCell<Vec<String>>,
}

impl MemoryBackend {
    pub fn new(title: &str) -> Self {
        Self {
            title: title.to_string(),
            url: format!("memory://{}", title),
            ..Self::default()
        }
    }

    /// Builder: add a tab with initial contents.
    pub fn with_tab(self, name: &str, grid: Grid) -> Self {
        self.tabs.borrow_mut().insert(name.to_string(), grid);
        self.next_tab_id.set(self.next_tab_id.get() + 1);
        self
    }

    /// Raw contents of a tab as stored (untrimmed).
    pub fn grid(&self, tab: &str) -> Option<Grid> {
        self.tabs.borrow().get(tab).cloned()
    }

    /// Number of successful `write_grid` calls so far.
    pub fn write_count(&self) -> usize {
        self.writes.get()
    }

    /// Make the next `write_grid` call fail with `err`.
    pub fn fail_next_write(&self, err: BackendError) {
        *self.fail_next_write.borrow_mut() = Some(err);
    }

    pub fn grants(&self) -> Vec<(Principal, Role)> {
        self.grants.borrow().clone()
    }

    /// Tabs that have been formatted as tables, in call order.
    pub fn formatted_tabs(&self) -> Vec<String> {
        self.formatted.borrow().clone()
    }

    fn require_tab(&self, tab: &str) -> Result<(), BackendError> {
        if self.tabs.borrow().contains_key(tab) {
            Ok(())
        } else {
            Err(BackendError::NotFound(format!("tab '{}'", tab)))
        }
    }
}

impl SheetBackend for MemoryBackend {
    fn read_grid(&self, tab: &str, _render: ValueRender) -> Result<Grid, BackendError> {
        let tabs = self.tabs.borrow();
        let grid = tabs
            .get(tab)
            .ok_or_else(|| BackendError::NotFound(format!("tab '{}'", tab)))?;
        Ok(trim_grid(grid))
    }

    fn write_grid(&self, tab: &str, grid: &Grid, mode: WriteMode) -> Result<(), BackendError> {
        if let Some(err) = self.fail_next_write.borrow_mut().take() {
            return Err(err);
        }
        self.require_tab(tab)?;

        let mut tabs = self.tabs.borrow_mut();
        let stored = tabs.entry(tab.to_string()).or_default();
        match mode {
            WriteMode::Overwrite => *stored = grid.clone(),
            WriteMode::Range => {
                if stored.len() < grid.len() {
                    stored.resize(grid.len(), Vec::new());
                }
                for (dst, src) in stored.iter_mut().zip(grid) {
                    if dst.len() < src.len() {
                        dst.resize(src.len(), String::new());
                    }
                    dst[..src.len()].clone_from_slice(src);
                }
            }
        }
        self.writes.set(self.writes.get() + 1);
        debug!("memory: wrote {} rows to '{}' ({:?})", grid.len(), tab, mode);
        Ok(())
    }

    fn list_tabs(&self) -> Result<Vec<String>, BackendError> {
        Ok(self.tabs.borrow().keys().cloned().collect())
    }

    fn create_tab(&self, name: &str, _rows: usize, _cols: usize) -> Result<TabInfo, BackendError> {
        let mut tabs = self.tabs.borrow_mut();
        if tabs.contains_key(name) {
            return Err(BackendError::Validation(format!(
                "A sheet with the name \"{}\" already exists",
                name
            )));
        }
        tabs.insert(name.to_string(), Grid::new());
        let id = self.next_tab_id.get();
        self.next_tab_id.set(id + 1);
        Ok(TabInfo {
            id,
            title: name.to_string(),
        })
    }

    fn grant_access(&self, principal: &Principal, role: Role) -> Result<(), BackendError> {
        if *principal == Principal::Anyone && role == Role::Owner {
            return Err(BackendError::Validation(
                "owner role can only be granted to a user".into(),
            ));
        }
        self.grants.borrow_mut().push((principal.clone(), role));
        Ok(())
    }

    fn format_as_table(&self, tab: &str, _cols: usize) -> Result<(), BackendError> {
        self.require_tab(tab)?;
        self.formatted.borrow_mut().push(tab.to_string());
        Ok(())
    }

    fn title(&self) -> &str {
        &self.title
    }

    fn url(&self) -> &str {
        &self.url
    }
}
