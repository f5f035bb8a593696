//! Spreadsheet handle: owns the backend and the per-tab fingerprints.

use std::cell::RefCell;

use log::{debug, info};
use smartspread_backend::{Principal, Role, SheetBackend};
use smartspread_engine::{EngineError, Fingerprint};

use crate::cache::FingerprintCache;
use crate::error::Error;
use crate::tab::{Tab, TabOptions};

/// Size of tabs created on demand by [`Spreadsheet::tab`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpreadsheetOptions {
    pub new_tab_rows: usize,
    pub new_tab_cols: usize,
}

impl Default for SpreadsheetOptions {
    fn default() -> Self {
        Self {
            new_tab_rows: 1000,
            new_tab_cols: 26,
        }
    }
}

pub struct Spreadsheet<B: SheetBackend> {
    backend: B,
    options: SpreadsheetOptions,
    pub(crate) fingerprints: RefCell<FingerprintCache>,
    tab_names: RefCell<Option<Vec<String>>>,
}

impl<B: SheetBackend> Spreadsheet<B> {
    pub fn new(backend: B) -> Self {
        Self::with_options(backend, SpreadsheetOptions::default())
    }

    pub fn with_options(backend: B, options: SpreadsheetOptions) -> Self {
        Self {
            backend,
            options,
            fingerprints: RefCell::new(FingerprintCache::new()),
            tab_names: RefCell::new(None),
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn title(&self) -> &str {
        self.backend.title()
    }

    pub fn url(&self) -> &str {
        self.backend.url()
    }

    /// Tab titles, fetched once and cached until a tab is created or
    /// [`refresh`](Self::refresh) is called.
    pub fn tab_names(&self) -> Result<Vec<String>, Error> {
        if let Some(names) = self.tab_names.borrow().as_ref() {
            return Ok(names.clone());
        }
        let names = self.backend.list_tabs()?;
        *self.tab_names.borrow_mut() = Some(names.clone());
        Ok(names)
    }

    pub fn tab_exists(&self, name: &str) -> Result<bool, Error> {
        if name.is_empty() {
            return Err(EngineError::InvalidArgument("tab_name cannot be empty".into()).into());
        }
        Ok(self.tab_names()?.iter().any(|t| t == name))
    }

    /// Open `name`, creating it first if it does not exist, and read its
    /// contents. An empty tab opens as an empty table.
    pub fn tab(&self, name: &str, options: TabOptions) -> Result<Tab<'_, B>, Error> {
        if !self.tab_exists(name)? {
            self.backend
                .create_tab(name, self.options.new_tab_rows, self.options.new_tab_cols)?;
            self.tab_names.borrow_mut().take();
            info!("Tab '{}' created in '{}'", name, self.title());
        }
        Tab::open(self, name, options)
    }

    pub fn grant_access(&self, principal: &Principal, role: Role) -> Result<(), Error> {
        self.backend.grant_access(principal, role)?;
        Ok(())
    }

    /// Forget cached tab names and every tab's fingerprint.
    pub fn refresh(&self) {
        self.tab_names.borrow_mut().take();
        let mut cache = self.fingerprints.borrow_mut();
        debug!("Dropping {} tab fingerprint(s) for '{}'", cache.len(), self.title());
        cache.clear();
    }

    /// Fingerprint the gate currently holds for `tab`.
    pub fn fingerprint(&self, tab: &str) -> Option<Fingerprint> {
        self.fingerprints.borrow().get(tab).cloned()
    }
}
