//! One tab of a spreadsheet, holding its data as a typed table.

use std::borrow::Cow;
use std::fmt;

use log::debug;
use smartspread_backend::{SheetBackend, ValueRender};
use smartspread_engine::{
    filter_by_column, filter_by_column_containing, update_or_insert, DataFormat, EngineError,
    Fingerprint, Frame, TypedTable, UpsertOutcome, Value,
};
use smartspread_engine::normalize::frame_from_grid;
use smartspread_engine::serialize::frame_to_grid;

use crate::error::Error;
use crate::spreadsheet::Spreadsheet;
use crate::writer::{write_if_changed, WriteOptions, WriteOutcome};

/// How a tab's contents are read.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TabOptions {
    pub format: DataFormat,
    pub render: ValueRender,
}

impl TabOptions {
    pub fn new(format: DataFormat) -> Self {
        Self {
            format,
            render: ValueRender::Unformatted,
        }
    }

    /// Read display text ("1,234.50") instead of raw values.
    pub fn keep_number_formatting(mut self, keep: bool) -> Self {
        self.render = ValueRender::from_keep_formatting(keep);
        self
    }
}

pub struct Tab<'a, B: SheetBackend> {
    sheet: &'a Spreadsheet<B>,
    name: String,
    options: TabOptions,
    data: TypedTable,
    /// Header row of the last read. An empty record list has no keys to
    /// carry it, so it is kept here.
    headers: Vec<String>,
}

impl<'a, B: SheetBackend> Tab<'a, B> {
    pub(crate) fn open(sheet: &'a Spreadsheet<B>, name: &str, options: TabOptions) -> Result<Self, Error> {
        let mut tab = Self {
            sheet,
            name: name.to_string(),
            options,
            data: TypedTable::empty(options.format),
            headers: Vec::new(),
        };
        tab.load()?;
        Ok(tab)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn options(&self) -> TabOptions {
        self.options
    }

    pub fn data(&self) -> &TypedTable {
        &self.data
    }

    /// Edit the held table directly. Nothing is sent until
    /// [`write_data`](Self::write_data).
    pub fn data_mut(&mut self) -> &mut TypedTable {
        &mut self.data
    }

    /// Replace the held table. An empty record list keeps the tab's
    /// header row.
    pub fn set_data(&mut self, data: TypedTable) {
        self.data = data;
    }

    /// Read and normalize the tab's current contents without touching the
    /// held data or the gate. An empty tab is `EngineError::EmptyTab`.
    pub fn read_data(&self) -> Result<TypedTable, Error> {
        let frame = self.read_frame()?;
        Ok(TypedTable::from_frame(frame, self.options.format))
    }

    fn read_frame(&self) -> Result<Frame, Error> {
        let grid = self
            .sheet
            .backend()
            .read_grid(&self.name, self.options.render)?;
        Ok(frame_from_grid(&grid)?)
    }

    /// Write the held table if it differs from the tab's known content.
    pub fn write_data(&self, options: WriteOptions) -> Result<WriteOutcome, Error> {
        let outcome = {
            let mut cache = self.sheet.fingerprints.borrow_mut();
            write_if_changed(
                self.sheet.backend(),
                &mut cache,
                &self.name,
                &self.table(),
                options.mode,
                options.force,
            )?
        };
        if outcome.written && options.as_table {
            let width = self.table().to_frame()?.width();
            self.sheet.backend().format_as_table(&self.name, width)?;
        }
        Ok(outcome)
    }

    /// Update the first row whose `column` matches `value`, or append one.
    /// Local only; call [`write_data`](Self::write_data) to persist.
    pub fn update_row_by_column<K, V>(
        &mut self,
        column: &str,
        value: impl Into<Value>,
        updates: impl IntoIterator<Item = (K, V)>,
    ) -> Result<UpsertOutcome, Error>
    where
        K: Into<String>,
        V: Into<Value>,
    {
        let seeded = match self.table() {
            Cow::Owned(table) => Some(table),
            Cow::Borrowed(_) => None,
        };
        if let Some(mut table) = seeded {
            let outcome = update_or_insert(&mut table, column, value, updates)?;
            self.data = table.into_format(self.data.format())?;
            return Ok(outcome);
        }
        Ok(update_or_insert(&mut self.data, column, value, updates)?)
    }

    pub fn filter_rows_by_column(&self, column: &str, pattern: &Value) -> Result<TypedTable, Error> {
        let hits = filter_by_column(&self.table(), column, pattern)?;
        Ok(hits.into_format(self.data.format())?)
    }

    pub fn filter_rows_containing(&self, column: &str, needle: &str) -> Result<TypedTable, Error> {
        let hits = filter_by_column_containing(&self.table(), column, needle)?;
        Ok(hits.into_format(self.data.format())?)
    }

    /// The held data, or a header-only frame when the data is an empty
    /// record list and the tab is known to have headers.
    fn table(&self) -> Cow<'_, TypedTable> {
        match &self.data {
            TypedTable::Records(rows) if rows.is_empty() && !self.headers.is_empty() => {
                Cow::Owned(TypedTable::Frame(Frame::with_headers(self.headers.iter().cloned())))
            }
            data => Cow::Borrowed(data),
        }
    }

    /// Re-read from the backend, replacing the held data and re-seeding
    /// the gate.
    pub fn refresh(&mut self) -> Result<&TypedTable, Error> {
        self.load()?;
        Ok(&self.data)
    }

    fn load(&mut self) -> Result<(), Error> {
        let read = self.read_frame();
        let mut cache = self.sheet.fingerprints.borrow_mut();
        match read {
            Ok(frame) => {
                debug!("Tab '{}' read: {} rows", self.name, frame.height());
                cache.set(&self.name, Fingerprint::of_grid(&frame_to_grid(&frame)?));
                self.headers = frame.headers().into_iter().map(String::from).collect();
                self.data = TypedTable::from_frame(frame, self.options.format);
                Ok(())
            }
            Err(Error::Engine(EngineError::EmptyTab)) => {
                debug!("Tab '{}' is empty or has no headers", self.name);
                cache.remove(&self.name);
                self.data = TypedTable::empty(self.options.format);
                self.headers.clear();
                Ok(())
            }
            Err(e) => Err(e),
        }
    }
}

impl<B: SheetBackend> fmt::Display for Tab<'_, B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Tab '{}'", self.name)
    }
}
