//! Typed Table: three interchangeable shapes over the same content.
//!
//! - `Frame`: named, typed columns (canonical form; all edits happen here)
//! - `Records`: one ordered key → value map per row
//! - `Rows`: row 0 holds the headers, following rows hold values
//!
//! Conversions are lossless and order-preserving. Every conversion goes
//! through `Frame`, so column types are recomputed at the boundary.

use std::fmt;
use std::str::FromStr;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::column::{Column, ColumnType};
use crate::error::EngineError;
use crate::grid::trimmed_len;
use crate::value::Value;

/// One row of the record-list form; key order follows the headers.
pub type Record = IndexMap<String, Value>;

/// Which shape a caller wants its table in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataFormat {
    #[default]
    #[serde(alias = "DataFrame")]
    Frame,
    #[serde(alias = "dict")]
    Records,
    #[serde(alias = "list")]
    Rows,
}

impl DataFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            DataFormat::Frame => "frame",
            DataFormat::Records => "records",
            DataFormat::Rows => "rows",
        }
    }
}

impl fmt::Display for DataFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DataFormat {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "frame" | "DataFrame" => Ok(DataFormat::Frame),
            "records" | "dict" => Ok(DataFormat::Records),
            "rows" | "list" => Ok(DataFormat::Rows),
            other => Err(EngineError::InvalidArgument(format!(
                "invalid data format '{other}' (expected frame, records or rows)"
            ))),
        }
    }
}

/// Name used for a blank header cell at `index` (0-based).
pub(crate) fn placeholder_header(index: usize) -> String {
    format!("Column_{}", index + 1)
}

// =============================================================================
// Frame
// =============================================================================

/// Tabular form: equal-length typed columns.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Frame {
    columns: Vec<Column>,
    height: usize,
}

impl Frame {
    /// A frame with the given headers and no rows.
    pub fn with_headers<S: Into<String>>(headers: impl IntoIterator<Item = S>) -> Self {
        Self {
            columns: headers.into_iter().map(|h| Column::nulls(h, 0)).collect(),
            height: 0,
        }
    }

    pub fn headers(&self) -> Vec<&str> {
        self.columns.iter().map(Column::name).collect()
    }

    pub fn kinds(&self) -> Vec<ColumnType> {
        self.columns.iter().map(Column::kind).collect()
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Number of columns.
    pub fn width(&self) -> usize {
        self.columns.len()
    }

    /// Number of data rows.
    pub fn height(&self) -> usize {
        self.height
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name() == name)
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name() == name)
    }

    pub fn get(&self, row: usize, col: usize) -> Option<&Value> {
        self.columns.get(col)?.get(row)
    }

    /// Values of one data row, in column order.
    pub fn row(&self, row: usize) -> Option<Vec<&Value>> {
        if row >= self.height {
            return None;
        }
        Some(self.columns.iter().filter_map(|c| c.get(row)).collect())
    }

    pub fn rows(&self) -> impl Iterator<Item = Vec<&Value>> + '_ {
        (0..self.height).filter_map(move |r| self.row(r))
    }

    /// Index of `name`, appending an all-null column if it does not exist.
    pub fn ensure_column(&mut self, name: &str) -> usize {
        if let Some(idx) = self.column_index(name) {
            return idx;
        }
        self.columns.push(Column::nulls(name, self.height));
        self.columns.len() - 1
    }

    /// Overwrite one cell; the column widens if the value does not fit.
    ///
    /// Panics if `row` or `col` is out of bounds.
    pub fn set(&mut self, row: usize, col: usize, value: Value) {
        assert!(row < self.height, "row {row} out of bounds ({})", self.height);
        self.columns[col].set(row, value);
    }

    /// Append a row. Short rows are padded with nulls.
    pub fn push_row(&mut self, values: Vec<Value>) -> Result<usize, EngineError> {
        if values.len() > self.width() {
            return Err(EngineError::Shape {
                row: self.height + 1,
                len: values.len(),
                width: self.width(),
            });
        }
        let mut values = values.into_iter();
        for col in &mut self.columns {
            col.push(values.next().unwrap_or_default());
        }
        self.height += 1;
        Ok(self.height - 1)
    }

    /// A frame holding only the given rows, in the given order.
    pub fn select_rows(&self, rows: &[usize]) -> Frame {
        Frame {
            columns: self.columns.iter().map(|c| c.select(rows)).collect(),
            height: rows.len(),
        }
    }

    fn to_records(&self) -> Vec<Record> {
        (0..self.height)
            .map(|r| {
                self.columns
                    .iter()
                    .map(|c| (c.name().to_string(), c.values()[r].clone()))
                    .collect()
            })
            .collect()
    }

    fn to_rows(&self) -> Vec<Vec<Value>> {
        let header = self.columns.iter().map(|c| Value::text(c.name())).collect();
        std::iter::once(header)
            .chain(self.rows().map(|row| row.into_iter().cloned().collect()))
            .collect()
    }

    fn from_records(records: &[Record]) -> Frame {
        let mut headers: Vec<&str> = Vec::new();
        for record in records {
            for key in record.keys() {
                if !headers.contains(&key.as_str()) {
                    headers.push(key);
                }
            }
        }
        let columns = headers
            .iter()
            .map(|&h| {
                let values = records
                    .iter()
                    .map(|r| r.get(h).cloned().unwrap_or_default())
                    .collect();
                Column::from_values(h, values)
            })
            .collect();
        Frame {
            columns,
            height: records.len(),
        }
    }

    fn from_rows(rows: &[Vec<Value>]) -> Result<Frame, EngineError> {
        let Some((header, body)) = rows.split_first() else {
            return Ok(Frame::default());
        };
        let names: Vec<String> = header
            .iter()
            .enumerate()
            .map(|(i, v)| match v.display_text() {
                s if s.is_empty() => placeholder_header(i),
                s => s,
            })
            .collect();
        let width = names.len();

        for (i, row) in body.iter().enumerate() {
            let len = row.iter().rposition(|v| !v.is_null()).map_or(0, |p| p + 1);
            if len > width {
                return Err(EngineError::Shape { row: i + 1, len, width });
            }
        }

        let columns = names
            .into_iter()
            .enumerate()
            .map(|(c, name)| {
                let values = body
                    .iter()
                    .map(|row| row.get(c).cloned().unwrap_or_default())
                    .collect();
                Column::from_values(name, values)
            })
            .collect();
        Ok(Frame {
            columns,
            height: body.len(),
        })
    }

    /// Build from a text grid whose header row is already validated.
    pub(crate) fn from_text_rows(header: &[String], body: &[Vec<String>]) -> Result<Frame, EngineError> {
        let width = header.len();
        for (i, row) in body.iter().enumerate() {
            let len = trimmed_len(row);
            if len > width {
                return Err(EngineError::Shape { row: i + 1, len, width });
            }
        }

        let columns = header
            .iter()
            .enumerate()
            .map(|(c, name)| {
                let cells: Vec<&str> = body
                    .iter()
                    .map(|row| row.get(c).map_or("", String::as_str))
                    .collect();
                let name = if name.is_empty() { placeholder_header(c) } else { name.clone() };
                Column::from_cells(name, &cells)
            })
            .collect();
        Ok(Frame {
            columns,
            height: body.len(),
        })
    }
}

// =============================================================================
// TypedTable
// =============================================================================

/// A table in one of the three supported shapes.
#[derive(Debug, Clone, PartialEq)]
pub enum TypedTable {
    Frame(Frame),
    Records(Vec<Record>),
    Rows(Vec<Vec<Value>>),
}

impl TypedTable {
    /// A table with no headers and no rows.
    pub fn empty(format: DataFormat) -> Self {
        match format {
            DataFormat::Frame => TypedTable::Frame(Frame::default()),
            DataFormat::Records => TypedTable::Records(Vec::new()),
            DataFormat::Rows => TypedTable::Rows(Vec::new()),
        }
    }

    /// Re-encode a frame in the requested shape.
    pub fn from_frame(frame: Frame, format: DataFormat) -> Self {
        match format {
            DataFormat::Frame => TypedTable::Frame(frame),
            DataFormat::Records => TypedTable::Records(frame.to_records()),
            DataFormat::Rows => TypedTable::Rows(frame.to_rows()),
        }
    }

    pub fn format(&self) -> DataFormat {
        match self {
            TypedTable::Frame(_) => DataFormat::Frame,
            TypedTable::Records(_) => DataFormat::Records,
            TypedTable::Rows(_) => DataFormat::Rows,
        }
    }

    /// Number of data rows (the header row of `Rows` is not counted).
    pub fn row_count(&self) -> usize {
        match self {
            TypedTable::Frame(f) => f.height(),
            TypedTable::Records(r) => r.len(),
            TypedTable::Rows(r) => r.len().saturating_sub(1),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.row_count() == 0
    }

    pub fn to_frame(&self) -> Result<Frame, EngineError> {
        match self {
            TypedTable::Frame(f) => Ok(f.clone()),
            TypedTable::Records(r) => Ok(Frame::from_records(r)),
            TypedTable::Rows(r) => Frame::from_rows(r),
        }
    }

    pub fn to_records(&self) -> Result<Vec<Record>, EngineError> {
        match self {
            TypedTable::Records(r) => Ok(r.clone()),
            other => Ok(other.to_frame()?.to_records()),
        }
    }

    pub fn to_rows(&self) -> Result<Vec<Vec<Value>>, EngineError> {
        match self {
            TypedTable::Rows(r) => Ok(r.clone()),
            other => Ok(other.to_frame()?.to_rows()),
        }
    }

    pub fn into_format(self, format: DataFormat) -> Result<TypedTable, EngineError> {
        if self.format() == format {
            return Ok(self);
        }
        Ok(TypedTable::from_frame(self.to_frame()?, format))
    }

    /// Run `f` against the frame form and store the result back in this
    /// table's own shape.
    pub fn with_frame_mut<T>(
        &mut self,
        f: impl FnOnce(&mut Frame) -> Result<T, EngineError>,
    ) -> Result<T, EngineError> {
        if let TypedTable::Frame(frame) = self {
            return f(frame);
        }
        let mut frame = self.to_frame()?;
        let out = f(&mut frame)?;
        *self = TypedTable::from_frame(frame, self.format());
        Ok(out)
    }
}

/// JSON-style output: `Frame` and `Records` as a list of objects, `Rows`
/// as a list of arrays. Nulls serialize as `null`.
impl Serialize for TypedTable {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            TypedTable::Frame(f) => f.to_records().serialize(serializer),
            TypedTable::Records(r) => r.serialize(serializer),
            TypedTable::Rows(r) => r.serialize(serializer),
        }
    }
}

impl From<Frame> for TypedTable {
    fn from(frame: Frame) -> Self {
        TypedTable::Frame(frame)
    }
}
