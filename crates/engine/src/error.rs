use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// The grid has no header row at all.
    EmptyTab,
    /// A data row carries more cells than the header row.
    Shape { row: usize, len: usize, width: usize },
    /// Nothing to serialize: the table has no columns.
    EmptyData,
    /// A named column does not exist in the table.
    ColumnNotFound(String),
    /// Bad caller input (empty column name, empty update set, ...).
    InvalidArgument(String),
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyTab => write!(f, "tab is empty or has no header row"),
            Self::Shape { row, len, width } => {
                write!(f, "row {row} has {len} cells but the header has {width}")
            }
            Self::EmptyData => write!(f, "cannot write a table without columns"),
            Self::ColumnNotFound(name) => write!(f, "column '{name}' not found"),
            Self::InvalidArgument(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for EngineError {}
