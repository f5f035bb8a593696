//! Content fingerprints used to skip redundant writes.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::grid::Grid;
use crate::serialize::to_grid;
use crate::table::TypedTable;

/// Digest of a serialized grid, with algorithm prefix (`blake3:<hex>`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Hash a grid. Rows and cells are length-prefixed so that
    /// `[["ab"]]` and `[["a", "b"]]` never collide.
    pub fn of_grid(grid: &Grid) -> Self {
        let mut hasher = blake3::Hasher::new();
        hasher.update(&(grid.len() as u64).to_le_bytes());
        for row in grid {
            hasher.update(&(row.len() as u64).to_le_bytes());
            for cell in row {
                hasher.update(&(cell.len() as u64).to_le_bytes());
                hasher.update(cell.as_bytes());
            }
        }
        Fingerprint(format!("blake3:{}", hasher.finalize().to_hex()))
    }

    /// Fingerprint of the grid `table` would be written as.
    pub fn of_table(table: &TypedTable) -> Result<Self, EngineError> {
        Ok(Self::of_grid(&to_grid(table)?))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::{DataFormat, Frame};
    use crate::value::Value;

    fn g(rows: &[&[&str]]) -> Grid {
        rows.iter().map(|r| r.iter().map(|c| c.to_string()).collect()).collect()
    }

    #[test]
    fn test_deterministic_with_prefix() {
        let a = Fingerprint::of_grid(&g(&[&["A"], &["1"]]));
        let b = Fingerprint::of_grid(&g(&[&["A"], &["1"]]));
        assert_eq!(a, b);
        assert!(a.as_str().starts_with("blake3:"));
        assert_eq!(a.as_str().len(), 7 + 64);
    }

    #[test]
    fn test_cell_boundaries_matter() {
        let a = Fingerprint::of_grid(&g(&[&["ab"]]));
        let b = Fingerprint::of_grid(&g(&[&["a", "b"]]));
        let c = Fingerprint::of_grid(&g(&[&["a"], &["b"]]));
        assert_ne!(a, b);
        assert_ne!(b, c);
    }

    #[test]
    fn test_same_content_in_any_shape_hashes_equal() {
        let mut f = Frame::with_headers(["ID", "Status"]);
        f.push_row(vec![Value::Int(1), Value::text("open")]).unwrap();

        let frame = Fingerprint::of_table(&TypedTable::from(f.clone())).unwrap();
        let records = Fingerprint::of_table(&TypedTable::from_frame(f.clone(), DataFormat::Records)).unwrap();
        let rows = Fingerprint::of_table(&TypedTable::from_frame(f, DataFormat::Rows)).unwrap();
        assert_eq!(frame, records);
        assert_eq!(frame, rows);
    }
}
