//! The plain-text grid exchanged with the spreadsheet backend.

/// Rows of text cells. Row 0 is the header row.
pub type Grid = Vec<Vec<String>>;

/// Convert column index to letter (0 -> A, 1 -> B, 26 -> AA, etc.)
pub fn col_to_letter(col: usize) -> String {
    let mut result = String::new();
    let mut n = col;
    loop {
        result.insert(0, (b'A' + (n % 26) as u8) as char);
        if n < 26 {
            break;
        }
        n = n / 26 - 1;
    }
    result
}

/// A1 notation of the rectangle occupied by `grid`, e.g. `A1:C4`.
/// Returns `None` for a grid with no cells.
pub fn occupied_range(grid: &Grid) -> Option<String> {
    let width = grid.iter().map(Vec::len).max().unwrap_or(0);
    if width == 0 {
        return None;
    }
    Some(format!("A1:{}{}", col_to_letter(width - 1), grid.len()))
}

/// Length of `row` once trailing empty cells are dropped.
pub(crate) fn trimmed_len<S: AsRef<str>>(row: &[S]) -> usize {
    row.iter()
        .rposition(|c| !c.as_ref().is_empty())
        .map_or(0, |i| i + 1)
}

/// `grid` as a spreadsheet service reports it back: trailing empty cells
/// and trailing empty rows dropped.
pub fn trim_grid(grid: &Grid) -> Grid {
    let mut out: Grid = grid
        .iter()
        .map(|row| row[..trimmed_len(row)].to_vec())
        .collect();
    while out.last().is_some_and(|row| row.is_empty()) {
        out.pop();
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_col_to_letter() {
        assert_eq!(col_to_letter(0), "A");
        assert_eq!(col_to_letter(25), "Z");
        assert_eq!(col_to_letter(26), "AA");
        assert_eq!(col_to_letter(27), "AB");
        assert_eq!(col_to_letter(701), "ZZ");
        assert_eq!(col_to_letter(702), "AAA");
    }

    #[test]
    fn test_occupied_range() {
        let grid: Grid = vec![
            vec!["ID".into(), "Status".into()],
            vec!["1".into(), "open".into()],
            vec!["2".into(), "done".into()],
        ];
        assert_eq!(occupied_range(&grid).as_deref(), Some("A1:B3"));
        assert_eq!(occupied_range(&Vec::new()), None);
    }

    #[test]
    fn test_trimmed_len() {
        assert_eq!(trimmed_len(&["a", "", ""]), 1);
        assert_eq!(trimmed_len(&["", "b"]), 2);
        assert_eq!(trimmed_len::<&str>(&[]), 0);
    }

    #[test]
    fn test_trim_grid() {
        let grid: Grid = vec![
            vec!["A".into(), "B".into(), "".into()],
            vec!["".into(), "2".into()],
            vec!["".into(), "".into()],
        ];
        assert_eq!(trim_grid(&grid), vec![vec!["A", "B"], vec!["", "2"]]);
        assert!(trim_grid(&vec![vec![String::new()]]).is_empty());
    }
}
