//! The untyped grid a diary table is read into before cleaning.

use serde::Serialize;
use std::fmt;

/// One cell of a raw diary table.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Cell {
    Empty,
    Text(String),
    /// Already-typed value, present when a cleaned table is fed back in.
    Number(f64),
}

impl Cell {
    /// Text cell; blank input becomes [`Cell::Empty`].
    pub fn text(value: impl Into<String>) -> Self {
        let value = value.into();
        if value.trim().is_empty() {
            Cell::Empty
        } else {
            Cell::Text(value)
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Cell::Empty)
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Cell::Text(text) => Some(text),
            _ => None,
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Empty => Ok(()),
            Cell::Text(text) => f.write_str(text),
            Cell::Number(value) => write!(f, "{}", value),
        }
    }
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        Cell::text(value)
    }
}

impl From<String> for Cell {
    fn from(value: String) -> Self {
        Cell::text(value)
    }
}

impl From<f64> for Cell {
    fn from(value: f64) -> Self {
        Cell::Number(value)
    }
}

/// Rows of cells in page order; row 0 carries the column labels.
///
/// Rows may differ in length. Nothing about the shape is trusted until the
/// cleaner has run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTableGrid {
    rows: Vec<Vec<Cell>>,
}

impl RawTableGrid {
    pub fn new(rows: Vec<Vec<Cell>>) -> Self {
        Self { rows }
    }

    /// Builds a grid from string rows; handy for fixtures.
    pub fn from_strings<R, S>(rows: R) -> Self
    where
        R: IntoIterator,
        R::Item: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            rows: rows
                .into_iter()
                .map(|row| row.into_iter().map(|s| Cell::text(s)).collect())
                .collect(),
        }
    }

    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    pub fn header(&self) -> Option<&[Cell]> {
        self.rows.first().map(Vec::as_slice)
    }

    /// Widest row, in cells.
    pub fn width(&self) -> usize {
        self.rows.iter().map(Vec::len).max().unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn into_rows(self) -> Vec<Vec<Cell>> {
        self.rows
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_text_is_empty() {
        assert_eq!(Cell::text("   "), Cell::Empty);
        assert_eq!(Cell::from("95"), Cell::Text("95".into()));
    }

    #[test]
    fn width_tracks_ragged_rows() {
        let grid = RawTableGrid::from_strings(vec![vec!["food", "a", "b"], vec!["x"]]);
        assert_eq!(grid.width(), 3);
        assert_eq!(grid.len(), 2);
        assert_eq!(grid.header().map(|h| h.len()), Some(3));
    }
}
