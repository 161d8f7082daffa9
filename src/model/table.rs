use super::entry::DiaryEntry;
use crate::constants::{FOOD_COLUMN, QTY_COLUMN};
use crate::diary::{Cell, RawTableGrid};
use chrono::NaiveDate;

/// The cleaned diary of a single day.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DiaryTable {
    date: Option<NaiveDate>,
    columns: Vec<String>,
    entries: Vec<DiaryEntry>,
}

impl DiaryTable {
    /// `columns` lists the numeric columns in display order.
    pub fn new(columns: Vec<String>, entries: Vec<DiaryEntry>) -> Self {
        Self {
            date: None,
            columns,
            entries,
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// Stamps the day onto the table and every entry in it.
    pub fn with_date(mut self, date: NaiveDate) -> Self {
        self.date = Some(date);
        for entry in &mut self.entries {
            entry.date = Some(date);
        }
        self
    }

    pub fn date(&self) -> Option<NaiveDate> {
        self.date
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.columns.iter().any(|c| c == column)
    }

    pub fn entries(&self) -> &[DiaryEntry] {
        &self.entries
    }

    pub fn into_entries(self) -> Vec<DiaryEntry> {
        self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Lays the table back out as a grid, header first.
    ///
    /// Cleaning the result reproduces this table.
    pub fn to_grid(&self) -> RawTableGrid {
        let mut rows = Vec::with_capacity(self.entries.len() + 1);

        let mut header = vec![Cell::text(FOOD_COLUMN), Cell::text(QTY_COLUMN)];
        header.extend(self.columns.iter().map(|c| Cell::text(c.as_str())));
        rows.push(header);

        for entry in &self.entries {
            let mut row = vec![Cell::text(entry.food.as_str()), Cell::text(entry.qty.as_str())];
            row.extend(
                self.columns
                    .iter()
                    .map(|c| entry.value(c).map(Cell::Number).unwrap_or(Cell::Empty)),
            );
            rows.push(row);
        }

        RawTableGrid::new(rows)
    }
}
