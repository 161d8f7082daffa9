//! Diary page handling: HTML to raw grid, raw grid to typed table.

mod cleaner;
mod grid;
mod parser;

pub use cleaner::{clean_diary_table, is_numeric_column, parse_number, split_food_cell};
pub use grid::{Cell, RawTableGrid};
pub use parser::{parse_diary_table, probe_missing_reason};
