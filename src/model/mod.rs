//! Domain model: cleaned diary entries, per-day tables and the combined
//! table a collection run produces.

mod combined;
mod day;
mod entry;
mod table;

pub use combined::CombinedDiaryTable;
pub use day::{DayResult, DayStatus};
pub use entry::DiaryEntry;
pub use table::DiaryTable;
