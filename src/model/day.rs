use super::table::DiaryTable;
use crate::error::{AppError, NoDiaryReason};
use std::fmt;

/// What one day of a collection run produced.
///
/// A diary that is absent is its own case, so callers cannot mistake it for
/// a failure or for a day with zero entries.
#[derive(Debug)]
pub enum DayResult {
    Entries(DiaryTable),
    Empty(NoDiaryReason),
    Failed(AppError),
}

impl DayResult {
    pub fn table(&self) -> Option<&DiaryTable> {
        match self {
            DayResult::Entries(table) => Some(table),
            _ => None,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, DayResult::Failed(_))
    }
}

/// Per-day bookkeeping kept alongside a combined table.
#[derive(Debug)]
pub enum DayStatus {
    Retrieved { entries: usize },
    Empty(NoDiaryReason),
    Failed(AppError),
}

impl DayStatus {
    pub fn is_retrieved(&self) -> bool {
        matches!(self, DayStatus::Retrieved { .. })
    }
}

impl fmt::Display for DayStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DayStatus::Retrieved { entries } => write!(f, "{} entries", entries),
            DayStatus::Empty(reason) => write!(f, "no data ({})", reason),
            DayStatus::Failed(error) => write!(f, "failed: {}", error),
        }
    }
}
