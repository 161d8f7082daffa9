// src/pipeline.rs
//! Per-day pipeline stage and the progress capability shared by both
//! collectors.

use crate::api::RawPage;
use crate::diary::{clean_diary_table, parse_diary_table};
use crate::model::DayResult;
use chrono::NaiveDate;
use std::fmt;
use tokio::sync::mpsc::UnboundedSender;

/// Parses and cleans one fetched page.
///
/// A page without a table is [`DayResult::Empty`]; a malformed table fails
/// this day only.
pub fn process_page(page: &RawPage) -> DayResult {
    let grid = match parse_diary_table(&page.html) {
        Ok(grid) => grid,
        Err(missing) => {
            log::info!("{}: {}", page.date, missing);
            return DayResult::Empty(missing.reason);
        }
    };

    match clean_diary_table(grid) {
        Ok(table) => DayResult::Entries(table.with_date(page.date)),
        Err(e) => {
            log::warn!("{}: {}", page.date, e);
            DayResult::Failed(e)
        }
    }
}

/// One day finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressEvent {
    pub date: NaiveDate,
    /// 1-based position of the day in completion order.
    pub index: usize,
    pub total: usize,
}

impl fmt::Display for ProgressEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}/{}] {}", self.index, self.total, self.date)
    }
}

/// Receives progress events. Display state belongs to the implementor.
pub trait ProgressReporter: Send + Sync {
    fn report(&self, event: ProgressEvent);
}

/// Discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressReporter for NoProgress {
    fn report(&self, _event: ProgressEvent) {}
}

impl ProgressReporter for UnboundedSender<ProgressEvent> {
    fn report(&self, event: ProgressEvent) {
        // A closed receiver only means nobody is watching any more.
        let _ = self.send(event);
    }
}

impl<F> ProgressReporter for F
where
    F: Fn(ProgressEvent) + Send + Sync,
{
    fn report(&self, event: ProgressEvent) {
        self(event)
    }
}

/// What the serial collector yields for each day.
#[derive(Debug)]
pub struct DayOutcome {
    pub date: NaiveDate,
    /// 1-based position of the day in the range.
    pub index: usize,
    pub total: usize,
    pub result: DayResult,
}

impl DayOutcome {
    pub fn progress(&self) -> ProgressEvent {
        ProgressEvent {
            date: self.date,
            index: self.index,
            total: self.total,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::NoDiaryReason;
    use std::sync::Mutex;

    fn page(html: &str) -> RawPage {
        RawPage {
            date: NaiveDate::from_ymd_opt(2024, 4, 1).unwrap(),
            html: html.to_string(),
            url: "https://www.myfitnesspal.com/food/diary/jo?date=2024-04-01".to_string(),
        }
    }

    #[test]
    fn page_without_table_is_an_empty_day() {
        let result = process_page(&page("<html><body><p>Nothing logged</p></body></html>"));
        assert!(matches!(result, DayResult::Empty(NoDiaryReason::NoTable)));
    }

    #[test]
    fn entries_carry_the_page_date() {
        let html = r#"<table>
            <tr><td>Breakfast</td><td>Calories <div>kcal</div></td></tr>
            <tr><td>Toast, 2 slices</td><td>160</td></tr>
        </table>"#;
        let table = match process_page(&page(html)) {
            DayResult::Entries(table) => table,
            other => panic!("expected entries, got {:?}", other),
        };
        assert_eq!(table.len(), 1);
        assert_eq!(table.entries()[0].date, NaiveDate::from_ymd_opt(2024, 4, 1));
        assert_eq!(table.entries()[0].qty, "2 slices");
    }

    #[test]
    fn malformed_table_fails_the_day() {
        let html = r#"<table>
            <tr><td>Breakfast</td><td>Calories <div>kcal</div></td></tr>
            <tr><td>Toast</td><td>lots</td></tr>
        </table>"#;
        assert!(process_page(&page(html)).is_failed());
    }

    #[test]
    fn closures_and_channels_report() {
        let seen = Mutex::new(Vec::new());
        let reporter = |event: ProgressEvent| seen.lock().unwrap().push(event.index);
        let event = ProgressEvent {
            date: NaiveDate::from_ymd_opt(2024, 4, 1).unwrap(),
            index: 1,
            total: 2,
        };
        reporter.report(event);
        assert_eq!(*seen.lock().unwrap(), vec![1]);

        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        tx.report(event);
        assert_eq!(rx.try_recv().unwrap().to_string(), "[1/2] 2024-04-01");
        NoProgress.report(event);
    }
}
