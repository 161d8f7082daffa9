// src/output/render.rs
use crate::analytics::{logged_days, most_common_foods, total_macros};
use crate::error::AppError;
use crate::model::{CombinedDiaryTable, DayResult, DiaryTable};
use chrono::NaiveDate;
use std::fmt::Write;

/// One JSON object per entry over the full column set, `null` for columns
/// an entry's day did not have.
pub fn render_json_lines(table: &CombinedDiaryTable) -> Result<String, AppError> {
    let mut out = String::new();
    for row in table.rows() {
        out.push_str(&serde_json::to_string(&row)?);
        out.push('\n');
    }
    Ok(out)
}

/// JSON lines for a single day, over the guaranteed columns and the day's
/// own columns.
pub fn render_day_json_lines(date: NaiveDate, table: &DiaryTable) -> Result<String, AppError> {
    let mut day = CombinedDiaryTable::new();
    day.record(date, DayResult::Entries(table.clone()));
    render_json_lines(&day)
}

/// Human-readable run report: day counts, nutrition totals, top foods and
/// the days that produced nothing.
pub fn render_summary(table: &CombinedDiaryTable, top_n: usize) -> String {
    let mut out = String::new();
    // Writing into a String cannot fail.
    let _ = writeln!(out, "{}", table.summary());
    let _ = writeln!(out, "Logged days: {}", logged_days(table));
    let _ = writeln!(out, "{}", total_macros(table));

    let foods = most_common_foods(table, top_n);
    if !foods.is_empty() {
        let _ = writeln!(out, "Most common foods:");
        for (food, count) in foods {
            let _ = writeln!(out, "  {:>4}  {}", count, food);
        }
    }

    for (date, reason) in table.empty_days() {
        let _ = writeln!(out, "{}", AppError::NoDiaryFound { date, reason });
    }
    for (date, error) in table.failures() {
        let _ = writeln!(out, "{}: {}", date, error);
    }
    out
}
