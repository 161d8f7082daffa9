use super::day::{DayResult, DayStatus};
use super::entry::DiaryEntry;
use super::table::DiaryTable;
use crate::constants::{DATE_COLUMN, FOOD_COLUMN, GUARANTEED_COLUMNS, QTY_COLUMN};
use crate::error::{AppError, NoDiaryReason};
use chrono::NaiveDate;
use indexmap::{IndexMap, IndexSet};
use serde_json::Value;
use std::collections::BTreeMap;

/// All days of a run, outer-joined into one table.
///
/// Days are keyed by date, so entries always come out in date order no
/// matter in which order the days were recorded. The column set is the
/// union of every day's columns; an entry reads `null` for a column its
/// day did not have.
#[derive(Debug, Default)]
pub struct CombinedDiaryTable {
    tables: BTreeMap<NaiveDate, DiaryTable>,
    days: BTreeMap<NaiveDate, DayStatus>,
}

impl CombinedDiaryTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the outcome of one day, replacing any earlier outcome for it.
    pub fn record(&mut self, date: NaiveDate, result: DayResult) {
        let status = match result {
            DayResult::Entries(table) => {
                let entries = table.len();
                self.tables.insert(date, table.with_date(date));
                DayStatus::Retrieved { entries }
            }
            DayResult::Empty(reason) => {
                self.tables.remove(&date);
                DayStatus::Empty(reason)
            }
            DayResult::Failed(error) => {
                self.tables.remove(&date);
                DayStatus::Failed(error)
            }
        };
        if self.days.insert(date, status).is_some() {
            log::warn!("Outcome for {} recorded twice; keeping the latest", date);
        }
    }

    /// Entries of every retrieved day, in date order.
    pub fn entries(&self) -> impl Iterator<Item = &DiaryEntry> {
        self.tables.values().flat_map(|table| table.entries().iter())
    }

    pub fn tables(&self) -> impl Iterator<Item = (&NaiveDate, &DiaryTable)> {
        self.tables.iter()
    }

    pub fn len(&self) -> usize {
        self.tables.values().map(DiaryTable::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Guaranteed columns first, then any extra column in first-seen order.
    pub fn columns(&self) -> Vec<String> {
        let mut columns: IndexSet<String> =
            GUARANTEED_COLUMNS.iter().map(|c| c.to_string()).collect();
        for table in self.tables.values() {
            columns.extend(table.columns().iter().cloned());
        }
        columns.into_iter().collect()
    }

    /// One entry as a full row over [`columns`](Self::columns).
    pub fn row(&self, entry: &DiaryEntry, columns: &[String]) -> IndexMap<String, Value> {
        columns
            .iter()
            .map(|column| {
                let value = match column.as_str() {
                    FOOD_COLUMN => Value::from(entry.food.as_str()),
                    QTY_COLUMN => Value::from(entry.qty.as_str()),
                    DATE_COLUMN => entry
                        .date
                        .map(|d| Value::from(d.to_string()))
                        .unwrap_or(Value::Null),
                    "calories_kcal" => entry.calories_kcal().map(Value::from).unwrap_or(Value::Null),
                    other => entry.value(other).map(Value::from).unwrap_or(Value::Null),
                };
                (column.clone(), value)
            })
            .collect()
    }

    /// Every entry as a full row, in date order.
    pub fn rows(&self) -> Vec<IndexMap<String, Value>> {
        let columns = self.columns();
        self.entries().map(|e| self.row(e, &columns)).collect()
    }

    pub fn days(&self) -> &BTreeMap<NaiveDate, DayStatus> {
        &self.days
    }

    pub fn status(&self, date: NaiveDate) -> Option<&DayStatus> {
        self.days.get(&date)
    }

    pub fn days_recorded(&self) -> usize {
        self.days.len()
    }

    pub fn days_retrieved(&self) -> usize {
        self.days.values().filter(|s| s.is_retrieved()).count()
    }

    pub fn empty_days(&self) -> impl Iterator<Item = (NaiveDate, NoDiaryReason)> + '_ {
        self.days.iter().filter_map(|(date, status)| match status {
            DayStatus::Empty(reason) => Some((*date, *reason)),
            _ => None,
        })
    }

    pub fn failures(&self) -> impl Iterator<Item = (NaiveDate, &AppError)> {
        self.days.iter().filter_map(|(date, status)| match status {
            DayStatus::Failed(error) => Some((*date, error)),
            _ => None,
        })
    }

    /// "N of M days retrieved".
    pub fn summary(&self) -> String {
        format!(
            "{} of {} days retrieved ({} entries)",
            self.days_retrieved(),
            self.days_recorded(),
            self.len()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FetchError;
    use pretty_assertions::assert_eq;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
    }

    fn table(food: &str, columns: &[(&str, f64)]) -> DiaryTable {
        let mut entry = DiaryEntry::new(food, "");
        for (name, value) in columns {
            entry = entry.with_nutrient(*name, *value);
        }
        DiaryTable::new(
            columns.iter().map(|(n, _)| n.to_string()).collect(),
            vec![entry],
        )
    }

    #[test]
    fn entries_follow_date_order_not_record_order() {
        let mut combined = CombinedDiaryTable::new();
        combined.record(day(3), DayResult::Entries(table("c", &[("calories_kcal", 3.0)])));
        combined.record(day(1), DayResult::Entries(table("a", &[("calories_kcal", 1.0)])));
        combined.record(day(2), DayResult::Entries(table("b", &[("calories_kcal", 2.0)])));

        let foods: Vec<_> = combined.entries().map(|e| e.food.as_str()).collect();
        assert_eq!(foods, vec!["a", "b", "c"]);
        let dates: Vec<_> = combined.entries().map(|e| e.date).collect();
        assert_eq!(dates, vec![Some(day(1)), Some(day(2)), Some(day(3))]);
    }

    #[test]
    fn outer_join_fills_missing_columns_with_null() {
        let mut combined = CombinedDiaryTable::new();
        combined.record(day(1), DayResult::Entries(table("a", &[("calories_kcal", 10.0)])));
        combined.record(
            day(2),
            DayResult::Entries(table("b", &[("calories_kcal", 20.0), ("sugar_g", 4.0)])),
        );

        let columns = combined.columns();
        assert_eq!(&columns[..GUARANTEED_COLUMNS.len()], GUARANTEED_COLUMNS);
        assert_eq!(columns.last().map(String::as_str), Some("sugar_g"));

        let rows = combined.rows();
        assert_eq!(rows[0]["sugar_g"], Value::Null);
        assert_eq!(rows[0]["goal_fat_g"], Value::Null);
        assert_eq!(rows[1]["sugar_g"], Value::from(4.0));
        assert_eq!(rows[0]["calories_kcal"], Value::from(10));
        assert_eq!(rows[1]["date"], Value::from("2024-03-02"));
    }

    #[test]
    fn statuses_are_counted_per_day() {
        let mut combined = CombinedDiaryTable::new();
        combined.record(day(1), DayResult::Entries(table("a", &[("calories_kcal", 1.0)])));
        combined.record(day(2), DayResult::Empty(NoDiaryReason::Private));
        combined.record(
            day(3),
            DayResult::Failed(AppError::Fetch {
                date: day(3),
                source: FetchError::HttpStatus {
                    url: "u".into(),
                    status: 500,
                },
            }),
        );

        assert_eq!(combined.days_recorded(), 3);
        assert_eq!(combined.days_retrieved(), 1);
        assert_eq!(
            combined.empty_days().collect::<Vec<_>>(),
            vec![(day(2), NoDiaryReason::Private)]
        );
        assert_eq!(combined.failures().count(), 1);
        assert_eq!(combined.summary(), "1 of 3 days retrieved (1 entries)");
    }
}
