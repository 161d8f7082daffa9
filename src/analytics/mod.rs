// src/analytics/mod.rs
//! Nutrition statistics over a combined diary table.

use crate::constants::{KCAL_PER_GRAM_CARBS, KCAL_PER_GRAM_FAT, KCAL_PER_GRAM_PROTEIN};
use crate::model::{CombinedDiaryTable, DiaryEntry, DiaryTable};
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// Calories and macros summed over every entry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct MacroTotals {
    pub calories_kcal: i64,
    pub carbs_g: f64,
    pub fat_g: f64,
    pub protein_g: f64,
}

impl fmt::Display for MacroTotals {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Calories (kcal): {}, Carbs (g): {:.0}, Fats (g): {:.0}, Protein (g): {:.0}",
            self.calories_kcal, self.carbs_g, self.fat_g, self.protein_g
        )
    }
}

pub fn total_macros(table: &CombinedDiaryTable) -> MacroTotals {
    table
        .entries()
        .fold(MacroTotals::default(), |mut totals, entry| {
            totals.calories_kcal += entry.calories_kcal().unwrap_or(0);
            totals.carbs_g += entry.carbs_g().unwrap_or(0.0);
            totals.fat_g += entry.fat_g().unwrap_or(0.0);
            totals.protein_g += entry.protein_g().unwrap_or(0.0);
            totals
        })
}

/// Days with at least one entry.
pub fn logged_days(table: &CombinedDiaryTable) -> usize {
    table.tables().filter(|(_, day)| !day.is_empty()).count()
}

/// The `top_n` most often logged foods with their entry counts.
///
/// Ties are ordered alphabetically.
pub fn most_common_foods(table: &CombinedDiaryTable, top_n: usize) -> Vec<(String, usize)> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for entry in table.entries() {
        *counts.entry(entry.food.as_str()).or_default() += 1;
    }

    let mut foods: Vec<(String, usize)> = counts
        .into_iter()
        .map(|(food, count)| (food.to_string(), count))
        .collect();
    foods.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    foods.truncate(top_n);
    foods
}

/// A macronutrient and its energy density.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Macro {
    Carbs,
    Fat,
    Protein,
}

impl Macro {
    pub const ALL: [Macro; 3] = [Macro::Carbs, Macro::Fat, Macro::Protein];

    pub fn kcal_per_gram(self) -> f64 {
        match self {
            Macro::Carbs => KCAL_PER_GRAM_CARBS,
            Macro::Fat => KCAL_PER_GRAM_FAT,
            Macro::Protein => KCAL_PER_GRAM_PROTEIN,
        }
    }

    /// Gram column holding this macro.
    pub fn column(self) -> &'static str {
        match self {
            Macro::Carbs => "carbs_g",
            Macro::Fat => "fat_g",
            Macro::Protein => "protein_g",
        }
    }

    pub fn goal_column(self) -> &'static str {
        match self {
            Macro::Carbs => "goal_carbs_g",
            Macro::Fat => "goal_fat_g",
            Macro::Protein => "goal_protein_g",
        }
    }

    fn kcal(self, entry: &DiaryEntry) -> Option<f64> {
        entry.value(self.column()).map(|g| g * self.kcal_per_gram())
    }
}

impl fmt::Display for Macro {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Macro::Carbs => write!(f, "carbs"),
            Macro::Fat => write!(f, "fat"),
            Macro::Protein => write!(f, "protein"),
        }
    }
}

/// One day's intake against the day's goals.
///
/// Actuals are summed over the day's entries; goals are the mean of the
/// values the entries carry (they are equal when the page had one goal
/// row). A day without goal row has no goals.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyIntake {
    pub date: NaiveDate,
    pub calories_kcal: i64,
    pub carbs_g: f64,
    pub fat_g: f64,
    pub protein_g: f64,
    pub carbs_kcal: f64,
    pub fat_kcal: f64,
    pub protein_kcal: f64,
    pub goal_calories_kcal: Option<f64>,
    pub goal_carbs_g: Option<f64>,
    pub goal_fat_g: Option<f64>,
    pub goal_protein_g: Option<f64>,
    pub goal_carbs_kcal: Option<f64>,
    pub goal_fat_kcal: Option<f64>,
    pub goal_protein_kcal: Option<f64>,
}

pub fn daily_intake(table: &CombinedDiaryTable) -> Vec<DailyIntake> {
    table
        .tables()
        .filter(|(_, day)| !day.is_empty())
        .map(|(date, day)| intake_of(*date, day))
        .collect()
}

fn intake_of(date: NaiveDate, day: &DiaryTable) -> DailyIntake {
    let entries = day.entries();
    let sum = |column: &str| entries.iter().filter_map(|e| e.value(column)).sum::<f64>();
    let mean = |column: &str| {
        let values: Vec<f64> = entries.iter().filter_map(|e| e.value(column)).collect();
        (!values.is_empty()).then(|| values.iter().sum::<f64>() / values.len() as f64)
    };

    let goal_carbs_g = mean(Macro::Carbs.goal_column());
    let goal_fat_g = mean(Macro::Fat.goal_column());
    let goal_protein_g = mean(Macro::Protein.goal_column());

    DailyIntake {
        date,
        calories_kcal: entries.iter().filter_map(DiaryEntry::calories_kcal).sum(),
        carbs_g: sum(Macro::Carbs.column()),
        fat_g: sum(Macro::Fat.column()),
        protein_g: sum(Macro::Protein.column()),
        carbs_kcal: sum(Macro::Carbs.column()) * Macro::Carbs.kcal_per_gram(),
        fat_kcal: sum(Macro::Fat.column()) * Macro::Fat.kcal_per_gram(),
        protein_kcal: sum(Macro::Protein.column()) * Macro::Protein.kcal_per_gram(),
        goal_calories_kcal: mean("goal_calories_kcal"),
        goal_carbs_g,
        goal_fat_g,
        goal_protein_g,
        goal_carbs_kcal: goal_carbs_g.map(|g| g * Macro::Carbs.kcal_per_gram()),
        goal_fat_kcal: goal_fat_g.map(|g| g * Macro::Fat.kcal_per_gram()),
        goal_protein_kcal: goal_protein_g.map(|g| g * Macro::Protein.kcal_per_gram()),
    }
}

/// Energy one food contributed through one macro on one day.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MacroKcal {
    pub food: String,
    pub date: NaiveDate,
    #[serde(rename = "macro")]
    pub nutrient: Macro,
    pub kcal: f64,
    /// Entries of the food that day.
    pub meals: usize,
}

/// One row per (food, date, macro), ordered by food, then date, then macro.
pub fn macro_breakdown(table: &CombinedDiaryTable) -> Vec<MacroKcal> {
    let mut groups: BTreeMap<(&str, NaiveDate, Macro), (f64, usize)> = BTreeMap::new();
    for (date, day) in table.tables() {
        for entry in day.entries() {
            for nutrient in Macro::ALL {
                if let Some(kcal) = nutrient.kcal(entry) {
                    let group = groups
                        .entry((entry.food.as_str(), *date, nutrient))
                        .or_insert((0.0, 0));
                    group.0 += kcal;
                    group.1 += 1;
                }
            }
        }
    }

    groups
        .into_iter()
        .map(|((food, date, nutrient), (kcal, meals))| MacroKcal {
            food: food.to_string(),
            date,
            nutrient,
            kcal,
            meals,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::DayResult;
    use pretty_assertions::assert_eq;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, d).unwrap()
    }

    fn entry(food: &str, kcal: f64, carbs: f64, fat: f64, protein: f64) -> DiaryEntry {
        DiaryEntry::new(food, "")
            .with_nutrient("calories_kcal", kcal)
            .with_nutrient("carbs_g", carbs)
            .with_nutrient("fat_g", fat)
            .with_nutrient("protein_g", protein)
    }

    fn with_goals(entry: DiaryEntry) -> DiaryEntry {
        entry
            .with_nutrient("goal_calories_kcal", 2000.0)
            .with_nutrient("goal_carbs_g", 250.0)
            .with_nutrient("goal_fat_g", 70.0)
            .with_nutrient("goal_protein_g", 100.0)
    }

    fn table(entries: Vec<DiaryEntry>) -> DiaryTable {
        let columns = entries
            .first()
            .map(|e| e.nutrients.keys().cloned().collect())
            .unwrap_or_default();
        DiaryTable::new(columns, entries)
    }

    fn sample() -> CombinedDiaryTable {
        let mut combined = CombinedDiaryTable::new();
        combined.record(
            day(1),
            DayResult::Entries(table(vec![
                with_goals(entry("Oats", 150.0, 27.0, 3.0, 5.0)),
                with_goals(entry("Banana", 105.0, 27.0, 0.5, 1.0)),
            ])),
        );
        combined.record(
            day(2),
            DayResult::Entries(table(vec![
                entry("Banana", 105.0, 27.0, 0.5, 1.0),
                entry("Banana", 105.0, 27.0, 0.5, 1.0),
                entry("Apple", 95.0, 25.0, 0.0, 0.5),
            ])),
        );
        combined.record(day(3), DayResult::Entries(DiaryTable::empty()));
        combined
    }

    #[test]
    fn totals_sum_every_entry() {
        let totals = total_macros(&sample());
        assert_eq!(totals.calories_kcal, 560);
        assert_eq!(totals.carbs_g, 133.0);
        assert_eq!(totals.fat_g, 4.5);
        assert_eq!(totals.protein_g, 8.5);
        assert!(totals.to_string().starts_with("Calories (kcal): 560"));
    }

    #[test]
    fn logged_days_skip_empty_tables() {
        assert_eq!(logged_days(&sample()), 2);
        assert_eq!(logged_days(&CombinedDiaryTable::new()), 0);
    }

    #[test]
    fn most_common_breaks_ties_alphabetically() {
        assert_eq!(
            most_common_foods(&sample(), 2),
            vec![("Banana".to_string(), 3), ("Apple".to_string(), 1)]
        );
        assert_eq!(most_common_foods(&sample(), 10).len(), 3);
    }

    #[test]
    fn daily_intake_sums_actuals_and_averages_goals() {
        let days = daily_intake(&sample());
        assert_eq!(days.len(), 2);

        let first = &days[0];
        assert_eq!(first.date, day(1));
        assert_eq!(first.calories_kcal, 255);
        assert_eq!(first.carbs_g, 54.0);
        assert_eq!(first.fat_kcal, 3.5 * 9.0);
        assert_eq!(first.goal_calories_kcal, Some(2000.0));
        assert_eq!(first.goal_fat_kcal, Some(630.0));

        let second = &days[1];
        assert_eq!(second.protein_kcal, 2.5 * 4.0);
        assert_eq!(second.goal_calories_kcal, None);
        assert_eq!(second.goal_carbs_kcal, None);
    }

    #[test]
    fn breakdown_groups_by_food_date_and_macro() {
        let rows = macro_breakdown(&sample());
        assert_eq!(rows.len(), 12);

        let banana_fat = rows
            .iter()
            .find(|r| r.food == "Banana" && r.date == day(2) && r.nutrient == Macro::Fat)
            .unwrap();
        assert_eq!(banana_fat.meals, 2);
        assert_eq!(banana_fat.kcal, 9.0);

        assert_eq!(rows[0].food, "Apple");
        assert_eq!(rows[0].nutrient, Macro::Carbs);
        assert_eq!(rows[0].kcal, 100.0);
    }
}
