use crate::constants::GOAL_PREFIX;
use chrono::NaiveDate;
use indexmap::IndexMap;
use serde::Serialize;

/// One food logged on one day, with every numeric column of that day.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiaryEntry {
    pub food: String,
    pub qty: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    /// Numeric columns in table order; a column without a value for this
    /// entry is absent rather than zero.
    #[serde(flatten)]
    pub nutrients: IndexMap<String, f64>,
}

impl DiaryEntry {
    pub fn new(food: impl Into<String>, qty: impl Into<String>) -> Self {
        Self {
            food: food.into(),
            qty: qty.into(),
            date: None,
            nutrients: IndexMap::new(),
        }
    }

    pub fn with_nutrient(mut self, column: impl Into<String>, value: f64) -> Self {
        self.nutrients.insert(column.into(), value);
        self
    }

    pub fn value(&self, column: &str) -> Option<f64> {
        self.nutrients.get(column).copied()
    }

    pub fn calories_kcal(&self) -> Option<i64> {
        self.value("calories_kcal").map(|kcal| kcal.round() as i64)
    }

    pub fn carbs_g(&self) -> Option<f64> {
        self.value("carbs_g")
    }

    pub fn fat_g(&self) -> Option<f64> {
        self.value("fat_g")
    }

    pub fn protein_g(&self) -> Option<f64> {
        self.value("protein_g")
    }

    pub fn goal_calories_kcal(&self) -> Option<f64> {
        self.value("goal_calories_kcal")
    }

    pub fn goal_carbs_g(&self) -> Option<f64> {
        self.value("goal_carbs_g")
    }

    pub fn goal_fat_g(&self) -> Option<f64> {
        self.value("goal_fat_g")
    }

    pub fn goal_protein_g(&self) -> Option<f64> {
        self.value("goal_protein_g")
    }

    /// Goal columns carried by this entry.
    pub fn goals(&self) -> impl Iterator<Item = (&str, f64)> {
        self.nutrients
            .iter()
            .filter(|(name, _)| name.starts_with(GOAL_PREFIX))
            .map(|(name, value)| (name.as_str(), *value))
    }

    /// The food cell as the page showed it: food and quantity rejoined.
    pub fn food_cell(&self) -> String {
        if self.qty.is_empty() {
            self.food.clone()
        } else {
            format!("{}, {}", self.food, self.qty)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accessors_read_named_columns() {
        let entry = DiaryEntry::new("Apple", "1 medium")
            .with_nutrient("calories_kcal", 95.0)
            .with_nutrient("carbs_g", 25.0)
            .with_nutrient("goal_carbs_g", 250.0);
        assert_eq!(entry.calories_kcal(), Some(95));
        assert_eq!(entry.carbs_g(), Some(25.0));
        assert_eq!(entry.fat_g(), None);
        assert_eq!(entry.goals().collect::<Vec<_>>(), vec![("goal_carbs_g", 250.0)]);
        assert_eq!(entry.food_cell(), "Apple, 1 medium");
    }

    #[test]
    fn serializes_flat() {
        let mut entry = DiaryEntry::new("Apple", "").with_nutrient("calories_kcal", 95.0);
        entry.date = NaiveDate::from_ymd_opt(2024, 1, 2);
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "food": "Apple",
                "qty": "",
                "date": "2024-01-02",
                "calories_kcal": 95.0
            })
        );
    }
}
