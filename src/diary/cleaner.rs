//! Turns a raw diary grid into typed entries.
//!
//! The page renders one table per day whose shape depends on the account:
//! which nutrient columns are shown, how many meals there are, whether a
//! goal row exists. Cleaning runs a fixed sequence of steps, each one a
//! plain function from table to table:
//!
//! 1. header normalisation
//! 2. junk-row and empty row/column removal
//! 3. daily-goal extraction and attachment
//! 4. footer trim
//! 5. leading-token split of numeric cells
//! 6. numeric coercion
//! 7. food / quantity split

use super::grid::{Cell, RawTableGrid};
use crate::constants::{
    CELL_LABEL_SEPARATOR, CORE_NUTRIENT_COLUMNS, DAILY_GOAL_MARKER, FOOD_COLUMN, FOOTER_LABELS,
    FOOTER_ROWS, GOAL_PREFIX, NUTRIENT_UNIT_SUFFIXES, QTY_COLUMN, QUICK_TOOLS_MARKER,
};
use crate::error::AppError;
use crate::model::{DiaryEntry, DiaryTable};
use indexmap::IndexMap;
use regex::Regex;

lazy_static::lazy_static! {
    static ref NUMBER: Regex = Regex::new(r"^[-+]?(?:\d{1,3}(?:,\d{3})+|\d+)?(?:\.\d+)?$")
        .expect("Failed to compile number regex - this is a bug in the code");
}

/// A data row, remembering its position in the source grid for error
/// messages.
#[derive(Debug, Clone)]
struct Row {
    origin: usize,
    cells: Vec<Cell>,
}

impl Row {
    fn food(&self) -> String {
        self.cells
            .first()
            .map(|c| c.to_string().trim().to_string())
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone)]
struct WorkingTable {
    columns: Vec<String>,
    rows: Vec<Row>,
}

/// Cleans one day's grid into a [`DiaryTable`] (without date).
///
/// Fails with [`AppError::MalformedRow`] when a numeric cell holds anything
/// but a number, or when the day has more than one daily-goal row.
pub fn clean_diary_table(grid: RawTableGrid) -> Result<DiaryTable, AppError> {
    let raw_rows = grid.len();
    let table = normalise_header(grid);
    let table = remove_junk(table);
    let table = extract_goals(table)?;
    let table = trim_footer(table);
    let table = split_leading_tokens(table);
    let table = coerce_numeric(table)?;
    let diary = split_food_and_qty(table);

    log::debug!(
        "Cleaned diary grid: {} raw rows -> {} entries over {} numeric columns",
        raw_rows,
        diary.len(),
        diary.columns().len()
    );
    Ok(diary)
}

/// Lower-cases a label and turns each double space into an underscore.
pub fn normalise_label(label: &str) -> String {
    label
        .trim()
        .to_lowercase()
        .replace(CELL_LABEL_SEPARATOR, "_")
}

/// Name of the goal column derived from `label`.
pub fn goal_column_name(label: &str) -> String {
    let token = label.split_whitespace().next().unwrap_or(label);
    format!("{}{}", GOAL_PREFIX, token.to_lowercase())
}

/// Whether a column holds numbers.
pub fn is_numeric_column(name: &str) -> bool {
    name.contains("_g")
        || name.contains("calories")
        || NUTRIENT_UNIT_SUFFIXES
            .iter()
            .any(|suffix| name.ends_with(suffix))
}

/// Splits a food cell at its last comma into `(food, qty)`.
///
/// `"Chicken Breast, Grilled, 150g"` gives `("Chicken Breast, Grilled",
/// "150g")`; a cell without commas has an empty quantity.
pub fn split_food_cell(cell: &str) -> (String, String) {
    match cell.rsplit_once(',') {
        Some((food, qty)) => (food.trim().to_string(), qty.trim().to_string()),
        None => (cell.trim().to_string(), String::new()),
    }
}

/// Parses a numeric cell, accepting thousands separators.
pub fn parse_number(text: &str) -> Option<f64> {
    let text = text.trim();
    if !text.chars().any(|c| c.is_ascii_digit()) || !NUMBER.is_match(text) {
        return None;
    }
    text.replace(',', "").parse::<f64>().ok()
}

fn leading_token(text: &str) -> &str {
    text.split(CELL_LABEL_SEPARATOR).next().unwrap_or(text).trim()
}

// --- 1. header -------------------------------------------------------------

fn normalise_header(grid: RawTableGrid) -> WorkingTable {
    let width = grid.width().max(1);
    let mut rows = grid.into_rows().into_iter();
    let header = rows.next().unwrap_or_default();

    let mut columns: Vec<String> = Vec::with_capacity(width);
    for index in 0..width {
        let label = if index == 0 {
            FOOD_COLUMN.to_string()
        } else {
            header
                .get(index)
                .map(|cell| normalise_label(&cell.to_string()))
                .filter(|label| !label.is_empty())
                .unwrap_or_else(|| format!("column_{}", index))
        };
        let label = if columns.contains(&label) {
            format!("{}_{}", label, index)
        } else {
            label
        };
        columns.push(label);
    }

    let rows = rows
        .enumerate()
        .map(|(i, mut cells)| {
            cells.resize(width, Cell::Empty);
            Row {
                origin: i + 1,
                cells,
            }
        })
        .collect();

    WorkingTable { columns, rows }
}

// --- 2. junk -----------------------------------------------------------------

/// Quick-tools rows, and one-letter meal separators on pages that still
/// carry food and quantity in one cell.
fn is_junk_row(row: &Row, has_qty: bool) -> bool {
    let food = row.food();
    food.to_lowercase().contains(QUICK_TOOLS_MARKER) || (!has_qty && food.chars().count() == 1)
}

/// A meal header repeating the column labels ("Lunch", "Calories  kcal",
/// "Carbs  g", ...).
fn is_header_echo(row: &Row, columns: &[String]) -> bool {
    let mut labels = 0;
    for (cell, column) in row.cells.iter().zip(columns).skip(1) {
        match cell {
            Cell::Empty => {}
            Cell::Text(text) if normalise_label(text) == *column => labels += 1,
            _ => return false,
        }
    }
    labels > 0
}

fn remove_junk(mut table: WorkingTable) -> WorkingTable {
    let columns = table.columns.clone();
    let has_qty = columns.iter().any(|c| c == QTY_COLUMN);
    table
        .rows
        .retain(|row| !is_junk_row(row, has_qty) && !is_header_echo(row, &columns));
    table
        .rows
        .retain(|row| row.cells.iter().any(|cell| !cell.is_empty()));

    let keep: Vec<bool> = (0..table.columns.len())
        .map(|i| {
            i == 0
                || table.columns[i] == QTY_COLUMN
                || table.rows.iter().any(|row| !row.cells[i].is_empty())
        })
        .collect();
    if keep.iter().all(|k| *k) {
        return table;
    }

    let dropped: Vec<&str> = table
        .columns
        .iter()
        .zip(&keep)
        .filter(|(_, k)| !**k)
        .map(|(c, _)| c.as_str())
        .collect();
    log::debug!("Dropping empty columns: {}", dropped.join(", "));

    table.columns = retain_flagged(table.columns, &keep);
    for row in &mut table.rows {
        row.cells = retain_flagged(std::mem::take(&mut row.cells), &keep);
    }
    table
}

fn retain_flagged<T>(values: Vec<T>, keep: &[bool]) -> Vec<T> {
    values
        .into_iter()
        .zip(keep)
        .filter(|(_, k)| **k)
        .map(|(v, _)| v)
        .collect()
}

// --- 3. goals ----------------------------------------------------------------

/// Pulls the daily-goal row out of the table (first pass) and attaches its
/// values to every remaining row as `goal_*` columns (second pass).
///
/// No goal row leaves the table without goal columns; more than one is a
/// malformed day.
fn extract_goals(mut table: WorkingTable) -> Result<WorkingTable, AppError> {
    let positions: Vec<usize> = table
        .rows
        .iter()
        .enumerate()
        .filter(|(_, row)| row.food().to_lowercase().contains(DAILY_GOAL_MARKER))
        .map(|(i, _)| i)
        .collect();

    let goal_row = match positions.as_slice() {
        [] => {
            log::debug!("No daily goal row; goal columns stay empty");
            return Ok(table);
        }
        [single] => table.rows.remove(*single),
        [_, second, ..] => {
            let row = &table.rows[*second];
            return Err(AppError::MalformedRow {
                row: row.origin,
                column: FOOD_COLUMN.to_string(),
                value: row.food(),
                expected: "the only daily goal row of the day",
            });
        }
    };

    let mut goals: IndexMap<String, Cell> = IndexMap::new();
    for (column, cell) in table.columns.iter().zip(goal_row.cells).skip(1) {
        let mut name = goal_column_name(column);
        if goals.contains_key(&name) || table.columns.contains(&name) {
            name = format!("{}_{}", name, goals.len() + 1);
        }
        goals.insert(name, cell);
    }

    for row in &mut table.rows {
        row.cells.extend(goals.values().cloned());
    }
    table.columns.extend(goals.into_keys());
    Ok(table)
}

// --- 4. footer ---------------------------------------------------------------

/// Summary rows closing the table: totals, remaining, the goal row and the
/// unlabelled row repeating the column headers.
fn is_footer_row(row: &Row) -> bool {
    let food = row.food().to_lowercase();
    food.is_empty() || FOOTER_LABELS.contains(&food.as_str()) || food.contains(DAILY_GOAL_MARKER)
}

/// Drops the summary block closing the table (totals, remaining, the label
/// row), never more than the footer's size.
fn trim_footer(mut table: WorkingTable) -> WorkingTable {
    let mut trimmed = 0;
    while trimmed < FOOTER_ROWS {
        match table.rows.last() {
            Some(row) if is_footer_row(row) => {
                log::trace!("Trimming footer row '{}'", row.food());
                table.rows.pop();
                trimmed += 1;
            }
            _ => break,
        }
    }
    table
}

// --- 5. leading tokens -------------------------------------------------------

fn split_leading_tokens(mut table: WorkingTable) -> WorkingTable {
    let numeric: Vec<bool> = table.columns.iter().map(|c| is_numeric_column(c)).collect();
    for row in &mut table.rows {
        for (cell, is_numeric) in row.cells.iter_mut().zip(&numeric) {
            if !*is_numeric {
                continue;
            }
            if let Cell::Text(text) = cell {
                let token = leading_token(text).to_string();
                *cell = Cell::text(token);
            }
        }
    }
    table
}

// --- 6. numbers --------------------------------------------------------------

/// Rows after coercion: text columns kept as strings, numeric ones typed.
struct TypedTable {
    numeric_columns: Vec<String>,
    rows: Vec<TypedRow>,
}

struct TypedRow {
    food: String,
    qty: Option<String>,
    values: Vec<Option<f64>>,
}

fn coerce_cell(row: &Row, column: &str, cell: &Cell) -> Result<Option<f64>, AppError> {
    let value = match cell {
        Cell::Empty => return Ok(None),
        Cell::Number(value) => *value,
        Cell::Text(text) => parse_number(text).ok_or_else(|| AppError::MalformedRow {
            row: row.origin,
            column: column.to_string(),
            value: text.clone(),
            expected: "numeric",
        })?,
    };

    if column.contains("calories") && value.fract() != 0.0 {
        return Err(AppError::MalformedRow {
            row: row.origin,
            column: column.to_string(),
            value: value.to_string(),
            expected: "a whole number of calories",
        });
    }
    Ok(Some(value))
}

fn coerce_numeric(table: WorkingTable) -> Result<TypedTable, AppError> {
    let qty_index = table.columns.iter().position(|c| c == QTY_COLUMN);
    let numeric_indices: Vec<usize> = table
        .columns
        .iter()
        .enumerate()
        .filter(|(_, c)| is_numeric_column(c))
        .map(|(i, _)| i)
        .collect();

    let ignored: Vec<&str> = table
        .columns
        .iter()
        .enumerate()
        .skip(1)
        .filter(|(i, _)| Some(*i) != qty_index && !numeric_indices.contains(i))
        .map(|(_, c)| c.as_str())
        .collect();
    if !ignored.is_empty() {
        log::debug!("Ignoring non-numeric columns: {}", ignored.join(", "));
    }

    let required: Vec<usize> = numeric_indices
        .iter()
        .enumerate()
        .filter(|(_, i)| CORE_NUTRIENT_COLUMNS.contains(&table.columns[**i].as_str()))
        .map(|(position, _)| position)
        .collect();

    let mut rows = Vec::with_capacity(table.rows.len());
    for row in &table.rows {
        let values = numeric_indices
            .iter()
            .map(|&i| coerce_cell(row, &table.columns[i], &row.cells[i]))
            .collect::<Result<Vec<_>, _>>()?;

        if required.iter().any(|&position| values[position].is_none()) {
            log::debug!(
                "Dropping row {} ('{}'): missing calories or macros",
                row.origin,
                row.food()
            );
            continue;
        }

        rows.push(TypedRow {
            food: row.food(),
            qty: qty_index.map(|i| row.cells[i].to_string().trim().to_string()),
            values,
        });
    }

    let numeric_columns = numeric_indices
        .iter()
        .map(|&i| table.columns[i].clone())
        .collect();
    Ok(TypedTable {
        numeric_columns,
        rows,
    })
}

// --- 7. food / qty -----------------------------------------------------------

fn split_food_and_qty(table: TypedTable) -> DiaryTable {
    let entries: Vec<DiaryEntry> = table
        .rows
        .into_iter()
        .map(|row| {
            let (food, qty) = match row.qty {
                Some(qty) => (row.food, qty),
                None => split_food_cell(&row.food),
            };
            let nutrients = table
                .numeric_columns
                .iter()
                .zip(row.values)
                .filter_map(|(column, value)| value.map(|v| (column.clone(), v)))
                .collect();
            DiaryEntry {
                food,
                qty,
                date: None,
                nutrients,
            }
        })
        .collect();

    let columns = table
        .numeric_columns
        .into_iter()
        .filter(|column| entries.iter().any(|e| e.nutrients.contains_key(column)))
        .collect();

    DiaryTable::new(columns, entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn grid(rows: &[&[&str]]) -> RawTableGrid {
        RawTableGrid::from_strings(rows.iter().map(|r| r.iter().copied()))
    }

    /// A day shaped like the live page: meal separators, quick-tools rows,
    /// macro cells carrying a percentage, and the four-row footer.
    fn full_day() -> RawTableGrid {
        grid(&[
            &["Breakfast", "Calories  kcal", "Carbs  g", "Fat  g", "Protein  g", "Sodium  mg", ""],
            &["B"],
            &["Oats, Rolled, 40 g", "150", "27  70", "3  18", "5  13", "0", ""],
            &["Milk, 200 ml", "100", "10  40", "4  35", "7  25", "90", ""],
            &["Add Food  Quick Tools  Quick add calories", "", "", "", "", "", ""],
            &["L"],
            &["Chicken Breast, 150g", "248", "0  0", "5  20", "46  80", "110", ""],
            &["Add Food  Quick Tools  Quick add calories", "", "", "", "", "", ""],
            &["Totals", "498", "37  30", "12  22", "58  48", "200", ""],
            &["Your Daily Goal", "2,000", "250  50", "67  30", "100  20", "2,300", ""],
            &["Remaining", "1,502", "213", "55", "42", "2,100", ""],
            &["", "Calories  kcal", "Carbs  g", "Fat  g", "Protein  g", "Sodium  mg", ""],
        ])
    }

    #[test]
    fn reduced_page_scenario() {
        let table = clean_diary_table(grid(&[
            &["food", "calories  kcal", "carbs  g"],
            &["Apple", "95  kcal", "25  g"],
            &["Your Daily Goal", "2000  kcal", "250  g"],
            &["x"],
            &["Quick Tools..."],
        ]))
        .unwrap();

        assert_eq!(table.len(), 1);
        let apple = &table.entries()[0];
        assert_eq!(apple.food, "Apple");
        assert_eq!(apple.qty, "");
        assert_eq!(apple.calories_kcal(), Some(95));
        assert_eq!(apple.carbs_g(), Some(25.0));
        assert_eq!(apple.goal_calories_kcal(), Some(2000.0));
        assert_eq!(apple.goal_carbs_g(), Some(250.0));
        assert_eq!(
            table.columns(),
            &["calories_kcal", "carbs_g", "goal_calories_kcal", "goal_carbs_g"]
        );
    }

    #[test]
    fn full_day_yields_food_rows_only() {
        let table = clean_diary_table(full_day()).unwrap();

        let foods: Vec<(&str, &str)> = table
            .entries()
            .iter()
            .map(|e| (e.food.as_str(), e.qty.as_str()))
            .collect();
        assert_eq!(
            foods,
            vec![
                ("Oats, Rolled", "40 g"),
                ("Milk", "200 ml"),
                ("Chicken Breast", "150g"),
            ]
        );

        let oats = &table.entries()[0];
        assert_eq!(oats.calories_kcal(), Some(150));
        assert_eq!(oats.carbs_g(), Some(27.0));
        assert_eq!(oats.fat_g(), Some(3.0));
        assert_eq!(oats.protein_g(), Some(5.0));
        assert_eq!(oats.value("sodium_mg"), Some(0.0));
        assert_eq!(
            table.columns(),
            &[
                "calories_kcal",
                "carbs_g",
                "fat_g",
                "protein_g",
                "sodium_mg",
                "goal_calories_kcal",
                "goal_carbs_g",
                "goal_fat_g",
                "goal_protein_g",
                "goal_sodium_mg",
            ]
        );
    }

    #[test]
    fn every_entry_carries_the_single_goal_row() {
        let table = clean_diary_table(full_day()).unwrap();
        for entry in table.entries() {
            assert_eq!(entry.goal_calories_kcal(), Some(2000.0));
            assert_eq!(entry.goal_carbs_g(), Some(250.0));
            assert_eq!(entry.goal_fat_g(), Some(67.0));
            assert_eq!(entry.goal_protein_g(), Some(100.0));
            assert_eq!(entry.value("goal_sodium_mg"), Some(2300.0));
        }
    }

    #[test]
    fn separator_rows_never_survive() {
        let table = clean_diary_table(grid(&[
            &["food", "calories  kcal"],
            &["B"],
            &["Egg, 1 large", "70"],
            &["S"],
            &["D"],
        ]))
        .unwrap();
        assert!(table.entries().iter().all(|e| e.food.chars().count() != 1));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn repeated_meal_headers_are_junk() {
        let table = clean_diary_table(grid(&[
            &["Breakfast", "Calories  kcal", "Carbs  g"],
            &["Egg, 1 large", "70", "1"],
            &["Lunch", "Calories  kcal", "Carbs  g"],
            &["Rice, 1 cup", "200", "45"],
        ]))
        .unwrap();
        let foods: Vec<&str> = table.entries().iter().map(|e| e.food.as_str()).collect();
        assert_eq!(foods, vec!["Egg", "Rice"]);
    }

    #[test]
    fn no_goal_row_leaves_goals_null() {
        let table = clean_diary_table(grid(&[
            &["food", "calories  kcal", "carbs  g"],
            &["Apple, 1 medium", "95", "25"],
            &["Totals", "95", "25"],
        ]))
        .unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table.entries()[0].goal_calories_kcal(), None);
        assert!(table.entries()[0].goals().next().is_none());
    }

    #[test]
    fn two_goal_rows_are_malformed() {
        let err = clean_diary_table(grid(&[
            &["food", "calories  kcal"],
            &["Apple", "95"],
            &["Your Daily Goal", "2000"],
            &["Your Daily Goal", "1800"],
        ]))
        .unwrap_err();
        match err {
            AppError::MalformedRow { row, column, .. } => {
                assert_eq!(row, 3);
                assert_eq!(column, "food");
            }
            other => panic!("expected MalformedRow, got {:?}", other),
        }
    }

    #[test]
    fn non_numeric_residue_fails_loudly() {
        let err = clean_diary_table(grid(&[
            &["food", "calories  kcal", "carbs  g"],
            &["Apple", "95", "lots"],
            &["Banana", "105", "27"],
        ]))
        .unwrap_err();
        match err {
            AppError::MalformedRow {
                row, column, value, ..
            } => {
                assert_eq!((row, column.as_str(), value.as_str()), (1, "carbs_g", "lots"));
            }
            other => panic!("expected MalformedRow, got {:?}", other),
        }
    }

    #[test]
    fn fractional_calories_are_malformed() {
        let err = clean_diary_table(grid(&[
            &["food", "calories  kcal"],
            &["Apple", "95.5"],
        ]))
        .unwrap_err();
        assert!(matches!(err, AppError::MalformedRow { expected: "a whole number of calories", .. }));
    }

    #[test]
    fn rows_missing_core_values_are_dropped() {
        let table = clean_diary_table(grid(&[
            &["food", "calories  kcal", "carbs  g"],
            &["Apple", "95", "25"],
            &["Water, 1 cup", "0", ""],
        ]))
        .unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table.entries()[0].food, "Apple");
    }

    #[test]
    fn header_is_normalised() {
        assert_eq!(normalise_label("Calories  kcal"), "calories_kcal");
        assert_eq!(normalise_label(" Sat Fat  g "), "sat fat_g");
        assert_eq!(goal_column_name("calories_kcal"), "goal_calories_kcal");
        assert_eq!(goal_column_name("sat fat_g"), "goal_sat");
    }

    #[test]
    fn ragged_rows_are_padded_and_labelled() {
        let table = clean_diary_table(grid(&[
            &["food", "calories  kcal"],
            &["Apple", "95", "extra"],
        ]))
        .unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table.columns(), &["calories_kcal"]);
    }

    #[test]
    fn numbers_accept_thousands_separators_only() {
        assert_eq!(parse_number("2,000"), Some(2000.0));
        assert_eq!(parse_number("12.5"), Some(12.5));
        assert_eq!(parse_number("-3"), Some(-3.0));
        assert_eq!(parse_number("1,23"), None);
        assert_eq!(parse_number("NaN"), None);
        assert_eq!(parse_number("inf"), None);
        assert_eq!(parse_number("-"), None);
    }

    #[test]
    fn food_split_round_trips() {
        for cell in ["Chicken Breast, 150g", "Oats, Rolled, 40 g", "Apple", "Tea, 1 cup"] {
            let (food, qty) = split_food_cell(cell);
            let rejoined = if qty.is_empty() {
                food.clone()
            } else {
                format!("{}, {}", food, qty)
            };
            assert_eq!(rejoined, cell);
        }
        assert_eq!(
            split_food_cell("Chicken Breast, Grilled, 150g"),
            ("Chicken Breast, Grilled".to_string(), "150g".to_string())
        );
    }

    #[test]
    fn cleaning_is_idempotent() {
        let once = clean_diary_table(full_day()).unwrap();
        let twice = clean_diary_table(once.to_grid()).unwrap();
        assert_eq!(once, twice);

        let once = clean_diary_table(grid(&[
            &["food", "calories  kcal", "carbs  g"],
            &["Apple", "95  kcal", "25  g"],
            &["Your Daily Goal", "2000  kcal", "250  g"],
        ]))
        .unwrap();
        assert_eq!(clean_diary_table(once.to_grid()).unwrap(), once);
    }

    #[test]
    fn recleaning_keeps_an_empty_quantity_column() {
        let once = clean_diary_table(grid(&[
            &["food", "calories  kcal", "carbs  g"],
            &["Salt, Sea,", "0", "0"],
        ]))
        .unwrap();
        assert_eq!(once.entries()[0].food, "Salt, Sea");
        assert_eq!(once.entries()[0].qty, "");

        let twice = clean_diary_table(once.to_grid()).unwrap();
        assert_eq!(twice, once);
    }

    #[test]
    fn one_letter_food_survives_recleaning() {
        let once = clean_diary_table(grid(&[
            &["food", "calories  kcal", "carbs  g"],
            &["X, 1 bar", "210", "24"],
        ]))
        .unwrap();
        assert_eq!(once.len(), 1);
        assert_eq!(once.entries()[0].food, "X");

        let twice = clean_diary_table(once.to_grid()).unwrap();
        assert_eq!(twice, once);
    }

    #[test]
    fn empty_grid_is_an_empty_day() {
        let table = clean_diary_table(RawTableGrid::default()).unwrap();
        assert!(table.is_empty());
        assert!(table.columns().is_empty());
    }
}
