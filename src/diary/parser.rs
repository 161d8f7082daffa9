//! Extracts the diary table from a page.

use super::grid::{Cell, RawTableGrid};
use crate::constants::PRIVATE_DIARY_MARKERS;
use crate::error::{NoDiaryFound, NoDiaryReason};
use scraper::{ElementRef, Html, Selector};

/// Cells spanning more columns than this are clamped.
const MAX_COLSPAN: usize = 64;

lazy_static::lazy_static! {
    static ref TABLE: Selector =
        Selector::parse("table").expect("Failed to compile table selector - this is a bug in the code");
    static ref ROW: Selector =
        Selector::parse("tr").expect("Failed to compile row selector - this is a bug in the code");
}

/// Reads the first `<table>` of `html` into a grid.
///
/// Every `<tr>` that belongs to the table itself (not to a nested table)
/// becomes a row; its `<th>`/`<td>` children become cells. A cell's text
/// nodes are trimmed and joined with a double space, so markup such as
/// `Calories <div>kcal</div>` reads as `"Calories  kcal"`. A cell spanning
/// several columns is repeated once per column.
///
/// A page without any table yields [`NoDiaryFound`]; the reason tells a
/// private diary apart from a page that simply has nothing to show.
pub fn parse_diary_table(html: &str) -> Result<RawTableGrid, NoDiaryFound> {
    let document = Html::parse_document(html);

    let Some(table) = document.select(&TABLE).next() else {
        let reason = probe_missing_reason(html);
        log::debug!("No diary table on page ({})", reason);
        return Err(NoDiaryFound { reason });
    };

    let rows: Vec<Vec<Cell>> = table
        .select(&ROW)
        .filter(|row| owning_table(*row) == Some(table))
        .map(read_row)
        .collect();

    log::debug!("Parsed diary table with {} rows", rows.len());
    Ok(RawTableGrid::new(rows))
}

/// Decides why a page carries no table.
pub fn probe_missing_reason(html: &str) -> NoDiaryReason {
    let lowered = html.to_lowercase();
    if PRIVATE_DIARY_MARKERS
        .iter()
        .any(|marker| lowered.contains(marker))
    {
        NoDiaryReason::Private
    } else {
        NoDiaryReason::NoTable
    }
}

fn owning_table(row: ElementRef<'_>) -> Option<ElementRef<'_>> {
    row.ancestors()
        .filter_map(ElementRef::wrap)
        .find(|el| el.value().name() == "table")
}

fn read_row(row: ElementRef<'_>) -> Vec<Cell> {
    let mut cells = Vec::new();
    for cell in row
        .children()
        .filter_map(ElementRef::wrap)
        .filter(|el| matches!(el.value().name(), "td" | "th"))
    {
        let value = Cell::text(cell_text(cell));
        let span = cell
            .value()
            .attr("colspan")
            .and_then(|s| s.trim().parse::<usize>().ok())
            .unwrap_or(1)
            .clamp(1, MAX_COLSPAN);
        cells.extend(std::iter::repeat(value).take(span));
    }
    cells
}

fn cell_text(cell: ElementRef<'_>) -> String {
    cell.text()
        .map(|fragment| fragment.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|fragment| !fragment.is_empty())
        .collect::<Vec<_>>()
        .join("  ")
}
