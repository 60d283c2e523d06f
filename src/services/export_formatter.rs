//! Export formatting service
//!
//! Lays a grid out as an `ExportDocument`. When a live grid is available the
//! export follows its current column visibility, sort, and filter so the file
//! matches what the user sees; otherwise it falls back to the static grid model.

use crate::model::export::{
    ColumnWidth, ExportDocument, HeaderCell, PageSetup, TableLayout, EXPORT_TITLE,
};
use crate::model::grid::{CellValue, GridModel};

/// A column as currently displayed by a live grid
#[derive(Debug, Clone, PartialEq)]
pub struct DisplayedColumn {
    /// Column identifier (the field key)
    pub id: String,
    /// Header label; falls back to the id when absent
    pub header: Option<String>,
}

impl DisplayedColumn {
    pub fn label(&self) -> &str {
        self.header.as_deref().unwrap_or(&self.id)
    }
}

/// Read access to a live grid's current state
pub trait GridAccessor {
    /// Visible columns in display order
    fn displayed_columns(&self) -> Vec<DisplayedColumn>;

    /// Row handles after the current filter and sort are applied
    fn rows_after_filter_and_sort(&self) -> Vec<usize>;

    /// Value of a column at a row handle
    fn value(&self, column: &DisplayedColumn, row: usize) -> Option<CellValue>;

    fn column_count(&self) -> usize {
        self.displayed_columns().len()
    }
}

/// Build the export document for a grid
pub fn format_export(grid: &GridModel, accessor: Option<&dyn GridAccessor>) -> ExportDocument {
    let (header_row, body_rows, column_widths) = match accessor {
        Some(live) => from_live_grid(live),
        None => from_static_grid(grid),
    };

    tracing::debug!(
        columns = header_row.len(),
        rows = body_rows.len(),
        live = accessor.is_some(),
        "formatted export document"
    );

    ExportDocument {
        title: EXPORT_TITLE.to_string(),
        header_row,
        body_rows,
        column_widths,
        layout: TableLayout::default(),
        page: PageSetup::default(),
    }
}

type Sections = (Vec<HeaderCell>, Vec<Vec<String>>, Vec<ColumnWidth>);

fn from_live_grid(live: &dyn GridAccessor) -> Sections {
    let columns = live.displayed_columns();
    let header_row = columns.iter().map(|c| HeaderCell::new(c.label())).collect();

    let count = live.column_count().max(1);
    let column_widths = vec![ColumnWidth::Percent(100.0 / count as f64); columns.len()];

    let body_rows = live
        .rows_after_filter_and_sort()
        .into_iter()
        .map(|row| {
            columns
                .iter()
                .map(|col| {
                    live.value(col, row)
                        .map(|v| v.to_string())
                        .unwrap_or_default()
                })
                .collect()
        })
        .collect();

    (header_row, body_rows, column_widths)
}

// Widths here are `Auto` while the live path uses equal percentages; kept as-is
// until it is settled which of the two should win.
fn from_static_grid(grid: &GridModel) -> Sections {
    let header_row = grid
        .columns
        .iter()
        .map(|c| HeaderCell::new(c.display_name.clone()))
        .collect();

    let column_widths = vec![ColumnWidth::Auto; grid.columns.len()];

    let body_rows = grid
        .rows
        .iter()
        .map(|row| {
            grid.columns
                .iter()
                .map(|col| {
                    row.get(&col.field_key)
                        .map(|v| v.to_string())
                        .unwrap_or_default()
                })
                .collect()
        })
        .collect();

    (header_row, body_rows, column_widths)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::export::ColumnWidth;
    use crate::services::table_extractor::grid_from_markdown;

    /// Live grid double: shows columns in reverse and rows reversed
    struct ReversedGrid<'a> {
        grid: &'a GridModel,
    }

    impl GridAccessor for ReversedGrid<'_> {
        fn displayed_columns(&self) -> Vec<DisplayedColumn> {
            self.grid
                .columns
                .iter()
                .rev()
                .map(|c| DisplayedColumn {
                    id: c.field_key.clone(),
                    header: Some(c.display_name.clone()),
                })
                .collect()
        }

        fn rows_after_filter_and_sort(&self) -> Vec<usize> {
            (0..self.grid.rows.len()).rev().collect()
        }

        fn value(&self, column: &DisplayedColumn, row: usize) -> Option<CellValue> {
            self.grid.value(row, &column.id).cloned()
        }
    }

    fn sample_grid() -> GridModel {
        grid_from_markdown("| Name | Count |\n|---|---|\n| Alice | 3 |\n| Bob | 12 |")
    }

    #[test]
    fn test_static_fallback() {
        let grid = sample_grid();
        let doc = format_export(&grid, None);

        assert_eq!(doc.title, "LW AI Data Table");
        assert_eq!(doc.header_texts(), vec!["Name", "Count"]);
        assert!(doc.header_row.iter().all(|h| h.bold && h.margin_top == 12.0));
        assert_eq!(
            doc.body_rows,
            vec![vec!["Alice", "3"], vec!["Bob", "12"]]
        );
    }

    #[test]
    fn test_live_grid_reflects_current_state() {
        let grid = sample_grid();
        let live = ReversedGrid { grid: &grid };
        let doc = format_export(&grid, Some(&live));

        assert_eq!(doc.header_texts(), vec!["Count", "Name"]);
        assert_eq!(
            doc.body_rows,
            vec![vec!["12", "Bob"], vec!["3", "Alice"]]
        );
    }

    #[test]
    fn test_column_width_asymmetry() {
        let grid = sample_grid();

        let static_doc = format_export(&grid, None);
        assert_eq!(static_doc.column_widths, vec![ColumnWidth::Auto; 2]);

        let live = ReversedGrid { grid: &grid };
        let live_doc = format_export(&grid, Some(&live));
        assert_eq!(live_doc.column_widths, vec![ColumnWidth::Percent(50.0); 2]);
    }

    #[test]
    fn test_missing_values_become_empty_strings() {
        let mut grid = sample_grid();
        grid.rows[0].remove("count");
        grid.rows[1].insert("count".into(), CellValue::Bool(true));

        let doc = format_export(&grid, None);
        assert_eq!(doc.body_rows[0], vec!["Alice", ""]);
        assert_eq!(doc.body_rows[1], vec!["Bob", "true"]);
    }

    #[test]
    fn test_header_falls_back_to_column_id() {
        let column = DisplayedColumn {
            id: "total".into(),
            header: None,
        };
        assert_eq!(column.label(), "total");
    }

    #[test]
    fn test_empty_grid_exports_empty_document() {
        let doc = format_export(&GridModel::default(), None);
        assert_eq!(doc.column_count(), 0);
        assert!(doc.body_rows.is_empty());
        assert_eq!(doc.table_row_count(), 1);
    }
}
