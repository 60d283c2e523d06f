//! Table extraction service
//!
//! Turns an assistant answer into a `GridModel`. Structured answers carry a
//! tabular payload that maps directly onto columns; markdown answers are scanned
//! for the first pipe table. Extraction is pure and never fails: input without
//! a recognisable table yields an empty grid.

use crate::model::grid::{CellValue, ColumnDefinition, GridModel, RowRecord, SortDirection};
use crate::model::response::{AgentResponse, TabularPayload};
use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;

/// Whitespace runs collapse to a single underscore in field keys
static WHITESPACE_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// Bracket and quote characters removed from headers
static BRACKET_QUOTE_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#"["'\[\]]"#).unwrap());

/// Integer or decimal after currency symbols and separators are stripped
static NUMERIC_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]+(\.[0-9]+)?$").unwrap());

/// Build a grid model from any resolved response
pub fn extract_grid(response: &AgentResponse) -> GridModel {
    match response {
        AgentResponse::StructuredMessage {
            table: Some(payload),
            ..
        } => grid_from_payload(payload),
        AgentResponse::StructuredMessage { text, table: None } => grid_from_markdown(text),
        AgentResponse::RawMarkdown(text) => grid_from_markdown(text),
        AgentResponse::Empty => GridModel::default(),
    }
}

/// Derive a field key from a header label
///
/// Lower-cased, bracket/quote characters stripped, whitespace runs become `_`.
pub fn field_key_for(display_name: &str) -> String {
    let stripped = BRACKET_QUOTE_REGEX.replace_all(display_name.trim(), "");
    WHITESPACE_REGEX
        .replace_all(&stripped.to_lowercase(), "_")
        .into_owned()
}

/// Header label for a payload key: brackets/quotes removed, `_` shown as space
pub fn display_name_for_key(key: &str) -> String {
    BRACKET_QUOTE_REGEX.replace_all(key, "").replace('_', " ")
}

/// Grid from a structured tabular payload
///
/// Columns come from the first record's keys in order. Values are used as-is.
pub fn grid_from_payload(payload: &TabularPayload) -> GridModel {
    let Some(first) = payload.first() else {
        return GridModel::default();
    };

    let columns: Vec<ColumnDefinition> = first
        .keys()
        .map(|key| ColumnDefinition {
            flexible: true,
            ..ColumnDefinition::new(display_name_for_key(key), key.clone())
        })
        .collect();

    let rows = payload
        .iter()
        .map(|record| {
            columns
                .iter()
                .map(|col| {
                    let value = record
                        .get(&col.field_key)
                        .map(CellValue::from_json)
                        .unwrap_or_else(CellValue::empty);
                    (col.field_key.clone(), value)
                })
                .collect::<RowRecord>()
        })
        .collect();

    GridModel { columns, rows }
}

/// Grid from the first pipe table in a markdown string
pub fn grid_from_markdown(markdown: &str) -> GridModel {
    let lines: Vec<&str> = markdown
        .split('\n')
        .filter(|line| !line.trim().is_empty())
        .collect();

    let separator_index = match lines.iter().position(|line| is_separator_line(line)) {
        Some(index) if index > 0 => index,
        _ => return GridModel::default(),
    };

    let headers = split_row(lines[separator_index - 1]);
    if headers.is_empty() {
        return GridModel::default();
    }

    let field_keys = unique_field_keys(&headers);
    let sort_column = sort_hint_column(markdown, &headers);
    let last = headers.len() - 1;

    let columns: Vec<ColumnDefinition> = headers
        .iter()
        .zip(field_keys.iter())
        .enumerate()
        .map(|(index, (header, key))| ColumnDefinition {
            flexible: index == last,
            sort_direction: (sort_column == Some(index)).then_some(SortDirection::Desc),
            ..ColumnDefinition::new(header.clone(), key.clone())
        })
        .collect();

    let rows = lines[separator_index + 1..]
        .iter()
        .filter(|line| line.contains('|') && !line.contains('*'))
        .map(|line| {
            let values = split_row(line);
            field_keys
                .iter()
                .enumerate()
                .map(|(index, key)| {
                    let raw = values.get(index).map(String::as_str).unwrap_or("");
                    (key.clone(), coerce_cell(raw))
                })
                .collect::<RowRecord>()
        })
        .collect();

    GridModel { columns, rows }
}

/// A header separator contains a pipe and at least two dashes
fn is_separator_line(line: &str) -> bool {
    line.contains('|') && line.matches('-').count() >= 2
}

/// Split a table line on `|`, trimming cells and the empty edge fragments
fn split_row(line: &str) -> Vec<String> {
    let mut cells: Vec<String> = line.split('|').map(|c| c.trim().to_string()).collect();
    if cells.first().is_some_and(|c| c.is_empty()) {
        cells.remove(0);
    }
    if cells.last().is_some_and(|c| c.is_empty()) {
        cells.pop();
    }
    cells
}

/// Field keys for each header, suffixing duplicates (`total`, `total_2`, ...)
fn unique_field_keys(headers: &[String]) -> Vec<String> {
    let mut seen: HashSet<String> = HashSet::new();
    headers
        .iter()
        .enumerate()
        .map(|(index, header)| {
            let mut base = field_key_for(header);
            if base.is_empty() {
                base = format!("column_{}", index + 1);
            }
            let mut key = base.clone();
            let mut suffix = 2;
            while !seen.insert(key.clone()) {
                key = format!("{}_{}", base, suffix);
                suffix += 1;
            }
            key
        })
        .collect()
}

/// Index of the column that should start sorted descending, if the text asks for it
fn sort_hint_column(markdown: &str, headers: &[String]) -> Option<usize> {
    let text = markdown.to_lowercase();
    if !(text.contains("sorted") && text.contains("descending") && text.contains("transaction")) {
        return None;
    }
    headers
        .iter()
        .position(|h| h.to_lowercase().contains("transaction"))
}

/// Numbers become `Number`, everything else stays trimmed text
fn coerce_cell(raw: &str) -> CellValue {
    if raw.is_empty() {
        return CellValue::empty();
    }
    let cleaned: String = raw.chars().filter(|c| *c != '$' && *c != ',').collect();
    if NUMERIC_REGEX.is_match(&cleaned) {
        if let Ok(number) = cleaned.parse::<f64>() {
            return CellValue::Number(number);
        }
    }
    CellValue::Text(raw.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn text(s: &str) -> CellValue {
        CellValue::Text(s.to_string())
    }

    #[test]
    fn test_basic_markdown_table() {
        let grid = grid_from_markdown("| Name | Count |\n|---|---|\n| Alice | 3 |\n| Bob | 12 |");

        assert_eq!(grid.columns.len(), 2);
        assert_eq!(grid.columns[0].display_name, "Name");
        assert_eq!(grid.columns[0].field_key, "name");
        assert_eq!(grid.columns[1].display_name, "Count");
        assert_eq!(grid.columns[1].field_key, "count");

        assert_eq!(grid.rows.len(), 2);
        assert_eq!(grid.rows[0]["name"], text("Alice"));
        assert_eq!(grid.rows[0]["count"], CellValue::Number(3.0));
        assert_eq!(grid.rows[1]["name"], text("Bob"));
        assert_eq!(grid.rows[1]["count"], CellValue::Number(12.0));
    }

    #[test]
    fn test_no_table_yields_empty_grid() {
        for input in [
            "",
            "Just some prose without a table.",
            "a | b\nc | d",
            "one dash - only | here",
            "---\n- list item\n- another",
        ] {
            let grid = grid_from_markdown(input);
            assert!(grid.columns.is_empty(), "columns for {:?}", input);
            assert!(grid.rows.is_empty(), "rows for {:?}", input);
        }
    }

    #[test]
    fn test_separator_on_first_line_has_no_header() {
        let grid = grid_from_markdown("|---|---|\n| a | b |");
        assert!(grid.is_empty());
    }

    #[test]
    fn test_currency_coercion() {
        let grid = grid_from_markdown(
            "| Client | Purchase Price |\n|---|---|\n| Alice | $2,150,000 |\n| Bob | $1,999.50 |",
        );
        assert_eq!(grid.columns[1].field_key, "purchase_price");
        let price = &grid.rows[0]["purchase_price"];
        assert_eq!(price, &CellValue::Number(2150000.0));
        assert_eq!(price.to_string(), "2150000");
        assert_eq!(grid.rows[1]["purchase_price"], CellValue::Number(1999.5));
    }

    #[test]
    fn test_non_numeric_keeps_original_text() {
        let grid = grid_from_markdown(
            "| Id | Amount |\n|---|---|\n| TX-1 | $1,000 approx |\n| 2024-05-01 | -5 |",
        );
        assert_eq!(grid.rows[0]["id"], text("TX-1"));
        assert_eq!(grid.rows[0]["amount"], text("$1,000 approx"));
        assert_eq!(grid.rows[1]["id"], text("2024-05-01"));
        assert_eq!(grid.rows[1]["amount"], text("-5"));
    }

    #[test]
    fn test_idempotent() {
        let markdown = "Intro\n\n| Agent | Total Transactions |\n|---|---|\n| Angie | 585 |\n";
        assert_eq!(grid_from_markdown(markdown), grid_from_markdown(markdown));
    }

    #[test]
    fn test_sort_hint_activation() {
        let markdown = "Results sorted in descending order by transaction count.\n\n\
                        | Office Name | Agent | Total Transactions |\n\
                        |---|---|---|\n\
                        | Main Branch | Angie | 585 |";
        let grid = grid_from_markdown(markdown);
        let sorted: Vec<_> = grid
            .columns
            .iter()
            .filter(|c| c.sort_direction.is_some())
            .collect();
        assert_eq!(sorted.len(), 1);
        assert_eq!(sorted[0].display_name, "Total Transactions");
        assert_eq!(sorted[0].sort_direction, Some(SortDirection::Desc));
    }

    #[test]
    fn test_sort_hint_requires_all_keywords() {
        for markdown in [
            "Sorted by total.\n| Total Transactions |\n|---|\n| 5 |",
            "In descending order.\n| Total Transactions |\n|---|\n| 5 |",
            "Sorted in descending order.\n| Total |\n|---|\n| 5 |",
        ] {
            let grid = grid_from_markdown(markdown);
            assert!(
                grid.columns.iter().all(|c| c.sort_direction.is_none()),
                "unexpected sort hint for {:?}",
                markdown
            );
        }
    }

    #[test]
    fn test_footnote_lines_excluded() {
        let markdown = "| Client | Transactions |\n|---|---|\n| Alice | 3 |\n\
                        | *Data sorted by transaction count* |";
        let grid = grid_from_markdown(markdown);
        assert_eq!(grid.rows.len(), 1);

        let markdown = "| Client | Transactions |\n|---|---|\n| Alice | 3 |\n\
                        *Data sorted by transaction count*";
        assert_eq!(grid_from_markdown(markdown).rows.len(), 1);
    }

    #[test]
    fn test_missing_trailing_cells_become_empty() {
        let grid = grid_from_markdown("| A | B | C |\n|---|---|---|\n| 1 |\n| x | y | z | extra |");
        assert_eq!(grid.rows[0]["a"], CellValue::Number(1.0));
        assert_eq!(grid.rows[0]["b"], text(""));
        assert_eq!(grid.rows[0]["c"], text(""));
        assert_eq!(grid.rows[1].len(), 3);
        for row in &grid.rows {
            let mut keys: Vec<_> = row.keys().cloned().collect();
            keys.sort();
            assert_eq!(keys, vec!["a", "b", "c"]);
        }
    }

    #[test]
    fn test_empty_interior_cell_keeps_alignment() {
        let grid = grid_from_markdown("| A | B | C |\n|---|---|---|\n| 1 |  | 3 |");
        assert_eq!(grid.rows[0]["b"], text(""));
        assert_eq!(grid.rows[0]["c"], CellValue::Number(3.0));
    }

    #[test]
    fn test_last_column_flexible() {
        let grid = grid_from_markdown("| A | B | C |\n|---|---|---|\n| 1 | 2 | 3 |");
        let flex: Vec<bool> = grid.columns.iter().map(|c| c.flexible).collect();
        assert_eq!(flex, vec![false, false, true]);
        assert!(grid.columns.iter().all(|c| c.sortable && c.resizable));
    }

    #[test]
    fn test_field_key_derivation() {
        assert_eq!(field_key_for("Total  Transactions"), "total_transactions");
        assert_eq!(field_key_for("[Client Name]"), "client_name");
        assert_eq!(field_key_for("\"Office\""), "office");
    }

    #[test]
    fn test_duplicate_field_keys_are_suffixed() {
        let grid = grid_from_markdown("| Total | total | TOTAL |\n|---|---|---|\n| 1 | 2 | 3 |");
        let keys: Vec<&str> = grid.columns.iter().map(|c| c.field_key.as_str()).collect();
        assert_eq!(keys, vec!["total", "total_2", "total_3"]);
        assert_eq!(grid.rows[0]["total_2"], CellValue::Number(2.0));
    }

    #[test]
    fn test_table_after_prose() {
        let markdown = "Here are the clients:\n\n| Client Name | Total |\n| --- | --- |\n| Alice | 4 |\n\nLet me know if you need more.";
        let grid = grid_from_markdown(markdown);
        assert_eq!(grid.columns.len(), 2);
        assert_eq!(grid.rows.len(), 1);
    }

    #[test]
    fn test_payload_grid() {
        let payload: TabularPayload = vec![
            json!({"office_name": "Main", "[user_key]": 524, "active": true})
                .as_object()
                .unwrap()
                .clone(),
            json!({"office_name": "Main", "[user_key]": 511})
                .as_object()
                .unwrap()
                .clone(),
        ];
        let grid = grid_from_payload(&payload);

        let names: Vec<&str> = grid.columns.iter().map(|c| c.display_name.as_str()).collect();
        assert_eq!(names, vec!["office name", "user key", "active"]);
        assert_eq!(grid.columns[1].field_key, "[user_key]");
        assert!(grid.columns.iter().all(|c| c.flexible && c.sortable));

        assert_eq!(grid.rows[0]["[user_key]"], CellValue::Number(524.0));
        assert_eq!(grid.rows[0]["active"], CellValue::Bool(true));
        assert_eq!(grid.rows[1]["active"], text(""));
    }

    #[test]
    fn test_payload_values_not_coerced() {
        let payload: TabularPayload =
            vec![json!({"price": "$2,150,000"}).as_object().unwrap().clone()];
        let grid = grid_from_payload(&payload);
        assert_eq!(grid.rows[0]["price"], text("$2,150,000"));
    }

    #[test]
    fn test_extract_grid_dispatch() {
        let markdown = "| A |\n|---|\n| 1 |";
        assert_eq!(
            extract_grid(&AgentResponse::RawMarkdown(markdown.into())).rows.len(),
            1
        );
        assert_eq!(
            extract_grid(&AgentResponse::StructuredMessage {
                text: markdown.into(),
                table: None
            })
            .rows
            .len(),
            1
        );
        assert!(extract_grid(&AgentResponse::Empty).is_empty());

        let payload = vec![json!({"x": 1}).as_object().unwrap().clone()];
        let grid = extract_grid(&AgentResponse::StructuredMessage {
            text: markdown.into(),
            table: Some(payload),
        });
        assert_eq!(grid.columns[0].field_key, "x");
    }
}
