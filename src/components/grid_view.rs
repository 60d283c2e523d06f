//! Grid view component
//!
//! Interactive table for the selected response: column cursor, sort cycling,
//! quick filter and hidden columns. Exports read the grid through
//! `GridAccessor` so files match what is on screen.

use crate::action::Action;
use crate::component::Component;
use crate::model::grid::{CellValue, ColumnDefinition, GridModel, SortDirection};
use crate::services::export_formatter::{DisplayedColumn, GridAccessor};
use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Scrollbar, ScrollbarOrientation, ScrollbarState},
    Frame,
};
use std::cmp::Ordering;
use std::collections::HashSet;
use unicode_width::UnicodeWidthStr;

const MAX_COLUMN_WIDTH: usize = 40;

#[derive(Default)]
pub struct GridView {
    grid: GridModel,
    /// Active sort: field key and direction
    sort: Option<(String, SortDirection)>,
    filter: String,
    pub filter_mode: bool,
    hidden: HashSet<String>,
    /// Index into the visible columns
    cursor: usize,
    scroll: usize,
    pub focused: bool,
}

impl GridView {
    pub fn new() -> Self {
        Self::default()
    }

    /// Show a new grid, resetting view state. A column sort hint becomes the
    /// initial sort.
    pub fn set_grid(&mut self, grid: GridModel) {
        self.sort = grid
            .columns
            .iter()
            .find_map(|c| c.sort_direction.map(|d| (c.field_key.clone(), d)));
        self.grid = grid;
        self.filter.clear();
        self.filter_mode = false;
        self.hidden.clear();
        self.cursor = 0;
        self.scroll = 0;
    }

    pub fn grid(&self) -> &GridModel {
        &self.grid
    }

    pub fn has_rows(&self) -> bool {
        self.grid.has_rows()
    }

    pub fn filter(&self) -> &str {
        &self.filter
    }

    pub fn sort(&self) -> Option<(&str, SortDirection)> {
        self.sort.as_ref().map(|(k, d)| (k.as_str(), *d))
    }

    pub fn visible_columns(&self) -> Vec<&ColumnDefinition> {
        self.grid
            .columns
            .iter()
            .filter(|c| !self.hidden.contains(&c.field_key))
            .collect()
    }

    fn current_column(&self) -> Option<&ColumnDefinition> {
        self.visible_columns().get(self.cursor).copied()
    }

    fn cell_text(&self, row: usize, key: &str) -> String {
        self.grid
            .value(row, key)
            .map(|v| v.to_string())
            .unwrap_or_default()
    }

    /// Row indices after the quick filter and sort
    pub fn visible_rows(&self) -> Vec<usize> {
        let needle = self.filter.trim().to_lowercase();
        let columns = self.visible_columns();

        let mut rows: Vec<usize> = (0..self.grid.rows.len())
            .filter(|&row| {
                needle.is_empty()
                    || columns
                        .iter()
                        .any(|c| self.cell_text(row, &c.field_key).to_lowercase().contains(&needle))
            })
            .collect();

        if let Some((key, direction)) = &self.sort {
            let empty = CellValue::empty();
            rows.sort_by(|&a, &b| {
                let va = self.grid.value(a, key).unwrap_or(&empty);
                let vb = self.grid.value(b, key).unwrap_or(&empty);
                let ord = va.compare(vb);
                match direction {
                    SortDirection::Asc => ord,
                    SortDirection::Desc => ord.reverse(),
                }
            });
        }
        rows
    }

    pub fn next_column(&mut self) {
        let count = self.visible_columns().len();
        if self.cursor + 1 < count {
            self.cursor += 1;
        }
    }

    pub fn prev_column(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    /// Cycle the current column through ascending, descending, unsorted
    pub fn toggle_sort(&mut self) {
        let Some(column) = self.current_column() else {
            return;
        };
        if !column.sortable {
            return;
        }
        let key = column.field_key.clone();

        self.sort = match self.sort.take() {
            Some((k, SortDirection::Asc)) if k == key => Some((k, SortDirection::Desc)),
            Some((k, SortDirection::Desc)) if k == key => None,
            _ => Some((key, SortDirection::Asc)),
        };
        self.scroll = 0;
    }

    /// Hide the current column; the last visible column stays
    pub fn hide_column(&mut self) {
        if self.visible_columns().len() <= 1 {
            return;
        }
        if let Some(key) = self.current_column().map(|c| c.field_key.clone()) {
            if self.sort.as_ref().is_some_and(|(k, _)| *k == key) {
                self.sort = None;
            }
            self.hidden.insert(key);
        }
        let count = self.visible_columns().len();
        self.cursor = self.cursor.min(count.saturating_sub(1));
    }

    pub fn show_all_columns(&mut self) {
        self.hidden.clear();
    }

    pub fn filter_input(&mut self, c: char) {
        self.filter.push(c);
        self.scroll = 0;
    }

    pub fn filter_backspace(&mut self) {
        self.filter.pop();
        self.scroll = 0;
    }

    /// Render the grid as text lines
    pub fn build_table_lines(&self) -> Vec<Line<'static>> {
        let columns = self.visible_columns();
        if columns.is_empty() {
            return vec![Line::from("No table in this response")];
        }
        let rows = self.visible_rows();

        let cells: Vec<Vec<String>> = rows
            .iter()
            .map(|&row| columns.iter().map(|c| self.cell_text(row, &c.field_key)).collect())
            .collect();

        let headers: Vec<String> = columns
            .iter()
            .map(|c| match &self.sort {
                Some((key, dir)) if *key == c.field_key => {
                    format!("{} {}", c.display_name, dir.arrow())
                }
                _ => c.display_name.clone(),
            })
            .collect();

        let mut col_widths: Vec<usize> = headers.iter().map(|h| h.width()).collect();
        for row in &cells {
            for (i, cell) in row.iter().enumerate() {
                col_widths[i] = col_widths[i].max(cell.width());
            }
        }
        for width in &mut col_widths {
            *width = (*width).min(MAX_COLUMN_WIDTH);
        }

        let mut lines = Vec::new();

        let header_spans: Vec<Span> = headers
            .iter()
            .enumerate()
            .flat_map(|(i, h)| {
                let mut style = Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD);
                if self.focused && i == self.cursor {
                    style = style.bg(Color::Blue).fg(Color::White);
                }
                vec![
                    Span::styled(pad(h, col_widths[i]), style),
                    Span::raw(" │ "),
                ]
            })
            .collect();
        lines.push(Line::from(header_spans));

        let separator: String = col_widths
            .iter()
            .map(|w| "─".repeat(*w))
            .collect::<Vec<_>>()
            .join("─┼─");
        lines.push(Line::from(Span::styled(
            separator,
            Style::default().fg(Color::DarkGray),
        )));

        for (n, row) in cells.iter().enumerate() {
            let fg = if n % 2 == 0 { Color::White } else { Color::Gray };
            let row_spans: Vec<Span> = row
                .iter()
                .enumerate()
                .flat_map(|(i, cell)| {
                    vec![
                        Span::styled(pad(cell, col_widths[i]), Style::default().fg(fg)),
                        Span::raw(" │ "),
                    ]
                })
                .collect();
            lines.push(Line::from(row_spans));
        }

        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            format!("Showing {} of {} rows", rows.len(), self.grid.rows.len()),
            Style::default().fg(Color::Yellow),
        )));

        lines
    }

    fn title(&self) -> String {
        let mut title = format!(" Table ({} rows) ", self.grid.rows.len());
        if !self.hidden.is_empty() {
            title = format!("{}[{} hidden] ", title, self.hidden.len());
        }
        if self.filter_mode || !self.filter.is_empty() {
            title = format!("{}[filter: {}{}] ", title, self.filter, if self.filter_mode { "_" } else { "" });
        }
        title
    }
}

/// Truncate to `width` columns and pad with spaces
fn pad(text: &str, width: usize) -> String {
    let text = if text.width() > width {
        let mut out = String::new();
        for c in text.chars() {
            if out.width() + 4 > width {
                break;
            }
            out.push(c);
        }
        format!("{}...", out)
    } else {
        text.to_string()
    };
    let fill = width.saturating_sub(text.width());
    format!("{}{}", text, " ".repeat(fill))
}

impl GridAccessor for GridView {
    fn displayed_columns(&self) -> Vec<DisplayedColumn> {
        self.visible_columns()
            .into_iter()
            .map(|c| DisplayedColumn {
                id: c.field_key.clone(),
                header: Some(c.display_name.clone()),
            })
            .collect()
    }

    fn rows_after_filter_and_sort(&self) -> Vec<usize> {
        self.visible_rows()
    }

    fn value(&self, column: &DisplayedColumn, row: usize) -> Option<CellValue> {
        self.grid.value(row, &column.id).cloned()
    }
}

impl Component for GridView {
    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        if self.filter_mode {
            let action = match key.code {
                KeyCode::Esc | KeyCode::Enter => Some(Action::ExitFilterMode),
                KeyCode::Backspace => Some(Action::FilterBackspace),
                KeyCode::Char(c) => Some(Action::FilterInput(c)),
                _ => None,
            };
            return Ok(action);
        }

        let action = match key.code {
            KeyCode::Left | KeyCode::Char('h') => Some(Action::GridPrevColumn),
            KeyCode::Right | KeyCode::Char('l') => Some(Action::GridNextColumn),
            KeyCode::Char('j') | KeyCode::Down => Some(Action::ScrollDown),
            KeyCode::Char('k') | KeyCode::Up => Some(Action::ScrollUp),
            KeyCode::Char('d') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                Some(Action::PageDown)
            }
            KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                Some(Action::PageUp)
            }
            KeyCode::PageDown => Some(Action::PageDown),
            KeyCode::PageUp => Some(Action::PageUp),
            KeyCode::Char('s') => Some(Action::ToggleSort),
            KeyCode::Char('/') => Some(Action::EnterFilterMode),
            KeyCode::Char('x') => Some(Action::HideColumn),
            KeyCode::Char('X') => Some(Action::ShowAllColumns),
            KeyCode::Char('e') => Some(Action::OpenExportMenu),
            KeyCode::Tab => Some(Action::FocusNext),
            KeyCode::Esc | KeyCode::Char('i') => Some(Action::FocusInput),
            KeyCode::Char('q') => Some(Action::OpenQuitDialog),
            KeyCode::Char('?') => Some(Action::OpenHelp),
            _ => None,
        };
        Ok(action)
    }

    fn update(&mut self, action: Action) -> Result<Option<Action>> {
        let max_scroll = self.visible_rows().len().saturating_sub(1);
        match action {
            Action::GridNextColumn => self.next_column(),
            Action::GridPrevColumn => self.prev_column(),
            Action::ToggleSort => self.toggle_sort(),
            Action::HideColumn => self.hide_column(),
            Action::ShowAllColumns => self.show_all_columns(),
            Action::EnterFilterMode => self.filter_mode = true,
            Action::ExitFilterMode => self.filter_mode = false,
            Action::FilterInput(c) => self.filter_input(c),
            Action::FilterBackspace => self.filter_backspace(),
            Action::ScrollDown => {
                if self.scroll < max_scroll {
                    self.scroll += 1;
                }
            }
            Action::ScrollUp => {
                self.scroll = self.scroll.saturating_sub(1);
            }
            Action::PageDown => {
                self.scroll = (self.scroll + 10).min(max_scroll);
            }
            Action::PageUp => {
                self.scroll = self.scroll.saturating_sub(10);
            }
            _ => {}
        }
        Ok(None)
    }

    fn draw(&mut self, frame: &mut Frame, area: Rect) -> Result<()> {
        let content = self.build_table_lines();
        let visible_height = area.height.saturating_sub(2) as usize;
        let border = if self.focused { Color::Cyan } else { Color::DarkGray };

        // Header and separator stay; scrolling moves the body
        let (head, body) = content.split_at(content.len().min(2));
        let mut lines: Vec<Line> = head.to_vec();
        lines.extend(body.iter().skip(self.scroll).cloned());

        let paragraph = Paragraph::new(lines).block(
            Block::default()
                .borders(Borders::ALL)
                .title(self.title())
                .border_style(Style::default().fg(border)),
        );

        frame.render_widget(paragraph, area);

        let total = content.len();
        if total > visible_height {
            let mut scrollbar_state =
                ScrollbarState::new(total.saturating_sub(visible_height)).position(self.scroll);

            frame.render_stateful_widget(
                Scrollbar::new(ScrollbarOrientation::VerticalRight)
                    .begin_symbol(Some("↑"))
                    .end_symbol(Some("↓")),
                area.inner(ratatui::layout::Margin {
                    vertical: 1,
                    horizontal: 0,
                }),
                &mut scrollbar_state,
            );
        }

        Ok(())
    }
}
