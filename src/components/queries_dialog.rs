//! Saved queries dialog component
//!
//! Lists the predefined queries the backend offers and runs the selected one.

use crate::action::Action;
use crate::component::Component;
use crate::services::api::SavedQuery;
use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap},
    Frame,
};

/// Saved queries dialog
pub struct QueriesDialog {
    pub queries: Vec<SavedQuery>,
    pub selected_index: usize,
    pub list_state: ListState,
    /// The list is being fetched
    pub loading: bool,
    pub error: Option<String>,
}

impl Default for QueriesDialog {
    fn default() -> Self {
        Self::new()
    }
}

impl QueriesDialog {
    pub fn new() -> Self {
        let mut list_state = ListState::default();
        list_state.select(Some(0));
        Self {
            queries: Vec::new(),
            selected_index: 0,
            list_state,
            loading: false,
            error: None,
        }
    }

    pub fn set_queries(&mut self, queries: Vec<SavedQuery>) {
        self.queries = queries;
        self.loading = false;
        self.error = None;
        self.selected_index = self.selected_index.min(self.queries.len().saturating_sub(1));
        self.list_state.select(Some(self.selected_index));
    }

    pub fn set_error(&mut self, message: String) {
        self.error = Some(message);
        self.loading = false;
    }

    pub fn selected_query(&self) -> Option<&SavedQuery> {
        self.queries.get(self.selected_index)
    }

    fn select_next(&mut self) {
        if self.selected_index + 1 < self.queries.len() {
            self.selected_index += 1;
            self.list_state.select(Some(self.selected_index));
        }
    }

    fn select_prev(&mut self) {
        if self.selected_index > 0 {
            self.selected_index -= 1;
            self.list_state.select(Some(self.selected_index));
        }
    }
}

impl Component for QueriesDialog {
    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        let action = match key.code {
            KeyCode::Esc | KeyCode::Char('s') | KeyCode::Char('q') => Some(Action::CloseModal),
            KeyCode::Enter if self.selected_query().is_some() => Some(Action::RunSavedQuery),
            KeyCode::Char('r') => Some(Action::ReloadQueries),
            KeyCode::Up | KeyCode::Char('k') => Some(Action::ModalUp),
            KeyCode::Down | KeyCode::Char('j') => Some(Action::ModalDown),
            _ => None,
        };
        Ok(action)
    }

    fn update(&mut self, action: Action) -> Result<Option<Action>> {
        match action {
            Action::ModalUp => self.select_prev(),
            Action::ModalDown => self.select_next(),
            _ => {}
        }
        Ok(None)
    }

    fn draw(&mut self, frame: &mut Frame, area: Rect) -> Result<()> {
        frame.render_widget(Clear, area);

        let popup_width = 70u16.min(area.width.saturating_sub(4));
        let content_height = if self.queries.is_empty() { 4 } else { self.queries.len() as u16 + 2 };
        let popup_height = (content_height + 10).min(area.height.saturating_sub(4)).max(12);

        let x = area.x + (area.width.saturating_sub(popup_width)) / 2;
        let y = area.y + (area.height.saturating_sub(popup_height)) / 2;
        let popup_area = Rect::new(x, y, popup_width, popup_height);

        let main_chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Min(3),    // Query list
                Constraint::Length(5), // Description
                Constraint::Length(3), // Help bar
            ])
            .split(popup_area);

        let title_block = Block::default()
            .borders(Borders::ALL)
            .title(" Saved Queries ")
            .title_style(
                Style::default()
                    .fg(Color::Magenta)
                    .add_modifier(Modifier::BOLD),
            );

        if self.loading || self.error.is_some() || self.queries.is_empty() {
            let message = if self.loading {
                Line::from(Span::styled(
                    "Loading queries...",
                    Style::default().fg(Color::DarkGray),
                ))
            } else if let Some(error) = &self.error {
                Line::from(Span::styled(
                    format!("Error: {}", error),
                    Style::default().fg(Color::Red),
                ))
            } else {
                Line::from(Span::styled(
                    "The server offers no saved queries",
                    Style::default().fg(Color::Yellow),
                ))
            };
            let paragraph = Paragraph::new(vec![Line::from(""), message])
                .block(title_block)
                .wrap(Wrap { trim: false });
            frame.render_widget(paragraph, main_chunks[0]);
        } else {
            let items: Vec<ListItem> = self
                .queries
                .iter()
                .map(|q| {
                    ListItem::new(Line::from(vec![
                        Span::styled(q.name.clone(), Style::default().fg(Color::White)),
                        Span::styled(
                            format!("  ({})", q.alias),
                            Style::default().fg(Color::DarkGray),
                        ),
                    ]))
                })
                .collect();

            let list = List::new(items)
                .block(title_block)
                .highlight_style(
                    Style::default()
                        .bg(Color::Blue)
                        .fg(Color::White)
                        .add_modifier(Modifier::BOLD),
                )
                .highlight_symbol("▶ ");

            frame.render_stateful_widget(list, main_chunks[0], &mut self.list_state);
        }

        let description = self
            .selected_query()
            .map(|q| q.description.clone())
            .unwrap_or_default();
        let detail = Paragraph::new(description)
            .style(Style::default().fg(Color::Gray))
            .wrap(Wrap { trim: true })
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(Color::DarkGray))
                    .title(" Description "),
            );
        frame.render_widget(detail, main_chunks[1]);

        let help = Paragraph::new(Line::from(vec![
            Span::styled(" Enter ", Style::default().fg(Color::Yellow)),
            Span::raw("Run  "),
            Span::styled(" j/k ", Style::default().fg(Color::Cyan)),
            Span::raw("Navigate  "),
            Span::styled(" r ", Style::default().fg(Color::Cyan)),
            Span::raw("Reload  "),
            Span::styled(" Esc ", Style::default().fg(Color::Yellow)),
            Span::raw("Close"),
        ]))
        .alignment(ratatui::layout::Alignment::Center)
        .block(Block::default().borders(Borders::ALL));
        frame.render_widget(help, main_chunks[2]);

        Ok(())
    }
}
