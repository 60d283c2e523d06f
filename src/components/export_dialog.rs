//! Export menu component
//!
//! Picks the export target for a table: PDF download, print, email, or CSV.

use crate::action::{Action, ExportKind};
use crate::component::Component;
use crate::components::centered_popup;
use crate::model::modal::ExportSource;
use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph},
    Frame,
};

/// Export menu
pub struct ExportDialog {
    pub selected_index: usize,
    pub list_state: ListState,
    pub source: ExportSource,
    /// Directory downloads are written to
    pub export_dir: String,
}

impl Default for ExportDialog {
    fn default() -> Self {
        Self::new()
    }
}

impl ExportDialog {
    pub fn new() -> Self {
        let mut list_state = ListState::default();
        list_state.select(Some(0));
        Self {
            selected_index: 0,
            list_state,
            source: ExportSource::LiveGrid,
            export_dir: String::new(),
        }
    }

    pub fn open(&mut self, source: ExportSource, export_dir: String) {
        self.source = source;
        self.export_dir = export_dir;
        self.selected_index = 0;
        self.list_state.select(Some(0));
    }

    pub fn selected_kind(&self) -> ExportKind {
        ExportKind::all()[self.selected_index.min(ExportKind::all().len() - 1)]
    }

    fn describe(kind: ExportKind) -> &'static str {
        match kind {
            ExportKind::DownloadPdf => "Save a landscape PDF",
            ExportKind::Print => "Send the PDF to the printer",
            ExportKind::Email => "Save the PDF and open a new email",
            ExportKind::DownloadCsv => "Save the rows as CSV",
        }
    }
}

impl Component for ExportDialog {
    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        let action = match key.code {
            KeyCode::Esc | KeyCode::Char('e') | KeyCode::Char('q') => Some(Action::CloseModal),
            KeyCode::Enter => Some(Action::Export(self.selected_kind())),
            KeyCode::Char(c @ '1'..='4') => {
                let index = c as usize - '1' as usize;
                Some(Action::Export(ExportKind::all()[index]))
            }
            KeyCode::Up | KeyCode::Char('k') => Some(Action::ModalUp),
            KeyCode::Down | KeyCode::Char('j') => Some(Action::ModalDown),
            _ => None,
        };
        Ok(action)
    }

    fn update(&mut self, action: Action) -> Result<Option<Action>> {
        match action {
            Action::ModalUp => {
                self.selected_index = self.selected_index.saturating_sub(1);
            }
            Action::ModalDown => {
                self.selected_index = (self.selected_index + 1).min(ExportKind::all().len() - 1);
            }
            _ => {}
        }
        self.list_state.select(Some(self.selected_index));
        Ok(None)
    }

    fn draw(&mut self, frame: &mut Frame, area: Rect) -> Result<()> {
        let popup_area = centered_popup(area, 56, 13);
        frame.render_widget(Clear, popup_area);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(3), Constraint::Length(3)])
            .split(popup_area);

        let items: Vec<ListItem> = ExportKind::all()
            .iter()
            .enumerate()
            .map(|(i, kind)| {
                ListItem::new(Line::from(vec![
                    Span::styled(
                        format!("{} ", i + 1),
                        Style::default().fg(Color::Yellow),
                    ),
                    Span::styled(
                        format!("{:<14}", kind.label()),
                        Style::default().add_modifier(Modifier::BOLD),
                    ),
                    Span::styled(Self::describe(*kind), Style::default().fg(Color::DarkGray)),
                ]))
            })
            .collect();

        let title = match self.source {
            ExportSource::LiveGrid => " Export Table ".to_string(),
            ExportSource::History { conversation, exchange } => {
                format!(" Export Saved Table ({}.{}) ", conversation + 1, exchange + 1)
            }
        };

        let list = List::new(items)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(title)
                    .title_bottom(Line::from(format!(" → {} ", self.export_dir)))
                    .title_style(
                        Style::default()
                            .fg(Color::Magenta)
                            .add_modifier(Modifier::BOLD),
                    ),
            )
            .highlight_style(
                Style::default()
                    .bg(Color::Blue)
                    .fg(Color::White)
                    .add_modifier(Modifier::BOLD),
            )
            .highlight_symbol("▶ ");

        frame.render_stateful_widget(list, chunks[0], &mut self.list_state);

        let help = Paragraph::new(Line::from(vec![
            Span::styled(" Enter/1-4 ", Style::default().fg(Color::Yellow)),
            Span::raw("Export  "),
            Span::styled(" Esc ", Style::default().fg(Color::Yellow)),
            Span::raw("Cancel"),
        ]))
        .alignment(ratatui::layout::Alignment::Center)
        .block(Block::default().borders(Borders::ALL));
        frame.render_widget(help, chunks[1]);

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyModifiers;

    #[test]
    fn test_selection_and_shortcuts() {
        let mut dialog = ExportDialog::new();
        dialog.update(Action::ModalDown).ok();
        dialog.update(Action::ModalDown).ok();
        let enter = KeyEvent::new(KeyCode::Enter, KeyModifiers::NONE);
        assert_eq!(
            dialog.handle_key_event(enter).ok().flatten(),
            Some(Action::Export(ExportKind::Email))
        );

        for _ in 0..10 {
            dialog.update(Action::ModalDown).ok();
        }
        assert_eq!(dialog.selected_kind(), ExportKind::DownloadCsv);

        let one = KeyEvent::new(KeyCode::Char('1'), KeyModifiers::NONE);
        assert_eq!(
            dialog.handle_key_event(one).ok().flatten(),
            Some(Action::Export(ExportKind::DownloadPdf))
        );
    }

    #[test]
    fn test_open_resets_selection() {
        let mut dialog = ExportDialog::new();
        dialog.update(Action::ModalDown).ok();
        dialog.open(
            ExportSource::History {
                conversation: 2,
                exchange: 0,
            },
            "/tmp".into(),
        );
        assert_eq!(dialog.selected_kind(), ExportKind::DownloadPdf);
        assert_eq!(dialog.export_dir, "/tmp");
    }
}
