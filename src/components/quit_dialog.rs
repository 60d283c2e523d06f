//! Quit confirmation dialog component

use crate::action::Action;
use crate::component::Component;
use crate::components::centered_popup;
use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

/// Quit confirmation dialog
#[derive(Default)]
pub struct QuitDialog {
    /// A question is still waiting for its answer
    pub request_in_flight: bool,
}

impl QuitDialog {
    fn build_content(&self) -> Vec<Line<'static>> {
        let mut content = vec![
            Line::from(""),
            Line::from(Span::styled(
                "Leave the data agent?",
                Style::default()
                    .fg(Color::White)
                    .add_modifier(Modifier::BOLD),
            )),
        ];

        if self.request_in_flight {
            content.push(Line::from(Span::styled(
                "The pending answer will be lost.",
                Style::default().fg(Color::Red),
            )));
        } else {
            content.push(Line::from(Span::styled(
                "Conversations stay in history.",
                Style::default().fg(Color::DarkGray),
            )));
        }

        content.push(Line::from(""));
        content.push(Line::from(vec![
            Span::styled(
                " y ",
                Style::default()
                    .fg(Color::Green)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::raw("Yes, quit  "),
            Span::styled(
                " n/Esc ",
                Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
            ),
            Span::raw("No, stay"),
        ]));
        content
    }
}

impl Component for QuitDialog {
    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        let action = match key.code {
            KeyCode::Char('y') | KeyCode::Char('Y') => Some(Action::ForceQuit),
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc | KeyCode::Char('q') => {
                Some(Action::CloseModal)
            }
            _ => None,
        };
        Ok(action)
    }

    fn draw(&mut self, frame: &mut Frame, area: Rect) -> Result<()> {
        let popup_area = centered_popup(area, 44, 8);

        frame.render_widget(Clear, popup_area);

        let paragraph = Paragraph::new(self.build_content())
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(Color::Yellow))
                    .title(" Quit? ")
                    .title_style(
                        Style::default()
                            .fg(Color::Yellow)
                            .add_modifier(Modifier::BOLD),
                    ),
            )
            .alignment(ratatui::layout::Alignment::Center);

        frame.render_widget(paragraph, popup_area);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyModifiers;

    #[test]
    fn test_confirm_and_cancel() {
        let mut dialog = QuitDialog::default();
        let yes = KeyEvent::new(KeyCode::Char('y'), KeyModifiers::NONE);
        let esc = KeyEvent::new(KeyCode::Esc, KeyModifiers::NONE);
        assert_eq!(dialog.handle_key_event(yes).ok().flatten(), Some(Action::ForceQuit));
        assert_eq!(dialog.handle_key_event(esc).ok().flatten(), Some(Action::CloseModal));
    }

    #[test]
    fn test_warns_about_pending_request() {
        let dialog = QuitDialog {
            request_in_flight: true,
        };
        let text: String = dialog
            .build_content()
            .iter()
            .flat_map(|l| l.spans.iter().map(|s| s.content.to_string()))
            .collect();
        assert!(text.contains("pending answer"));
    }
}
