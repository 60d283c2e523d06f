//! Help dialog component
//!
//! Keyboard reference for the chat, table and dialogs.

use crate::action::Action;
use crate::component::Component;
use crate::components::centered_popup;
use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    layout::{Margin, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Scrollbar, ScrollbarOrientation, ScrollbarState},
    Frame,
};

type Shortcut = (&'static str, &'static str);

const SECTIONS: &[(&str, &[Shortcut])] = &[
    (
        "Prompt",
        &[
            ("Enter", "Send the question"),
            ("Tab / Esc", "Move focus to the chat"),
            ("Ctrl+n", "Start a new chat"),
            ("Ctrl+c", "Quit immediately"),
        ],
    ),
    (
        "Chat",
        &[
            ("j / k", "Scroll"),
            ("Ctrl+d / u", "Scroll a page"),
            ("[ / ]", "Previous / next table"),
            ("1 2 3", "Use a sample question"),
            ("i / Enter", "Back to the prompt"),
            ("n", "Start a new chat"),
            ("Tab", "Focus the table"),
        ],
    ),
    (
        "Table",
        &[
            ("h / l", "Previous / next column"),
            ("s", "Sort: ascending, descending, off"),
            ("/", "Quick filter"),
            ("x / X", "Hide column / show all"),
            ("j / k", "Scroll rows"),
        ],
    ),
    (
        "Export",
        &[
            ("e", "Export the table on screen"),
            ("1-4", "PDF, print, email, CSV"),
            ("", "Exports keep the sort, filter and hidden columns"),
        ],
    ),
    (
        "History",
        &[
            ("h", "Open history"),
            ("/", "Search prompts and answers"),
            ("Enter", "Continue a conversation"),
            ("[ / ]", "Pick the message to export"),
            ("e / d", "Export / delete"),
        ],
    ),
    (
        "Other dialogs",
        &[
            ("s", "Saved queries"),
            ("a", "Sign-in: l start, o open page, r refresh"),
            ("?", "This help"),
            ("q / Esc", "Close dialog, or quit from the chat"),
        ],
    ),
];

/// Help dialog showing all keyboard shortcuts
#[derive(Default)]
pub struct HelpDialog {
    pub scroll_offset: usize,
}

impl Component for HelpDialog {
    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        let step: isize = match key.code {
            KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('?') => {
                return Ok(Some(Action::CloseModal))
            }
            KeyCode::Char('j') | KeyCode::Down => 1,
            KeyCode::Char('k') | KeyCode::Up => -1,
            KeyCode::PageDown => 10,
            KeyCode::PageUp => -10,
            _ => 0,
        };
        self.scroll_offset = self.scroll_offset.saturating_add_signed(step);
        Ok(None)
    }

    fn draw(&mut self, frame: &mut Frame, area: Rect) -> Result<()> {
        let lines = help_lines();
        let total = lines.len();

        let popup = centered_popup(area, 64, (total as u16).saturating_add(2));
        frame.render_widget(Clear, popup);

        let visible = popup.height.saturating_sub(2) as usize;
        let max_scroll = total.saturating_sub(visible);
        self.scroll_offset = self.scroll_offset.min(max_scroll);

        let paragraph = Paragraph::new(lines)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(Color::Cyan))
                    .title(" Keys ")
                    .title_bottom(Line::from(" q / Esc close ").right_aligned())
                    .title_style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)),
            )
            .scroll((self.scroll_offset as u16, 0));
        frame.render_widget(paragraph, popup);

        if max_scroll > 0 {
            let mut state = ScrollbarState::new(max_scroll).position(self.scroll_offset);
            frame.render_stateful_widget(
                Scrollbar::new(ScrollbarOrientation::VerticalRight),
                popup.inner(Margin {
                    vertical: 1,
                    horizontal: 0,
                }),
                &mut state,
            );
        }

        Ok(())
    }
}

fn help_lines() -> Vec<Line<'static>> {
    let heading = Style::default()
        .fg(Color::Yellow)
        .add_modifier(Modifier::BOLD);
    let key = Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD);

    let mut lines = Vec::new();
    for (i, (title, shortcuts)) in SECTIONS.iter().enumerate() {
        if i > 0 {
            lines.push(Line::from(""));
        }
        lines.push(Line::from(Span::styled(format!(" {}", title), heading)));
        for (keys, description) in shortcuts.iter() {
            lines.push(Line::from(vec![
                Span::styled(format!("   {:<12}", keys), key),
                Span::raw(*description),
            ]));
        }
    }
    lines
}
