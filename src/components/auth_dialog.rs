//! Sign-in dialog component
//!
//! Shows the backend's authentication state and walks through the device
//! code flow: start, open the verification page, enter the code, refresh.

use crate::action::Action;
use crate::component::Component;
use crate::services::api::{AuthStatus, DeviceCode};
use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

/// Sign-in dialog component
#[derive(Default)]
pub struct AuthDialog {
    pub status: Option<AuthStatus>,
    pub device_code: Option<DeviceCode>,
    /// A status check or start request is running
    pub waiting: bool,
    pub error: Option<String>,
}

impl AuthDialog {
    pub fn set_status(&mut self, status: AuthStatus) {
        if status.authenticated {
            self.device_code = None;
        }
        self.status = Some(status);
        self.waiting = false;
        self.error = None;
    }

    pub fn set_device_code(&mut self, code: DeviceCode) {
        self.device_code = Some(code);
        self.waiting = false;
        self.error = None;
    }

    pub fn set_error(&mut self, message: String) {
        self.error = Some(message);
        self.waiting = false;
    }

    pub fn verification_uri(&self) -> Option<&str> {
        self.device_code.as_ref()?.verification_uri.as_deref()
    }

    fn build_content(&self) -> Vec<Line<'static>> {
        let label = |text: &str| {
            Span::styled(
                format!("{:<14}", text),
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            )
        };

        let mut lines = vec![Line::from("")];

        let (state, color) = match &self.status {
            Some(s) if s.authenticated => ("Signed in", Color::Green),
            Some(s) if s.auth_in_progress => ("Sign-in in progress", Color::Yellow),
            Some(_) => ("Not signed in", Color::Red),
            None => ("Unknown", Color::DarkGray),
        };
        lines.push(Line::from(vec![
            label("Status:"),
            Span::styled(state, Style::default().fg(color).add_modifier(Modifier::BOLD)),
        ]));

        if let Some(code) = &self.device_code {
            lines.push(Line::from(""));
            lines.push(Line::from(vec![
                label("Code:"),
                Span::styled(
                    code.device_code.clone().unwrap_or_else(|| "(pending)".to_string()),
                    Style::default()
                        .fg(Color::Yellow)
                        .add_modifier(Modifier::BOLD),
                ),
            ]));
            lines.push(Line::from(vec![
                label("Visit:"),
                Span::raw(
                    code.verification_uri
                        .clone()
                        .unwrap_or_else(|| "(pending)".to_string()),
                ),
            ]));
            if let Some(secs) = code.expires_in {
                lines.push(Line::from(vec![
                    label("Expires in:"),
                    Span::raw(format!("{} min", secs.div_ceil(60))),
                ]));
            }
            lines.push(Line::from(""));
            lines.push(Line::from(Span::styled(
                "Open the page, enter the code, then press r to refresh.",
                Style::default().fg(Color::DarkGray),
            )));
        }

        if self.waiting {
            lines.push(Line::from(""));
            lines.push(Line::from(Span::styled(
                "Contacting the server...",
                Style::default()
                    .fg(Color::DarkGray)
                    .add_modifier(Modifier::ITALIC),
            )));
        }

        if let Some(error) = &self.error {
            lines.push(Line::from(""));
            lines.push(Line::from(Span::styled(
                format!("Error: {}", error),
                Style::default().fg(Color::Red),
            )));
        }

        lines
    }
}

impl Component for AuthDialog {
    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        let action = match key.code {
            KeyCode::Char('r') => Some(Action::RefreshAuthStatus),
            KeyCode::Char('l') | KeyCode::Enter => Some(Action::StartAuth),
            KeyCode::Char('o') => Some(Action::OpenVerificationLink),
            KeyCode::Char('a') | KeyCode::Char('q') | KeyCode::Esc => Some(Action::CloseModal),
            _ => None,
        };
        Ok(action)
    }

    fn draw(&mut self, frame: &mut Frame, area: Rect) -> Result<()> {
        // Clear the entire screen and fill with terminal default background
        frame.render_widget(Clear, area);
        let background = Block::default().style(Style::default().bg(Color::Reset));
        frame.render_widget(background, area);

        let margin = 2;
        let overlay_area = Rect::new(
            margin,
            margin,
            area.width.saturating_sub(margin * 2),
            area.height.saturating_sub(margin * 2),
        );

        let main_chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(1), Constraint::Length(3)])
            .split(overlay_area);

        let paragraph = Paragraph::new(self.build_content())
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(Color::Cyan))
                    .title(" Sign In ")
                    .title_style(
                        Style::default()
                            .fg(Color::Cyan)
                            .add_modifier(Modifier::BOLD),
                    ),
            )
            .wrap(Wrap { trim: false });

        frame.render_widget(paragraph, main_chunks[0]);

        let key = |k: &str, color: Color| {
            Span::styled(
                format!(" {} ", k),
                Style::default().fg(color).add_modifier(Modifier::BOLD),
            )
        };
        let help = Paragraph::new(Line::from(vec![
            key("Esc", Color::Yellow),
            Span::raw("Close  "),
            key("l/Enter", Color::Green),
            Span::raw("Start sign-in  "),
            key("o", Color::Cyan),
            Span::raw("Open page  "),
            key("r", Color::Cyan),
            Span::raw("Refresh"),
        ]))
        .alignment(ratatui::layout::Alignment::Left)
        .block(Block::default().borders(Borders::ALL));

        frame.render_widget(help, main_chunks[1]);

        Ok(())
    }
}
