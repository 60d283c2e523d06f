//! Chat component - Main application screen
//!
//! Prompt input, transcript and the grid panel for the selected response.
//! Conversation data lives in `ConversationStore`; this component only owns
//! presentation state (input buffer, focus, scroll, selected response).

use crate::action::Action;
use crate::component::Component;
use crate::components::markdown::render_markdown;
use crate::components::{calculate_chat_layout, GridView};
use crate::model::conversation::Exchange;
use crate::model::ui::{Focus, DISCLAIMER_BODY, DISCLAIMER_TITLE, SAMPLE_PROMPTS};
use crate::services::table_extractor::extract_grid;
use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};
use unicode_width::UnicodeWidthStr;

// ═══════════════════════════════════════════════════════════════════════════════
// Chat Component
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Default)]
pub struct ChatComponent {
    /// Prompt being typed
    pub input: String,

    pub focus: Focus,

    /// Transcript scroll offset in rendered rows
    pub scroll: u16,

    /// Keep the transcript pinned to the newest message
    pub follow: bool,

    /// Exchange whose table is shown in the grid panel
    pub selected: Option<usize>,
}

impl ChatComponent {
    pub fn new() -> Self {
        Self {
            follow: true,
            ..Self::default()
        }
    }

    /// Take the prompt out of the input box
    pub fn take_input(&mut self) -> String {
        std::mem::take(&mut self.input)
    }

    /// Reset view state for a different transcript
    pub fn reset(&mut self) {
        self.scroll = 0;
        self.follow = true;
        self.selected = None;
        self.focus = Focus::Input;
    }

    pub fn use_sample_prompt(&mut self, index: usize) -> bool {
        match SAMPLE_PROMPTS.get(index) {
            Some(sample) => {
                self.input = sample.full.to_string();
                self.focus = Focus::Input;
                true
            }
            None => false,
        }
    }

    /// Select the newest exchange that carries a table
    pub fn select_latest_table(&mut self, transcript: &[Exchange]) {
        self.selected = transcript
            .iter()
            .rposition(|e| extract_grid(&e.response).has_rows());
    }

    /// Move the selection to the previous (`forward == false`) or next
    /// exchange with a table
    pub fn step_selection(&mut self, transcript: &[Exchange], forward: bool) -> bool {
        let with_tables: Vec<usize> = transcript
            .iter()
            .enumerate()
            .filter(|(_, e)| extract_grid(&e.response).has_rows())
            .map(|(i, _)| i)
            .collect();

        let next = match self.selected {
            None => with_tables.last().copied(),
            Some(current) if forward => with_tables.iter().copied().find(|&i| i > current),
            Some(current) => with_tables.iter().rev().copied().find(|&i| i < current),
        };

        match next {
            Some(index) if Some(index) != self.selected => {
                self.selected = Some(index);
                true
            }
            _ => false,
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Component Implementation
// ═══════════════════════════════════════════════════════════════════════════════

impl Component for ChatComponent {
    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        if self.focus == Focus::Input {
            let action = match key.code {
                KeyCode::Enter => Some(Action::SubmitPrompt),
                KeyCode::Backspace => Some(Action::InputBackspace),
                KeyCode::Tab | KeyCode::Esc => Some(Action::FocusNext),
                KeyCode::Char('n') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                    Some(Action::NewChat)
                }
                KeyCode::Char(c) => Some(Action::InputChar(c)),
                _ => None,
            };
            return Ok(action);
        }

        let action = match key.code {
            // Scrolling
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

            // Table selection
            KeyCode::Char('[') => Some(Action::PrevResponse),
            KeyCode::Char(']') => Some(Action::NextResponse),

            // Sample prompts
            KeyCode::Char(c @ '1'..='3') => {
                Some(Action::UseSamplePrompt(c as usize - '1' as usize))
            }

            // Modals
            KeyCode::Char('q') => Some(Action::OpenQuitDialog),
            KeyCode::Char('e') => Some(Action::OpenExportMenu),
            KeyCode::Char('h') => Some(Action::OpenHistory),
            KeyCode::Char('s') => Some(Action::OpenSavedQueries),
            KeyCode::Char('a') => Some(Action::OpenAuth),
            KeyCode::Char('?') => Some(Action::OpenHelp),

            KeyCode::Char('n') => Some(Action::NewChat),
            KeyCode::Char('i') | KeyCode::Enter | KeyCode::Esc => Some(Action::FocusInput),
            KeyCode::Tab => Some(Action::FocusNext),
            _ => None,
        };
        Ok(action)
    }

    fn update(&mut self, action: Action) -> Result<Option<Action>> {
        match action {
            Action::InputChar(c) => self.input.push(c),
            Action::InputBackspace => {
                self.input.pop();
            }
            Action::FocusInput => self.focus = Focus::Input,
            Action::ScrollDown => self.scroll = self.scroll.saturating_add(1),
            Action::ScrollUp => {
                self.follow = false;
                self.scroll = self.scroll.saturating_sub(1);
            }
            Action::PageDown => self.scroll = self.scroll.saturating_add(10),
            Action::PageUp => {
                self.follow = false;
                self.scroll = self.scroll.saturating_sub(10);
            }
            _ => {}
        }
        Ok(None)
    }

    fn draw(&mut self, _frame: &mut Frame, _area: Rect) -> Result<()> {
        // Drawing is done through draw_chat_screen which takes full context
        Ok(())
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Rendering Functions
// ═══════════════════════════════════════════════════════════════════════════════

/// Context needed for rendering the chat screen
pub struct ChatRenderContext<'a> {
    pub transcript: &'a [Exchange],
    pub pending_prompt: Option<&'a str>,
    pub loading_message: Option<&'a str>,
    pub error: Option<&'a str>,
    pub status_message: Option<&'a str>,
    /// Failure of a local operation, shown in red
    pub alert: Option<&'a str>,
    pub api_url: &'a str,
    /// None until the first status check returns
    pub authenticated: Option<bool>,
    /// Set when the transcript is a conversation opened from history
    pub conversation_title: Option<&'a str>,
}

/// Draw the chat screen
pub fn draw_chat_screen(
    frame: &mut Frame,
    area: Rect,
    chat: &mut ChatComponent,
    grid: &mut GridView,
    ctx: &ChatRenderContext,
) -> Result<()> {
    let show_grid = chat.selected.is_some() && grid.has_rows();
    let layout = calculate_chat_layout(area, show_grid);

    render_header(frame, layout.header, ctx);
    render_transcript(frame, layout.transcript, chat, ctx);

    if let Some(grid_area) = layout.grid {
        grid.focused = chat.focus == Focus::Grid;
        grid.draw(frame, grid_area)?;
    }

    render_input(frame, layout.input, chat, ctx);
    render_status_bar(frame, layout.status, chat, ctx);
    render_help_bar(frame, layout.help, chat, grid, ctx);

    Ok(())
}

fn render_header(frame: &mut Frame, area: Rect, ctx: &ChatRenderContext) {
    let mut spans = vec![Span::styled(
        " LW AI Data Agent ",
        Style::default()
            .fg(Color::Black)
            .bg(Color::Cyan)
            .add_modifier(Modifier::BOLD),
    )];
    if let Some(title) = ctx.conversation_title {
        spans.push(Span::styled(
            format!(" {}", title),
            Style::default().fg(Color::DarkGray),
        ));
    }
    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

/// Transcript lines: bubbles, disclaimer, loading indicator
pub fn build_transcript_lines(
    chat: &ChatComponent,
    ctx: &ChatRenderContext,
) -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    if ctx.transcript.is_empty() && ctx.pending_prompt.is_none() {
        lines.extend(build_landing_lines());
    }

    for (index, exchange) in ctx.transcript.iter().enumerate() {
        lines.push(Line::from(vec![
            Span::styled(
                "You",
                Style::default()
                    .fg(Color::Green)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                format!("  {}", exchange.formatted_time()),
                Style::default().fg(Color::DarkGray),
            ),
        ]));
        for line in exchange.prompt.lines() {
            lines.push(Line::from(Span::styled(
                line.to_string(),
                Style::default().fg(Color::Green),
            )));
        }
        lines.push(Line::from(""));

        if index == 0 {
            lines.extend(disclaimer_lines());
        }

        lines.push(Line::from(Span::styled(
            "Assistant",
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )));
        lines.extend(render_markdown(&exchange.response.prose()));

        let grid = extract_grid(&exchange.response);
        if grid.has_rows() {
            let marker = format!(
                "▦ Table: {} rows × {} columns",
                grid.rows.len(),
                grid.columns.len()
            );
            let style = if chat.selected == Some(index) {
                Style::default()
                    .fg(Color::Black)
                    .bg(Color::Yellow)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::Yellow)
            };
            lines.push(Line::from(Span::styled(marker, style)));
        }
        lines.push(Line::from(""));
    }

    if let Some(prompt) = ctx.pending_prompt {
        lines.push(Line::from(Span::styled(
            "You",
            Style::default()
                .fg(Color::Green)
                .add_modifier(Modifier::BOLD),
        )));
        for line in prompt.lines() {
            lines.push(Line::from(Span::styled(
                line.to_string(),
                Style::default().fg(Color::Green),
            )));
        }
        lines.push(Line::from(""));
        if let Some(message) = ctx.loading_message {
            lines.push(Line::from(Span::styled(
                format!("⠿ {}", message),
                Style::default()
                    .fg(Color::DarkGray)
                    .add_modifier(Modifier::ITALIC),
            )));
        }
    }

    if let Some(error) = ctx.error {
        lines.push(Line::from(Span::styled(
            format!("Error: {}", error),
            Style::default().fg(Color::Red),
        )));
    }

    lines
}

fn disclaimer_lines() -> Vec<Line<'static>> {
    vec![
        Line::from(vec![
            Span::styled("ⓘ ", Style::default().fg(Color::Blue)),
            Span::styled(
                DISCLAIMER_TITLE,
                Style::default()
                    .fg(Color::Blue)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(format!(" {}", DISCLAIMER_BODY), Style::default().fg(Color::Blue)),
        ]),
        Line::from(""),
    ]
}

fn build_landing_lines() -> Vec<Line<'static>> {
    let mut lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            "How can I help you today?",
            Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
    ];
    for (i, sample) in SAMPLE_PROMPTS.iter().enumerate() {
        lines.push(Line::from(vec![
            Span::styled(
                format!(" {} ", i + 1),
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::raw(sample.short),
        ]));
    }
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "Press Tab then 1-3 to use a sample question, or type your own below.",
        Style::default().fg(Color::DarkGray),
    )));
    lines
}

/// Rows the lines take once wrapped to `width`
fn wrapped_height(lines: &[Line], width: u16) -> u16 {
    let width = width.max(1) as usize;
    let rows: usize = lines
        .iter()
        .map(|line| {
            let w: usize = line.spans.iter().map(|s| s.content.width()).sum();
            w.max(1).div_ceil(width)
        })
        .sum();
    rows.min(u16::MAX as usize) as u16
}

fn render_transcript(
    frame: &mut Frame,
    area: Rect,
    chat: &mut ChatComponent,
    ctx: &ChatRenderContext,
) {
    let lines = build_transcript_lines(chat, ctx);
    let inner_height = area.height.saturating_sub(2);
    let max_scroll = wrapped_height(&lines, area.width.saturating_sub(2)).saturating_sub(inner_height);

    if chat.follow || chat.scroll >= max_scroll {
        chat.follow = true;
        chat.scroll = max_scroll;
    }

    let border = if chat.focus == Focus::Transcript {
        Color::Cyan
    } else {
        Color::DarkGray
    };

    let paragraph = Paragraph::new(lines)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" Chat ")
                .border_style(Style::default().fg(border)),
        )
        .wrap(Wrap { trim: false })
        .scroll((chat.scroll, 0));

    frame.render_widget(paragraph, area);
}

fn render_input(frame: &mut Frame, area: Rect, chat: &ChatComponent, ctx: &ChatRenderContext) {
    let focused = chat.focus == Focus::Input;
    let busy = ctx.pending_prompt.is_some();

    let (title, border) = if busy {
        (" Waiting for the data agent... ", Color::DarkGray)
    } else if focused {
        (" Ask ", Color::Cyan)
    } else {
        (" Ask ", Color::DarkGray)
    };

    let content = if chat.input.is_empty() && !focused {
        let placeholder = if ctx.transcript.is_empty() {
            "Ask your Assistant anything..."
        } else {
            "Ask a follow up question..."
        };
        Line::from(Span::styled(placeholder, Style::default().fg(Color::DarkGray)))
    } else {
        let cursor = if focused { "_" } else { "" };
        Line::from(vec![
            Span::styled("> ", Style::default().fg(Color::Cyan)),
            Span::raw(format!("{}{}", chat.input, cursor)),
        ])
    };

    // Keep the end of long prompts visible
    let visible = area.width.saturating_sub(4) as usize;
    let overflow = (chat.input.width() + 3).saturating_sub(visible);

    let paragraph = Paragraph::new(content)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(title)
                .border_style(Style::default().fg(border)),
        )
        .scroll((0, overflow.min(u16::MAX as usize) as u16));

    frame.render_widget(paragraph, area);
}

fn render_status_bar(frame: &mut Frame, area: Rect, chat: &ChatComponent, ctx: &ChatRenderContext) {
    let mut spans = vec![
        Span::styled(
            format!(" {} ", chat.focus.name()),
            Style::default()
                .fg(Color::Black)
                .bg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw(" "),
    ];

    let (auth_label, auth_color) = match ctx.authenticated {
        Some(true) => (" Signed in ", Color::Green),
        Some(false) => (" Not signed in ", Color::Yellow),
        None => (" Auth unknown ", Color::DarkGray),
    };
    spans.push(Span::styled(
        auth_label,
        Style::default()
            .fg(Color::Black)
            .bg(auth_color)
            .add_modifier(Modifier::BOLD),
    ));
    spans.push(Span::styled(
        format!(" {}", ctx.api_url),
        Style::default().fg(Color::DarkGray),
    ));

    if let Some(status) = ctx.status_message {
        spans.push(Span::styled(
            format!("  {} ", status),
            Style::default().fg(Color::Yellow),
        ));
    }
    if let Some(alert) = ctx.alert {
        spans.push(Span::styled(
            format!("  {} ", alert),
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        ));
    }

    let paragraph = Paragraph::new(Line::from(spans));
    frame.render_widget(paragraph, area);
}

fn key_span(key: &str, color: Color) -> Span<'static> {
    Span::styled(
        format!(" {} ", key),
        Style::default().fg(color).add_modifier(Modifier::BOLD),
    )
}

fn render_help_bar(
    frame: &mut Frame,
    area: Rect,
    chat: &ChatComponent,
    grid: &GridView,
    ctx: &ChatRenderContext,
) {
    let help_spans = match chat.focus {
        Focus::Input => vec![
            key_span("Enter", Color::Green),
            Span::raw("Send "),
            key_span("Tab", Color::Cyan),
            Span::raw("Chat "),
            key_span("Ctrl+N", Color::Cyan),
            Span::raw("New chat "),
            key_span("Ctrl+C", Color::Yellow),
            Span::raw("Quit"),
        ],
        Focus::Grid if grid.filter_mode => vec![
            key_span("Esc", Color::Yellow),
            Span::raw("Done  "),
            Span::styled(
                format!("Filter: {}", grid.filter()),
                Style::default().fg(Color::Cyan),
            ),
        ],
        Focus::Grid => vec![
            key_span("←/→", Color::Cyan),
            Span::raw("Column "),
            key_span("s", Color::Green),
            Span::raw("Sort "),
            key_span("/", Color::Cyan),
            Span::raw("Filter "),
            key_span("x", Color::Cyan),
            Span::raw("Hide "),
            key_span("X", Color::Cyan),
            Span::raw("Show all "),
            key_span("e", Color::Magenta),
            Span::raw("Export "),
            key_span("Esc", Color::Yellow),
            Span::raw("Back"),
        ],
        Focus::Transcript => {
            let mut spans = vec![key_span("q", Color::Yellow), Span::raw("Quit ")];
            if ctx.transcript.is_empty() {
                spans.push(key_span("1-3", Color::Green));
                spans.push(Span::raw("Sample "));
            } else {
                spans.push(key_span("[ ]", Color::Cyan));
                spans.push(Span::raw("Table "));
                spans.push(key_span("e", Color::Magenta));
                spans.push(Span::raw("Export "));
            }
            spans.extend([
                key_span("i", Color::Green),
                Span::raw("Ask "),
                key_span("n", Color::Cyan),
                Span::raw("New "),
                key_span("h", Color::Magenta),
                Span::raw("History "),
                key_span("s", Color::Cyan),
                Span::raw("Queries "),
                key_span("a", Color::Blue),
                Span::raw("Auth "),
                key_span("?", Color::White),
                Span::raw("Help"),
            ]);
            spans
        }
    };

    let paragraph = Paragraph::new(Line::from(help_spans))
        .alignment(ratatui::layout::Alignment::Left)
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(paragraph, area);
}
