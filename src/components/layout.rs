//! Layout calculations for the UI

use ratatui::layout::{Constraint, Direction, Layout, Rect};

/// Chat screen layout areas
pub struct ChatLayout {
    pub header: Rect,
    pub transcript: Rect,
    pub grid: Option<Rect>,
    pub input: Rect,
    pub status: Rect,
    pub help: Rect,
}

/// Calculate centered popup area
pub fn centered_popup(area: Rect, width: u16, height: u16) -> Rect {
    let popup_x = area.x + (area.width.saturating_sub(width)) / 2;
    let popup_y = area.y + (area.height.saturating_sub(height)) / 2;

    Rect::new(
        popup_x,
        popup_y,
        width.min(area.width),
        height.min(area.height),
    )
}

/// Calculate the chat screen layout
///
/// With a table on screen the body splits into transcript (40%) and
/// grid (60%), side by side on wide terminals and stacked otherwise.
pub fn calculate_chat_layout(area: Rect, show_grid: bool) -> ChatLayout {
    // header + body + input + status + help bar
    let main_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(0),
            Constraint::Length(3),
            Constraint::Length(1),
            Constraint::Length(3),
        ])
        .split(area);

    let body = main_chunks[1];
    let (transcript, grid) = if show_grid {
        let direction = if body.width >= 120 {
            Direction::Horizontal
        } else {
            Direction::Vertical
        };
        let chunks = Layout::default()
            .direction(direction)
            .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
            .split(body);
        (chunks[0], Some(chunks[1]))
    } else {
        (body, None)
    };

    ChatLayout {
        header: main_chunks[0],
        transcript,
        grid,
        input: main_chunks[2],
        status: main_chunks[3],
        help: main_chunks[4],
    }
}
