//! Component trait - Interface for UI components
//!
//! Each panel and dialog keeps its own state, turns keys into Actions and
//! draws itself. State changes only happen in `update`.

use crate::action::Action;
use anyhow::Result;
use crossterm::event::KeyEvent;
use ratatui::{layout::Rect, Frame};

/// Trait for UI components
///
/// The cycle is:
/// 1. `handle_key_event` - map a key to an Action
/// 2. `update` - apply the Action, optionally returning a follow-up
/// 3. `draw` - render into `area`
pub trait Component {
    /// Called once before the first frame
    fn init(&mut self) -> Result<()> {
        Ok(())
    }

    /// Map a key to an Action without changing state
    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        let _ = key;
        Ok(None)
    }

    /// Apply an Action
    ///
    /// A returned Action is fed back into the root `update` by the main loop.
    fn update(&mut self, action: Action) -> Result<Option<Action>> {
        let _ = action;
        Ok(None)
    }

    fn draw(&mut self, frame: &mut Frame, area: Rect) -> Result<()>;
}
