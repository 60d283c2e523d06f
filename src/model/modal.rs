//! Modal stack for managing overlays
//!
//! An enum-based stack: only the top modal receives input, modals render
//! bottom to top.

/// Where an export takes its table from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportSource {
    /// The grid on screen, with its current sort, filter and hidden columns
    LiveGrid,
    /// A saved exchange, exported from its static grid model
    History {
        conversation: usize,
        exchange: usize,
    },
}

/// Represents a modal overlay that can be displayed on top of the main UI
#[derive(Debug, Clone, PartialEq)]
pub enum Modal {
    /// Quit confirmation dialog
    QuitConfirm,
    /// Export format menu
    Export { source: ExportSource },
    /// Conversation history browser
    History,
    /// Predefined backend queries
    SavedQueries,
    /// Authentication status and device code
    Auth,
    /// Help dialog showing all keyboard shortcuts
    Help,
}

/// A stack of modal overlays
#[derive(Debug, Default)]
pub struct ModalStack {
    stack: Vec<Modal>,
}

impl ModalStack {
    pub fn new() -> Self {
        Self { stack: Vec::new() }
    }

    pub fn push(&mut self, modal: Modal) {
        self.stack.push(modal);
    }

    pub fn pop(&mut self) -> Option<Modal> {
        self.stack.pop()
    }

    pub fn top(&self) -> Option<&Modal> {
        self.stack.last()
    }

    pub fn is_empty(&self) -> bool {
        self.stack.is_empty()
    }

    /// Push `modal`, or pop it if it is already on top
    pub fn toggle(&mut self, modal: Modal) {
        if self.top() == Some(&modal) {
            self.pop();
        } else {
            self.push(modal);
        }
    }
}
