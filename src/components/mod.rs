//! UI Components
//!
//! Panels and dialogs of the chat screen. Each one owns its state, maps keys
//! to Actions and draws itself.

pub mod auth_dialog;
pub mod chat;
pub mod export_dialog;
pub mod grid_view;
pub mod help_dialog;
pub mod history_dialog;
pub mod layout;
pub mod markdown;
pub mod queries_dialog;
pub mod quit_dialog;

pub use auth_dialog::AuthDialog;
pub use chat::{draw_chat_screen, ChatComponent, ChatRenderContext};
pub use export_dialog::ExportDialog;
pub use grid_view::GridView;
pub use help_dialog::HelpDialog;
pub use history_dialog::HistoryDialog;
pub use layout::{calculate_chat_layout, centered_popup};
pub use queries_dialog::QueriesDialog;
pub use quit_dialog::QuitDialog;
