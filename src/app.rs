//! Root application component
//!
//! The App struct implements the Component trait, acting as the root component
//! that delegates event handling and rendering to child components.
//! It owns the conversation store, the background request runner and the
//! export launcher, and routes Actions between them.

use crate::action::{Action, ExportKind};
use crate::component::Component;
use crate::components::{
    draw_chat_screen, AuthDialog, ChatComponent, ChatRenderContext, ExportDialog, GridView,
    HelpDialog, HistoryDialog, QueriesDialog, QuitDialog,
};
use crate::config::Config;
use crate::model::conversation::{ConversationStore, SubmitRejected};
use crate::model::grid::GridModel;
use crate::model::modal::{ExportSource, Modal, ModalStack};
use crate::model::ui::{loading_message, Focus};
use crate::services::api::{ApiClient, ApiError};
use crate::services::export::{self, ExportError, Launcher, SystemLauncher};
use crate::services::export_formatter::format_export;
use crate::services::request_runner::{JobMessage, RequestRunner};
use crate::services::table_extractor::extract_grid;
use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{layout::Rect, Frame};
use std::time::Instant;

// ═══════════════════════════════════════════════════════════════════════════════
// App Struct
// ═══════════════════════════════════════════════════════════════════════════════

/// Main application state - coordinates between components
pub struct App {
    pub config: Config,

    /// Transcript, saved conversations and the in-flight prompt
    pub store: ConversationStore,

    /// Background API requests
    pub runner: RequestRunner,

    /// Opens links and prints files
    pub launcher: Box<dyn Launcher>,

    /// Modal overlay stack
    pub modals: ModalStack,

    /// Flag to indicate the app should quit
    pub should_quit: bool,

    /// When the pending prompt was sent, for the loading message
    pub loading_since: Option<Instant>,

    /// Status message to display
    pub status_message: Option<String>,

    /// Failure of a local operation such as an export
    pub alert: Option<String>,

    // ─────────────────────────────────────────────────────────────────────────
    // Child Components
    // ─────────────────────────────────────────────────────────────────────────
    pub chat: ChatComponent,
    pub grid: GridView,
    pub quit_dialog: QuitDialog,
    pub export_dialog: ExportDialog,
    pub history_dialog: HistoryDialog,
    pub queries_dialog: QueriesDialog,
    pub auth_dialog: AuthDialog,
    pub help_dialog: HelpDialog,
}

// ═══════════════════════════════════════════════════════════════════════════════
// App Implementation
// ═══════════════════════════════════════════════════════════════════════════════

impl App {
    /// Create a new App instance
    pub fn new(config: Config, client: ApiClient) -> App {
        let store = match Config::history_path() {
            Some(path) if config.persist_history => {
                ConversationStore::with_persistence(path, config.history_limit)
            }
            _ => ConversationStore::new(config.history_limit),
        };
        let launcher = Box::new(SystemLauncher::new(config.print_command.clone()));

        App {
            store,
            runner: RequestRunner::new(client),
            launcher,
            modals: ModalStack::new(),
            should_quit: false,
            loading_since: None,
            status_message: None,
            alert: None,
            chat: ChatComponent::new(),
            grid: GridView::new(),
            quit_dialog: QuitDialog::default(),
            export_dialog: ExportDialog::new(),
            history_dialog: HistoryDialog::default(),
            queries_dialog: QueriesDialog::new(),
            auth_dialog: AuthDialog::default(),
            help_dialog: HelpDialog::default(),
            config,
        }
    }

    /// Replace the launcher used for printing and links
    pub fn with_launcher(mut self, launcher: Box<dyn Launcher>) -> App {
        self.launcher = launcher;
        self
    }

    fn has_grid(&self) -> bool {
        self.chat.selected.is_some() && self.grid.has_rows()
    }

    /// Load the selected exchange's table into the grid view
    fn sync_grid(&mut self) {
        let grid = self
            .chat
            .selected
            .and_then(|i| self.store.transcript().get(i))
            .map(|exchange| extract_grid(&exchange.response))
            .unwrap_or_default();
        self.grid.set_grid(grid);

        if self.chat.focus == Focus::Grid && !self.has_grid() {
            self.chat.focus = Focus::Input;
        }
    }

    fn clear_notices(&mut self) {
        self.status_message = None;
        self.alert = None;
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Requests
    // ─────────────────────────────────────────────────────────────────────────

    fn submit_prompt(&mut self) {
        match self.store.submit(&self.chat.input) {
            Ok(request) => {
                self.chat.take_input();
                self.chat.follow = true;
                self.clear_notices();
                self.loading_since = Some(Instant::now());
                tracing::info!(id = request.id, chars = request.prompt.len(), "prompt submitted");
                self.runner.ask(request.id, request.prompt);
            }
            Err(SubmitRejected::Blank) => {}
            Err(e @ SubmitRejected::InFlight) => {
                self.status_message = Some(e.to_string());
            }
        }
    }

    fn run_saved_query(&mut self) {
        let Some(query) = self.queries_dialog.selected_query().cloned() else {
            return;
        };
        let label = format!("Saved query: {}", query.name);
        match self.store.submit(&label) {
            Ok(request) => {
                self.modals.pop();
                self.chat.follow = true;
                self.clear_notices();
                self.loading_since = Some(Instant::now());
                tracing::info!(id = request.id, alias = %query.alias, "saved query submitted");
                self.runner.run_query(request.id, query.alias);
            }
            Err(e) => {
                self.status_message = Some(e.to_string());
            }
        }
    }

    /// Apply a finished background request
    pub fn handle_job_message(&mut self, message: JobMessage) {
        match message {
            JobMessage::Answer { id, result } => {
                if self.store.pending_id() != Some(id) {
                    tracing::debug!(id, "discarding answer for an abandoned request");
                    return;
                }
                self.loading_since = None;

                let auth_required = matches!(result, Err(ApiError::AuthRequired));
                let before = self.store.transcript().len();
                self.store.complete(id, result);
                self.chat.follow = true;

                if self.store.transcript().len() > before {
                    let previous = self.chat.selected;
                    self.chat.select_latest_table(self.store.transcript());
                    if self.chat.selected != previous {
                        self.sync_grid();
                    }
                }

                if auth_required {
                    self.open_auth();
                }
            }
            JobMessage::AuthStatus(Ok(status)) => {
                tracing::debug!(authenticated = status.authenticated, "auth status");
                self.auth_dialog.set_status(status);
            }
            JobMessage::DeviceCode(Ok(code)) => self.auth_dialog.set_device_code(code),
            JobMessage::AuthStatus(Err(e)) | JobMessage::DeviceCode(Err(e)) => {
                tracing::warn!(error = %e, "auth request failed");
                self.auth_dialog.set_error(e.to_string());
            }
            JobMessage::Queries(Ok(queries)) => self.queries_dialog.set_queries(queries),
            JobMessage::Queries(Err(e)) => {
                tracing::warn!(error = %e, "could not load saved queries");
                self.queries_dialog.set_error(e.to_string());
            }
        }
    }

    fn open_auth(&mut self) {
        if self.modals.top() != Some(&Modal::Auth) {
            self.modals.push(Modal::Auth);
        }
        self.auth_dialog.waiting = true;
        self.runner.check_auth();
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Export
    // ─────────────────────────────────────────────────────────────────────────

    fn open_export_menu(&mut self, source: ExportSource) {
        let dir = self.config.export_dir().display().to_string();
        self.export_dialog.open(source, dir);
        self.modals.push(Modal::Export { source });
    }

    fn export(&mut self, kind: ExportKind) {
        let Some(Modal::Export { source }) = self.modals.top().cloned() else {
            return;
        };
        self.modals.pop();
        self.clear_notices();

        match self.run_export(source, kind) {
            Ok(message) => self.status_message = Some(message),
            Err(e) => {
                tracing::error!(error = %e, kind = kind.label(), "export failed");
                self.alert = Some(format!("{} failed: {}", kind.label(), e));
            }
        }
    }

    fn run_export(&self, source: ExportSource, kind: ExportKind) -> Result<String, ExportError> {
        let doc = match source {
            ExportSource::LiveGrid => format_export(self.grid.grid(), Some(&self.grid)),
            ExportSource::History {
                conversation,
                exchange,
            } => {
                let grid = self
                    .store
                    .history()
                    .get(conversation)
                    .and_then(|c| c.exchanges.get(exchange))
                    .map(|e| extract_grid(&e.response))
                    .unwrap_or_default();
                format_export(&grid, None)
            }
        };
        if doc.column_count() == 0 {
            return Err(ExportError::EmptyGrid);
        }

        let dir = self.config.export_dir();
        let message = match kind {
            ExportKind::DownloadPdf => {
                let path = export::download(&doc, &dir)?;
                format!("Saved {}", path.display())
            }
            ExportKind::Print => {
                export::print(&doc, self.launcher.as_ref())?;
                "Sent to the printer".to_string()
            }
            ExportKind::Email => {
                let path = export::email(&doc, &dir, self.launcher.as_ref())?;
                format!("Mail draft opened, attach {}", path.display())
            }
            ExportKind::DownloadCsv => {
                let path = export::download_csv(&doc, &dir)?;
                format!("Saved {}", path.display())
            }
        };
        Ok(message)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // History
    // ─────────────────────────────────────────────────────────────────────────

    fn open_conversation(&mut self) {
        let Some(index) = self.history_dialog.selected_conversation(&self.store) else {
            return;
        };
        if self.store.is_loading() {
            self.status_message = Some(SubmitRejected::InFlight.to_string());
            return;
        }
        if self.store.select(index) {
            self.modals.pop();
            self.chat.reset();
            self.chat.focus = Focus::Transcript;
            self.chat.select_latest_table(self.store.transcript());
            self.sync_grid();
            self.status_message = Some("Conversation opened".to_string());
        }
    }

    fn delete_conversation(&mut self) {
        let Some(index) = self.history_dialog.selected_conversation(&self.store) else {
            return;
        };
        let was_open = self.store.active_index() == Some(index);
        if self.store.delete_entry(index) {
            if was_open {
                self.chat.reset();
                self.sync_grid();
            }
            self.history_dialog.clamp_to(&self.store);
            self.status_message = Some("Conversation deleted".to_string());
        }
    }

    fn export_from_history(&mut self) {
        let Some((conversation, exchange)) = self.history_dialog.export_target(&self.store) else {
            return;
        };
        let has_table = self
            .store
            .history()
            .get(conversation)
            .and_then(|c| c.exchanges.get(exchange))
            .is_some_and(|e| extract_grid(&e.response).has_rows());

        if has_table {
            self.open_export_menu(ExportSource::History {
                conversation,
                exchange,
            });
        } else {
            self.status_message = Some("That message has no table".to_string());
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Component Implementation
// ═══════════════════════════════════════════════════════════════════════════════

impl Component for App {
    fn init(&mut self) -> Result<()> {
        // Know the sign-in state before the first question
        self.auth_dialog.waiting = true;
        self.runner.check_auth();
        Ok(())
    }

    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            return Ok(Some(Action::ForceQuit));
        }

        if let Some(modal) = self.modals.top().cloned() {
            self.handle_modal_key_event(&modal, key)
        } else if self.chat.focus == Focus::Grid {
            self.grid.handle_key_event(key)
        } else {
            self.chat.handle_key_event(key)
        }
    }

    fn update(&mut self, action: Action) -> Result<Option<Action>> {
        match action {
            // ─────────────────────────────────────────────────────────────────
            // App Lifecycle
            // ─────────────────────────────────────────────────────────────────
            Action::Tick => {
                for message in self.runner.poll() {
                    self.handle_job_message(message);
                }
            }
            Action::ForceQuit => {
                self.should_quit = true;
            }
            Action::Resize(_, _) => {}

            // ─────────────────────────────────────────────────────────────────
            // Prompt
            // ─────────────────────────────────────────────────────────────────
            Action::InputChar(_) | Action::InputBackspace | Action::FocusInput => {
                self.chat.update(action)?;
            }
            Action::SubmitPrompt => self.submit_prompt(),
            Action::UseSamplePrompt(index) => {
                if self.store.transcript().is_empty() && !self.store.is_loading() {
                    self.chat.use_sample_prompt(index);
                }
            }
            Action::NewChat => {
                self.store.clear();
                self.loading_since = None;
                self.chat.reset();
                self.grid.set_grid(GridModel::default());
                self.clear_notices();
            }
            Action::FocusNext => {
                self.chat.focus = self.chat.focus.next(self.has_grid());
            }

            // ─────────────────────────────────────────────────────────────────
            // Scrolling (delegate to the focused panel or open dialog)
            // ─────────────────────────────────────────────────────────────────
            Action::ScrollUp | Action::ScrollDown | Action::PageUp | Action::PageDown => {
                match self.modals.top() {
                    Some(Modal::History) => {
                        self.history_dialog.update(action)?;
                    }
                    _ if self.chat.focus == Focus::Grid => {
                        self.grid.update(action)?;
                    }
                    _ => {
                        self.chat.update(action)?;
                    }
                }
            }
            Action::PrevResponse | Action::NextResponse => {
                let forward = action == Action::NextResponse;
                if self.modals.top() == Some(&Modal::History) {
                    self.history_dialog.step_exchange(&self.store, forward);
                } else if self.chat.step_selection(self.store.transcript(), forward) {
                    self.sync_grid();
                }
            }

            // ─────────────────────────────────────────────────────────────────
            // Grid (delegate to GridView)
            // ─────────────────────────────────────────────────────────────────
            Action::GridNextColumn
            | Action::GridPrevColumn
            | Action::ToggleSort
            | Action::HideColumn
            | Action::ShowAllColumns
            | Action::EnterFilterMode
            | Action::ExitFilterMode
            | Action::FilterInput(_)
            | Action::FilterBackspace => {
                self.grid.update(action)?;
            }

            // ─────────────────────────────────────────────────────────────────
            // Modals
            // ─────────────────────────────────────────────────────────────────
            Action::OpenQuitDialog => {
                self.quit_dialog.request_in_flight = self.store.is_loading();
                self.modals.push(Modal::QuitConfirm);
            }
            Action::OpenExportMenu => {
                if self.store.is_loading() {
                    self.status_message =
                        Some("Export is available once the answer arrives".to_string());
                } else if !self.has_grid() {
                    self.status_message = Some("No table to export".to_string());
                } else {
                    self.open_export_menu(ExportSource::LiveGrid);
                }
            }
            Action::OpenHistory => {
                self.history_dialog.open();
                self.modals.toggle(Modal::History);
            }
            Action::OpenSavedQueries => {
                self.modals.push(Modal::SavedQueries);
                if self.queries_dialog.queries.is_empty() && !self.queries_dialog.loading {
                    self.queries_dialog.loading = true;
                    self.runner.load_queries();
                }
            }
            Action::OpenAuth => self.open_auth(),
            Action::OpenHelp => {
                self.help_dialog.scroll_offset = 0;
                self.modals.push(Modal::Help);
            }
            Action::CloseModal => {
                self.modals.pop();
            }
            Action::ModalUp | Action::ModalDown => match self.modals.top() {
                Some(Modal::History) => {
                    self.history_dialog.update(action)?;
                    self.history_dialog.clamp_to(&self.store);
                }
                Some(Modal::SavedQueries) => {
                    self.queries_dialog.update(action)?;
                }
                Some(Modal::Export { .. }) => {
                    self.export_dialog.update(action)?;
                }
                _ => {}
            },

            // ─────────────────────────────────────────────────────────────────
            // Export
            // ─────────────────────────────────────────────────────────────────
            Action::Export(kind) => self.export(kind),

            // ─────────────────────────────────────────────────────────────────
            // History
            // ─────────────────────────────────────────────────────────────────
            Action::OpenConversation => self.open_conversation(),
            Action::DeleteConversation => self.delete_conversation(),
            Action::ExportFromHistory => self.export_from_history(),
            Action::HistorySearchInput(_) | Action::HistorySearchBackspace => {
                self.history_dialog.update(action)?;
            }

            // ─────────────────────────────────────────────────────────────────
            // Backend
            // ─────────────────────────────────────────────────────────────────
            Action::RefreshAuthStatus => {
                self.auth_dialog.waiting = true;
                self.runner.check_auth();
            }
            Action::StartAuth => {
                self.auth_dialog.waiting = true;
                self.runner.start_auth();
            }
            Action::OpenVerificationLink => {
                if let Some(uri) = self.auth_dialog.verification_uri().map(str::to_string) {
                    if let Err(e) = self.launcher.open_link(&uri) {
                        self.auth_dialog.set_error(e.to_string());
                    }
                }
            }
            Action::ReloadQueries => {
                self.queries_dialog.loading = true;
                self.runner.load_queries();
            }
            Action::RunSavedQuery => self.run_saved_query(),
        }

        Ok(None)
    }

    fn draw(&mut self, frame: &mut Frame, area: Rect) -> Result<()> {
        let loading = self.loading_since.map(|since| loading_message(since.elapsed()));
        let title = self
            .store
            .active_index()
            .and_then(|i| self.store.history().get(i))
            .map(|c| c.title());

        let ctx = ChatRenderContext {
            transcript: self.store.transcript(),
            pending_prompt: self.store.pending_prompt(),
            loading_message: loading,
            error: self.store.error(),
            status_message: self.status_message.as_deref(),
            alert: self.alert.as_deref(),
            api_url: self.config.api_base_url.as_str(),
            authenticated: self.auth_dialog.status.as_ref().map(|s| s.authenticated),
            conversation_title: title.as_deref(),
        };

        draw_chat_screen(frame, area, &mut self.chat, &mut self.grid, &ctx)?;

        // Draw modal overlay if active
        if let Some(modal) = self.modals.top().cloned() {
            self.draw_modal(frame, area, &modal)?;
        }
        Ok(())
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Helper Methods
// ═══════════════════════════════════════════════════════════════════════════════

impl App {
    fn handle_modal_key_event(&mut self, modal: &Modal, key: KeyEvent) -> Result<Option<Action>> {
        match modal {
            Modal::QuitConfirm => self.quit_dialog.handle_key_event(key),
            Modal::Export { .. } => self.export_dialog.handle_key_event(key),
            Modal::History => self.history_dialog.handle_key_event(key),
            Modal::SavedQueries => self.queries_dialog.handle_key_event(key),
            Modal::Auth => self.auth_dialog.handle_key_event(key),
            Modal::Help => self.help_dialog.handle_key_event(key),
        }
    }

    fn draw_modal(&mut self, frame: &mut Frame, area: Rect, modal: &Modal) -> Result<()> {
        match modal {
            Modal::QuitConfirm => self.quit_dialog.draw(frame, area)?,
            Modal::Export { .. } => self.export_dialog.draw(frame, area)?,
            Modal::History => {
                self.history_dialog.draw_with_history(frame, area, &self.store)?;
            }
            Modal::SavedQueries => self.queries_dialog.draw(frame, area)?,
            Modal::Auth => self.auth_dialog.draw(frame, area)?,
            Modal::Help => self.help_dialog.draw(frame, area)?,
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::response::AgentResponse;
    use std::cell::RefCell;
    use std::path::Path;
    use std::time::Duration;

    #[derive(Default)]
    struct RecordingLauncher {
        printed: RefCell<Vec<String>>,
        links: RefCell<Vec<String>>,
    }

    impl Launcher for RecordingLauncher {
        fn open_link(&self, url: &str) -> Result<(), ExportError> {
            self.links.borrow_mut().push(url.to_string());
            Ok(())
        }

        fn print_file(&self, path: &Path) -> Result<(), ExportError> {
            self.printed.borrow_mut().push(path.display().to_string());
            Ok(())
        }
    }

    fn app(export_dir: &Path) -> App {
        let config = Config {
            persist_history: false,
            export_dir: export_dir.display().to_string(),
            ..Config::default()
        };
        let client = ApiClient::new("http://127.0.0.1:9", Duration::from_millis(200))
            .expect("client builds");
        App::new(config, client).with_launcher(Box::new(RecordingLauncher::default()))
    }

    fn ask(app: &mut App, prompt: &str, answer: &str) {
        app.chat.input = prompt.to_string();
        app.update(Action::SubmitPrompt).unwrap();
        let id = app.store.pending_id().expect("request in flight");
        app.handle_job_message(JobMessage::Answer {
            id,
            result: Ok(AgentResponse::RawMarkdown(answer.to_string())),
        });
    }

    const TABLE: &str = "Top agents:\n| Agent | Deals |\n|---|---|\n| Ann | 4 |\n| Bo | 9 |";

    #[test]
    fn test_answer_selects_table() {
        let tmp = tempfile::tempdir().unwrap();
        let mut app = app(tmp.path());

        ask(&mut app, "top agents", TABLE);

        assert!(!app.store.is_loading());
        assert_eq!(app.store.transcript().len(), 1);
        assert_eq!(app.chat.selected, Some(0));
        assert!(app.grid.has_rows());
        assert!(app.chat.input.is_empty());
    }

    #[test]
    fn test_second_submit_rejected_while_loading() {
        let tmp = tempfile::tempdir().unwrap();
        let mut app = app(tmp.path());

        app.chat.input = "first".into();
        app.update(Action::SubmitPrompt).unwrap();
        app.chat.input = "second".into();
        app.update(Action::SubmitPrompt).unwrap();

        assert_eq!(app.store.pending_prompt(), Some("first"));
        assert_eq!(app.chat.input, "second");
        assert!(app.status_message.is_some());
    }

    #[test]
    fn test_answer_after_new_chat_is_discarded() {
        let tmp = tempfile::tempdir().unwrap();
        let mut app = app(tmp.path());

        app.chat.input = "abandoned".into();
        app.update(Action::SubmitPrompt).unwrap();
        let id = app.store.pending_id().unwrap();
        app.update(Action::NewChat).unwrap();
        app.handle_job_message(JobMessage::Answer {
            id,
            result: Ok(AgentResponse::RawMarkdown("late".into())),
        });

        assert!(app.store.transcript().is_empty());
    }

    #[test]
    fn test_repeated_prompt_after_new_chat_ignores_first_reply() {
        let tmp = tempfile::tempdir().unwrap();
        let mut app = app(tmp.path());

        app.chat.input = "top agents".into();
        app.update(Action::SubmitPrompt).unwrap();
        let first = app.store.pending_id().unwrap();
        app.update(Action::NewChat).unwrap();
        app.chat.input = "top agents".into();
        app.update(Action::SubmitPrompt).unwrap();
        let second = app.store.pending_id().unwrap();

        app.handle_job_message(JobMessage::Answer {
            id: first,
            result: Ok(AgentResponse::RawMarkdown("STALE".into())),
        });
        assert!(app.store.transcript().is_empty());
        assert!(app.store.is_loading());

        app.handle_job_message(JobMessage::Answer {
            id: second,
            result: Ok(AgentResponse::RawMarkdown(TABLE.into())),
        });
        assert_eq!(app.store.transcript().len(), 1);
        assert!(app.grid.has_rows());
    }

    #[test]
    fn test_failed_request_keeps_transcript() {
        let tmp = tempfile::tempdir().unwrap();
        let mut app = app(tmp.path());

        app.chat.input = "q".into();
        app.update(Action::SubmitPrompt).unwrap();
        let id = app.store.pending_id().unwrap();
        app.handle_job_message(JobMessage::Answer {
            id,
            result: Err(ApiError::Backend("assistant unavailable".into())),
        });

        assert!(app.store.transcript().is_empty());
        assert_eq!(app.store.error(), Some("assistant unavailable"));
    }

    #[test]
    fn test_auth_required_opens_sign_in() {
        let tmp = tempfile::tempdir().unwrap();
        let mut app = app(tmp.path());

        app.chat.input = "q".into();
        app.update(Action::SubmitPrompt).unwrap();
        let id = app.store.pending_id().unwrap();
        app.handle_job_message(JobMessage::Answer {
            id,
            result: Err(ApiError::AuthRequired),
        });

        assert_eq!(app.modals.top(), Some(&Modal::Auth));
    }

    #[test]
    fn test_sample_prompt_only_on_landing() {
        let tmp = tempfile::tempdir().unwrap();
        let mut app = app(tmp.path());

        app.update(Action::UseSamplePrompt(0)).unwrap();
        assert!(!app.chat.input.is_empty());

        app.chat.input.clear();
        ask(&mut app, "q", "a");
        app.update(Action::UseSamplePrompt(0)).unwrap();
        assert!(app.chat.input.is_empty());
    }

    #[test]
    fn test_live_export_follows_grid_state() {
        let tmp = tempfile::tempdir().unwrap();
        let mut app = app(tmp.path());
        ask(&mut app, "top agents", TABLE);

        app.update(Action::GridNextColumn).unwrap();
        app.update(Action::ToggleSort).unwrap();
        app.update(Action::ToggleSort).unwrap();

        app.update(Action::OpenExportMenu).unwrap();
        assert!(matches!(app.modals.top(), Some(Modal::Export { .. })));
        app.update(Action::Export(ExportKind::DownloadCsv)).unwrap();

        assert!(app.modals.is_empty());
        assert!(app.alert.is_none());
        let csv = std::fs::read_to_string(tmp.path().join(crate::model::export::CSV_FILE_NAME))
            .unwrap();
        assert_eq!(csv, "Agent,Deals\nBo,9\nAnn,4\n");
    }

    #[test]
    fn test_export_menu_needs_a_table() {
        let tmp = tempfile::tempdir().unwrap();
        let mut app = app(tmp.path());
        ask(&mut app, "hello", "Hi there");

        app.update(Action::OpenExportMenu).unwrap();
        assert!(app.modals.is_empty());
        assert_eq!(app.status_message.as_deref(), Some("No table to export"));
    }

    #[test]
    fn test_print_and_email_use_launcher() {
        let tmp = tempfile::tempdir().unwrap();
        let mut app = app(tmp.path());
        ask(&mut app, "top agents", TABLE);

        app.update(Action::OpenExportMenu).unwrap();
        app.update(Action::Export(ExportKind::Email)).unwrap();
        assert!(tmp.path().join(crate::model::export::PDF_FILE_NAME).exists());
        assert!(app.status_message.as_deref().unwrap_or_default().starts_with("Mail draft opened"));

        app.update(Action::OpenExportMenu).unwrap();
        app.update(Action::Export(ExportKind::Print)).unwrap();
        assert_eq!(app.status_message.as_deref(), Some("Sent to the printer"));
    }

    #[test]
    fn test_history_export_uses_saved_table() {
        let tmp = tempfile::tempdir().unwrap();
        let mut app = app(tmp.path());
        ask(&mut app, "top agents", TABLE);
        app.update(Action::NewChat).unwrap();

        app.update(Action::OpenHistory).unwrap();
        app.update(Action::ExportFromHistory).unwrap();
        assert_eq!(
            app.modals.top(),
            Some(&Modal::Export {
                source: ExportSource::History {
                    conversation: 0,
                    exchange: 0
                }
            })
        );

        app.update(Action::Export(ExportKind::DownloadCsv)).unwrap();
        let csv = std::fs::read_to_string(tmp.path().join(crate::model::export::CSV_FILE_NAME))
            .unwrap();
        assert_eq!(csv, "Agent,Deals\nAnn,4\nBo,9\n");
        // Back on the history dialog
        assert_eq!(app.modals.top(), Some(&Modal::History));
    }

    #[test]
    fn test_open_conversation_restores_transcript() {
        let tmp = tempfile::tempdir().unwrap();
        let mut app = app(tmp.path());
        ask(&mut app, "top agents", TABLE);
        app.update(Action::NewChat).unwrap();
        assert!(app.store.transcript().is_empty());

        app.update(Action::OpenHistory).unwrap();
        app.update(Action::OpenConversation).unwrap();

        assert!(app.modals.is_empty());
        assert_eq!(app.store.transcript().len(), 1);
        assert!(app.grid.has_rows());

        // Follow-ups join the reopened conversation
        ask(&mut app, "and next month?", "Nothing yet.");
        assert_eq!(app.store.history().len(), 1);
        assert_eq!(app.store.history()[0].exchanges.len(), 2);
    }

    #[test]
    fn test_history_selection_stays_in_range() {
        let tmp = tempfile::tempdir().unwrap();
        let mut app = app(tmp.path());
        ask(&mut app, "first", "a");
        app.update(Action::NewChat).unwrap();
        ask(&mut app, "second", "b");

        app.update(Action::OpenHistory).unwrap();
        for _ in 0..5 {
            app.update(Action::ModalDown).unwrap();
        }
        assert_eq!(app.history_dialog.selected_index, 1);

        app.update(Action::DeleteConversation).unwrap();
        assert_eq!(app.store.history().len(), 1);
        assert_eq!(app.history_dialog.selected_index, 0);
    }

    #[test]
    fn test_deleting_open_conversation_clears_chat() {
        let tmp = tempfile::tempdir().unwrap();
        let mut app = app(tmp.path());
        ask(&mut app, "top agents", TABLE);
        assert!(app.grid.has_rows());

        app.update(Action::OpenHistory).unwrap();
        app.update(Action::DeleteConversation).unwrap();

        assert!(app.store.history().is_empty());
        assert!(app.store.transcript().is_empty());
        assert_eq!(app.chat.selected, None);
        assert!(!app.grid.has_rows());

        // The next question starts a fresh conversation
        app.update(Action::CloseModal).unwrap();
        ask(&mut app, "and this month?", "Nothing yet.");
        assert_eq!(app.store.history().len(), 1);
        assert_eq!(app.store.history()[0].exchanges.len(), 1);
    }

    #[test]
    fn test_ctrl_c_quits_from_anywhere() {
        let tmp = tempfile::tempdir().unwrap();
        let mut app = app(tmp.path());
        app.update(Action::OpenHelp).unwrap();
        let key = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert_eq!(app.handle_key_event(key).unwrap(), Some(Action::ForceQuit));
    }
}
