//! Action enum - All possible application actions
//!
//! Actions are discrete operations that the application can perform.
//! Components emit Actions in response to events, and the App processes
//! them to update state.

use std::fmt;

/// Export target chosen in the export menu
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportKind {
    DownloadPdf,
    Print,
    Email,
    DownloadCsv,
}

impl ExportKind {
    pub fn all() -> [ExportKind; 4] {
        [
            ExportKind::DownloadPdf,
            ExportKind::Print,
            ExportKind::Email,
            ExportKind::DownloadCsv,
        ]
    }

    pub fn label(&self) -> &str {
        match self {
            ExportKind::DownloadPdf => "Download PDF",
            ExportKind::Print => "Print",
            ExportKind::Email => "Email PDF",
            ExportKind::DownloadCsv => "Download CSV",
        }
    }
}

/// All possible actions in the application
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    // ─────────────────────────────────────────────────────────────────────────
    // App Lifecycle
    // ─────────────────────────────────────────────────────────────────────────
    /// Regular tick for polling and animations
    Tick,
    /// Terminal was resized
    Resize(u16, u16),
    /// Quit without confirmation
    ForceQuit,

    // ─────────────────────────────────────────────────────────────────────────
    // Prompt
    // ─────────────────────────────────────────────────────────────────────────
    InputChar(char),
    InputBackspace,
    /// Send the prompt in the input box
    SubmitPrompt,
    /// Put a sample prompt into the input box
    UseSamplePrompt(usize),
    /// Start a new chat
    NewChat,
    /// Move focus to the next panel
    FocusNext,
    /// Focus the prompt input
    FocusInput,

    // ─────────────────────────────────────────────────────────────────────────
    // Transcript
    // ─────────────────────────────────────────────────────────────────────────
    ScrollUp,
    ScrollDown,
    PageUp,
    PageDown,
    /// Show the previous response's table
    PrevResponse,
    /// Show the next response's table
    NextResponse,

    // ─────────────────────────────────────────────────────────────────────────
    // Grid
    // ─────────────────────────────────────────────────────────────────────────
    GridNextColumn,
    GridPrevColumn,
    /// Cycle the sort on the current column
    ToggleSort,
    HideColumn,
    ShowAllColumns,
    EnterFilterMode,
    ExitFilterMode,
    FilterInput(char),
    FilterBackspace,

    // ─────────────────────────────────────────────────────────────────────────
    // Modals
    // ─────────────────────────────────────────────────────────────────────────
    OpenQuitDialog,
    OpenExportMenu,
    OpenHistory,
    OpenSavedQueries,
    OpenAuth,
    OpenHelp,
    /// Close the current modal
    CloseModal,
    /// Move the selection in the open dialog
    ModalUp,
    ModalDown,

    // ─────────────────────────────────────────────────────────────────────────
    // Export
    // ─────────────────────────────────────────────────────────────────────────
    Export(ExportKind),

    // ─────────────────────────────────────────────────────────────────────────
    // History
    // ─────────────────────────────────────────────────────────────────────────
    OpenConversation,
    DeleteConversation,
    /// Export the table of the selected saved conversation
    ExportFromHistory,
    HistorySearchInput(char),
    HistorySearchBackspace,

    // ─────────────────────────────────────────────────────────────────────────
    // Backend
    // ─────────────────────────────────────────────────────────────────────────
    RefreshAuthStatus,
    StartAuth,
    /// Open the device login page in a browser
    OpenVerificationLink,
    ReloadQueries,
    /// Run the selected saved query
    RunSavedQuery,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Tick => write!(f, "Tick"),
            Action::Resize(w, h) => write!(f, "Resize({}, {})", w, h),
            Action::ForceQuit => write!(f, "ForceQuit"),
            Action::InputChar(c) => write!(f, "InputChar('{}')", c),
            Action::InputBackspace => write!(f, "InputBackspace"),
            Action::SubmitPrompt => write!(f, "SubmitPrompt"),
            Action::UseSamplePrompt(i) => write!(f, "UseSamplePrompt({})", i),
            Action::NewChat => write!(f, "NewChat"),
            Action::FocusNext => write!(f, "FocusNext"),
            Action::FocusInput => write!(f, "FocusInput"),
            Action::ScrollUp => write!(f, "ScrollUp"),
            Action::ScrollDown => write!(f, "ScrollDown"),
            Action::PageUp => write!(f, "PageUp"),
            Action::PageDown => write!(f, "PageDown"),
            Action::PrevResponse => write!(f, "PrevResponse"),
            Action::NextResponse => write!(f, "NextResponse"),
            Action::GridNextColumn => write!(f, "GridNextColumn"),
            Action::GridPrevColumn => write!(f, "GridPrevColumn"),
            Action::ToggleSort => write!(f, "ToggleSort"),
            Action::HideColumn => write!(f, "HideColumn"),
            Action::ShowAllColumns => write!(f, "ShowAllColumns"),
            Action::EnterFilterMode => write!(f, "EnterFilterMode"),
            Action::ExitFilterMode => write!(f, "ExitFilterMode"),
            Action::FilterInput(c) => write!(f, "FilterInput('{}')", c),
            Action::FilterBackspace => write!(f, "FilterBackspace"),
            Action::OpenQuitDialog => write!(f, "OpenQuitDialog"),
            Action::OpenExportMenu => write!(f, "OpenExportMenu"),
            Action::OpenHistory => write!(f, "OpenHistory"),
            Action::OpenSavedQueries => write!(f, "OpenSavedQueries"),
            Action::OpenAuth => write!(f, "OpenAuth"),
            Action::OpenHelp => write!(f, "OpenHelp"),
            Action::CloseModal => write!(f, "CloseModal"),
            Action::ModalUp => write!(f, "ModalUp"),
            Action::ModalDown => write!(f, "ModalDown"),
            Action::Export(kind) => write!(f, "Export({})", kind.label()),
            Action::OpenConversation => write!(f, "OpenConversation"),
            Action::DeleteConversation => write!(f, "DeleteConversation"),
            Action::ExportFromHistory => write!(f, "ExportFromHistory"),
            Action::HistorySearchInput(c) => write!(f, "HistorySearchInput('{}')", c),
            Action::HistorySearchBackspace => write!(f, "HistorySearchBackspace"),
            Action::RefreshAuthStatus => write!(f, "RefreshAuthStatus"),
            Action::StartAuth => write!(f, "StartAuth"),
            Action::OpenVerificationLink => write!(f, "OpenVerificationLink"),
            Action::ReloadQueries => write!(f, "ReloadQueries"),
            Action::RunSavedQuery => write!(f, "RunSavedQuery"),
        }
    }
}
