//! Export delivery: download, print, email, CSV
//!
//! Every operation returns a typed `ExportError` on failure so the UI can show
//! what went wrong. Side effects outside the filesystem go through `Launcher`.

use crate::model::export::{ExportDocument, CSV_FILE_NAME, EXPORT_TITLE, PDF_FILE_NAME};
use crate::services::pdf::render_pdf;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Command;

const EMAIL_BODY: &str = "Please find the PDF attached.";

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    /// Nothing to export
    #[error("There is no table to export")]
    EmptyGrid,

    #[error("Failed to generate document: {0}")]
    DocumentGeneration(String),

    #[error("Failed to serialize table: {0}")]
    Serialization(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Printing failed: {0}")]
    PrintFailed(String),

    #[error("Could not open mail client: {0}")]
    MailLinkFailed(String),
}

/// Platform side effects used by exports
pub trait Launcher {
    /// Open a URL (used for the mailto link)
    fn open_link(&self, url: &str) -> Result<(), ExportError>;

    /// Send a file to the printer
    fn print_file(&self, path: &Path) -> Result<(), ExportError>;
}

/// Launcher backed by the desktop opener and a print command
pub struct SystemLauncher {
    print_command: String,
}

impl SystemLauncher {
    pub fn new(print_command: impl Into<String>) -> Self {
        Self {
            print_command: print_command.into(),
        }
    }
}

impl Launcher for SystemLauncher {
    fn open_link(&self, url: &str) -> Result<(), ExportError> {
        open::that(url).map_err(|e| ExportError::MailLinkFailed(e.to_string()))
    }

    fn print_file(&self, path: &Path) -> Result<(), ExportError> {
        let mut parts = self.print_command.split_whitespace();
        let program = parts
            .next()
            .ok_or_else(|| ExportError::PrintFailed("no print command configured".into()))?;

        let output = Command::new(program)
            .args(parts)
            .arg(path)
            .output()
            .map_err(|e| ExportError::PrintFailed(format!("{}: {}", program, e)))?;

        if output.status.success() {
            Ok(())
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            Err(ExportError::PrintFailed(if stderr.is_empty() {
                format!("{} exited with {}", program, output.status)
            } else {
                stderr
            }))
        }
    }
}

fn render(doc: &ExportDocument) -> Result<Vec<u8>, ExportError> {
    if doc.column_count() == 0 {
        return Err(ExportError::EmptyGrid);
    }
    render_pdf(doc).map_err(|e| ExportError::DocumentGeneration(e.to_string()))
}

fn write_file(dir: &Path, name: &str, bytes: &[u8]) -> Result<PathBuf, ExportError> {
    fs::create_dir_all(dir)?;
    let path = dir.join(name);
    fs::write(&path, bytes)?;
    Ok(path)
}

/// Save the PDF into `dir`
pub fn download(doc: &ExportDocument, dir: &Path) -> Result<PathBuf, ExportError> {
    let bytes = render(doc)?;
    let path = write_file(dir, PDF_FILE_NAME, &bytes)?;
    tracing::info!(path = %path.display(), bytes = bytes.len(), "pdf downloaded");
    Ok(path)
}

/// Print the PDF. The temporary file is removed once printing returns.
pub fn print(doc: &ExportDocument, launcher: &dyn Launcher) -> Result<(), ExportError> {
    let bytes = render(doc)?;

    let mut file = tempfile::Builder::new()
        .prefix("lw-ai-data-table-")
        .suffix(".pdf")
        .tempfile()?;
    file.write_all(&bytes)?;
    file.flush()?;

    launcher.print_file(file.path())?;
    tracing::info!(bytes = bytes.len(), "pdf sent to printer");
    Ok(())
}

/// Save the PDF, then open a mail draft. The user attaches the file by hand.
pub fn email(
    doc: &ExportDocument,
    dir: &Path,
    launcher: &dyn Launcher,
) -> Result<PathBuf, ExportError> {
    let path = download(doc, dir)?;
    launcher.open_link(&mailto_link())?;
    tracing::info!(path = %path.display(), "mail draft opened");
    Ok(path)
}

/// Save the table as CSV into `dir`
pub fn download_csv(doc: &ExportDocument, dir: &Path) -> Result<PathBuf, ExportError> {
    if doc.column_count() == 0 {
        return Err(ExportError::EmptyGrid);
    }

    let mut writer = csv::WriterBuilder::new().from_writer(Vec::new());
    writer.write_record(doc.header_texts())?;
    for row in &doc.body_rows {
        writer.write_record(row)?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| ExportError::Io(e.into_error()))?;

    let path = write_file(dir, CSV_FILE_NAME, &bytes)?;
    tracing::info!(path = %path.display(), rows = doc.body_rows.len(), "csv downloaded");
    Ok(path)
}

pub fn mailto_link() -> String {
    format!(
        "mailto:?subject={}&body={}",
        percent_encode(EXPORT_TITLE),
        percent_encode(EMAIL_BODY)
    )
}

/// Encode everything outside the URI unreserved set
fn percent_encode(s: &str) -> String {
    let mut out = String::with_capacity(s.len() * 3);
    for byte in s.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(byte as char)
            }
            _ => out.push_str(&format!("%{:02X}", byte)),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::export::{ColumnWidth, HeaderCell, PageSetup, TableLayout};
    use std::cell::RefCell;

    #[derive(Default)]
    struct FakeLauncher {
        links: RefCell<Vec<String>>,
        printed: RefCell<Vec<(PathBuf, bool)>>,
        fail_print: bool,
    }

    impl Launcher for FakeLauncher {
        fn open_link(&self, url: &str) -> Result<(), ExportError> {
            self.links.borrow_mut().push(url.to_string());
            Ok(())
        }

        fn print_file(&self, path: &Path) -> Result<(), ExportError> {
            self.printed
                .borrow_mut()
                .push((path.to_path_buf(), path.exists()));
            if self.fail_print {
                Err(ExportError::PrintFailed("printer offline".into()))
            } else {
                Ok(())
            }
        }
    }

    fn document() -> ExportDocument {
        ExportDocument {
            title: EXPORT_TITLE.to_string(),
            header_row: vec![HeaderCell::new("Name"), HeaderCell::new("Location")],
            body_rows: vec![
                vec!["Alice".into(), "Austin, TX".into()],
                vec!["Bob".into(), String::new()],
            ],
            column_widths: vec![ColumnWidth::Auto; 2],
            layout: TableLayout::default(),
            page: PageSetup::default(),
        }
    }

    fn empty_document() -> ExportDocument {
        ExportDocument {
            header_row: vec![],
            body_rows: vec![],
            column_widths: vec![],
            ..document()
        }
    }

    #[test]
    fn test_download_writes_pdf() {
        let dir = tempfile::tempdir().unwrap();
        let path = download(&document(), dir.path()).unwrap();

        assert_eq!(path, dir.path().join(PDF_FILE_NAME));
        let bytes = fs::read(&path).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn test_download_creates_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("exports").join("today");
        let path = download(&document(), &nested).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_empty_document_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let launcher = FakeLauncher::default();

        assert!(matches!(
            download(&empty_document(), dir.path()),
            Err(ExportError::EmptyGrid)
        ));
        assert!(matches!(
            print(&empty_document(), &launcher),
            Err(ExportError::EmptyGrid)
        ));
        assert!(matches!(
            download_csv(&empty_document(), dir.path()),
            Err(ExportError::EmptyGrid)
        ));
        assert!(launcher.printed.borrow().is_empty());
    }

    #[test]
    fn test_print_uses_temporary_file() {
        let launcher = FakeLauncher::default();
        print(&document(), &launcher).unwrap();

        let printed = launcher.printed.borrow();
        assert_eq!(printed.len(), 1);
        let (path, existed) = &printed[0];
        assert!(existed);
        assert!(!path.exists());
    }

    #[test]
    fn test_print_failure_is_reported() {
        let launcher = FakeLauncher {
            fail_print: true,
            ..Default::default()
        };
        let err = print(&document(), &launcher).unwrap_err();
        assert!(matches!(err, ExportError::PrintFailed(_)));
        assert!(err.to_string().contains("printer offline"));
    }

    #[test]
    fn test_email_writes_file_before_opening_link() {
        let dir = tempfile::tempdir().unwrap();
        let launcher = FakeLauncher::default();
        let path = email(&document(), dir.path(), &launcher).unwrap();

        assert!(path.exists());
        let links = launcher.links.borrow();
        assert_eq!(links.len(), 1);
        assert_eq!(
            links[0],
            "mailto:?subject=LW%20AI%20Data%20Table&body=Please%20find%20the%20PDF%20attached."
        );
    }

    #[test]
    fn test_email_skips_link_when_write_fails() {
        let dir = tempfile::tempdir().unwrap();
        // A regular file where the export directory should be
        let blocker = dir.path().join("blocked");
        fs::write(&blocker, b"").unwrap();

        let launcher = FakeLauncher::default();
        let result = email(&document(), &blocker, &launcher);

        assert!(matches!(result, Err(ExportError::Io(_))));
        assert!(launcher.links.borrow().is_empty());
    }

    #[test]
    fn test_download_csv_quotes_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = download_csv(&document(), dir.path()).unwrap();
        let contents = fs::read_to_string(path).unwrap();

        assert_eq!(
            contents,
            "Name,Location\nAlice,\"Austin, TX\"\nBob,\n"
        );
    }

    #[test]
    fn test_percent_encode() {
        assert_eq!(percent_encode("a b&c"), "a%20b%26c");
        assert_eq!(percent_encode("é"), "%C3%A9");
    }
}
