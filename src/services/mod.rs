//! External service interactions
//!
//! - HTTP client for the data agent backend and its background runner
//! - Table extraction from agent responses
//! - Export formatting, PDF rendering and the download/print/email actions

pub mod api;
pub mod export;
pub mod export_formatter;
pub mod pdf;
pub mod request_runner;
pub mod table_extractor;
