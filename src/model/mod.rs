//! Model layer
//!
//! - `conversation` - transcript, history and the in-flight prompt
//! - `response` - what the agent sends back
//! - `grid` - tabular data shown in the grid view
//! - `export` - print-ready table documents
//! - `modal`, `ui` - overlay stack and presentation constants

pub mod conversation;
pub mod export;
pub mod grid;
pub mod modal;
pub mod response;
pub mod ui;
