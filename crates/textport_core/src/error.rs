//! Error types for the editing engine.
use thiserror::Error;

/// Errors surfaced by content, layout, and configuration APIs.
///
/// Navigation past a document edge is not an error; those APIs return
/// `None` or an empty list instead.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EditorError {
    #[error("Invalid range: {start}..{end} is outside a document of {len} chars")]
    InvalidRange { start: usize, end: usize, len: usize },

    #[error("Layout unavailable at location {location}")]
    LayoutUnavailable { location: usize },

    #[error("Invalid config: {0}")]
    InvalidConfig(String),
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, EditorError>;
