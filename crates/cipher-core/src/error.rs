//! Error types for the pure core.

use thiserror::Error;

/// Rejected user input (project names, theme values).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("project name can't be empty")]
    EmptyName,

    #[error("unknown theme: {0:?}")]
    UnknownTheme(String),
}

/// Precondition violations from file-set operations. The input map is never modified.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FileSetError {
    #[error("invalid file path {path:?}: {reason}")]
    InvalidPath { path: String, reason: &'static str },

    #[error("a file with path {0} already exists")]
    DuplicatePath(String),

    #[error("file not found: {0}")]
    NotFound(String),

    #[error("cannot delete {0}: it is the last visible file")]
    LastFile(String),

    #[error("file map has no visible files")]
    NoVisibleFiles,
}
