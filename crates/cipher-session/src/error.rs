//! Session errors and how each one is surfaced to the user.

use cipher_core::{FileSetError, ValidationError};
use cipher_store::{RepoError, StoreError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    FileSet(#[from] FileSetError),

    #[error("project not found: {0}")]
    ProjectNotFound(String),

    #[error("project not saved: {0}")]
    NotSaved(#[source] StoreError),

    #[error("could not load projects: {0}")]
    Load(#[source] StoreError),

    #[error("no project is open")]
    NoActiveProject,
}

impl From<RepoError> for SessionError {
    fn from(e: RepoError) -> Self {
        match e {
            RepoError::Validation(v) => Self::Validation(v),
            RepoError::NotFound(id) => Self::ProjectNotFound(id),
            RepoError::NotSaved(s) => Self::NotSaved(s),
            RepoError::Load(s) => Self::Load(s),
        }
    }
}

/// How a failure is presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Bad input; ask again before anything changes.
    BlockingPrompt,
    /// Operation refused; in-memory state unchanged.
    Rejection,
    /// Non-blocking notice; edits are kept for a manual retry.
    Warning,
    /// The project is gone; go back to the project list.
    ReturnToProjectList,
}

impl SessionError {
    pub fn severity(&self) -> Severity {
        match self {
            Self::Validation(_) | Self::FileSet(FileSetError::InvalidPath { .. }) => {
                Severity::BlockingPrompt
            }
            Self::FileSet(_) => Severity::Rejection,
            Self::NotSaved(_) | Self::Load(_) => Severity::Warning,
            Self::ProjectNotFound(_) | Self::NoActiveProject => Severity::ReturnToProjectList,
        }
    }
}
