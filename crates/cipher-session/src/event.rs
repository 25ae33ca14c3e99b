use chrono::{DateTime, Utc};

use cipher_core::{CommitTrigger, FileMap};

use crate::error::Severity;

/// Outbound notifications for the editor/preview collaborator and the UI.
/// Drained with `SessionController::take_events`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    ProjectOpened {
        project_id: String,
    },
    /// The file set changed; re-render explorer and sandbox.
    FilesChanged {
        files: FileMap,
        active_path: String,
    },
    ActiveFileChanged {
        path: String,
    },
    Saved {
        updated_at: DateTime<Utc>,
        trigger: CommitTrigger,
    },
    /// A commit failed. In-memory edits are kept; no automatic retry.
    SaveFailed {
        trigger: CommitTrigger,
        message: String,
    },
    /// An edit or request was refused; nothing changed.
    OperationRejected {
        message: String,
        severity: Severity,
    },
    ProjectClosed {
        project_id: String,
    },
}
