//! cipher-core: project data model and the pure state machines behind the studio.
//!
//! - `types`: persisted shapes (`FileEntry`, `FileMap`, `ProjectRecord`, `ProjectCollection`, `Theme`).
//! - `file_set`: immutable create/delete/rename operations over a `FileMap`.
//! - `autosave`: trailing-debounce commit coordinator driven by an injected `now`.
//!
//! Nothing in this crate touches the filesystem or spawns tasks.

pub mod autosave;
pub mod error;
pub mod file_set;
pub mod template;
pub mod types;

pub use autosave::{
    AutosaveCoordinator, AutosaveState, CommitTicket, CommitTrigger, DEFAULT_DEBOUNCE_MS,
    EditOutcome,
};
pub use error::{FileSetError, ValidationError};
pub use file_set::{FileSetChange, normalize_path, validate_file_map, visible_paths};
pub use template::{DEFAULT_ACTIVE_FILE, default_files, placeholder_content};
pub use types::{FileEntry, FileMap, ProjectCollection, ProjectRecord, Theme};
