//! cipher-session: the studio session controller.
//! Holds the one active project, routes file-set edits and collaborator
//! changes through the autosave coordinator, and commits via the repository.

pub mod controller;
pub mod error;
pub mod event;

pub use controller::{SaveOutcome, SessionController};
pub use error::{SessionError, Severity};
pub use event::SessionEvent;
