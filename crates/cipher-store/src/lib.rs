//! cipher-store: durable state for the studio.
//! Provides the `KeyedStore` seam (in-memory and on-disk), the project
//! repository built on it, and the theme preference. All IO lives here.

pub mod error;
pub mod file;
pub mod keyed;
pub mod memory;
pub mod repository;
pub mod theme;

pub use error::{RepoError, StoreError};
pub use file::FileStore;
pub use keyed::{KeyedStore, KeyedStoreExt, Subscriber, SubscriptionId};
pub use memory::MemoryStore;
pub use repository::{PROJECTS_KEY, ProjectRepository};
pub use theme::{THEME_KEY, ThemeStore};
