//! Device-local storage for the expense tracker desktop shell.
//!
//! - **FileStorage**: JSON file under the user's profile directory
//! - **MemoryStorage**: volatile map, for tests and browser-only runs
//!
//! [`SessionStore`] sits on top of either and owns the session credential.

mod file;
mod keys;
mod memory;
mod session;
mod traits;

pub use file::FileStorage;
pub use keys::StorageKeys;
pub use memory::MemoryStorage;
pub use session::SessionStore;
pub use traits::KeyValueStorage;

use std::path::Path;
use thiserror::Error;

/// Error type for storage operations.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Encoding/decoding error
    #[error("Encoding error: {0}")]
    Encoding(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Create a session store persisted at `path`.
pub fn create_session_store(path: &Path) -> SessionStore {
    SessionStore::new(Box::new(FileStorage::new(path)))
}
