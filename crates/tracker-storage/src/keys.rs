//! Storage key constants.

/// Storage keys used by the desktop shell.
pub struct StorageKeys;

impl StorageKeys {
    /// Opaque bearer credential of the current session.
    pub const SESSION_TOKEN: &'static str = "token";
}
