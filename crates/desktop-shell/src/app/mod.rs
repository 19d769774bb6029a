//! Application wiring and commands.

mod analytics;
mod commands;
mod init;

pub use commands::{login, logout, status};
pub use init::{start_shell, Shell};
