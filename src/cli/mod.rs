//! Command-line interface
//!
//! Argument parsing for the binary, the shell grammar and the session that
//! executes shell commands against one in-memory ledger.

pub mod commands;
pub mod session;

pub use commands::{Command, Opt, ShellCommand, ShellLine};
pub use session::Session;
