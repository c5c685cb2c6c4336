//! CLI argument parsing and command dispatch.

pub mod args;
pub mod files;
pub mod verify;

pub use args::{Cli, Commands, OutputFormat};
