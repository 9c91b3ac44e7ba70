//! CLI, bootstrap, and top-level error handling
//!
//! This crate provides the `groupaudit` command-line interface.

pub mod cli;
pub mod commands;
pub mod error;

pub use cli::Cli;
pub use error::{ClientError, ClientResult};
