//! Library exports for formwork-cli.
//!
//! This module exports the CLI structure and commands so they can be
//! exercised from tests without spawning the binary.

pub mod cli;
pub mod commands;
pub mod error;
pub mod utils;

pub use cli::Cli;
