//! CLI structure and command definitions.
//!
//! This module defines the main CLI structure using clap's derive macros,
//! including global options and subcommands.

use crate::commands::{InspectCommand, MergeCommand, ValidateCommand};
use clap::{Parser, Subcommand};

/// Command-line tool for value host configuration documents.
#[derive(Parser)]
#[command(name = "formwork")]
#[command(version, about = "Validate, merge and inspect value host configurations", long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(long, global = true)]
    pub verbose: bool,

    /// Suppress non-essential output
    #[arg(long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Available CLI commands.
#[derive(Subcommand)]
pub enum Command {
    /// Check a configuration document for errors
    Validate(ValidateCommand),

    /// Merge UI-layer override documents into a business-logic document
    Merge(MergeCommand),

    /// Build a manager from a document and list its value hosts
    Inspect(InspectCommand),
}
