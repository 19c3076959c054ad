//! Main entry point for the formwork CLI.
//!
//! This is the command-line interface for formwork value host configurations.
//! It provides commands for working with configuration documents:
//! - `validate`: Check a configuration document for errors
//! - `merge`: Layer UI override documents over a business-logic document
//! - `inspect`: Build a manager from a document and show its value hosts

mod cli;
mod commands;
mod error;
mod utils;

use clap::Parser;
use cli::Cli;
use utils::GlobalOptions;

fn main() {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    let _level = formwork::init_logger(cli.verbose, cli.quiet);

    let global = GlobalOptions {
        verbose: cli.verbose,
        quiet: cli.quiet,
    };

    // Execute the command
    let result = match cli.command {
        cli::Command::Validate(cmd) => cmd.execute(&global),
        cli::Command::Merge(cmd) => cmd.execute(&global),
        cli::Command::Inspect(cmd) => cmd.execute(&global),
    };

    // Handle errors and set exit code
    match result {
        Ok(()) => std::process::exit(0),
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(e.exit_code());
        }
    }
}
