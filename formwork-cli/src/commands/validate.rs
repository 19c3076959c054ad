//! Command to validate a value host configuration document.

use crate::error::CliError;
use crate::utils::{load_document, GlobalOptions};
use clap::Args;
use formwork::config::ConfigValidator;
use std::path::PathBuf;

/// Validate a value host configuration document.
#[derive(Args)]
pub struct ValidateCommand {
    /// Configuration document to validate (.yaml, .yml or .json)
    #[arg(value_name = "CONFIG_PATH")]
    pub config_path: PathBuf,
}

impl ValidateCommand {
    pub fn execute(self, global: &GlobalOptions) -> Result<(), CliError> {
        let config = load_document(&self.config_path)?;

        let errors = ConfigValidator::collect_errors(&config.value_host_configs);
        if errors.is_empty() {
            if !global.quiet {
                println!(
                    "Configuration is valid ({} value hosts)",
                    config.value_host_configs.len()
                );
            }
            return Ok(());
        }

        for error in &errors {
            eprintln!("Validation error: {error}");
        }
        Err(CliError::SemanticFailure(format!(
            "Configuration validation failed with {} errors",
            errors.len()
        )))
    }
}
