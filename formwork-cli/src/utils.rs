//! Utility functions for CLI operations.
//!
//! This module provides common utility functions used across CLI commands,
//! including document loading, services setup and output formatting.

use crate::error::CliError;
use clap::ValueEnum;
use formwork::config::{ConfigLoader, ManagerConfig};
use formwork::services::{TextLocalizer, ValidationServices, WILDCARD_CULTURE};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::rc::Rc;

/// Global CLI options shared across all commands.
#[derive(Debug, Clone, Default)]
pub struct GlobalOptions {
    /// Enable verbose output.
    pub verbose: bool,

    /// Suppress non-essential output.
    pub quiet: bool,
}

/// Serialization format for documents written to stdout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum DocumentFormat {
    /// YAML document
    #[default]
    Yaml,
    /// Pretty-printed JSON document
    Json,
}

/// Serialize `value` in the requested format.
pub fn render<T: Serialize>(value: &T, format: DocumentFormat) -> Result<String, CliError> {
    match format {
        DocumentFormat::Yaml => {
            serde_yaml::to_string(value).map_err(|e| CliError::Parse(e.to_string()))
        }
        DocumentFormat::Json => {
            serde_json::to_string_pretty(value).map_err(|e| CliError::Parse(e.to_string()))
        }
    }
}

/// Fail with `InvalidArguments` if `path` does not exist.
pub fn require_file(path: &Path) -> Result<(), CliError> {
    if !path.exists() {
        return Err(CliError::InvalidArguments(format!(
            "File not found: {}",
            path.display()
        )));
    }
    Ok(())
}

/// Load a configuration document, picking YAML or JSON by extension.
pub fn load_document(path: &Path) -> Result<ManagerConfig, CliError> {
    require_file(path)?;
    Ok(ConfigLoader::load_file(path)?)
}

/// Load an error-message catalog: a YAML or JSON map from error code to text.
pub fn load_messages(path: &Path) -> Result<BTreeMap<String, String>, CliError> {
    require_file(path)?;
    let contents = fs::read_to_string(path)?;
    let is_json = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    if is_json {
        serde_json::from_str(&contents).map_err(|e| CliError::Parse(e.to_string()))
    } else {
        serde_yaml::from_str(&contents).map_err(|e| CliError::Parse(e.to_string()))
    }
}

/// Build a services bag whose text localizer knows `messages` for every
/// culture.
pub fn build_services(messages: &BTreeMap<String, String>) -> Rc<ValidationServices> {
    let localizer = TextLocalizer::new();
    for (error_code, text) in messages {
        localizer.register_error_message(error_code, WILDCARD_CULTURE, text);
    }
    log::debug!("Registered {} localized error messages", messages.len());
    Rc::new(ValidationServices::new().with_text_localizer(Rc::new(localizer)))
}
