//! Command to merge UI-layer override documents into a base document.
//!
//! The base document plays the business-logic layer. Each `--ui` document
//! becomes one override list, newest last, and the first one opens the UI
//! layer so the base list can cede inline messages and retype properties.

use crate::error::CliError;
use crate::utils::{build_services, load_document, load_messages, render, DocumentFormat, GlobalOptions};
use clap::Args;
use formwork::builder::{DeclareValueHosts, UiLayerOptions, ValidationManagerConfigBuilder};
use formwork::config::{ConfigValidator, ManagerConfig};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Merge override documents into a base document and print the result.
#[derive(Args)]
pub struct MergeCommand {
    /// Business-logic configuration document
    #[arg(value_name = "BASE")]
    pub base: PathBuf,

    /// UI-layer override document (repeatable, later documents win)
    #[arg(long = "ui", value_name = "FILE")]
    pub ui: Vec<PathBuf>,

    /// Error-message catalog (error code to text) known to the localizer
    #[arg(long, value_name = "FILE")]
    pub messages: Option<PathBuf>,

    /// Keep inline messages even when the catalog has one for the error code
    #[arg(long)]
    pub no_favor_ui_messages: bool,

    /// Keep property value hosts as properties
    #[arg(long)]
    pub no_property_to_input: bool,

    /// Output format
    #[arg(long, value_enum, default_value_t = DocumentFormat::Yaml)]
    pub format: DocumentFormat,
}

impl MergeCommand {
    pub fn execute(self, _global: &GlobalOptions) -> Result<(), CliError> {
        let merged = self.merge()?;
        print!("{}", render(&merged, self.format)?);
        if self.format == DocumentFormat::Json {
            println!();
        }
        Ok(())
    }

    /// Runs the layered build and returns the completed configuration.
    pub fn merge(&self) -> Result<ManagerConfig, CliError> {
        let messages = match &self.messages {
            Some(path) => load_messages(path)?,
            None => BTreeMap::new(),
        };
        let services = build_services(&messages);

        let base = load_document(&self.base)?;
        ConfigValidator::validate(&base.value_host_configs)?;
        let mut builder = ValidationManagerConfigBuilder::from_config(base.with_services(services))?;

        for (index, path) in self.ui.iter().enumerate() {
            let layer = load_document(path)?;
            ConfigValidator::validate(&layer.value_host_configs)?;
            if index == 0 {
                builder.start_ui_layer_config(self.ui_layer_options())?;
            } else {
                builder.add_override()?;
            }
            for config in layer.value_host_configs {
                builder.apply_config(config)?;
            }
            log::debug!("Layered override {}", path.display());
        }

        Ok(builder.complete()?)
    }

    fn ui_layer_options(&self) -> UiLayerOptions {
        UiLayerOptions {
            favor_ui_messages: Some(!self.no_favor_ui_messages),
            convert_property_to_input: Some(!self.no_property_to_input),
        }
    }
}
