//! Command to build a manager from a document and report its value hosts.

use crate::error::CliError;
use crate::utils::{build_services, load_document, render, require_file, DocumentFormat, GlobalOptions};
use clap::{Args, ValueEnum};
use formwork::config::{ConfigLoader, ConfigValidator, ValueHostType};
use formwork::{ValidationStatus, ValueHostsManager};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Output format for the value host report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ReportFormat {
    /// Aligned, human-readable lines
    #[default]
    Human,
    /// YAML document
    Yaml,
    /// Pretty-printed JSON document
    Json,
}

/// One row of the report.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValueHostReport {
    /// Value host name.
    pub name: String,
    /// Value host type.
    pub value_host_type: ValueHostType,
    /// Data type lookup key.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_type: Option<String>,
    /// Display label.
    pub label: String,
    /// Stored native value.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    /// Stored input value.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_value: Option<Value>,
    /// Validation progress for validatable value hosts.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validation_status: Option<ValidationStatus>,
}

/// Build a manager from a configuration document and list its value hosts.
#[derive(Args)]
pub struct InspectCommand {
    /// Configuration document
    #[arg(value_name = "CONFIG_PATH")]
    pub config_path: PathBuf,

    /// State snapshot to rehydrate the manager with
    #[arg(long, value_name = "SNAPSHOT")]
    pub state: Option<PathBuf>,

    /// Only list value hosts of this type
    #[arg(long = "type", value_name = "TYPE")]
    pub value_host_type: Option<String>,

    /// Output format
    #[arg(long, value_enum, default_value_t = ReportFormat::Human)]
    pub format: ReportFormat,
}

impl InspectCommand {
    pub fn execute(self, global: &GlobalOptions) -> Result<(), CliError> {
        let report = self.report()?;
        match self.format {
            ReportFormat::Human => {
                if report.is_empty() {
                    if !global.quiet {
                        println!("No value hosts");
                    }
                    return Ok(());
                }
                print!("{}", format_human(&report));
            }
            ReportFormat::Yaml => print!("{}", render(&report, DocumentFormat::Yaml)?),
            ReportFormat::Json => println!("{}", render(&report, DocumentFormat::Json)?),
        }
        Ok(())
    }

    /// Builds the manager and collects one row per selected value host.
    pub fn report(&self) -> Result<Vec<ValueHostReport>, CliError> {
        let config = load_document(&self.config_path)?;
        ConfigValidator::validate(&config.value_host_configs)?;
        let mut config = config.with_services(build_services(&BTreeMap::new()));
        if let Some(path) = &self.state {
            require_file(path)?;
            config = config.with_snapshot(ConfigLoader::load_snapshot(path)?);
        }

        let manager = ValueHostsManager::new(config)?;
        let wanted = self.value_host_type.as_deref().map(ValueHostType::from);
        let filter = wanted.map(|wanted| -> formwork::manager::ValueHostFilter {
            Box::new(move |host| host.value_host_type().is_ok_and(|t| t == wanted))
        });

        let mut report = Vec::new();
        for host in manager.enumerate_value_hosts(filter)? {
            // Stored state only; calculated values need functions the CLI
            // does not have.
            let state = host.instance_state()?;
            report.push(ValueHostReport {
                name: host.name()?,
                value_host_type: host.value_host_type()?,
                data_type: host.data_type()?,
                label: host.label()?,
                value: state.value,
                input_value: state.input_value,
                validation_status: state.validation_status,
            });
        }
        Ok(report)
    }
}

fn display_value(value: Option<&Value>) -> String {
    match value {
        None => "-".to_string(),
        Some(Value::String(s)) => format!("{s:?}"),
        Some(other) => other.to_string(),
    }
}

/// Format report rows as aligned columns.
pub fn format_human(report: &[ValueHostReport]) -> String {
    let width = report.iter().map(|r| r.name.len()).max().unwrap_or(0);
    let mut out = String::new();
    for row in report {
        let mut line = format!(
            "{:<width$}  {:<8}  value={}",
            row.name,
            row.value_host_type.to_string(),
            display_value(row.value.as_ref()),
        );
        if row.input_value.is_some() {
            line.push_str(&format!("  input={}", display_value(row.input_value.as_ref())));
        }
        if let Some(status) = row.validation_status {
            line.push_str(&format!("  status={status:?}"));
        }
        out.push_str(line.trim_end());
        out.push('\n');
    }
    out
}
