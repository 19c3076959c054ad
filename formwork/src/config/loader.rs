//! Configuration file loading.
//!
//! Reads manager configurations and state snapshots from YAML or JSON
//! documents. The format is chosen by file extension. Loaded configurations
//! carry no services; attach one with
//! [`ManagerConfig::with_services`](crate::config::ManagerConfig::with_services).

use std::fs;
use std::path::Path;

use crate::config::manager_config::ManagerConfig;
use crate::error::{Error, Result};
use crate::state::ManagerStateSnapshot;

/// Document formats understood by [`ConfigLoader`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// `.yaml` or `.yml`
    Yaml,
    /// `.json`
    Json,
}

impl ConfigFormat {
    /// Picks the format from a file extension.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` for any other extension.
    pub fn from_path(path: &Path) -> Result<Self> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml") => {
                Ok(Self::Yaml)
            }
            Some(ext) if ext.eq_ignore_ascii_case("json") => Ok(Self::Json),
            _ => Err(Error::invalid_argument(
                "path",
                format!(
                    "{} has no .yaml, .yml or .json extension",
                    path.display()
                ),
            )),
        }
    }
}

/// Loads configuration documents.
///
/// # Examples
///
/// ```no_run
/// use std::path::Path;
/// use std::rc::Rc;
/// use formwork::config::ConfigLoader;
/// use formwork::services::ValidationServices;
///
/// let config = ConfigLoader::load_file(Path::new("form.yaml"))
///     .unwrap()
///     .with_services(Rc::new(ValidationServices::new()));
/// println!("{} value hosts", config.value_host_configs.len());
/// ```
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load a manager configuration from a YAML or JSON file.
    ///
    /// # Errors
    ///
    /// Returns an error if the extension is unknown, the file cannot be read,
    /// or the document is invalid.
    pub fn load_file(path: &Path) -> Result<ManagerConfig> {
        let format = ConfigFormat::from_path(path)?;
        let contents = fs::read_to_string(path)?;
        let config = Self::parse(&contents, format)?;
        log::debug!(
            "Loaded {} value host configurations from {}",
            config.value_host_configs.len(),
            path.display()
        );
        Ok(config)
    }

    /// Parse a manager configuration document.
    ///
    /// # Errors
    ///
    /// Returns a YAML or JSON error if the document is invalid.
    pub fn parse(contents: &str, format: ConfigFormat) -> Result<ManagerConfig> {
        Ok(match format {
            ConfigFormat::Yaml => serde_yaml::from_str(contents)?,
            ConfigFormat::Json => serde_json::from_str(contents)?,
        })
    }

    /// Load a state snapshot written by [`ConfigLoader::save_snapshot`].
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or the document is invalid.
    pub fn load_snapshot(path: &Path) -> Result<ManagerStateSnapshot> {
        let contents = fs::read_to_string(path)?;
        match ConfigFormat::from_path(path)? {
            ConfigFormat::Yaml => Ok(serde_yaml::from_str(&contents)?),
            ConfigFormat::Json => ManagerStateSnapshot::from_json(&contents),
        }
    }

    /// Write a state snapshot as YAML or JSON, chosen by extension.
    ///
    /// # Errors
    ///
    /// Returns an error if the extension is unknown or the file cannot be written.
    pub fn save_snapshot(path: &Path, snapshot: &ManagerStateSnapshot) -> Result<()> {
        let contents = match ConfigFormat::from_path(path)? {
            ConfigFormat::Yaml => serde_yaml::to_string(snapshot)?,
            ConfigFormat::Json => snapshot.to_json()?,
        };
        fs::write(path, contents)?;
        Ok(())
    }
}
