//! The shared builder core.

use std::rc::Rc;

use super::{rules, CompleteManagerConfig, DeclareValueHosts};
use crate::config::{ManagerConfig, ValueHostConfig};
use crate::error::{Error, Result};
use crate::services::ValidationServices;

const COMPONENT: &str = "config builder";

#[derive(Debug)]
struct Staging {
    services: Rc<ValidationServices>,
    base: ManagerConfig,
    overrides: Vec<Vec<ValueHostConfig>>,
}

/// Accumulates a base list of value host configurations and a stack of
/// override lists.
///
/// Once completed or disposed, every method fails with [`Error::Disposed`].
///
/// # Examples
///
/// ```
/// use std::rc::Rc;
/// use formwork::builder::{CompleteManagerConfig, ConfigBuilderBase, DeclareValueHosts};
/// use formwork::config::{ValueHostConfig, ValueHostType};
/// use formwork::services::ValidationServices;
///
/// let mut builder = ConfigBuilderBase::new(Rc::new(ValidationServices::new()));
/// builder.static_host(ValueHostConfig::new("X", ValueHostType::Static).with_label("business")).unwrap();
///
/// builder.add_override().unwrap();
/// builder.static_host(ValueHostConfig::new("X", ValueHostType::Static).with_label("ui")).unwrap();
///
/// let config = builder.complete().unwrap();
/// assert_eq!(config.value_host_configs.len(), 1);
/// assert_eq!(config.value_host_configs[0].label.as_deref(), Some("ui"));
/// ```
#[derive(Debug)]
pub struct ConfigBuilderBase {
    staging: Option<Staging>,
}

impl ConfigBuilderBase {
    /// Creates an empty builder bound to a services bag.
    #[must_use]
    pub fn new(services: Rc<ValidationServices>) -> Self {
        Self {
            staging: Some(Staging {
                base: ManagerConfig::new(Rc::clone(&services)),
                services,
                overrides: Vec::new(),
            }),
        }
    }

    /// Creates a builder that continues from an existing configuration.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if `config` has no services.
    pub fn from_config(config: ManagerConfig) -> Result<Self> {
        let services = config.services.clone().ok_or_else(|| Error::Configuration {
            reason: "a builder requires a services object or a configuration with services"
                .to_string(),
        })?;
        Ok(Self {
            staging: Some(Staging {
                services,
                base: config,
                overrides: Vec::new(),
            }),
        })
    }

    fn staging(&self) -> Result<&Staging> {
        self.staging.as_ref().ok_or(Error::Disposed {
            component: COMPONENT,
        })
    }

    fn staging_mut(&mut self) -> Result<&mut Staging> {
        self.staging.as_mut().ok_or(Error::Disposed {
            component: COMPONENT,
        })
    }

    /// The shared services bag.
    ///
    /// # Errors
    ///
    /// Returns `Disposed` after completion or disposal.
    pub fn services(&self) -> Result<Rc<ValidationServices>> {
        Ok(Rc::clone(&self.staging()?.services))
    }

    /// Starts a new override list. Later declarations go into it.
    ///
    /// # Errors
    ///
    /// Returns `Disposed` after completion or disposal.
    pub fn add_override(&mut self) -> Result<&mut Self> {
        self.staging_mut()?.overrides.push(Vec::new());
        Ok(self)
    }

    /// The base list.
    ///
    /// # Errors
    ///
    /// Returns `Disposed` after completion or disposal.
    pub fn base_configs(&self) -> Result<&[ValueHostConfig]> {
        Ok(&self.staging()?.base.value_host_configs)
    }

    /// The override lists, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `Disposed` after completion or disposal.
    pub fn override_configs(&self) -> Result<&[Vec<ValueHostConfig>]> {
        Ok(&self.staging()?.overrides)
    }

    /// The configuration being built, excluding pending overrides.
    ///
    /// # Errors
    ///
    /// Returns `Disposed` after completion or disposal.
    pub fn manager_config(&self) -> Result<&ManagerConfig> {
        Ok(&self.staging()?.base)
    }

    /// Mutable access to the configuration being built.
    ///
    /// # Errors
    ///
    /// Returns `Disposed` after completion or disposal.
    pub fn manager_config_mut(&mut self) -> Result<&mut ManagerConfig> {
        Ok(&mut self.staging_mut()?.base)
    }

    /// Changes the validator `error_code` of `value_host_name`, searching the
    /// override lists newest first and then the base list.
    pub(crate) fn modify_validator(
        &mut self,
        value_host_name: &str,
        error_code: &str,
        change: impl FnOnce(&mut crate::config::ValidatorConfig),
    ) -> Result<()> {
        let staging = self.staging_mut()?;
        let lists = staging
            .overrides
            .iter_mut()
            .rev()
            .chain(std::iter::once(&mut staging.base.value_host_configs));
        rules::modify(lists, value_host_name, error_code, change)
    }

    /// Merges the override lists into the base list, oldest first, and
    /// returns the final configuration.
    ///
    /// # Errors
    ///
    /// Returns `Disposed` if already completed or disposed.
    pub fn complete(mut self) -> Result<ManagerConfig> {
        let Staging {
            services,
            mut base,
            overrides,
        } = self.staging.take().ok_or(Error::Disposed {
            component: COMPONENT,
        })?;

        let merger = services.config_merge_service();
        for entry in overrides.into_iter().flatten() {
            match merger.identify_value_host_conflict(&entry, &base.value_host_configs) {
                Some(index) => merger.merge(&entry, &mut base.value_host_configs[index]),
                None => base.value_host_configs.push(entry),
            }
        }
        log::debug!(
            "Completed configuration with {} value hosts",
            base.value_host_configs.len()
        );
        Ok(base)
    }

    /// Releases the staged configuration. Calling it again does nothing.
    pub fn dispose(&mut self) {
        self.staging = None;
    }

    /// Returns whether the builder was completed or disposed.
    #[must_use]
    pub fn is_disposed(&self) -> bool {
        self.staging.is_none()
    }
}

impl DeclareValueHosts for ConfigBuilderBase {
    fn destination_configs(&mut self) -> Result<&mut Vec<ValueHostConfig>> {
        let staging = self.staging_mut()?;
        Ok(match staging.overrides.last_mut() {
            Some(list) => list,
            None => &mut staging.base.value_host_configs,
        })
    }
}

impl CompleteManagerConfig for ConfigBuilderBase {
    fn complete(self) -> Result<ManagerConfig> {
        ConfigBuilderBase::complete(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ConditionConfig, ValueHostType};
    use serde_json::json;

    fn builder() -> ConfigBuilderBase {
        ConfigBuilderBase::new(Rc::new(ValidationServices::new()))
    }

    #[test]
    fn test_declarations_follow_newest_override() {
        let mut builder = builder();
        builder.static_host("a").unwrap();
        builder.add_override().unwrap();
        builder.static_host("b").unwrap();
        builder.add_override().unwrap();
        builder.static_host("a").unwrap();

        assert_eq!(builder.base_configs().unwrap().len(), 1);
        let overrides = builder.override_configs().unwrap();
        assert_eq!(overrides.len(), 2);
        assert_eq!(overrides[0][0].name, "b");
        assert_eq!(overrides[1][0].name, "a");
    }

    #[test]
    fn test_complete_appends_new_names_in_order() {
        let mut builder = builder();
        builder.static_host("a").unwrap();
        builder.add_override().unwrap();
        builder.static_host("c").unwrap();
        builder.static_host("b").unwrap();

        let config = builder.complete().unwrap();
        let names: Vec<_> = config
            .value_host_configs
            .iter()
            .map(|c| c.name.as_str())
            .collect();
        assert_eq!(names, ["a", "c", "b"]);
    }

    #[test]
    fn test_complete_merges_per_field() {
        let mut builder = builder();
        builder
            .static_host(
                ValueHostConfig::new("X", ValueHostType::Static)
                    .with_extra("A", json!(1)),
            )
            .unwrap();
        builder.add_override().unwrap();
        builder
            .static_host(ValueHostConfig::new("X", ValueHostType::Static).with_extra("B", json!(2)))
            .unwrap();
        builder.add_override().unwrap();
        builder
            .static_host(ValueHostConfig::new("X", ValueHostType::Static).with_extra("A", json!(3)))
            .unwrap();

        let config = builder.complete().unwrap();
        assert_eq!(config.value_host_configs.len(), 1);
        let x = &config.value_host_configs[0];
        assert_eq!(x.extras.get("A"), Some(&json!(3)));
        assert_eq!(x.extras.get("B"), Some(&json!(2)));
    }

    #[test]
    fn test_dispose_fails_fast() {
        let mut builder = builder();
        builder.dispose();
        builder.dispose();
        assert!(builder.is_disposed());
        assert!(builder.static_host("a").unwrap_err().is_disposed());
        assert!(builder.add_override().unwrap_err().is_disposed());
        assert!(builder.base_configs().unwrap_err().is_disposed());
        assert!(builder.complete().unwrap_err().is_disposed());
    }

    #[test]
    fn test_from_config_requires_services() {
        assert!(matches!(
            ConfigBuilderBase::from_config(ManagerConfig::default()),
            Err(Error::Configuration { .. })
        ));

        let existing = ManagerConfig::new(Rc::new(ValidationServices::new()))
            .with_value_host(ValueHostConfig::new("a", ValueHostType::Static));
        let mut builder = ConfigBuilderBase::from_config(existing).unwrap();
        assert!(builder.static_host("a").is_err());
    }

    #[test]
    fn test_modify_validator_prefers_newest_override() {
        let mut builder = builder();
        builder
            .input("age")
            .unwrap()
            .condition(ConditionConfig::new("Range"))
            .error_message("base");
        builder.add_override().unwrap();
        builder
            .input("age")
            .unwrap()
            .condition(ConditionConfig::new("Range"))
            .error_message("override");

        builder
            .modify_validator("age", "Range", |v| v.severity = Some(crate::config::ValidatorSeverity::Warning))
            .unwrap();
        assert!(builder.base_configs().unwrap()[0].validators()[0].severity.is_none());
        assert!(builder.override_configs().unwrap()[0][0].validators()[0]
            .severity
            .is_some());
    }
}
