//! Configuration builders.
//!
//! Builders accumulate value host configurations before a manager exists.
//! Declarations go into a base list until [`ConfigBuilderBase::add_override`]
//! opens an override list; every later declaration lands in the newest
//! override. [`CompleteManagerConfig::complete`] merges the overrides into
//! the base, oldest first, so later overrides win field by field.
//!
//! # Builders
//!
//! - [`ConfigBuilderBase`]: base list, override lists and completion
//! - [`ValueHostsManagerConfigBuilder`]: adds notification handlers
//! - [`ValidationManagerConfigBuilder`]: adds UI-layer and rule helpers
//!
//! The declaration surface is shared with
//! [`ManagerConfigModifier`](crate::modifier::ManagerConfigModifier) through
//! the [`DeclareValueHosts`] trait.

mod base;
mod fluent;
mod manager_builder;
pub(crate) mod rules;
mod validation_builder;

use std::collections::BTreeMap;

use serde_json::Value;

use crate::config::{ManagerConfig, ValueHostConfig, ValueHostType};
use crate::error::{Error, Result};

pub use base::ConfigBuilderBase;
pub use fluent::FluentValidatorBuilder;
pub use manager_builder::ValueHostsManagerConfigBuilder;
pub use rules::CombineUsing;
pub use validation_builder::{UiLayerOptions, ValidationManagerConfigBuilder};

/// A value host declared by name, by name and data type, by name, data type
/// and extra fields, or by a full configuration.
///
/// The value host type is always taken from the declaring method.
#[derive(Debug, Clone)]
pub struct ValueHostDeclaration {
    config: ValueHostConfig,
}

impl ValueHostDeclaration {
    fn into_config(self, value_host_type: ValueHostType) -> Result<ValueHostConfig> {
        let mut config = self.config;
        if config.name.trim().is_empty() {
            return Err(Error::invalid_argument(
                "name",
                "value host name must not be empty",
            ));
        }
        config.value_host_type = value_host_type;
        Ok(config)
    }
}

impl From<&str> for ValueHostDeclaration {
    fn from(name: &str) -> Self {
        Self {
            config: ValueHostConfig {
                name: name.to_string(),
                ..Default::default()
            },
        }
    }
}

impl From<String> for ValueHostDeclaration {
    fn from(name: String) -> Self {
        Self {
            config: ValueHostConfig {
                name,
                ..Default::default()
            },
        }
    }
}

impl From<(&str, &str)> for ValueHostDeclaration {
    fn from((name, data_type): (&str, &str)) -> Self {
        Self {
            config: ValueHostConfig {
                name: name.to_string(),
                data_type: Some(data_type.to_string()),
                ..Default::default()
            },
        }
    }
}

/// Extra fields use the configuration's serialized names. Known fields such
/// as `label` or `initialValue` are set on the configuration; anything else
/// lands in its extras. `name` and `valueHostType` are ignored.
impl From<(&str, &str, BTreeMap<String, Value>)> for ValueHostDeclaration {
    fn from((name, data_type, extra_fields): (&str, &str, BTreeMap<String, Value>)) -> Self {
        let config = ValueHostConfig::new(name, ValueHostType::default()).with_data_type(data_type);
        Self {
            config: with_extra_fields(config, extra_fields),
        }
    }
}

fn with_extra_fields(mut config: ValueHostConfig, mut extra_fields: BTreeMap<String, Value>) -> ValueHostConfig {
    extra_fields.remove("name");
    extra_fields.remove("valueHostType");
    if let Ok(Value::Object(mut fields)) = serde_json::to_value(&config) {
        fields.extend(extra_fields.clone());
        if let Ok(merged) = serde_json::from_value::<ValueHostConfig>(Value::Object(fields)) {
            return merged;
        }
    }
    // A known field with the wrong shape; keep everything as extras.
    config.extras.extend(extra_fields);
    config
}

impl From<ValueHostConfig> for ValueHostDeclaration {
    fn from(config: ValueHostConfig) -> Self {
        Self { config }
    }
}

/// Fluent value host declarations.
///
/// Implementors only supply the list new declarations go into. Names must be
/// unique within that list.
///
/// # Examples
///
/// ```
/// use std::rc::Rc;
/// use formwork::builder::{ConfigBuilderBase, DeclareValueHosts};
/// use formwork::config::ConditionConfig;
/// use formwork::services::ValidationServices;
///
/// let mut builder = ConfigBuilderBase::new(Rc::new(ValidationServices::new()));
/// builder.static_host("country").unwrap();
/// builder.calc("total", "sum").unwrap();
/// builder
///     .input(("email", "String"))
///     .unwrap()
///     .condition(ConditionConfig::new("RequireText"))
///     .error_message("Required");
///
/// assert!(builder.static_host("country").is_err());
/// assert_eq!(builder.base_configs().unwrap().len(), 3);
/// ```
pub trait DeclareValueHosts {
    /// The list that receives new declarations.
    ///
    /// # Errors
    ///
    /// Returns `Disposed` once the implementor is disposed.
    fn destination_configs(&mut self) -> Result<&mut Vec<ValueHostConfig>>;

    /// Appends a configuration to the destination list.
    ///
    /// # Errors
    ///
    /// Returns `DuplicateValueHostName` if the name is already in the
    /// destination list, which is left unchanged.
    fn apply_config(&mut self, config: ValueHostConfig) -> Result<&mut ValueHostConfig> {
        let destination = self.destination_configs()?;
        if destination.iter().any(|c| c.name == config.name) {
            log::error!("Value host '{}' is already declared", config.name);
            return Err(Error::DuplicateValueHostName { name: config.name });
        }
        let index = destination.len();
        destination.push(config);
        Ok(&mut destination[index])
    }

    /// Declares a static value host.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` for an empty name, or the errors of
    /// [`DeclareValueHosts::apply_config`].
    fn static_host(&mut self, declaration: impl Into<ValueHostDeclaration>) -> Result<&mut Self>
    where
        Self: Sized,
    {
        let config = declaration.into().into_config(ValueHostType::Static)?;
        self.apply_config(config)?;
        Ok(self)
    }

    /// Declares a calculated value host using a registered calculation function.
    ///
    /// # Errors
    ///
    /// See [`DeclareValueHosts::static_host`].
    fn calc(
        &mut self,
        declaration: impl Into<ValueHostDeclaration>,
        calc_fn: &str,
    ) -> Result<&mut Self>
    where
        Self: Sized,
    {
        let mut config = declaration.into().into_config(ValueHostType::Calc)?;
        config.calc_fn = Some(calc_fn.to_string());
        self.apply_config(config)?;
        Ok(self)
    }

    /// Declares an input value host and returns a chain for its validators.
    ///
    /// # Errors
    ///
    /// See [`DeclareValueHosts::static_host`].
    fn input(&mut self, declaration: impl Into<ValueHostDeclaration>) -> Result<FluentValidatorBuilder<'_>>
    where
        Self: Sized,
    {
        let config = declaration.into().into_config(ValueHostType::Input)?;
        Ok(FluentValidatorBuilder::new(self.apply_config(config)?))
    }

    /// Declares a property value host and returns a chain for its validators.
    ///
    /// # Errors
    ///
    /// See [`DeclareValueHosts::static_host`].
    fn property(
        &mut self,
        declaration: impl Into<ValueHostDeclaration>,
    ) -> Result<FluentValidatorBuilder<'_>>
    where
        Self: Sized,
    {
        let config = declaration.into().into_config(ValueHostType::Property)?;
        Ok(FluentValidatorBuilder::new(self.apply_config(config)?))
    }
}

/// Builders that produce a final [`ManagerConfig`].
pub trait CompleteManagerConfig {
    /// Merges every override list into the base list and returns the result.
    /// The builder is consumed.
    ///
    /// # Errors
    ///
    /// Returns `Disposed` if the builder was disposed.
    fn complete(self) -> Result<ManagerConfig>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, Default)]
    struct ListOnly {
        configs: Vec<ValueHostConfig>,
    }

    impl DeclareValueHosts for ListOnly {
        fn destination_configs(&mut self) -> Result<&mut Vec<ValueHostConfig>> {
            Ok(&mut self.configs)
        }
    }

    #[test]
    fn test_type_comes_from_method() {
        let mut list = ListOnly::default();
        let declared = crate::config::ValueHostConfig::new("a", ValueHostType::Input);
        list.static_host(declared).unwrap();
        assert_eq!(list.configs[0].value_host_type, ValueHostType::Static);
    }

    #[test]
    fn test_name_and_data_type_tuple() {
        let mut list = ListOnly::default();
        list.property(("age", "Integer")).unwrap();
        assert_eq!(list.configs[0].data_type.as_deref(), Some("Integer"));
        assert_eq!(list.configs[0].value_host_type, ValueHostType::Property);
    }

    #[test]
    fn test_name_data_type_and_extra_fields() {
        let mut list = ListOnly::default();
        let extra = BTreeMap::from([
            ("label".to_string(), json!("Age")),
            ("maxLength".to_string(), json!(3)),
            ("valueHostType".to_string(), json!("Calc")),
        ]);
        list.input(("age", "Integer", extra)).unwrap();

        let config = &list.configs[0];
        assert_eq!(config.value_host_type, ValueHostType::Input);
        assert_eq!(config.data_type.as_deref(), Some("Integer"));
        assert_eq!(config.label.as_deref(), Some("Age"));
        assert_eq!(config.extras.get("maxLength"), Some(&json!(3)));
        assert!(!config.extras.contains_key("label"));
    }

    #[test]
    fn test_malformed_known_extra_field_is_kept_as_extra() {
        let mut list = ListOnly::default();
        let extra = BTreeMap::from([("label".to_string(), json!(7))]);
        list.static_host(("a", "Integer", extra)).unwrap();
        assert_eq!(list.configs[0].label, None);
        assert_eq!(list.configs[0].extras.get("label"), Some(&json!(7)));
    }

    #[test]
    fn test_duplicate_leaves_list_unchanged() {
        let mut list = ListOnly::default();
        list.static_host("a").unwrap();
        let err = list.calc("a", "sum").unwrap_err();
        assert!(matches!(err, Error::DuplicateValueHostName { .. }));
        assert_eq!(list.configs.len(), 1);
    }

    #[test]
    fn test_empty_name_rejected() {
        let mut list = ListOnly::default();
        assert!(matches!(
            list.input(""),
            Err(Error::InvalidArgument { .. })
        ));
        assert!(list.configs.is_empty());
    }

    #[test]
    fn test_calc_records_function() {
        let mut list = ListOnly::default();
        list.calc(String::from("total"), "sum").unwrap();
        assert_eq!(list.configs[0].calc_fn.as_deref(), Some("sum"));
    }
}
