//! Validator chains for input and property declarations.
//!
//! The chain exposes its target configuration so other crates can add their
//! own chainable methods through an extension trait:
//!
//! ```
//! use std::rc::Rc;
//! use formwork::builder::{ConfigBuilderBase, DeclareValueHosts, FluentValidatorBuilder};
//! use formwork::config::ConditionConfig;
//! use formwork::services::ValidationServices;
//! use serde_json::json;
//!
//! trait MaxLengthExt {
//!     fn max_length(self, length: u64) -> Self;
//! }
//!
//! impl MaxLengthExt for FluentValidatorBuilder<'_> {
//!     fn max_length(self, length: u64) -> Self {
//!         self.condition(ConditionConfig::new("MaxLength").with_property("maxLength", json!(length)))
//!     }
//! }
//!
//! let mut builder = ConfigBuilderBase::new(Rc::new(ValidationServices::new()));
//! builder.input("name").unwrap().max_length(40);
//! let config = &builder.base_configs().unwrap()[0];
//! assert_eq!(config.validators()[0].effective_error_code(), Some("MaxLength"));
//! ```

use crate::config::{ConditionConfig, ValidatorConfig, ValidatorSeverity, ValueHostConfig};

/// Chain that appends validators to one input or property configuration.
///
/// Message setters apply to the most recently added validator and do nothing
/// before the first one.
#[derive(Debug)]
pub struct FluentValidatorBuilder<'a> {
    target: &'a mut ValueHostConfig,
}

// Chains usually end by dropping the builder.
#[allow(clippy::return_self_not_must_use)]
impl<'a> FluentValidatorBuilder<'a> {
    /// Starts a chain on `target`.
    #[must_use]
    pub fn new(target: &'a mut ValueHostConfig) -> Self {
        Self { target }
    }

    /// The configuration being built.
    pub fn parent_config(&mut self) -> &mut ValueHostConfig {
        self.target
    }

    /// The validators declared so far.
    pub fn validators(&self) -> &[ValidatorConfig] {
        self.target.validators()
    }

    /// Appends a validator.
    pub fn validator(self, validator: ValidatorConfig) -> Self {
        self.target.validators_mut().push(validator);
        self
    }

    /// Appends a validator wrapping `condition`.
    pub fn condition(self, condition: ConditionConfig) -> Self {
        self.validator(ValidatorConfig::new(condition))
    }

    fn last(self, f: impl FnOnce(&mut ValidatorConfig)) -> Self {
        if let Some(validator) = self
            .target
            .validator_configs
            .as_mut()
            .and_then(|validators| validators.last_mut())
        {
            f(validator);
        }
        self
    }

    /// Sets the error code of the last validator.
    pub fn error_code(self, error_code: &str) -> Self {
        self.last(|v| v.error_code = Some(error_code.to_string()))
    }

    /// Sets the inline error message of the last validator.
    pub fn error_message(self, message: &str) -> Self {
        self.last(|v| v.error_message = Some(message.to_string()))
    }

    /// Sets the inline summary message of the last validator.
    pub fn summary_message(self, message: &str) -> Self {
        self.last(|v| v.summary_message = Some(message.to_string()))
    }

    /// Sets the severity of the last validator.
    pub fn severity(self, severity: ValidatorSeverity) -> Self {
        self.last(|v| v.severity = Some(severity))
    }

    /// Sets the label of the configuration.
    pub fn label(self, label: &str) -> Self {
        self.target.label = Some(label.to_string());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ValueHostType;

    #[test]
    fn test_setters_target_last_validator() {
        let mut config = ValueHostConfig::new("email", ValueHostType::Input);
        let chain = FluentValidatorBuilder::new(&mut config)
            .condition(ConditionConfig::new("RequireText"))
            .error_message("Required")
            .condition(ConditionConfig::new("EmailAddress"))
            .error_code("Email")
            .severity(ValidatorSeverity::Warning);
        assert_eq!(chain.validators().len(), 2);

        let validators = config.validators();
        assert_eq!(validators[0].error_message.as_deref(), Some("Required"));
        assert!(validators[0].severity.is_none());
        assert_eq!(validators[1].effective_error_code(), Some("Email"));
        assert_eq!(validators[1].severity, Some(ValidatorSeverity::Warning));
    }

    #[test]
    fn test_setter_without_validator_is_ignored() {
        let mut config = ValueHostConfig::new("email", ValueHostType::Input);
        FluentValidatorBuilder::new(&mut config)
            .error_message("nothing to attach to")
            .label("E-mail");
        assert!(config.validator_configs.is_none());
        assert_eq!(config.label.as_deref(), Some("E-mail"));
    }

    #[test]
    fn test_parent_config_is_writable() {
        let mut config = ValueHostConfig::new("email", ValueHostType::Input);
        let mut chain = FluentValidatorBuilder::new(&mut config);
        chain.parent_config().data_type = Some("String".into());
        assert_eq!(config.data_type.as_deref(), Some("String"));
    }
}
