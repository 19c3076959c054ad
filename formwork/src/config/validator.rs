//! Configuration validation.
//!
//! Static checks over a list of value host configurations, run before the
//! list reaches a builder or manager. The checks catch authoring mistakes
//! that would otherwise surface later as registry errors.

use std::collections::HashSet;

use crate::config::schema::{ValueHostConfig, ValueHostType};
use crate::error::{Error, Result};

/// Validates value host configuration lists.
///
/// # Examples
///
/// ```
/// use formwork::config::{ConfigValidator, ValueHostConfig, ValueHostType};
///
/// let configs = vec![
///     ValueHostConfig::new("total", ValueHostType::Calc).with_calc_fn("sum"),
///     ValueHostConfig::new("email", ValueHostType::Input),
/// ];
/// ConfigValidator::validate(&configs).unwrap();
///
/// let missing_fn = vec![ValueHostConfig::new("total", ValueHostType::Calc)];
/// assert!(ConfigValidator::validate(&missing_fn).is_err());
/// ```
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate a list of value host configurations.
    ///
    /// Checks that names are non-empty and unique, calculated value hosts
    /// name a calculation function, every validator has a condition, and no
    /// error code appears twice on one value host.
    ///
    /// # Errors
    ///
    /// Returns the first validation error found.
    pub fn validate(configs: &[ValueHostConfig]) -> Result<()> {
        let mut seen_names = HashSet::new();
        for (i, config) in configs.iter().enumerate() {
            Self::validate_name(i, &config.name)?;
            if !seen_names.insert(config.name.as_str()) {
                return Err(Error::Validation {
                    field: format!("valueHostConfigs[{i}].name"),
                    message: format!("Duplicate value host name: {}", config.name),
                });
            }
            Self::validate_value_host(config)?;
        }
        Ok(())
    }

    /// Collects every validation error instead of stopping at the first.
    #[must_use]
    pub fn collect_errors(configs: &[ValueHostConfig]) -> Vec<Error> {
        let mut errors = Vec::new();
        let mut seen_names = HashSet::new();
        for (i, config) in configs.iter().enumerate() {
            if let Err(err) = Self::validate_name(i, &config.name) {
                errors.push(err);
                continue;
            }
            if !seen_names.insert(config.name.as_str()) {
                errors.push(Error::Validation {
                    field: format!("valueHostConfigs[{i}].name"),
                    message: format!("Duplicate value host name: {}", config.name),
                });
            }
            if let Err(err) = Self::validate_value_host(config) {
                errors.push(err);
            }
        }
        errors
    }

    fn validate_name(index: usize, name: &str) -> Result<()> {
        if name.trim().is_empty() {
            return Err(Error::Validation {
                field: format!("valueHostConfigs[{index}].name"),
                message: "Cannot be empty or only whitespace".into(),
            });
        }
        Ok(())
    }

    fn validate_value_host(config: &ValueHostConfig) -> Result<()> {
        let name = &config.name;
        if config.value_host_type == ValueHostType::Calc
            && !config
                .calc_fn
                .as_deref()
                .is_some_and(|f| !f.trim().is_empty())
        {
            return Err(Error::Validation {
                field: format!("{name}.calcFn"),
                message: "Calculated value hosts require a calculation function".into(),
            });
        }

        let mut seen_codes = HashSet::new();
        for (i, validator) in config.validators().iter().enumerate() {
            if validator.condition_config.is_none() {
                return Err(Error::Validation {
                    field: format!("{name}.validatorConfigs[{i}]"),
                    message: "Validator has no condition".into(),
                });
            }
            if let Some(code) = validator.effective_error_code() {
                if !seen_codes.insert(code) {
                    return Err(Error::Validation {
                        field: format!("{name}.validatorConfigs[{i}].errorCode"),
                        message: format!("Duplicate error code: {code}"),
                    });
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::{ConditionConfig, ValidatorConfig};

    fn input_with(validators: Vec<ValidatorConfig>) -> ValueHostConfig {
        let mut config = ValueHostConfig::new("email", ValueHostType::Input);
        config.validator_configs = Some(validators);
        config
    }

    #[test]
    fn test_validate_empty_list() {
        assert!(ConfigValidator::validate(&[]).is_ok());
    }

    #[test]
    fn test_validate_empty_name() {
        let result = ConfigValidator::validate(&[ValueHostConfig::new("  ", ValueHostType::Static)]);
        assert!(matches!(result, Err(Error::Validation { .. })));
    }

    #[test]
    fn test_validate_duplicate_name() {
        let configs = vec![
            ValueHostConfig::new("a", ValueHostType::Static),
            ValueHostConfig::new("a", ValueHostType::Input),
        ];
        let err = ConfigValidator::validate(&configs).unwrap_err();
        assert!(err.to_string().contains("Duplicate value host name"));
    }

    #[test]
    fn test_validate_calc_without_function() {
        let mut config = ValueHostConfig::new("total", ValueHostType::Calc);
        assert!(ConfigValidator::validate(std::slice::from_ref(&config)).is_err());
        config.calc_fn = Some(" ".into());
        assert!(ConfigValidator::validate(std::slice::from_ref(&config)).is_err());
        config.calc_fn = Some("sum".into());
        assert!(ConfigValidator::validate(std::slice::from_ref(&config)).is_ok());
    }

    #[test]
    fn test_validate_validator_without_condition() {
        let config = input_with(vec![ValidatorConfig::default()]);
        let err = ConfigValidator::validate(&[config]).unwrap_err();
        assert!(err.to_string().contains("no condition"));
    }

    #[test]
    fn test_validate_duplicate_error_code() {
        let config = input_with(vec![
            ValidatorConfig::new(ConditionConfig::new("RequireText")),
            ValidatorConfig::new(ConditionConfig::new("Regex")).with_error_code("RequireText"),
        ]);
        let err = ConfigValidator::validate(&[config]).unwrap_err();
        assert!(err.to_string().contains("Duplicate error code"));
    }

    #[test]
    fn test_validate_distinct_error_codes() {
        let config = input_with(vec![
            ValidatorConfig::new(ConditionConfig::new("Regex")).with_error_code("Phone"),
            ValidatorConfig::new(ConditionConfig::new("Regex")).with_error_code("Postcode"),
        ]);
        assert!(ConfigValidator::validate(&[config]).is_ok());
    }

    #[test]
    fn test_collect_errors_reports_all() {
        let configs = vec![
            ValueHostConfig::new("", ValueHostType::Static),
            ValueHostConfig::new("total", ValueHostType::Calc),
            ValueHostConfig::new("a", ValueHostType::Static),
            ValueHostConfig::new("a", ValueHostType::Static),
        ];
        assert_eq!(ConfigValidator::collect_errors(&configs).len(), 3);
    }
}
