//! Value host configuration merging.
//!
//! This module reconciles two configurations that describe the same value
//! host, such as a business-logic declaration and a UI-layer override of it.
//! Merging is field-by-field: the source overwrites what it specifies and the
//! destination keeps everything else. Validators are matched by error code so
//! an override can adjust one rule without restating the others.

use crate::config::schema::{property_names, ValidatorConfig, ValueHostConfig};

/// Identifies and merges conflicting value host configurations.
///
/// Implementations are installed in the services bag and used by config
/// builders, config modifiers and the manager.
pub trait ValueHostConfigMergeService {
    /// Finds the configuration in `existing` that has the same identity as
    /// `candidate`, returning its index.
    fn identify_value_host_conflict(
        &self,
        candidate: &ValueHostConfig,
        existing: &[ValueHostConfig],
    ) -> Option<usize>;

    /// Merges `source` into `destination` in place.
    fn merge(&self, source: &ValueHostConfig, destination: &mut ValueHostConfig);

    /// Serialized names of properties that are never overwritten once set.
    fn no_change_property_names(&self) -> &[String];
}

/// Default merge service.
///
/// # Merging Rules
///
/// - Identity: equal `name`
/// - Simple fields: source overwrites if Some
/// - No-change fields: written only when the destination lacks them
/// - Validators: matched by effective error code and merged field-by-field;
///   unmatched source validators are appended in order
/// - Extra fields: merged per key
///
/// # Examples
///
/// ```
/// use formwork::config::{ConfigMerger, ValueHostConfig, ValueHostConfigMergeService, ValueHostType};
///
/// let merger = ConfigMerger::new();
/// let mut business = ValueHostConfig::new("age", ValueHostType::Input).with_label("Age");
/// let ui = ValueHostConfig::new("age", ValueHostType::Input).with_label("Your age");
///
/// merger.merge(&ui, &mut business);
/// assert_eq!(business.label.as_deref(), Some("Your age"));
/// ```
#[derive(Debug, Clone)]
pub struct ConfigMerger {
    no_change: Vec<String>,
}

impl ConfigMerger {
    /// Creates a merger with the default no-change properties
    /// (`valueHostType` and `dataType`).
    #[must_use]
    pub fn new() -> Self {
        Self::with_no_change_properties(vec![
            property_names::VALUE_HOST_TYPE.to_string(),
            property_names::DATA_TYPE.to_string(),
        ])
    }

    /// Creates a merger with an explicit list of no-change properties.
    #[must_use]
    pub fn with_no_change_properties(no_change: Vec<String>) -> Self {
        Self { no_change }
    }

    fn is_no_change(&self, property: &str) -> bool {
        self.no_change.iter().any(|p| p == property)
    }

    /// Whether `source` may write `property` into `destination`.
    fn may_write(&self, property: &str, destination: &ValueHostConfig) -> bool {
        !(self.is_no_change(property) && destination.has_property(property))
    }

    /// Merge validators by effective error code.
    fn merge_validators(source: &[ValidatorConfig], destination: &mut Vec<ValidatorConfig>) {
        for validator in source {
            let existing = validator.effective_error_code().and_then(|code| {
                destination
                    .iter_mut()
                    .find(|d| d.effective_error_code() == Some(code))
            });
            match existing {
                Some(target) => Self::merge_validator(validator, target),
                None => destination.push(validator.clone()),
            }
        }
    }

    /// Merge one validator. Source values take precedence over target values.
    fn merge_validator(source: &ValidatorConfig, target: &mut ValidatorConfig) {
        // A replaced condition must not change the identity the match was made on.
        let matched_code = target.effective_error_code().map(ToString::to_string);

        if source.condition_config.is_some() {
            target.condition_config.clone_from(&source.condition_config);
            if target.error_code.is_none() {
                target.error_code = matched_code;
            }
        }
        if source.error_code.is_some() {
            target.error_code.clone_from(&source.error_code);
        }
        if source.error_message.is_some() {
            target.error_message.clone_from(&source.error_message);
        }
        if source.error_message_l10n.is_some() {
            target.error_message_l10n.clone_from(&source.error_message_l10n);
        }
        if source.summary_message.is_some() {
            target.summary_message.clone_from(&source.summary_message);
        }
        if source.summary_message_l10n.is_some() {
            target
                .summary_message_l10n
                .clone_from(&source.summary_message_l10n);
        }
        if source.severity.is_some() {
            target.severity = source.severity;
        }
        if source.enabled.is_some() {
            target.enabled = source.enabled;
        }
    }
}

impl Default for ConfigMerger {
    fn default() -> Self {
        Self::new()
    }
}

impl ValueHostConfigMergeService for ConfigMerger {
    fn identify_value_host_conflict(
        &self,
        candidate: &ValueHostConfig,
        existing: &[ValueHostConfig],
    ) -> Option<usize> {
        existing.iter().position(|c| c.name == candidate.name)
    }

    fn merge(&self, source: &ValueHostConfig, destination: &mut ValueHostConfig) {
        if self.may_write(property_names::VALUE_HOST_TYPE, destination) {
            destination.value_host_type = source.value_host_type.clone();
        }

        if source.data_type.is_some() && self.may_write(property_names::DATA_TYPE, destination) {
            destination.data_type.clone_from(&source.data_type);
        }

        if source.label.is_some() && self.may_write(property_names::LABEL, destination) {
            destination.label.clone_from(&source.label);
        }

        if source.label_l10n.is_some() && self.may_write(property_names::LABEL_L10N, destination) {
            destination.label_l10n.clone_from(&source.label_l10n);
        }

        if source.initial_value.is_some()
            && self.may_write(property_names::INITIAL_VALUE, destination)
        {
            destination.initial_value.clone_from(&source.initial_value);
        }

        if source.calc_fn.is_some() && self.may_write(property_names::CALC_FN, destination) {
            destination.calc_fn.clone_from(&source.calc_fn);
        }

        if let Some(source_validators) = &source.validator_configs {
            if self.may_write(property_names::VALIDATOR_CONFIGS, destination) {
                Self::merge_validators(source_validators, destination.validators_mut());
            }
        }

        for (key, value) in &source.extras {
            if self.may_write(key, destination) {
                destination.extras.insert(key.clone(), value.clone());
            }
        }
    }

    fn no_change_property_names(&self) -> &[String] {
        &self.no_change
    }
}
