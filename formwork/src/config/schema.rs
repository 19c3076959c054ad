//! Configuration schema definitions.
//!
//! This module defines the plain-data descriptions from which value hosts are
//! built: value host configurations, the validators they carry, and the
//! condition configurations those validators wrap. None of these types have
//! behavior beyond construction helpers, so they can be cloned, compared and
//! persisted freely.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Value host configurations keyed by value host name.
pub type ConfigMap = BTreeMap<String, ValueHostConfig>;

/// Serialized property names of [`ValueHostConfig`].
///
/// Merge services refer to configuration fields by these names, for example
/// in their list of properties that must never be overwritten.
pub mod property_names {
    /// `ValueHostConfig::name`
    pub const NAME: &str = "name";
    /// `ValueHostConfig::value_host_type`
    pub const VALUE_HOST_TYPE: &str = "valueHostType";
    /// `ValueHostConfig::data_type`
    pub const DATA_TYPE: &str = "dataType";
    /// `ValueHostConfig::label`
    pub const LABEL: &str = "label";
    /// `ValueHostConfig::label_l10n`
    pub const LABEL_L10N: &str = "labelL10n";
    /// `ValueHostConfig::initial_value`
    pub const INITIAL_VALUE: &str = "initialValue";
    /// `ValueHostConfig::calc_fn`
    pub const CALC_FN: &str = "calcFn";
    /// `ValueHostConfig::validator_configs`
    pub const VALIDATOR_CONFIGS: &str = "validatorConfigs";
}

/// Well-known condition types used when combining rules.
pub mod condition_types {
    /// Every child condition must succeed.
    pub const ALL: &str = "All";
    /// At least one child condition must succeed.
    pub const ANY: &str = "Any";
    /// The child condition is only evaluated when the enabler succeeds.
    pub const WHEN: &str = "When";
}

/// Discriminator selecting which kind of value host a configuration builds.
///
/// Unknown names are kept as [`ValueHostType::Other`] so applications can
/// register generators for their own value host types.
///
/// # Examples
///
/// ```
/// use formwork::config::ValueHostType;
///
/// assert_eq!(ValueHostType::from("Input"), ValueHostType::Input);
/// assert_eq!(ValueHostType::Calc.to_string(), "Calc");
/// assert_eq!(
///     ValueHostType::from("Signature"),
///     ValueHostType::Other("Signature".to_string())
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ValueHostType {
    /// Holds a value that is set directly by the application.
    #[default]
    Static,
    /// Computes its value from other value hosts.
    Calc,
    /// Backs an editor in the UI; carries validators and an input value.
    Input,
    /// Backs a model property; carries validators but no input value.
    Property,
    /// An application-defined value host type.
    Other(String),
}

impl ValueHostType {
    /// Returns the serialized name of this type.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Static => "Static",
            Self::Calc => "Calc",
            Self::Input => "Input",
            Self::Property => "Property",
            Self::Other(name) => name,
        }
    }
}

impl From<String> for ValueHostType {
    fn from(value: String) -> Self {
        match value.as_str() {
            "Static" => Self::Static,
            "Calc" => Self::Calc,
            "Input" => Self::Input,
            "Property" => Self::Property,
            _ => Self::Other(value),
        }
    }
}

impl From<&str> for ValueHostType {
    fn from(value: &str) -> Self {
        Self::from(value.to_string())
    }
}

impl From<ValueHostType> for String {
    fn from(value: ValueHostType) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for ValueHostType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Plain-data description of one value host.
///
/// The `name` is the identity of the configuration and is unique among the
/// configurations active in one manager.
///
/// # Examples
///
/// ```
/// use formwork::config::{ValueHostConfig, ValueHostType};
/// use serde_json::json;
///
/// let config = ValueHostConfig::new("age", ValueHostType::Static)
///     .with_data_type("Integer")
///     .with_initial_value(json!(21));
/// assert_eq!(config.name, "age");
/// assert_eq!(config.data_type.as_deref(), Some("Integer"));
/// ```
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValueHostConfig {
    /// Unique name of the value host.
    pub name: String,

    /// Kind of value host to build.
    #[serde(default)]
    pub value_host_type: ValueHostType,

    /// Data type lookup key used by conversion and formatting services.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_type: Option<String>,

    /// Label shown to users.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,

    /// Localization key for the label.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label_l10n: Option<String>,

    /// Value used for new instance state.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initial_value: Option<Value>,

    /// Name of a registered calculation function (calculated value hosts).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub calc_fn: Option<String>,

    /// Ordered validators (input and property value hosts).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validator_configs: Option<Vec<ValidatorConfig>>,

    /// Additional fields understood by custom value hosts.
    #[serde(flatten)]
    pub extras: BTreeMap<String, Value>,
}

impl ValueHostConfig {
    /// Creates a configuration with only a name and a type.
    #[must_use]
    pub fn new(name: impl Into<String>, value_host_type: ValueHostType) -> Self {
        Self {
            name: name.into(),
            value_host_type,
            ..Default::default()
        }
    }

    /// Sets the data type lookup key.
    #[must_use]
    pub fn with_data_type(mut self, data_type: impl Into<String>) -> Self {
        self.data_type = Some(data_type.into());
        self
    }

    /// Sets the label.
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Sets the initial value.
    #[must_use]
    pub fn with_initial_value(mut self, value: Value) -> Self {
        self.initial_value = Some(value);
        self
    }

    /// Sets the calculation function name.
    #[must_use]
    pub fn with_calc_fn(mut self, calc_fn: impl Into<String>) -> Self {
        self.calc_fn = Some(calc_fn.into());
        self
    }

    /// Appends a validator.
    #[must_use]
    pub fn with_validator(mut self, validator: ValidatorConfig) -> Self {
        self.validators_mut().push(validator);
        self
    }

    /// Sets an additional field.
    #[must_use]
    pub fn with_extra(mut self, key: impl Into<String>, value: Value) -> Self {
        self.extras.insert(key.into(), value);
        self
    }

    /// Returns the validators, or an empty slice when none are configured.
    #[must_use]
    pub fn validators(&self) -> &[ValidatorConfig] {
        self.validator_configs.as_deref().unwrap_or_default()
    }

    /// Returns the validator list, creating it if absent.
    pub fn validators_mut(&mut self) -> &mut Vec<ValidatorConfig> {
        self.validator_configs.get_or_insert_with(Vec::new)
    }

    /// Finds a validator by its effective error code.
    #[must_use]
    pub fn find_validator(&self, error_code: &str) -> Option<&ValidatorConfig> {
        self.validators()
            .iter()
            .find(|v| v.effective_error_code() == Some(error_code))
    }

    /// Finds a validator by its effective error code for mutation.
    pub fn find_validator_mut(&mut self, error_code: &str) -> Option<&mut ValidatorConfig> {
        self.validator_configs
            .as_mut()?
            .iter_mut()
            .find(|v| v.effective_error_code() == Some(error_code))
    }

    /// Returns whether the named property holds a value.
    ///
    /// `name` and `valueHostType` always hold a value.
    #[must_use]
    pub fn has_property(&self, property: &str) -> bool {
        match property {
            property_names::NAME | property_names::VALUE_HOST_TYPE => true,
            property_names::DATA_TYPE => self.data_type.is_some(),
            property_names::LABEL => self.label.is_some(),
            property_names::LABEL_L10N => self.label_l10n.is_some(),
            property_names::INITIAL_VALUE => self.initial_value.is_some(),
            property_names::CALC_FN => self.calc_fn.is_some(),
            property_names::VALIDATOR_CONFIGS => self.validator_configs.is_some(),
            other => self.extras.contains_key(other),
        }
    }
}

/// Severity assigned to a validator's issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ValidatorSeverity {
    /// Blocks saving.
    Error,
    /// Blocks saving and stops evaluating the remaining validators.
    Severe,
    /// Reported but does not block saving.
    Warning,
}

/// Plain-data description of one validator on an input or property value host.
///
/// # Examples
///
/// ```
/// use formwork::config::{ConditionConfig, ValidatorConfig};
///
/// let validator = ValidatorConfig::new(ConditionConfig::new("RequireText"))
///     .with_error_message("Required");
/// assert_eq!(validator.effective_error_code(), Some("RequireText"));
/// ```
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidatorConfig {
    /// The rule evaluated by this validator.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition_config: Option<ConditionConfig>,

    /// Identifies the validator; defaults to the condition type.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,

    /// Inline error message template.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,

    /// Localization key for the error message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message_l10n: Option<String>,

    /// Inline summary message template.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary_message: Option<String>,

    /// Localization key for the summary message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary_message_l10n: Option<String>,

    /// Severity of the validator's issues.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub severity: Option<ValidatorSeverity>,

    /// When `Some(false)`, the validator is skipped.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
}

impl ValidatorConfig {
    /// Creates a validator wrapping a condition.
    #[must_use]
    pub fn new(condition: ConditionConfig) -> Self {
        Self {
            condition_config: Some(condition),
            ..Default::default()
        }
    }

    /// Sets the error code.
    #[must_use]
    pub fn with_error_code(mut self, error_code: impl Into<String>) -> Self {
        self.error_code = Some(error_code.into());
        self
    }

    /// Sets the inline error message.
    #[must_use]
    pub fn with_error_message(mut self, message: impl Into<String>) -> Self {
        self.error_message = Some(message.into());
        self
    }

    /// Sets the inline summary message.
    #[must_use]
    pub fn with_summary_message(mut self, message: impl Into<String>) -> Self {
        self.summary_message = Some(message.into());
        self
    }

    /// The error code identifying this validator.
    ///
    /// Uses `error_code` when set, else the condition type.
    #[must_use]
    pub fn effective_error_code(&self) -> Option<&str> {
        self.error_code
            .as_deref()
            .or_else(|| self.condition_config.as_ref().map(|c| c.condition_type.as_str()))
    }

    /// Returns whether an inline error or summary message is present.
    #[must_use]
    pub fn has_inline_messages(&self) -> bool {
        self.error_message.is_some() || self.summary_message.is_some()
    }

    /// Removes every message-related field.
    pub fn clear_messages(&mut self) {
        self.error_message = None;
        self.error_message_l10n = None;
        self.summary_message = None;
        self.summary_message_l10n = None;
    }
}

/// Plain-data description of a condition.
///
/// Conditions are evaluated by an external condition layer; this crate only
/// stores, merges and combines their configurations.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConditionConfig {
    /// Name of the condition implementation.
    pub condition_type: String,

    /// Value host the condition reads, when not the owning value host.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_host_name: Option<String>,

    /// Second value host compared against.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub second_value_host_name: Option<String>,

    /// Children of `All`/`Any` conditions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition_configs: Option<Vec<ConditionConfig>>,

    /// Child of a `When` condition.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub child_config: Option<Box<ConditionConfig>>,

    /// Enabler of a `When` condition.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabler_config: Option<Box<ConditionConfig>>,

    /// Condition-specific settings.
    #[serde(flatten)]
    pub properties: BTreeMap<String, Value>,
}

impl ConditionConfig {
    /// Creates a condition configuration of the given type.
    #[must_use]
    pub fn new(condition_type: impl Into<String>) -> Self {
        Self {
            condition_type: condition_type.into(),
            ..Default::default()
        }
    }

    /// Sets the value host the condition reads.
    #[must_use]
    pub fn with_value_host_name(mut self, name: impl Into<String>) -> Self {
        self.value_host_name = Some(name.into());
        self
    }

    /// Sets the second value host the condition compares against.
    #[must_use]
    pub fn with_second_value_host_name(mut self, name: impl Into<String>) -> Self {
        self.second_value_host_name = Some(name.into());
        self
    }

    /// Sets a condition-specific property.
    #[must_use]
    pub fn with_property(mut self, key: impl Into<String>, value: Value) -> Self {
        self.properties.insert(key.into(), value);
        self
    }

    /// An `All` condition over the given children.
    #[must_use]
    pub fn all(children: Vec<ConditionConfig>) -> Self {
        Self {
            condition_configs: Some(children),
            ..Self::new(condition_types::ALL)
        }
    }

    /// An `Any` condition over the given children.
    #[must_use]
    pub fn any(children: Vec<ConditionConfig>) -> Self {
        Self {
            condition_configs: Some(children),
            ..Self::new(condition_types::ANY)
        }
    }

    /// A `When` condition: `child` is evaluated only when `enabler` succeeds.
    #[must_use]
    pub fn when(enabler: ConditionConfig, child: ConditionConfig) -> Self {
        Self {
            enabler_config: Some(Box::new(enabler)),
            child_config: Some(Box::new(child)),
            ..Self::new(condition_types::WHEN)
        }
    }

    /// Collects every value host name referenced anywhere in this condition tree.
    pub fn gather_value_host_names(&self, names: &mut BTreeSet<String>) {
        names.extend(self.value_host_name.iter().cloned());
        names.extend(self.second_value_host_name.iter().cloned());
        for child in self.condition_configs.iter().flatten() {
            child.gather_value_host_names(names);
        }
        if let Some(child) = &self.child_config {
            child.gather_value_host_names(names);
        }
        if let Some(enabler) = &self.enabler_config {
            enabler.gather_value_host_names(names);
        }
    }
}

/// Partial update of a static or calculated value host configuration.
///
/// Name and type are supplied separately by the updater, which keeps them
/// from the existing configuration.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigPatch {
    /// New data type lookup key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_type: Option<String>,
    /// New label.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// New label localization key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label_l10n: Option<String>,
    /// New initial value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initial_value: Option<Value>,
    /// New calculation function name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub calc_fn: Option<String>,
    /// New additional fields.
    #[serde(flatten)]
    pub extras: BTreeMap<String, Value>,
}

impl ConfigPatch {
    /// Removes every field whose serialized name is listed.
    pub fn strip(&mut self, property_names: &[String]) {
        for property in property_names {
            match property.as_str() {
                property_names::DATA_TYPE => self.data_type = None,
                property_names::LABEL => self.label = None,
                property_names::LABEL_L10N => self.label_l10n = None,
                property_names::INITIAL_VALUE => self.initial_value = None,
                property_names::CALC_FN => self.calc_fn = None,
                other => {
                    self.extras.remove(other);
                }
            }
        }
    }

    /// Builds a complete configuration from this patch.
    #[must_use]
    pub fn into_config(self, name: &str, value_host_type: ValueHostType) -> ValueHostConfig {
        ValueHostConfig {
            name: name.to_string(),
            value_host_type,
            data_type: self.data_type,
            label: self.label,
            label_l10n: self.label_l10n,
            initial_value: self.initial_value,
            calc_fn: self.calc_fn,
            validator_configs: None,
            extras: self.extras,
        }
    }
}
