//! Instance state types.
//!
//! Instance state is the mutable, serializable runtime data of a value host
//! or of the whole manager. The embedding application persists it between
//! manager instantiations; the manager honors whatever is handed back,
//! matched by value host name.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Validation progress of an input or property value host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ValidationStatus {
    /// Validators have not run against the current value.
    #[default]
    NotAttempted,
    /// Something the validators depend on changed since they last ran.
    NeedsValidation,
    /// The last validation succeeded.
    Valid,
    /// The last validation found issues.
    Invalid,
    /// The validators could not decide.
    Undetermined,
}

/// Mutable state of one value host.
///
/// # Examples
///
/// ```
/// use formwork::ValueHostInstanceState;
/// use serde_json::json;
///
/// let saved = ValueHostInstanceState::new("age").with_value(json!(10));
/// let defaults = ValueHostInstanceState::new("age").with_value(json!(0));
/// let effective = saved.merge_over(defaults);
/// assert_eq!(effective.value, Some(json!(10)));
/// ```
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValueHostInstanceState {
    /// Name of the value host this state belongs to.
    pub name: String,

    /// Current native value. `None` means the value is undefined.
    ///
    /// Always serialized, as `null` when undefined, so a cleared value
    /// survives a snapshot.
    #[serde(default)]
    pub value: Option<Value>,

    /// Raw value from the editor (input value hosts).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_value: Option<Value>,

    /// Validation progress (input and property value hosts).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation_status: Option<ValidationStatus>,

    /// Whether the value changed since the state was created.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub changed: Option<bool>,

    /// Additional fields kept by custom value hosts.
    #[serde(flatten)]
    pub extras: BTreeMap<String, Value>,
}

impl ValueHostInstanceState {
    /// Creates an empty state for a value host.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Sets the native value.
    #[must_use]
    pub fn with_value(mut self, value: Value) -> Self {
        self.value = Some(value);
        self
    }

    /// Overlays this state on `defaults`.
    ///
    /// `value` is always taken from this state, even when it is `None`: a
    /// cleared value stays cleared. Other fields present here win; absent
    /// ones are filled from `defaults`, so everything the defaults consider
    /// mandatory is present.
    #[must_use]
    pub fn merge_over(self, defaults: ValueHostInstanceState) -> ValueHostInstanceState {
        let mut extras = defaults.extras;
        extras.extend(self.extras);
        ValueHostInstanceState {
            name: if self.name.is_empty() {
                defaults.name
            } else {
                self.name
            },
            value: self.value,
            input_value: self.input_value.or(defaults.input_value),
            validation_status: self.validation_status.or(defaults.validation_status),
            changed: self.changed.or(defaults.changed),
            extras,
        }
    }
}

/// State scoped to the whole manager.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManagerInstanceState {
    /// Incremented on every recorded state change.
    #[serde(default)]
    pub state_change_counter: u64,

    /// Additional fields kept by the application.
    #[serde(flatten)]
    pub extras: BTreeMap<String, Value>,
}

/// Everything needed to rehydrate a manager's state.
///
/// # Examples
///
/// ```
/// use formwork::{ManagerStateSnapshot, ValueHostInstanceState};
/// use serde_json::json;
///
/// let mut snapshot = ManagerStateSnapshot::default();
/// snapshot
///     .value_host_instance_states
///     .push(ValueHostInstanceState::new("age").with_value(json!(4)));
/// let json = snapshot.to_json().unwrap();
/// let restored = ManagerStateSnapshot::from_json(&json).unwrap();
/// assert_eq!(restored, snapshot);
/// ```
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManagerStateSnapshot {
    /// Manager-level state.
    #[serde(default)]
    pub instance_state: ManagerInstanceState,

    /// Per value host state.
    #[serde(default)]
    pub value_host_instance_states: Vec<ValueHostInstanceState>,
}

impl ManagerStateSnapshot {
    /// Serializes the snapshot as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if a value cannot be represented as JSON.
    pub fn to_json(&self) -> crate::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parses a snapshot from JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not a valid snapshot.
    pub fn from_json(text: &str) -> crate::Result<Self> {
        Ok(serde_json::from_str(text)?)
    }
}
