//! Manager-level configuration.
//!
//! A [`ManagerConfig`] is everything a [`ValueHostsManager`] is constructed
//! from: the services bag, the value host configurations, previously saved
//! state, and optional notification handlers. Cloning it deep-copies the
//! configurations and states but shares the services bag and handlers.
//!
//! [`ValueHostsManager`]: crate::manager::ValueHostsManager

use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::schema::ValueHostConfig;
use crate::services::ValidationServices;
use crate::state::{ManagerInstanceState, ManagerStateSnapshot, ValidationStatus, ValueHostInstanceState};
use crate::value_host::ValueHost;

/// Receives clones of every registered configuration after a configuration change.
pub type ConfigChangedHandler = Rc<dyn Fn(Vec<ValueHostConfig>)>;

/// Receives a value host and its new instance state.
pub type ValueHostInstanceStateChangedHandler = Rc<dyn Fn(&dyn ValueHost, &ValueHostInstanceState)>;

/// Receives a value host and its previous value.
pub type ValueChangedHandler = Rc<dyn Fn(&dyn ValueHost, Option<&Value>)>;

/// Receives the new manager-level instance state.
pub type ManagerInstanceStateChangedHandler = Rc<dyn Fn(&ManagerInstanceState)>;

/// Receives a validatable value host and its new validation status.
pub type ValidationStatusChangedHandler = Rc<dyn Fn(&dyn ValueHost, ValidationStatus)>;

/// Optional notification handlers. Absent handlers are silently skipped.
#[derive(Clone, Default)]
pub struct ManagerCallbacks {
    /// Fired after a value host is added, replaced or discarded.
    pub on_config_changed: Option<ConfigChangedHandler>,
    /// Fired when a value host's instance state changes.
    pub on_value_host_instance_state_changed: Option<ValueHostInstanceStateChangedHandler>,
    /// Fired when a value host's native value changes.
    pub on_value_changed: Option<ValueChangedHandler>,
    /// Fired when an input value host's input value changes.
    pub on_input_value_changed: Option<ValueChangedHandler>,
    /// Fired when the manager-level instance state changes.
    pub on_instance_state_changed: Option<ManagerInstanceStateChangedHandler>,
    /// Fired when a validatable value host's validation status changes.
    pub on_validation_status_changed: Option<ValidationStatusChangedHandler>,
}

impl fmt::Debug for ManagerCallbacks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ManagerCallbacks")
            .field("on_config_changed", &self.on_config_changed.is_some())
            .field(
                "on_value_host_instance_state_changed",
                &self.on_value_host_instance_state_changed.is_some(),
            )
            .field("on_value_changed", &self.on_value_changed.is_some())
            .field("on_input_value_changed", &self.on_input_value_changed.is_some())
            .field("on_instance_state_changed", &self.on_instance_state_changed.is_some())
            .field(
                "on_validation_status_changed",
                &self.on_validation_status_changed.is_some(),
            )
            .finish()
    }
}

/// Configuration of a value hosts manager.
///
/// `services` and `callbacks` are not serialized. A configuration read from a
/// file has no services until one is attached with [`ManagerConfig::with_services`].
///
/// # Examples
///
/// ```
/// use std::rc::Rc;
/// use formwork::config::{ManagerConfig, ValueHostConfig, ValueHostType};
/// use formwork::services::ValidationServices;
///
/// let services = Rc::new(ValidationServices::new());
/// let config = ManagerConfig::new(services)
///     .with_value_host(ValueHostConfig::new("age", ValueHostType::Static));
/// assert_eq!(config.value_host_configs.len(), 1);
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManagerConfig {
    /// Shared services bag.
    #[serde(skip)]
    pub services: Option<Rc<ValidationServices>>,

    /// Value host configurations, in declaration order.
    #[serde(default)]
    pub value_host_configs: Vec<ValueHostConfig>,

    /// Manager-level state from a previous manager.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub saved_instance_state: Option<ManagerInstanceState>,

    /// Per value host state from a previous manager, matched by name.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub saved_value_host_instance_states: Vec<ValueHostInstanceState>,

    /// Notification handlers.
    #[serde(skip)]
    pub callbacks: ManagerCallbacks,
}

impl ManagerConfig {
    /// Creates an empty configuration bound to a services bag.
    #[must_use]
    pub fn new(services: Rc<ValidationServices>) -> Self {
        Self {
            services: Some(services),
            ..Default::default()
        }
    }

    /// Attaches a services bag.
    #[must_use]
    pub fn with_services(mut self, services: Rc<ValidationServices>) -> Self {
        self.services = Some(services);
        self
    }

    /// Appends a value host configuration.
    #[must_use]
    pub fn with_value_host(mut self, config: ValueHostConfig) -> Self {
        self.value_host_configs.push(config);
        self
    }

    /// Seeds saved state from a snapshot taken from an earlier manager.
    #[must_use]
    pub fn with_snapshot(mut self, snapshot: ManagerStateSnapshot) -> Self {
        self.saved_instance_state = Some(snapshot.instance_state);
        self.saved_value_host_instance_states = snapshot.value_host_instance_states;
        self
    }

    /// Returns the services bag.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if no services are attached.
    pub fn require_services(&self) -> crate::Result<Rc<ValidationServices>> {
        self.services.clone().ok_or_else(|| crate::Error::Configuration {
            reason: "a services object is required".to_string(),
        })
    }
}
