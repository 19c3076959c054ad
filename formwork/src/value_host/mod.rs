//! Live value hosts.
//!
//! A value host pairs one configuration with one instance state and the
//! behavior to read and change it. Value hosts are owned exclusively by the
//! manager's registry. Callers only ever receive a [`ValueHostRef`], a weak
//! handle that stops working as soon as the registry replaces or discards
//! the host.
//!
//! Built-in kinds:
//! - [`StaticValueHost`]: a value set by the application
//! - [`CalcValueHost`]: a value computed from other value hosts
//! - [`ValidatorsValueHost`]: input and property value hosts carrying validators

pub mod calc;
pub mod factory;
pub mod static_host;
pub mod validators;

use std::any::Any;
use std::cell::RefCell;
use std::rc::{Rc, Weak};

use serde_json::Value;

use crate::config::{ValidatorConfig, ValueHostConfig, ValueHostType};
use crate::error::{Error, Result};
use crate::manager::ManagerHandle;
use crate::state::{ValidationStatus, ValueHostInstanceState};

pub use calc::{CalcContext, CalcValueHost, CalcValueHostGenerator, MAX_CALC_DEPTH};
pub use factory::{ValueHostFactory, ValueHostGenerator};
pub use static_host::{StaticValueHost, StaticValueHostGenerator};
pub use validators::{ValidatorsValueHost, ValidatorsValueHostGenerator};

/// Deterministic teardown.
///
/// After `dispose` every fallible operation of the component fails with
/// [`Error::Disposed`].
pub trait Disposable {
    /// Releases the component's internal state. Calling it again does nothing.
    fn dispose(&self);

    /// Returns whether `dispose` has run.
    fn is_disposed(&self) -> bool;
}

/// Options for changing a value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SetValueOptions {
    /// Ask dependent validatable value hosts to revalidate.
    pub validate: bool,
    /// Treat the new value as the unchanged baseline.
    pub reset: bool,
}

impl SetValueOptions {
    /// Options requesting revalidation of dependents.
    #[must_use]
    pub const fn validate() -> Self {
        Self {
            validate: true,
            reset: false,
        }
    }
}

/// Behavior shared by every live value host.
pub trait ValueHost: Disposable {
    /// The value host name.
    fn name(&self) -> Result<String>;

    /// The value host type from the configuration.
    fn value_host_type(&self) -> Result<ValueHostType>;

    /// A copy of the configuration the host was built from.
    fn config(&self) -> Result<ValueHostConfig>;

    /// The label, falling back to the name.
    fn label(&self) -> Result<String>;

    /// The data type lookup key.
    fn data_type(&self) -> Result<Option<String>>;

    /// The current native value.
    fn value(&self) -> Result<Option<Value>>;

    /// Changes the native value.
    fn set_value(&self, value: Option<Value>, options: SetValueOptions) -> Result<()>;

    /// Whether the value changed since the baseline.
    fn is_changed(&self) -> Result<bool>;

    /// A copy of the current instance state.
    fn instance_state(&self) -> Result<ValueHostInstanceState>;

    /// The validation capability, for hosts that have it.
    fn as_validatable(&self) -> Option<&dyn ValidatableValueHost> {
        None
    }

    /// Access to the concrete type.
    fn as_any(&self) -> &dyn Any;
}

/// Capability of value hosts that carry validators.
pub trait ValidatableValueHost: ValueHost {
    /// Copies of the validator configurations.
    fn validator_configs(&self) -> Result<Vec<ValidatorConfig>>;

    /// The current validation status.
    fn validation_status(&self) -> Result<ValidationStatus>;

    /// Records a validation status, typically reported by the validator layer.
    fn set_validation_status(&self, status: ValidationStatus) -> Result<()>;

    /// Informs this host that a different value host changed its value.
    fn other_value_host_changed_notification(
        &self,
        value_host_name: &str,
        revalidate: bool,
    ) -> Result<()>;
}

/// Configuration and state owned by one live value host.
pub(crate) struct HostCore {
    pub(crate) manager: ManagerHandle,
    pub(crate) config: ValueHostConfig,
    pub(crate) state: ValueHostInstanceState,
}

/// Disposable storage for a [`HostCore`].
pub(crate) struct HostCell {
    core: RefCell<Option<HostCore>>,
}

impl HostCell {
    pub(crate) fn new(manager: ManagerHandle, config: ValueHostConfig, mut state: ValueHostInstanceState) -> Self {
        state.name.clone_from(&config.name);
        Self {
            core: RefCell::new(Some(HostCore {
                manager,
                config,
                state,
            })),
        }
    }

    pub(crate) fn read<R>(&self, f: impl FnOnce(&HostCore) -> R) -> Result<R> {
        self.core
            .borrow()
            .as_ref()
            .map(f)
            .ok_or(Error::Disposed {
                component: "value host",
            })
    }

    pub(crate) fn write<R>(&self, f: impl FnOnce(&mut HostCore) -> R) -> Result<R> {
        self.core
            .borrow_mut()
            .as_mut()
            .map(f)
            .ok_or(Error::Disposed {
                component: "value host",
            })
    }

    pub(crate) fn dispose(&self) {
        self.core.borrow_mut().take();
    }

    pub(crate) fn is_disposed(&self) -> bool {
        self.core.borrow().is_none()
    }

    pub(crate) fn name(&self) -> Result<String> {
        self.read(|core| core.config.name.clone())
    }

    pub(crate) fn value_host_type(&self) -> Result<ValueHostType> {
        self.read(|core| core.config.value_host_type.clone())
    }

    pub(crate) fn config(&self) -> Result<ValueHostConfig> {
        self.read(|core| core.config.clone())
    }

    pub(crate) fn label(&self) -> Result<String> {
        self.read(|core| {
            core.config
                .label
                .clone()
                .unwrap_or_else(|| core.config.name.clone())
        })
    }

    pub(crate) fn data_type(&self) -> Result<Option<String>> {
        self.read(|core| core.config.data_type.clone())
    }

    pub(crate) fn stored_value(&self) -> Result<Option<Value>> {
        self.read(|core| core.state.value.clone())
    }

    pub(crate) fn is_changed(&self) -> Result<bool> {
        self.read(|core| core.state.changed.unwrap_or(false))
    }

    pub(crate) fn instance_state(&self) -> Result<ValueHostInstanceState> {
        self.read(|core| core.state.clone())
    }

    pub(crate) fn manager(&self) -> Result<ManagerHandle> {
        self.read(|core| core.manager.clone())
    }

    /// Stores a new native value and reports it to the manager.
    ///
    /// `extra` runs on the state while it is being updated. No borrow is held
    /// while the manager is notified. Returns whether anything changed.
    pub(crate) fn store_value(
        &self,
        host: &dyn ValueHost,
        value: Option<Value>,
        options: SetValueOptions,
        extra: impl FnOnce(&mut ValueHostInstanceState),
    ) -> Result<bool> {
        let update = self.write(|core| {
            if core.state.value == value && !options.reset {
                return None;
            }
            let old = std::mem::replace(&mut core.state.value, value);
            core.state.changed = Some(!options.reset);
            extra(&mut core.state);
            Some((core.manager.clone(), old, core.state.clone()))
        })?;

        let Some((manager, old, state)) = update else {
            return Ok(false);
        };
        manager.notify_value_host_instance_state_changed(host, &state)?;
        manager.notify_value_changed(host, old.as_ref())?;
        manager.notify_other_value_hosts_of_value_change(&state.name, options.validate)?;
        Ok(true)
    }
}

/// Weak handle to a registry-owned value host.
///
/// Every method fails with [`Error::Disposed`] once the registry has
/// replaced or discarded the host, or the manager was disposed.
///
/// # Examples
///
/// ```
/// use std::rc::Rc;
/// use formwork::config::{ManagerConfig, ValueHostConfig, ValueHostType};
/// use formwork::services::ValidationServices;
/// use formwork::value_host::SetValueOptions;
/// use formwork::ValueHostsManager;
/// use serde_json::json;
///
/// let services = Rc::new(ValidationServices::new());
/// let manager = ValueHostsManager::new(
///     ManagerConfig::new(services).with_value_host(ValueHostConfig::new("age", ValueHostType::Static)),
/// )
/// .unwrap();
///
/// let age = manager.get_value_host("age").unwrap().unwrap();
/// age.set_value(Some(json!(30)), SetValueOptions::default()).unwrap();
/// assert_eq!(age.value().unwrap(), Some(json!(30)));
///
/// manager.discard_value_host("age").unwrap();
/// assert!(age.value().is_err());
/// ```
#[derive(Clone)]
pub struct ValueHostRef {
    host: Weak<dyn ValueHost>,
}

impl ValueHostRef {
    pub(crate) fn new(host: &Rc<dyn ValueHost>) -> Self {
        Self {
            host: Rc::downgrade(host),
        }
    }

    fn upgrade(&self) -> Result<Rc<dyn ValueHost>> {
        self.host.upgrade().ok_or(Error::Disposed {
            component: "value host",
        })
    }

    /// Returns whether the handle still reaches a live host.
    #[must_use]
    pub fn is_live(&self) -> bool {
        self.host
            .upgrade()
            .is_some_and(|host| !host.is_disposed())
    }

    /// Runs `f` against the live host.
    ///
    /// # Errors
    ///
    /// Returns `Disposed` if the host is gone.
    pub fn with<R>(&self, f: impl FnOnce(&dyn ValueHost) -> R) -> Result<R> {
        let host = self.upgrade()?;
        Ok(f(host.as_ref()))
    }

    /// Runs `f` against the live host as its concrete type.
    ///
    /// # Errors
    ///
    /// Returns `Disposed` if the host is gone, or `WrongValueHostType` if it
    /// is not a `T`.
    pub fn with_as<T: 'static, R>(&self, f: impl FnOnce(&T) -> R) -> Result<R> {
        let host = self.upgrade()?;
        match host.as_any().downcast_ref::<T>() {
            Some(concrete) => Ok(f(concrete)),
            None => Err(Error::WrongValueHostType {
                name: host.name()?,
                expected: std::any::type_name::<T>()
                    .rsplit("::")
                    .next()
                    .unwrap_or_default()
                    .to_string(),
                actual: host.value_host_type()?.to_string(),
            }),
        }
    }

    /// See [`ValueHost::name`].
    ///
    /// # Errors
    ///
    /// Returns `Disposed` if the host is gone.
    pub fn name(&self) -> Result<String> {
        self.upgrade()?.name()
    }

    /// See [`ValueHost::value_host_type`].
    ///
    /// # Errors
    ///
    /// Returns `Disposed` if the host is gone.
    pub fn value_host_type(&self) -> Result<ValueHostType> {
        self.upgrade()?.value_host_type()
    }

    /// See [`ValueHost::config`].
    ///
    /// # Errors
    ///
    /// Returns `Disposed` if the host is gone.
    pub fn config(&self) -> Result<ValueHostConfig> {
        self.upgrade()?.config()
    }

    /// See [`ValueHost::label`].
    ///
    /// # Errors
    ///
    /// Returns `Disposed` if the host is gone.
    pub fn label(&self) -> Result<String> {
        self.upgrade()?.label()
    }

    /// See [`ValueHost::data_type`].
    ///
    /// # Errors
    ///
    /// Returns `Disposed` if the host is gone.
    pub fn data_type(&self) -> Result<Option<String>> {
        self.upgrade()?.data_type()
    }

    /// See [`ValueHost::value`].
    ///
    /// # Errors
    ///
    /// Returns `Disposed` if the host is gone, or the calculation error of a
    /// calculated host.
    pub fn value(&self) -> Result<Option<Value>> {
        self.upgrade()?.value()
    }

    /// See [`ValueHost::set_value`].
    ///
    /// # Errors
    ///
    /// Returns `Disposed` if the host is gone, or `Unsupported` for
    /// calculated hosts.
    pub fn set_value(&self, value: Option<Value>, options: SetValueOptions) -> Result<()> {
        self.upgrade()?.set_value(value, options)
    }

    /// See [`ValueHost::is_changed`].
    ///
    /// # Errors
    ///
    /// Returns `Disposed` if the host is gone.
    pub fn is_changed(&self) -> Result<bool> {
        self.upgrade()?.is_changed()
    }

    /// See [`ValueHost::instance_state`].
    ///
    /// # Errors
    ///
    /// Returns `Disposed` if the host is gone.
    pub fn instance_state(&self) -> Result<ValueHostInstanceState> {
        self.upgrade()?.instance_state()
    }

    /// Returns whether the host carries validators.
    ///
    /// # Errors
    ///
    /// Returns `Disposed` if the host is gone.
    pub fn is_validatable(&self) -> Result<bool> {
        Ok(self.upgrade()?.as_validatable().is_some())
    }

    /// The validation status of a validatable host.
    ///
    /// # Errors
    ///
    /// Returns `Disposed` if the host is gone, or `WrongValueHostType` if
    /// it carries no validators.
    pub fn validation_status(&self) -> Result<ValidationStatus> {
        let host = self.upgrade()?;
        match host.as_validatable() {
            Some(validatable) => validatable.validation_status(),
            None => Err(Error::WrongValueHostType {
                name: host.name()?,
                expected: "validatable".to_string(),
                actual: host.value_host_type()?.to_string(),
            }),
        }
    }

    /// The input value of an input value host.
    ///
    /// # Errors
    ///
    /// Returns `Disposed` if the host is gone, or `WrongValueHostType` if it
    /// is not an input value host.
    pub fn input_value(&self) -> Result<Option<Value>> {
        self.with_as(ValidatorsValueHost::input_value)?
    }

    /// Changes the input value of an input value host.
    ///
    /// # Errors
    ///
    /// Returns `Disposed` if the host is gone, or `WrongValueHostType` if it
    /// is not an input value host.
    pub fn set_input_value(&self, value: Option<Value>, options: SetValueOptions) -> Result<()> {
        self.with_as(|host: &ValidatorsValueHost| host.set_input_value(value, options))?
    }
}

impl std::fmt::Debug for ValueHostRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.name() {
            Ok(name) => write!(f, "ValueHostRef({name})"),
            Err(_) => write!(f, "ValueHostRef(<disposed>)"),
        }
    }
}
