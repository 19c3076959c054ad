//! Builder for generic value hosts managers.

use std::rc::Rc;

use serde_json::Value;

use super::{CompleteManagerConfig, ConfigBuilderBase, DeclareValueHosts};
use crate::config::{ManagerCallbacks, ManagerConfig, ValueHostConfig};
use crate::error::Result;
use crate::services::ValidationServices;
use crate::state::{ManagerInstanceState, ValueHostInstanceState};
use crate::value_host::ValueHost;

/// Config builder that also carries the manager's notification handlers.
///
/// Handler accessors read and write the configuration being built.
///
/// # Examples
///
/// ```
/// use std::cell::Cell;
/// use std::rc::Rc;
/// use formwork::builder::{DeclareValueHosts, ValueHostsManagerConfigBuilder};
/// use formwork::services::ValidationServices;
/// use formwork::ValueHostsManager;
///
/// let calls = Rc::new(Cell::new(0));
/// let seen = Rc::clone(&calls);
///
/// let mut builder = ValueHostsManagerConfigBuilder::new(Rc::new(ValidationServices::new()));
/// builder.static_host("a").unwrap();
/// builder
///     .on_config_changed(move |_| seen.set(seen.get() + 1))
///     .unwrap();
///
/// let manager = ValueHostsManager::from_builder(builder).unwrap();
/// assert_eq!(calls.get(), 0);
/// manager.discard_value_host("a").unwrap();
/// assert_eq!(calls.get(), 1);
/// ```
#[derive(Debug)]
pub struct ValueHostsManagerConfigBuilder {
    base: ConfigBuilderBase,
}

impl ValueHostsManagerConfigBuilder {
    /// Creates an empty builder bound to a services bag.
    #[must_use]
    pub fn new(services: Rc<ValidationServices>) -> Self {
        Self {
            base: ConfigBuilderBase::new(services),
        }
    }

    /// Creates a builder that continues from an existing configuration.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if `config` has no services.
    pub fn from_config(config: ManagerConfig) -> Result<Self> {
        Ok(Self {
            base: ConfigBuilderBase::from_config(config)?,
        })
    }

    /// The shared builder core.
    #[must_use]
    pub fn base(&self) -> &ConfigBuilderBase {
        &self.base
    }

    /// Mutable access to the shared builder core.
    pub fn base_mut(&mut self) -> &mut ConfigBuilderBase {
        &mut self.base
    }

    /// See [`ConfigBuilderBase::services`].
    ///
    /// # Errors
    ///
    /// Returns `Disposed` after completion or disposal.
    pub fn services(&self) -> Result<Rc<ValidationServices>> {
        self.base.services()
    }

    /// See [`ConfigBuilderBase::add_override`].
    ///
    /// # Errors
    ///
    /// Returns `Disposed` after completion or disposal.
    pub fn add_override(&mut self) -> Result<&mut Self> {
        self.base.add_override()?;
        Ok(self)
    }

    /// The notification handlers of the configuration being built.
    ///
    /// # Errors
    ///
    /// Returns `Disposed` after completion or disposal.
    pub fn callbacks(&self) -> Result<&ManagerCallbacks> {
        Ok(&self.base.manager_config()?.callbacks)
    }

    /// Mutable notification handlers of the configuration being built.
    ///
    /// # Errors
    ///
    /// Returns `Disposed` after completion or disposal.
    pub fn callbacks_mut(&mut self) -> Result<&mut ManagerCallbacks> {
        Ok(&mut self.base.manager_config_mut()?.callbacks)
    }

    /// Sets the config-changed handler. Clear handlers through
    /// [`ValueHostsManagerConfigBuilder::callbacks_mut`].
    ///
    /// # Errors
    ///
    /// Returns `Disposed` after completion or disposal.
    pub fn on_config_changed(
        &mut self,
        handler: impl Fn(Vec<ValueHostConfig>) + 'static,
    ) -> Result<&mut Self> {
        self.callbacks_mut()?.on_config_changed = Some(Rc::new(handler));
        Ok(self)
    }

    /// Sets the value host instance-state-changed handler.
    ///
    /// # Errors
    ///
    /// Returns `Disposed` after completion or disposal.
    pub fn on_value_host_instance_state_changed(
        &mut self,
        handler: impl Fn(&dyn ValueHost, &ValueHostInstanceState) + 'static,
    ) -> Result<&mut Self> {
        self.callbacks_mut()?.on_value_host_instance_state_changed = Some(Rc::new(handler));
        Ok(self)
    }

    /// Sets the value-changed handler.
    ///
    /// # Errors
    ///
    /// Returns `Disposed` after completion or disposal.
    pub fn on_value_changed(
        &mut self,
        handler: impl Fn(&dyn ValueHost, Option<&Value>) + 'static,
    ) -> Result<&mut Self> {
        self.callbacks_mut()?.on_value_changed = Some(Rc::new(handler));
        Ok(self)
    }

    /// Sets the input-value-changed handler.
    ///
    /// # Errors
    ///
    /// Returns `Disposed` after completion or disposal.
    pub fn on_input_value_changed(
        &mut self,
        handler: impl Fn(&dyn ValueHost, Option<&Value>) + 'static,
    ) -> Result<&mut Self> {
        self.callbacks_mut()?.on_input_value_changed = Some(Rc::new(handler));
        Ok(self)
    }

    /// Sets the manager instance-state-changed handler.
    ///
    /// # Errors
    ///
    /// Returns `Disposed` after completion or disposal.
    pub fn on_instance_state_changed(
        &mut self,
        handler: impl Fn(&ManagerInstanceState) + 'static,
    ) -> Result<&mut Self> {
        self.callbacks_mut()?.on_instance_state_changed = Some(Rc::new(handler));
        Ok(self)
    }

    /// See [`ConfigBuilderBase::complete`].
    ///
    /// # Errors
    ///
    /// Returns `Disposed` if already completed or disposed.
    pub fn complete(self) -> Result<ManagerConfig> {
        self.base.complete()
    }

    /// See [`ConfigBuilderBase::dispose`].
    pub fn dispose(&mut self) {
        self.base.dispose();
    }
}

impl DeclareValueHosts for ValueHostsManagerConfigBuilder {
    fn destination_configs(&mut self) -> Result<&mut Vec<ValueHostConfig>> {
        self.base.destination_configs()
    }
}

impl CompleteManagerConfig for ValueHostsManagerConfigBuilder {
    fn complete(self) -> Result<ManagerConfig> {
        ValueHostsManagerConfigBuilder::complete(self)
    }
}
