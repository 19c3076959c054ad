//! Non-owning access to a manager.

use std::fmt;
use std::rc::{Rc, Weak};

use serde_json::Value;

use super::ManagerCore;
use crate::error::{Error, Result};
use crate::services::ValidationServices;
use crate::state::{ValidationStatus, ValueHostInstanceState};
use crate::value_host::ValueHost;

/// Weak reference to a [`ValueHostsManager`](super::ValueHostsManager).
///
/// Value hosts and config modifiers hold one of these so they never keep the
/// manager alive. Every operation fails with [`Error::Disposed`] once the
/// manager is dropped or disposed.
#[derive(Clone)]
pub struct ManagerHandle {
    core: Weak<ManagerCore>,
}

impl ManagerHandle {
    pub(crate) fn new(core: Weak<ManagerCore>) -> Self {
        Self { core }
    }

    /// A handle not connected to any manager.
    #[must_use]
    pub fn detached() -> Self {
        Self { core: Weak::new() }
    }

    pub(crate) fn upgrade(&self) -> Option<Rc<ManagerCore>> {
        self.core.upgrade()
    }

    fn core(&self) -> Result<Rc<ManagerCore>> {
        self.upgrade().ok_or(Error::Disposed {
            component: super::COMPONENT,
        })
    }

    /// Returns whether the manager is still alive and not disposed.
    #[must_use]
    pub fn is_live(&self) -> bool {
        self.upgrade().is_some_and(|core| !core.is_disposed())
    }

    /// The manager's services bag.
    ///
    /// # Errors
    ///
    /// Returns `Disposed` if the manager is gone.
    pub fn services(&self) -> Result<Rc<ValidationServices>> {
        self.core()?.services()
    }

    /// Reads the value of a registered value host.
    ///
    /// # Errors
    ///
    /// Returns `ValueHostNotFound` for unknown names and `Disposed` if the
    /// manager is gone.
    pub fn value_of(&self, name: &str) -> Result<Option<Value>> {
        self.core()?.value_of(name)
    }

    /// Records a value host's new instance state.
    ///
    /// # Errors
    ///
    /// Returns `Disposed` if the manager is gone.
    pub fn notify_value_host_instance_state_changed(
        &self,
        host: &dyn ValueHost,
        state: &ValueHostInstanceState,
    ) -> Result<()> {
        self.core()?
            .notify_value_host_instance_state_changed(host, state)
    }

    /// Informs validatable value hosts that `changed_name` changed.
    ///
    /// # Errors
    ///
    /// Returns `Disposed` if the manager is gone.
    pub fn notify_other_value_hosts_of_value_change(
        &self,
        changed_name: &str,
        revalidate: bool,
    ) -> Result<()> {
        self.core()?
            .notify_other_value_hosts_of_value_change(changed_name, revalidate)
    }

    /// Fires the value-changed handler.
    ///
    /// # Errors
    ///
    /// Returns `Disposed` if the manager is gone.
    pub fn notify_value_changed(&self, host: &dyn ValueHost, old_value: Option<&Value>) -> Result<()> {
        let handler = self.core()?.callbacks()?.on_value_changed;
        if let Some(handler) = handler {
            handler(host, old_value);
        }
        Ok(())
    }

    /// Fires the input-value-changed handler.
    ///
    /// # Errors
    ///
    /// Returns `Disposed` if the manager is gone.
    pub fn notify_input_value_changed(
        &self,
        host: &dyn ValueHost,
        old_value: Option<&Value>,
    ) -> Result<()> {
        let handler = self.core()?.callbacks()?.on_input_value_changed;
        if let Some(handler) = handler {
            handler(host, old_value);
        }
        Ok(())
    }

    /// Fires the validation-status-changed handler.
    ///
    /// # Errors
    ///
    /// Returns `Disposed` if the manager is gone.
    pub fn notify_validation_status_changed(
        &self,
        host: &dyn ValueHost,
        status: ValidationStatus,
    ) -> Result<()> {
        let handler = self.core()?.callbacks()?.on_validation_status_changed;
        if let Some(handler) = handler {
            handler(host, status);
        }
        Ok(())
    }
}

impl fmt::Debug for ManagerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ManagerHandle")
            .field("live", &self.is_live())
            .finish()
    }
}
