//! Staged configuration changes for a live manager.
//!
//! A [`ManagerConfigModifier`] is obtained from
//! [`ValueHostsManager::start_modifying`](crate::ValueHostsManager::start_modifying).
//! It records declarations and updates without touching the manager. Calling
//! [`ManagerConfigModifier::apply`] pushes every staged entry through the
//! manager's merge-aware registration, in declaration order; dropping the
//! modifier instead discards them.
//!
//! The modifier holds only weak references to the manager and to its
//! configuration map, so it never keeps a disposed manager alive.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use crate::builder::rules::{self, CombineUsing};
use crate::builder::DeclareValueHosts;
use crate::config::{ConditionConfig, ConfigMap, ConfigPatch, ValidatorConfig, ValueHostConfig, ValueHostType};
use crate::error::{Error, Result};
use crate::manager::ManagerHandle;
use crate::services::ValidationServices;

const COMPONENT: &str = "config modifier";

/// Stages value host changes against a live manager.
///
/// # Examples
///
/// ```
/// use std::rc::Rc;
/// use formwork::builder::DeclareValueHosts;
/// use formwork::config::ConfigPatch;
/// use formwork::services::{create_builder, ValidationServices};
/// use formwork::ValueHostsManager;
///
/// let services = Rc::new(ValidationServices::new());
/// let mut builder = create_builder(&services);
/// builder.static_host("country").unwrap();
/// let manager = ValueHostsManager::from_builder(builder).unwrap();
///
/// let mut modifier = manager.start_modifying().unwrap();
/// modifier.static_host("region").unwrap();
/// modifier
///     .update_static("country", ConfigPatch { label: Some("Country".into()), ..Default::default() })
///     .unwrap();
/// assert!(manager.get_value_host("region").unwrap().is_none());
///
/// modifier.apply().unwrap();
/// assert!(manager.get_value_host("region").unwrap().is_some());
/// let country = manager.get_value_host_config("country").unwrap().unwrap();
/// assert_eq!(country.label.as_deref(), Some("Country"));
/// ```
#[derive(Debug)]
pub struct ManagerConfigModifier {
    manager: ManagerHandle,
    existing: Weak<RefCell<ConfigMap>>,
    staged: Option<Vec<ValueHostConfig>>,
}

impl ManagerConfigModifier {
    /// Creates a modifier over `manager` and its configuration map.
    ///
    /// Usually called by a
    /// [`ConfigModifierFactory`](crate::services::ConfigModifierFactory).
    #[must_use]
    pub fn new(manager: ManagerHandle, existing: Weak<RefCell<ConfigMap>>) -> Self {
        Self {
            manager,
            existing,
            staged: Some(Vec::new()),
        }
    }

    fn staged(&self) -> Result<&Vec<ValueHostConfig>> {
        self.staged.as_ref().ok_or(Error::Disposed {
            component: COMPONENT,
        })
    }

    fn staged_mut(&mut self) -> Result<&mut Vec<ValueHostConfig>> {
        self.staged.as_mut().ok_or(Error::Disposed {
            component: COMPONENT,
        })
    }

    /// The manager's services bag.
    ///
    /// # Errors
    ///
    /// Returns `Disposed` if the modifier or the manager is gone.
    pub fn services(&self) -> Result<Rc<ValidationServices>> {
        self.staged()?;
        self.manager.services()
    }

    /// The staged entries, in declaration order.
    ///
    /// # Errors
    ///
    /// Returns `Disposed` after [`ManagerConfigModifier::dispose`].
    pub fn staged_configs(&self) -> Result<&[ValueHostConfig]> {
        Ok(self.staged()?)
    }

    /// A copy of the live configuration for `name`. Unknown names return
    /// `Ok(None)`.
    ///
    /// # Errors
    ///
    /// Returns `Disposed` if the modifier or the manager is gone.
    pub fn existing_value_host_config(&self, name: &str) -> Result<Option<ValueHostConfig>> {
        self.staged()?;
        let existing = self.existing.upgrade().ok_or(Error::Disposed {
            component: COMPONENT,
        })?;
        let config = existing.borrow().get(name).cloned();
        Ok(config)
    }

    fn require_existing(&self, name: &str, expected: &ValueHostType) -> Result<ValueHostConfig> {
        let config = self
            .existing_value_host_config(name)?
            .ok_or_else(|| Error::ValueHostNotFound {
                name: name.to_string(),
            })?;
        if &config.value_host_type != expected {
            return Err(Error::WrongValueHostType {
                name: name.to_string(),
                expected: expected.to_string(),
                actual: config.value_host_type.to_string(),
            });
        }
        Ok(config)
    }

    fn stage_update(
        &mut self,
        name: &str,
        value_host_type: ValueHostType,
        mut patch: ConfigPatch,
    ) -> Result<&mut Self> {
        let existing = self.require_existing(name, &value_host_type)?;
        let services = self.services()?;
        patch.strip(services.config_merge_service().no_change_property_names());
        self.apply_config(patch.into_config(&existing.name, existing.value_host_type))?;
        Ok(self)
    }

    /// Stages a partial update of an existing static value host.
    ///
    /// Fields the merge service treats as no-change are dropped from `patch`.
    ///
    /// # Errors
    ///
    /// Returns `ValueHostNotFound` for an unknown name, `WrongValueHostType`
    /// if the host is not static, `DuplicateValueHostName` if the name is
    /// already staged, and `Disposed` if the modifier or the manager is gone.
    pub fn update_static(&mut self, name: &str, patch: ConfigPatch) -> Result<&mut Self> {
        self.stage_update(name, ValueHostType::Static, patch)
    }

    /// Stages a partial update of an existing calculated value host.
    ///
    /// # Errors
    ///
    /// See [`ManagerConfigModifier::update_static`].
    pub fn update_calc(&mut self, name: &str, patch: ConfigPatch) -> Result<&mut Self> {
        self.stage_update(name, ValueHostType::Calc, patch)
    }

    fn modify_validator(
        &mut self,
        value_host_name: &str,
        error_code: &str,
        change: impl FnOnce(&mut ValidatorConfig),
    ) -> Result<()> {
        let staged = self.staged_mut()?;
        if let Some(validator) =
            rules::find_validator_mut(std::iter::once(&mut *staged), value_host_name, error_code)
        {
            change(validator);
            return Ok(());
        }

        let existing = self
            .existing_value_host_config(value_host_name)?
            .ok_or_else(|| rules::validator_not_found(value_host_name, error_code))?;
        let mut validator = existing
            .find_validator(error_code)
            .cloned()
            .ok_or_else(|| rules::validator_not_found(value_host_name, error_code))?;
        change(&mut validator);

        let staged = self.staged_mut()?;
        match staged.iter_mut().find(|config| config.name == value_host_name) {
            Some(config) => config.validators_mut().push(validator),
            None => staged.push(
                ValueHostConfig::new(value_host_name, existing.value_host_type).with_validator(validator),
            ),
        }
        Ok(())
    }

    /// Joins `condition` with the condition of the validator `error_code` on
    /// `value_host_name`, keeping its error code.
    ///
    /// Staged entries are searched first, then the live configuration. A
    /// validator found in the live configuration is staged as a change to
    /// that value host.
    ///
    /// # Errors
    ///
    /// Returns `ValidatorNotFound` if neither has the validator, and
    /// `Disposed` if the modifier or the manager is gone.
    pub fn combine_with_rule(
        &mut self,
        value_host_name: &str,
        error_code: &str,
        using: CombineUsing,
        condition: ConditionConfig,
    ) -> Result<&mut Self> {
        self.modify_validator(value_host_name, error_code, |validator| {
            rules::combine(validator, using, condition);
        })?;
        Ok(self)
    }

    /// Replaces the condition of the validator `error_code` on
    /// `value_host_name`, keeping its error code.
    ///
    /// # Errors
    ///
    /// See [`ManagerConfigModifier::combine_with_rule`].
    pub fn replace_rule(
        &mut self,
        value_host_name: &str,
        error_code: &str,
        condition: ConditionConfig,
    ) -> Result<&mut Self> {
        self.modify_validator(value_host_name, error_code, |validator| {
            rules::replace(validator, condition);
        })?;
        Ok(self)
    }

    /// Pushes every staged entry into the manager through its merge-aware
    /// registration, in declaration order, and consumes the modifier.
    ///
    /// A manager that is already gone makes this a no-op.
    ///
    /// # Errors
    ///
    /// Returns `Disposed` if the modifier was disposed, or the first error
    /// raised by the manager. Entries before the failing one stay applied.
    pub fn apply(mut self) -> Result<()> {
        let staged = self.staged.take().ok_or(Error::Disposed {
            component: COMPONENT,
        })?;
        let Some(core) = self.manager.upgrade() else {
            log::debug!("Manager is gone; dropping {} staged value hosts", staged.len());
            return Ok(());
        };
        for config in &staged {
            core.add_or_merge_value_host(config, None)?;
        }
        log::debug!("Applied {} staged value hosts", staged.len());
        Ok(())
    }

    /// Discards the staged entries. Calling it again does nothing.
    pub fn dispose(&mut self) {
        self.staged = None;
    }

    /// Returns whether the modifier was disposed.
    #[must_use]
    pub fn is_disposed(&self) -> bool {
        self.staged.is_none()
    }
}

impl DeclareValueHosts for ManagerConfigModifier {
    fn destination_configs(&mut self) -> Result<&mut Vec<ValueHostConfig>> {
        self.staged_mut()
    }
}
