//! Input and property value hosts.
//!
//! Both kinds carry an ordered list of validators and a validation status.
//! Input value hosts also keep the raw input value from the editor. Running
//! the validators belongs to the validation layer; this module tracks when
//! they need to run again.

use std::any::Any;
use std::collections::BTreeSet;
use std::rc::Rc;

use serde_json::Value;

use super::{Disposable, HostCell, SetValueOptions, ValidatableValueHost, ValueHost, ValueHostGenerator};
use crate::config::{ValidatorConfig, ValueHostConfig, ValueHostType};
use crate::error::{Error, Result};
use crate::manager::ManagerHandle;
use crate::services::Condition;
use crate::state::{ValidationStatus, ValueHostInstanceState};

/// A value host that carries validators.
///
/// Built for both `Input` and `Property` configurations.
pub struct ValidatorsValueHost {
    cell: HostCell,
}

impl ValidatorsValueHost {
    /// Creates an input or property value host.
    #[must_use]
    pub fn new(manager: ManagerHandle, config: ValueHostConfig, state: ValueHostInstanceState) -> Self {
        Self {
            cell: HostCell::new(manager, config, state),
        }
    }

    fn require_input(&self) -> Result<()> {
        let value_host_type = self.cell.value_host_type()?;
        if value_host_type == ValueHostType::Input {
            Ok(())
        } else {
            Err(Error::WrongValueHostType {
                name: self.cell.name()?,
                expected: ValueHostType::Input.to_string(),
                actual: value_host_type.to_string(),
            })
        }
    }

    /// The raw value from the editor.
    ///
    /// # Errors
    ///
    /// Returns `WrongValueHostType` for property value hosts and `Disposed`
    /// after disposal.
    pub fn input_value(&self) -> Result<Option<Value>> {
        self.require_input()?;
        self.cell.read(|core| core.state.input_value.clone())
    }

    /// Changes the raw value from the editor.
    ///
    /// A change marks the validators as needing another run.
    ///
    /// # Errors
    ///
    /// Returns `WrongValueHostType` for property value hosts and `Disposed`
    /// after disposal.
    pub fn set_input_value(&self, value: Option<Value>, options: SetValueOptions) -> Result<()> {
        self.require_input()?;
        let update = self.cell.write(|core| {
            if core.state.input_value == value && !options.reset {
                return None;
            }
            let old = std::mem::replace(&mut core.state.input_value, value);
            core.state.changed = Some(!options.reset);
            let status_changed = Self::mark_needs_validation(&core.config, &mut core.state);
            Some((core.manager.clone(), old, core.state.clone(), status_changed))
        })?;

        let Some((manager, old, state, status_changed)) = update else {
            return Ok(());
        };
        manager.notify_value_host_instance_state_changed(self, &state)?;
        manager.notify_input_value_changed(self, old.as_ref())?;
        if status_changed {
            manager.notify_validation_status_changed(self, ValidationStatus::NeedsValidation)?;
        }
        Ok(())
    }

    /// Changes the native value and the input value together.
    ///
    /// # Errors
    ///
    /// See [`ValidatorsValueHost::set_input_value`].
    pub fn set_values(
        &self,
        value: Option<Value>,
        input_value: Option<Value>,
        options: SetValueOptions,
    ) -> Result<()> {
        self.set_input_value(
            input_value,
            SetValueOptions {
                validate: false,
                ..options
            },
        )?;
        self.set_value(value, options)
    }

    /// Builds the evaluatable conditions of the enabled validators through the
    /// services' condition factory.
    ///
    /// # Errors
    ///
    /// Returns the condition factory's error for unknown condition types.
    pub fn create_conditions(&self) -> Result<Vec<Box<dyn Condition>>> {
        let (manager, validators) = self
            .cell
            .read(|core| (core.manager.clone(), core.config.validators().to_vec()))?;
        let services = manager.services()?;
        validators
            .iter()
            .filter(|v| v.enabled != Some(false))
            .filter_map(|v| v.condition_config.as_ref())
            .map(|condition| services.condition_factory().create(condition))
            .collect()
    }

    /// Names of the other value hosts the validators read.
    ///
    /// # Errors
    ///
    /// Returns `Disposed` after disposal.
    pub fn dependencies(&self) -> Result<BTreeSet<String>> {
        self.cell.read(|core| {
            let mut names = BTreeSet::new();
            for condition in core
                .config
                .validators()
                .iter()
                .filter_map(|v| v.condition_config.as_ref())
            {
                condition.gather_value_host_names(&mut names);
            }
            names.remove(&core.config.name);
            names
        })
    }

    /// Sets `NeedsValidation` when validators exist. Returns whether the
    /// status changed.
    fn mark_needs_validation(config: &ValueHostConfig, state: &mut ValueHostInstanceState) -> bool {
        if config.validators().is_empty() {
            return false;
        }
        state.validation_status.replace(ValidationStatus::NeedsValidation)
            != Some(ValidationStatus::NeedsValidation)
    }
}

impl Disposable for ValidatorsValueHost {
    fn dispose(&self) {
        self.cell.dispose();
    }

    fn is_disposed(&self) -> bool {
        self.cell.is_disposed()
    }
}

impl ValueHost for ValidatorsValueHost {
    fn name(&self) -> Result<String> {
        self.cell.name()
    }

    fn value_host_type(&self) -> Result<ValueHostType> {
        self.cell.value_host_type()
    }

    fn config(&self) -> Result<ValueHostConfig> {
        self.cell.config()
    }

    fn label(&self) -> Result<String> {
        self.cell.label()
    }

    fn data_type(&self) -> Result<Option<String>> {
        self.cell.data_type()
    }

    fn value(&self) -> Result<Option<Value>> {
        self.cell.stored_value()
    }

    fn set_value(&self, value: Option<Value>, options: SetValueOptions) -> Result<()> {
        let has_validators = self.cell.read(|core| !core.config.validators().is_empty())?;
        let mut status_changed = false;
        let changed = self.cell.store_value(self, value, options, |state| {
            if has_validators {
                status_changed = state.validation_status.replace(ValidationStatus::NeedsValidation)
                    != Some(ValidationStatus::NeedsValidation);
            }
        })?;
        if changed && status_changed {
            self.cell
                .manager()?
                .notify_validation_status_changed(self, ValidationStatus::NeedsValidation)?;
        }
        Ok(())
    }

    fn is_changed(&self) -> Result<bool> {
        self.cell.is_changed()
    }

    fn instance_state(&self) -> Result<ValueHostInstanceState> {
        self.cell.instance_state()
    }

    fn as_validatable(&self) -> Option<&dyn ValidatableValueHost> {
        Some(self)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl ValidatableValueHost for ValidatorsValueHost {
    fn validator_configs(&self) -> Result<Vec<ValidatorConfig>> {
        self.cell.read(|core| core.config.validators().to_vec())
    }

    fn validation_status(&self) -> Result<ValidationStatus> {
        self.cell
            .read(|core| core.state.validation_status.unwrap_or_default())
    }

    fn set_validation_status(&self, status: ValidationStatus) -> Result<()> {
        let update = self.cell.write(|core| {
            if core.state.validation_status.replace(status) == Some(status) {
                None
            } else {
                Some((core.manager.clone(), core.state.clone()))
            }
        })?;
        if let Some((manager, state)) = update {
            manager.notify_value_host_instance_state_changed(self, &state)?;
            manager.notify_validation_status_changed(self, status)?;
        }
        Ok(())
    }

    fn other_value_host_changed_notification(
        &self,
        value_host_name: &str,
        revalidate: bool,
    ) -> Result<()> {
        if !revalidate {
            return Ok(());
        }
        if self.dependencies()?.contains(value_host_name) {
            log::debug!(
                "Value host '{}' depends on '{value_host_name}' and needs validation",
                self.cell.name()?
            );
            self.set_validation_status(ValidationStatus::NeedsValidation)?;
        }
        Ok(())
    }
}

/// Builds [`ValidatorsValueHost`]s for `Input` and `Property` configurations.
#[derive(Debug, Default)]
pub struct ValidatorsValueHostGenerator;

impl ValueHostGenerator for ValidatorsValueHostGenerator {
    fn can_create(&self, config: &ValueHostConfig) -> bool {
        matches!(
            config.value_host_type,
            ValueHostType::Input | ValueHostType::Property
        )
    }

    fn create(
        &self,
        manager: ManagerHandle,
        config: ValueHostConfig,
        state: ValueHostInstanceState,
    ) -> Result<Rc<dyn ValueHost>> {
        Ok(Rc::new(ValidatorsValueHost::new(manager, config, state)))
    }

    fn create_instance_state(&self, config: &ValueHostConfig) -> ValueHostInstanceState {
        ValueHostInstanceState {
            name: config.name.clone(),
            value: config.initial_value.clone(),
            validation_status: Some(ValidationStatus::NotAttempted),
            ..Default::default()
        }
    }

    fn clean_up_instance_state(&self, state: &mut ValueHostInstanceState, config: &ValueHostConfig) {
        if config.value_host_type != ValueHostType::Input {
            state.input_value = None;
        }
    }
}
