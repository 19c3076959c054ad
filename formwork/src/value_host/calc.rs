//! Calculated value hosts.
//!
//! A calculated value host stores no value of its own. Each read looks up the
//! calculation function named by `calcFn` in the services bag and runs it with
//! a [`CalcContext`] that can read other value hosts.

use std::any::Any;
use std::cell::Cell;
use std::rc::Rc;

use serde_json::Value;

use super::{Disposable, HostCell, SetValueOptions, ValueHost, ValueHostGenerator};
use crate::config::{ValueHostConfig, ValueHostType};
use crate::error::{Error, Result};
use crate::manager::ManagerHandle;
use crate::state::ValueHostInstanceState;

/// Deepest nesting of reads through one calculated value host.
pub const MAX_CALC_DEPTH: u8 = 16;

/// What a calculation function can see.
pub struct CalcContext<'a> {
    name: &'a str,
    manager: &'a ManagerHandle,
}

impl<'a> CalcContext<'a> {
    pub(crate) fn new(name: &'a str, manager: &'a ManagerHandle) -> Self {
        Self { name, manager }
    }

    /// Name of the calculated value host being evaluated.
    #[must_use]
    pub fn name(&self) -> &str {
        self.name
    }

    /// Reads the value of another value host.
    ///
    /// # Errors
    ///
    /// Returns `ValueHostNotFound` for unknown names, or whatever the other
    /// value host's read returns.
    pub fn value_of(&self, value_host_name: &str) -> Result<Option<Value>> {
        self.manager.value_of(value_host_name)
    }

    /// Reads the value of another value host as a number.
    ///
    /// Missing and non-numeric values read as `None`.
    ///
    /// # Errors
    ///
    /// See [`CalcContext::value_of`].
    pub fn number_of(&self, value_host_name: &str) -> Result<Option<f64>> {
        Ok(self.value_of(value_host_name)?.as_ref().and_then(Value::as_f64))
    }
}

/// A value host computed from other value hosts.
///
/// # Examples
///
/// ```
/// use std::rc::Rc;
/// use formwork::config::{ManagerConfig, ValueHostConfig, ValueHostType};
/// use formwork::services::ValidationServices;
/// use formwork::ValueHostsManager;
/// use serde_json::{json, Value};
///
/// let services = Rc::new(ValidationServices::new());
/// services.calc_functions().register("double", |ctx| {
///     Ok(ctx.number_of("base")?.map(|n| Value::from(n * 2.0)))
/// });
/// let config = ManagerConfig::new(services)
///     .with_value_host(ValueHostConfig::new("base", ValueHostType::Static).with_initial_value(json!(4)))
///     .with_value_host(ValueHostConfig::new("twice", ValueHostType::Calc).with_calc_fn("double"));
/// let manager = ValueHostsManager::new(config).unwrap();
///
/// let twice = manager.get_value_host("twice").unwrap().unwrap();
/// assert_eq!(twice.value().unwrap(), Some(json!(8.0)));
/// ```
pub struct CalcValueHost {
    cell: HostCell,
    depth: Cell<u8>,
}

impl CalcValueHost {
    /// Creates a calculated value host.
    #[must_use]
    pub fn new(manager: ManagerHandle, config: ValueHostConfig, state: ValueHostInstanceState) -> Self {
        Self {
            cell: HostCell::new(manager, config, state),
            depth: Cell::new(0),
        }
    }

    fn calculate(&self) -> Result<Option<Value>> {
        let (manager, name, calc_fn) = self.cell.read(|core| {
            (
                core.manager.clone(),
                core.config.name.clone(),
                core.config.calc_fn.clone(),
            )
        })?;
        let calc_fn = calc_fn.ok_or_else(|| Error::Configuration {
            reason: format!("calculated value host '{name}' has no calcFn"),
        })?;

        if self.depth.get() >= MAX_CALC_DEPTH {
            log::error!("Calculation cycle detected at value host '{name}'");
            return Err(Error::CalcCycle { name });
        }

        let function = manager.services()?.calc_functions().get(&calc_fn)?;
        self.depth.set(self.depth.get() + 1);
        let result = function(&CalcContext::new(&name, &manager));
        self.depth.set(self.depth.get() - 1);
        result
    }
}

impl Disposable for CalcValueHost {
    fn dispose(&self) {
        self.cell.dispose();
    }

    fn is_disposed(&self) -> bool {
        self.cell.is_disposed()
    }
}

impl ValueHost for CalcValueHost {
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
        self.calculate()
    }

    fn set_value(&self, _value: Option<Value>, _options: SetValueOptions) -> Result<()> {
        Err(Error::Unsupported {
            operation: "set_value",
            name: self.cell.name()?,
        })
    }

    fn is_changed(&self) -> Result<bool> {
        // Fails like every other read once disposed.
        self.cell.read(|_| false)
    }

    fn instance_state(&self) -> Result<ValueHostInstanceState> {
        self.cell.instance_state()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Builds [`CalcValueHost`]s for `Calc` configurations.
#[derive(Debug, Default)]
pub struct CalcValueHostGenerator;

impl ValueHostGenerator for CalcValueHostGenerator {
    fn can_create(&self, config: &ValueHostConfig) -> bool {
        config.value_host_type == ValueHostType::Calc
    }

    fn create(
        &self,
        manager: ManagerHandle,
        config: ValueHostConfig,
        state: ValueHostInstanceState,
    ) -> Result<Rc<dyn ValueHost>> {
        Ok(Rc::new(CalcValueHost::new(manager, config, state)))
    }

    fn create_instance_state(&self, config: &ValueHostConfig) -> ValueHostInstanceState {
        ValueHostInstanceState::new(config.name.clone())
    }

    fn clean_up_instance_state(&self, state: &mut ValueHostInstanceState, _config: &ValueHostConfig) {
        state.value = None;
        state.input_value = None;
    }
}
