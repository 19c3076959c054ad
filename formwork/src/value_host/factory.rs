//! Value host construction.
//!
//! The [`ValueHostFactory`] lives in the services bag and turns a
//! configuration into a live value host by asking each registered
//! [`ValueHostGenerator`] whether it supports the configuration.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use super::{CalcValueHostGenerator, StaticValueHostGenerator, ValidatorsValueHostGenerator, ValueHost};
use crate::config::ValueHostConfig;
use crate::error::{Error, Result};
use crate::manager::ManagerHandle;
use crate::state::ValueHostInstanceState;

/// Creates one kind of value host and its instance state.
pub trait ValueHostGenerator {
    /// Returns whether this generator supports `config`.
    fn can_create(&self, config: &ValueHostConfig) -> bool;

    /// Creates the value host.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is unusable.
    fn create(
        &self,
        manager: ManagerHandle,
        config: ValueHostConfig,
        state: ValueHostInstanceState,
    ) -> Result<Rc<dyn ValueHost>>;

    /// Creates a fresh instance state with every field the value host needs.
    fn create_instance_state(&self, config: &ValueHostConfig) -> ValueHostInstanceState;

    /// Removes fields that do not apply to `config` from a saved state.
    fn clean_up_instance_state(&self, _state: &mut ValueHostInstanceState, _config: &ValueHostConfig) {}
}

/// Registry of value host generators.
///
/// Generators registered later are consulted first, so applications can
/// replace a built-in kind.
///
/// # Examples
///
/// ```
/// use formwork::config::{ValueHostConfig, ValueHostType};
/// use formwork::value_host::ValueHostFactory;
///
/// let factory = ValueHostFactory::with_builtin_generators();
/// let state = factory
///     .create_instance_state(&ValueHostConfig::new("a", ValueHostType::Input))
///     .unwrap();
/// assert_eq!(state.name, "a");
///
/// let custom = ValueHostConfig::new("b", ValueHostType::from("Signature"));
/// assert!(factory.create_instance_state(&custom).is_err());
/// ```
#[derive(Default)]
pub struct ValueHostFactory {
    generators: RefCell<Vec<Rc<dyn ValueHostGenerator>>>,
}

impl ValueHostFactory {
    /// Creates a factory with no generators.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a factory with the static, calculated, input and property generators.
    #[must_use]
    pub fn with_builtin_generators() -> Self {
        let factory = Self::new();
        factory.register(Rc::new(ValidatorsValueHostGenerator));
        factory.register(Rc::new(CalcValueHostGenerator));
        factory.register(Rc::new(StaticValueHostGenerator));
        factory
    }

    /// Registers a generator ahead of the existing ones.
    pub fn register(&self, generator: Rc<dyn ValueHostGenerator>) {
        self.generators.borrow_mut().insert(0, generator);
    }

    /// Finds the generator for `config`.
    ///
    /// # Errors
    ///
    /// Returns `NoValueHostGenerator` if no generator supports the configuration.
    pub fn generator_for(&self, config: &ValueHostConfig) -> Result<Rc<dyn ValueHostGenerator>> {
        self.generators
            .borrow()
            .iter()
            .find(|generator| generator.can_create(config))
            .cloned()
            .ok_or_else(|| Error::NoValueHostGenerator {
                value_host_type: config.value_host_type.to_string(),
            })
    }

    /// Returns whether some generator supports `config`.
    #[must_use]
    pub fn can_create(&self, config: &ValueHostConfig) -> bool {
        self.generator_for(config).is_ok()
    }

    /// Creates a value host.
    ///
    /// # Errors
    ///
    /// Returns `NoValueHostGenerator` if no generator supports the
    /// configuration, or the generator's own error.
    pub fn create(
        &self,
        manager: ManagerHandle,
        config: ValueHostConfig,
        state: ValueHostInstanceState,
    ) -> Result<Rc<dyn ValueHost>> {
        self.generator_for(&config)?.create(manager, config, state)
    }

    /// Creates a fresh instance state.
    ///
    /// # Errors
    ///
    /// Returns `NoValueHostGenerator` if no generator supports the configuration.
    pub fn create_instance_state(&self, config: &ValueHostConfig) -> Result<ValueHostInstanceState> {
        Ok(self.generator_for(config)?.create_instance_state(config))
    }

    /// Removes fields that do not apply to `config` from a saved state.
    ///
    /// # Errors
    ///
    /// Returns `NoValueHostGenerator` if no generator supports the configuration.
    pub fn clean_up_instance_state(
        &self,
        state: &mut ValueHostInstanceState,
        config: &ValueHostConfig,
    ) -> Result<()> {
        self.generator_for(config)?
            .clean_up_instance_state(state, config);
        Ok(())
    }
}

impl fmt::Debug for ValueHostFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValueHostFactory")
            .field("generators", &self.generators.borrow().len())
            .finish()
    }
}
