//! Static value hosts hold a value the application sets directly.

use std::any::Any;
use std::rc::Rc;

use serde_json::Value;

use super::{Disposable, HostCell, SetValueOptions, ValueHost, ValueHostGenerator};
use crate::config::{ValueHostConfig, ValueHostType};
use crate::error::Result;
use crate::manager::ManagerHandle;
use crate::state::ValueHostInstanceState;

/// A value host whose value is set by the application.
pub struct StaticValueHost {
    cell: HostCell,
}

impl StaticValueHost {
    /// Creates a static value host.
    #[must_use]
    pub fn new(manager: ManagerHandle, config: ValueHostConfig, state: ValueHostInstanceState) -> Self {
        Self {
            cell: HostCell::new(manager, config, state),
        }
    }
}

impl Disposable for StaticValueHost {
    fn dispose(&self) {
        self.cell.dispose();
    }

    fn is_disposed(&self) -> bool {
        self.cell.is_disposed()
    }
}

impl ValueHost for StaticValueHost {
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
        self.cell.store_value(self, value, options, |_| {})?;
        Ok(())
    }

    fn is_changed(&self) -> Result<bool> {
        self.cell.is_changed()
    }

    fn instance_state(&self) -> Result<ValueHostInstanceState> {
        self.cell.instance_state()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Builds [`StaticValueHost`]s for `Static` configurations.
#[derive(Debug, Default)]
pub struct StaticValueHostGenerator;

impl ValueHostGenerator for StaticValueHostGenerator {
    fn can_create(&self, config: &ValueHostConfig) -> bool {
        config.value_host_type == ValueHostType::Static
    }

    fn create(
        &self,
        manager: ManagerHandle,
        config: ValueHostConfig,
        state: ValueHostInstanceState,
    ) -> Result<Rc<dyn ValueHost>> {
        Ok(Rc::new(StaticValueHost::new(manager, config, state)))
    }

    fn create_instance_state(&self, config: &ValueHostConfig) -> ValueHostInstanceState {
        ValueHostInstanceState {
            name: config.name.clone(),
            value: config.initial_value.clone(),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn detached(config: ValueHostConfig) -> StaticValueHost {
        let state = StaticValueHostGenerator.create_instance_state(&config);
        StaticValueHost::new(ManagerHandle::detached(), config, state)
    }

    #[test]
    fn test_initial_value_seeds_state() {
        let config = ValueHostConfig::new("a", ValueHostType::Static).with_initial_value(json!(5));
        let host = detached(config);
        assert_eq!(host.value().unwrap(), Some(json!(5)));
        assert!(!host.is_changed().unwrap());
        assert_eq!(host.label().unwrap(), "a");
    }

    #[test]
    fn test_dispose_fails_fast() {
        let host = detached(ValueHostConfig::new("a", ValueHostType::Static));
        host.dispose();
        assert!(host.is_disposed());
        assert!(host.value().unwrap_err().is_disposed());
        assert!(host.name().unwrap_err().is_disposed());
    }

    #[test]
    fn test_generator_matches_static_only() {
        let generator = StaticValueHostGenerator;
        assert!(generator.can_create(&ValueHostConfig::new("a", ValueHostType::Static)));
        assert!(!generator.can_create(&ValueHostConfig::new("a", ValueHostType::Input)));
    }
}
