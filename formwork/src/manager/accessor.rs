//! Type-checked value host lookups.

use super::ValueHostsManager;
use crate::config::ValueHostType;
use crate::error::{Error, Result};
use crate::value_host::ValueHostRef;

/// Fail-fast lookups returned by [`ValueHostsManager::vh`].
///
/// Unlike [`ValueHostsManager::get_value_host`], a missing name is an error
/// here, and so is a value host of the wrong type.
///
/// # Examples
///
/// ```
/// use std::rc::Rc;
/// use formwork::config::{ManagerConfig, ValueHostConfig, ValueHostType};
/// use formwork::services::ValidationServices;
/// use formwork::ValueHostsManager;
///
/// let manager = ValueHostsManager::new(
///     ManagerConfig::new(Rc::new(ValidationServices::new()))
///         .with_value_host(ValueHostConfig::new("email", ValueHostType::Input)),
/// )
/// .unwrap();
///
/// let vh = manager.vh().unwrap();
/// assert!(vh.get_input("email").is_ok());
/// assert!(vh.get_static("email").is_err());
/// assert!(vh.get("missing").unwrap_err().is_not_found());
/// ```
#[derive(Debug)]
pub struct ValueHostAccessor<'a> {
    manager: &'a ValueHostsManager,
}

impl<'a> ValueHostAccessor<'a> {
    pub(super) fn new(manager: &'a ValueHostsManager) -> Self {
        Self { manager }
    }

    /// Any value host.
    ///
    /// # Errors
    ///
    /// Returns `ValueHostNotFound` for unknown names.
    pub fn get(&self, name: &str) -> Result<ValueHostRef> {
        self.manager
            .get_value_host(name)?
            .ok_or_else(|| Error::ValueHostNotFound {
                name: name.to_string(),
            })
    }

    fn get_typed(&self, name: &str, expected: &ValueHostType) -> Result<ValueHostRef> {
        let host = self.get(name)?;
        let actual = host.value_host_type()?;
        if &actual == expected {
            Ok(host)
        } else {
            Err(Error::WrongValueHostType {
                name: name.to_string(),
                expected: expected.to_string(),
                actual: actual.to_string(),
            })
        }
    }

    /// A static value host.
    ///
    /// # Errors
    ///
    /// Returns `ValueHostNotFound` or `WrongValueHostType`.
    pub fn get_static(&self, name: &str) -> Result<ValueHostRef> {
        self.get_typed(name, &ValueHostType::Static)
    }

    /// A calculated value host.
    ///
    /// # Errors
    ///
    /// Returns `ValueHostNotFound` or `WrongValueHostType`.
    pub fn get_calc(&self, name: &str) -> Result<ValueHostRef> {
        self.get_typed(name, &ValueHostType::Calc)
    }

    /// An input value host.
    ///
    /// # Errors
    ///
    /// Returns `ValueHostNotFound` or `WrongValueHostType`.
    pub fn get_input(&self, name: &str) -> Result<ValueHostRef> {
        self.get_typed(name, &ValueHostType::Input)
    }

    /// A property value host.
    ///
    /// # Errors
    ///
    /// Returns `ValueHostNotFound` or `WrongValueHostType`.
    pub fn get_property(&self, name: &str) -> Result<ValueHostRef> {
        self.get_typed(name, &ValueHostType::Property)
    }

    /// Any value host that carries validators.
    ///
    /// # Errors
    ///
    /// Returns `ValueHostNotFound` or `WrongValueHostType`.
    pub fn get_validatable(&self, name: &str) -> Result<ValueHostRef> {
        let host = self.get(name)?;
        if host.is_validatable()? {
            Ok(host)
        } else {
            Err(Error::WrongValueHostType {
                name: name.to_string(),
                expected: "validatable".to_string(),
                actual: host.value_host_type()?.to_string(),
            })
        }
    }
}
