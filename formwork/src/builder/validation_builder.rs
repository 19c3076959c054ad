//! Builder for validation-aware managers.
//!
//! Business logic usually declares value hosts first. The UI layer then calls
//! [`ValidationManagerConfigBuilder::start_ui_layer_config`] and declares its
//! own adjustments in an override, which can also cede inline messages to the
//! localization service and turn properties into inputs.

use std::rc::Rc;

use super::rules::{self, CombineUsing};
use super::{CompleteManagerConfig, ConfigBuilderBase, DeclareValueHosts, ValueHostsManagerConfigBuilder};
use crate::config::{ConditionConfig, ManagerCallbacks, ManagerConfig, ValueHostConfig, ValueHostType};
use crate::error::Result;
use crate::services::{ValidationServices, WILDCARD_CULTURE};
use crate::state::ValidationStatus;
use crate::value_host::ValueHost;

/// Options for [`ValidationManagerConfigBuilder::start_ui_layer_config`].
///
/// Absent flags count as `true`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UiLayerOptions {
    /// Run [`ValidationManagerConfigBuilder::favor_ui_messages`].
    pub favor_ui_messages: Option<bool>,
    /// Run [`ValidationManagerConfigBuilder::convert_property_to_input`].
    pub convert_property_to_input: Option<bool>,
}

/// Config builder with validation helpers.
///
/// # Examples
///
/// ```
/// use std::rc::Rc;
/// use formwork::builder::{CombineUsing, DeclareValueHosts, UiLayerOptions};
/// use formwork::config::{ConditionConfig, ValueHostType};
/// use formwork::services::{create_builder, ValidationServices};
///
/// let services = Rc::new(ValidationServices::new());
/// let mut builder = create_builder(&services);
/// builder
///     .property(("age", "Integer"))
///     .unwrap()
///     .condition(ConditionConfig::new("Range"));
///
/// builder.start_ui_layer_config(UiLayerOptions::default()).unwrap();
/// builder
///     .combine_with_rule("age", "Range", CombineUsing::All, ConditionConfig::new("Positive"))
///     .unwrap();
///
/// let config = builder.complete().unwrap();
/// let age = &config.value_host_configs[0];
/// assert_eq!(age.value_host_type, ValueHostType::Input);
/// assert_eq!(age.validators()[0].effective_error_code(), Some("Range"));
/// ```
#[derive(Debug)]
pub struct ValidationManagerConfigBuilder {
    inner: ValueHostsManagerConfigBuilder,
}

impl ValidationManagerConfigBuilder {
    /// Creates an empty builder bound to a services bag.
    #[must_use]
    pub fn new(services: Rc<ValidationServices>) -> Self {
        Self {
            inner: ValueHostsManagerConfigBuilder::new(services),
        }
    }

    /// Creates a builder that continues from an existing configuration.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if `config` has no services.
    pub fn from_config(config: ManagerConfig) -> Result<Self> {
        Ok(Self {
            inner: ValueHostsManagerConfigBuilder::from_config(config)?,
        })
    }

    /// The generic manager builder this one extends.
    #[must_use]
    pub fn manager_builder(&self) -> &ValueHostsManagerConfigBuilder {
        &self.inner
    }

    /// Mutable access to the generic manager builder, for its handler setters.
    pub fn manager_builder_mut(&mut self) -> &mut ValueHostsManagerConfigBuilder {
        &mut self.inner
    }

    fn base(&self) -> &ConfigBuilderBase {
        self.inner.base()
    }

    fn base_mut(&mut self) -> &mut ConfigBuilderBase {
        self.inner.base_mut()
    }

    /// See [`ConfigBuilderBase::services`].
    ///
    /// # Errors
    ///
    /// Returns `Disposed` after completion or disposal.
    pub fn services(&self) -> Result<Rc<ValidationServices>> {
        self.base().services()
    }

    /// See [`ConfigBuilderBase::add_override`].
    ///
    /// # Errors
    ///
    /// Returns `Disposed` after completion or disposal.
    pub fn add_override(&mut self) -> Result<&mut Self> {
        self.base_mut().add_override()?;
        Ok(self)
    }

    /// See [`ConfigBuilderBase::base_configs`].
    ///
    /// # Errors
    ///
    /// Returns `Disposed` after completion or disposal.
    pub fn base_configs(&self) -> Result<&[ValueHostConfig]> {
        self.base().base_configs()
    }

    /// See [`ConfigBuilderBase::override_configs`].
    ///
    /// # Errors
    ///
    /// Returns `Disposed` after completion or disposal.
    pub fn override_configs(&self) -> Result<&[Vec<ValueHostConfig>]> {
        self.base().override_configs()
    }

    /// See [`ValueHostsManagerConfigBuilder::callbacks`].
    ///
    /// # Errors
    ///
    /// Returns `Disposed` after completion or disposal.
    pub fn callbacks(&self) -> Result<&ManagerCallbacks> {
        self.inner.callbacks()
    }

    /// See [`ValueHostsManagerConfigBuilder::callbacks_mut`].
    ///
    /// # Errors
    ///
    /// Returns `Disposed` after completion or disposal.
    pub fn callbacks_mut(&mut self) -> Result<&mut ManagerCallbacks> {
        self.inner.callbacks_mut()
    }

    /// Sets the validation-status-changed handler.
    ///
    /// # Errors
    ///
    /// Returns `Disposed` after completion or disposal.
    pub fn on_validation_status_changed(
        &mut self,
        handler: impl Fn(&dyn ValueHost, ValidationStatus) + 'static,
    ) -> Result<&mut Self> {
        self.callbacks_mut()?.on_validation_status_changed = Some(Rc::new(handler));
        Ok(self)
    }

    /// Opens an override for UI-layer declarations, then runs the enabled
    /// base-list passes.
    ///
    /// # Errors
    ///
    /// Returns `Disposed` after completion or disposal.
    pub fn start_ui_layer_config(&mut self, options: UiLayerOptions) -> Result<&mut Self> {
        self.add_override()?;
        if options.favor_ui_messages.unwrap_or(true) {
            self.favor_ui_messages()?;
        }
        if options.convert_property_to_input.unwrap_or(true) {
            self.convert_property_to_input()?;
        }
        Ok(self)
    }

    /// Removes inline messages from base-list validators whose error code has
    /// a wildcard-culture message registered with the text localizer.
    ///
    /// Override lists are never changed.
    ///
    /// # Errors
    ///
    /// Returns `Disposed` after completion or disposal.
    pub fn favor_ui_messages(&mut self) -> Result<&mut Self> {
        let services = self.services()?;
        let localizer = services.text_localizer();
        let mut cleared = 0_usize;
        let base = &mut self.base_mut().manager_config_mut()?.value_host_configs;
        for validator in base
            .iter_mut()
            .flat_map(|config| config.validator_configs.iter_mut().flatten())
        {
            if !validator.has_inline_messages() {
                continue;
            }
            let covered = validator.effective_error_code().is_some_and(|code| {
                localizer.get_error_message(WILDCARD_CULTURE, code).is_some()
                    || localizer.get_summary_message(WILDCARD_CULTURE, code).is_some()
            });
            if covered {
                validator.clear_messages();
                cleared += 1;
            }
        }
        log::debug!("Ceded {cleared} inline messages to the text localizer");
        Ok(self)
    }

    /// Retypes every base-list property value host as an input value host.
    /// Returns whether anything changed.
    ///
    /// Override lists are never changed.
    ///
    /// # Errors
    ///
    /// Returns `Disposed` after completion or disposal.
    pub fn convert_property_to_input(&mut self) -> Result<bool> {
        let base = &mut self.base_mut().manager_config_mut()?.value_host_configs;
        let mut changed = false;
        for config in base
            .iter_mut()
            .filter(|config| config.value_host_type == ValueHostType::Property)
        {
            config.value_host_type = ValueHostType::Input;
            changed = true;
        }
        Ok(changed)
    }

    /// Joins `condition` with the condition of the validator `error_code` on
    /// `value_host_name`. The validator keeps its error code.
    ///
    /// Override lists are searched newest first, then the base list.
    ///
    /// # Errors
    ///
    /// Returns `ValidatorNotFound` if no list has the validator, and
    /// `Disposed` after completion or disposal.
    pub fn combine_with_rule(
        &mut self,
        value_host_name: &str,
        error_code: &str,
        using: CombineUsing,
        condition: ConditionConfig,
    ) -> Result<&mut Self> {
        self.base_mut()
            .modify_validator(value_host_name, error_code, |validator| {
                rules::combine(validator, using, condition);
            })?;
        Ok(self)
    }

    /// Replaces the condition of the validator `error_code` on
    /// `value_host_name`. The validator keeps its error code.
    ///
    /// # Errors
    ///
    /// See [`ValidationManagerConfigBuilder::combine_with_rule`].
    pub fn replace_rule(
        &mut self,
        value_host_name: &str,
        error_code: &str,
        condition: ConditionConfig,
    ) -> Result<&mut Self> {
        self.base_mut()
            .modify_validator(value_host_name, error_code, |validator| {
                rules::replace(validator, condition);
            })?;
        Ok(self)
    }

    /// See [`ConfigBuilderBase::complete`].
    ///
    /// # Errors
    ///
    /// Returns `Disposed` if already completed or disposed.
    pub fn complete(self) -> Result<ManagerConfig> {
        self.inner.complete()
    }

    /// See [`ConfigBuilderBase::dispose`].
    pub fn dispose(&mut self) {
        self.inner.dispose();
    }
}

impl DeclareValueHosts for ValidationManagerConfigBuilder {
    fn destination_configs(&mut self) -> Result<&mut Vec<ValueHostConfig>> {
        self.inner.destination_configs()
    }
}

impl CompleteManagerConfig for ValidationManagerConfigBuilder {
    fn complete(self) -> Result<ManagerConfig> {
        ValidationManagerConfigBuilder::complete(self)
    }
}
