//! The services bag.
//!
//! [`ValidationServices`] is the one long-lived object shared by every
//! builder, manager and value host created from it. It is held through an
//! `Rc` and never cloned; registries inside it use interior mutability so a
//! registration made after sharing is visible to all consumers at once.
//! Sequencing such registrations relative to manager construction is the
//! caller's responsibility.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::{Rc, Weak};

use serde_json::Value;

use crate::builder::ValidationManagerConfigBuilder;
use crate::config::{ConditionConfig, ConfigMap, ConfigMerger, ValueHostConfigMergeService};
use crate::error::{Error, Result};
use crate::manager::ManagerHandle;
use crate::modifier::ManagerConfigModifier;
use crate::value_host::{CalcContext, ValueHostFactory};

/// Culture that matches every requested culture.
pub const WILDCARD_CULTURE: &str = "*";

/// Looks up localized validation messages.
pub trait TextLocalizerService {
    /// Error message template registered for `error_code` in `culture`.
    fn get_error_message(&self, culture: &str, error_code: &str) -> Option<String>;

    /// Summary message template registered for `error_code` in `culture`.
    fn get_summary_message(&self, culture: &str, error_code: &str) -> Option<String>;
}

type MessageTable = HashMap<String, HashMap<String, String>>;

/// In-memory message table keyed by error code, then culture.
///
/// Lookups try the exact culture, then its language (`en` for `en-US`), then
/// the wildcard culture.
///
/// # Examples
///
/// ```
/// use formwork::services::{TextLocalizer, TextLocalizerService};
///
/// let localizer = TextLocalizer::new();
/// localizer.register_error_message("RequireText", "*", "This field is required");
/// assert!(localizer.get_error_message("fr-FR", "RequireText").is_some());
/// assert!(localizer.get_error_message("*", "Range").is_none());
/// ```
#[derive(Debug, Default)]
pub struct TextLocalizer {
    error_messages: RefCell<MessageTable>,
    summary_messages: RefCell<MessageTable>,
}

impl TextLocalizer {
    /// Creates an empty localizer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an error message template.
    pub fn register_error_message(&self, error_code: &str, culture: &str, text: &str) {
        Self::register(&self.error_messages, error_code, culture, text);
    }

    /// Registers a summary message template.
    pub fn register_summary_message(&self, error_code: &str, culture: &str, text: &str) {
        Self::register(&self.summary_messages, error_code, culture, text);
    }

    fn register(table: &RefCell<MessageTable>, error_code: &str, culture: &str, text: &str) {
        table
            .borrow_mut()
            .entry(error_code.to_string())
            .or_default()
            .insert(culture.to_string(), text.to_string());
    }

    fn lookup(table: &RefCell<MessageTable>, culture: &str, error_code: &str) -> Option<String> {
        let table = table.borrow();
        let cultures = table.get(error_code)?;
        let language = culture.split('-').next().unwrap_or(culture);
        cultures
            .get(culture)
            .or_else(|| cultures.get(language))
            .or_else(|| cultures.get(WILDCARD_CULTURE))
            .cloned()
    }
}

impl TextLocalizerService for TextLocalizer {
    fn get_error_message(&self, culture: &str, error_code: &str) -> Option<String> {
        Self::lookup(&self.error_messages, culture, error_code)
    }

    fn get_summary_message(&self, culture: &str, error_code: &str) -> Option<String> {
        Self::lookup(&self.summary_messages, culture, error_code)
    }
}

/// A calculation function for calculated value hosts.
pub type CalcFn = Rc<dyn Fn(&CalcContext<'_>) -> Result<Option<Value>>>;

/// Calculation functions addressable by name from configuration.
#[derive(Default)]
pub struct CalcFunctionRegistry {
    functions: RefCell<HashMap<String, CalcFn>>,
}

impl CalcFunctionRegistry {
    /// Registers (or replaces) a calculation function.
    pub fn register<F>(&self, name: &str, function: F)
    where
        F: Fn(&CalcContext<'_>) -> Result<Option<Value>> + 'static,
    {
        self.functions
            .borrow_mut()
            .insert(name.to_string(), Rc::new(function));
    }

    /// Looks up a calculation function.
    ///
    /// # Errors
    ///
    /// Returns `CalcFunctionNotFound` if nothing is registered under `name`.
    pub fn get(&self, name: &str) -> Result<CalcFn> {
        self.functions
            .borrow()
            .get(name)
            .cloned()
            .ok_or_else(|| Error::CalcFunctionNotFound {
                name: name.to_string(),
            })
    }

    /// Returns whether a function is registered under `name`.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.functions.borrow().contains_key(name)
    }
}

impl fmt::Debug for CalcFunctionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let functions = self.functions.borrow();
        let mut names: Vec<_> = functions.keys().collect();
        names.sort();
        f.debug_struct("CalcFunctionRegistry")
            .field("functions", &names)
            .finish()
    }
}

/// Outcome of evaluating a condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConditionEvaluateResult {
    /// The value satisfies the condition.
    Match,
    /// The value violates the condition.
    NoMatch,
    /// The condition could not decide.
    Undetermined,
}

/// An evaluatable condition produced by a [`ConditionFactory`].
pub trait Condition {
    /// The condition type this object implements.
    fn condition_type(&self) -> &str;

    /// Evaluates the condition against a value.
    fn evaluate(&self, value: Option<&Value>) -> ConditionEvaluateResult;
}

/// Produces evaluatable conditions from their configurations.
pub trait ConditionFactory {
    /// Creates the condition described by `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if the condition type is unknown.
    fn create(&self, config: &ConditionConfig) -> Result<Box<dyn Condition>>;

    /// Returns whether `condition_type` can be created.
    fn can_create(&self, condition_type: &str) -> bool;
}

type ConditionCreator = Rc<dyn Fn(&ConditionConfig) -> Box<dyn Condition>>;

/// Condition factory backed by registered constructors.
#[derive(Default)]
pub struct ConditionRegistry {
    creators: RefCell<HashMap<String, ConditionCreator>>,
}

impl ConditionRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a constructor for a condition type.
    pub fn register<F>(&self, condition_type: &str, creator: F)
    where
        F: Fn(&ConditionConfig) -> Box<dyn Condition> + 'static,
    {
        self.creators
            .borrow_mut()
            .insert(condition_type.to_string(), Rc::new(creator));
    }
}

impl ConditionFactory for ConditionRegistry {
    fn create(&self, config: &ConditionConfig) -> Result<Box<dyn Condition>> {
        let creator = self
            .creators
            .borrow()
            .get(&config.condition_type)
            .cloned()
            .ok_or_else(|| Error::Configuration {
                reason: format!("unknown condition type '{}'", config.condition_type),
            })?;
        Ok(creator(config))
    }

    fn can_create(&self, condition_type: &str) -> bool {
        self.creators.borrow().contains_key(condition_type)
    }
}

impl fmt::Debug for ConditionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConditionRegistry")
            .field("types", &self.creators.borrow().len())
            .finish()
    }
}

/// Creates config builders bound to a services bag.
pub trait ConfigBuilderFactory {
    /// Creates a builder.
    fn create(&self, services: Rc<ValidationServices>) -> ValidationManagerConfigBuilder;
}

/// Creates config modifiers bound to a live manager.
pub trait ConfigModifierFactory {
    /// Creates a modifier over `manager` and its current configuration map.
    fn create(
        &self,
        manager: ManagerHandle,
        existing: Weak<RefCell<ConfigMap>>,
    ) -> ManagerConfigModifier;
}

/// Builder factory producing [`ValidationManagerConfigBuilder`]s.
#[derive(Debug, Default)]
pub struct DefaultConfigBuilderFactory;

impl ConfigBuilderFactory for DefaultConfigBuilderFactory {
    fn create(&self, services: Rc<ValidationServices>) -> ValidationManagerConfigBuilder {
        ValidationManagerConfigBuilder::new(services)
    }
}

/// Modifier factory producing [`ManagerConfigModifier`]s.
#[derive(Debug, Default)]
pub struct DefaultConfigModifierFactory;

impl ConfigModifierFactory for DefaultConfigModifierFactory {
    fn create(
        &self,
        manager: ManagerHandle,
        existing: Weak<RefCell<ConfigMap>>,
    ) -> ManagerConfigModifier {
        ManagerConfigModifier::new(manager, existing)
    }
}

/// Dependency container shared by builders, managers and value hosts.
///
/// # Examples
///
/// ```
/// use std::rc::Rc;
/// use formwork::services::{TextLocalizer, ValidationServices};
///
/// let localizer = Rc::new(TextLocalizer::new());
/// let services = Rc::new(ValidationServices::new().with_text_localizer(localizer.clone()));
///
/// // Registrations after sharing are visible through the bag.
/// localizer.register_error_message("RequireText", "*", "Required");
/// assert!(services.text_localizer().get_error_message("en", "RequireText").is_some());
/// ```
pub struct ValidationServices {
    value_host_factory: ValueHostFactory,
    config_merge_service: Rc<dyn ValueHostConfigMergeService>,
    condition_factory: Rc<dyn ConditionFactory>,
    text_localizer: Rc<dyn TextLocalizerService>,
    calc_functions: CalcFunctionRegistry,
    builder_factory: Rc<dyn ConfigBuilderFactory>,
    modifier_factory: Rc<dyn ConfigModifierFactory>,
}

impl ValidationServices {
    /// Creates a services bag with the default implementation of every service.
    #[must_use]
    pub fn new() -> Self {
        Self {
            value_host_factory: ValueHostFactory::with_builtin_generators(),
            config_merge_service: Rc::new(ConfigMerger::new()),
            condition_factory: Rc::new(ConditionRegistry::new()),
            text_localizer: Rc::new(TextLocalizer::new()),
            calc_functions: CalcFunctionRegistry::default(),
            builder_factory: Rc::new(DefaultConfigBuilderFactory),
            modifier_factory: Rc::new(DefaultConfigModifierFactory),
        }
    }

    /// Replaces the configuration merge service.
    #[must_use]
    pub fn with_config_merge_service(mut self, service: Rc<dyn ValueHostConfigMergeService>) -> Self {
        self.config_merge_service = service;
        self
    }

    /// Replaces the condition factory.
    #[must_use]
    pub fn with_condition_factory(mut self, factory: Rc<dyn ConditionFactory>) -> Self {
        self.condition_factory = factory;
        self
    }

    /// Replaces the text localizer.
    #[must_use]
    pub fn with_text_localizer(mut self, localizer: Rc<dyn TextLocalizerService>) -> Self {
        self.text_localizer = localizer;
        self
    }

    /// Replaces the builder factory.
    #[must_use]
    pub fn with_builder_factory(mut self, factory: Rc<dyn ConfigBuilderFactory>) -> Self {
        self.builder_factory = factory;
        self
    }

    /// Replaces the modifier factory.
    #[must_use]
    pub fn with_modifier_factory(mut self, factory: Rc<dyn ConfigModifierFactory>) -> Self {
        self.modifier_factory = factory;
        self
    }

    /// The value host factory.
    #[must_use]
    pub fn value_host_factory(&self) -> &ValueHostFactory {
        &self.value_host_factory
    }

    /// The configuration merge service.
    #[must_use]
    pub fn config_merge_service(&self) -> &dyn ValueHostConfigMergeService {
        self.config_merge_service.as_ref()
    }

    /// The condition factory.
    #[must_use]
    pub fn condition_factory(&self) -> &dyn ConditionFactory {
        self.condition_factory.as_ref()
    }

    /// The text localizer.
    #[must_use]
    pub fn text_localizer(&self) -> &dyn TextLocalizerService {
        self.text_localizer.as_ref()
    }

    /// The calculation function registry.
    #[must_use]
    pub fn calc_functions(&self) -> &CalcFunctionRegistry {
        &self.calc_functions
    }

    /// The builder factory.
    #[must_use]
    pub fn builder_factory(&self) -> &dyn ConfigBuilderFactory {
        self.builder_factory.as_ref()
    }

    /// The modifier factory.
    #[must_use]
    pub fn modifier_factory(&self) -> &dyn ConfigModifierFactory {
        self.modifier_factory.as_ref()
    }
}

impl Default for ValidationServices {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ValidationServices {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValidationServices")
            .field("value_host_factory", &self.value_host_factory)
            .field("calc_functions", &self.calc_functions)
            .finish_non_exhaustive()
    }
}

/// Creates a validation-aware config builder through the services' builder factory.
///
/// # Examples
///
/// ```
/// use std::rc::Rc;
/// use formwork::services::{create_builder, ValidationServices};
///
/// let services = Rc::new(ValidationServices::new());
/// let builder = create_builder(&services);
/// assert!(builder.services().is_ok());
/// ```
#[must_use]
pub fn create_builder(services: &Rc<ValidationServices>) -> ValidationManagerConfigBuilder {
    services.builder_factory().create(Rc::clone(services))
}

#[cfg(test)]
mod tests {
    use super::*;

    struct AlwaysMatch;

    impl Condition for AlwaysMatch {
        fn condition_type(&self) -> &str {
            "AlwaysMatch"
        }

        fn evaluate(&self, _value: Option<&Value>) -> ConditionEvaluateResult {
            ConditionEvaluateResult::Match
        }
    }

    #[test]
    fn test_localizer_culture_fallback() {
        let localizer = TextLocalizer::new();
        localizer.register_error_message("Range", "en", "Out of range");
        localizer.register_error_message("Range", "*", "Range!");
        localizer.register_summary_message("Range", "de-DE", "Bereich");

        assert_eq!(
            localizer.get_error_message("en-GB", "Range").as_deref(),
            Some("Out of range")
        );
        assert_eq!(localizer.get_error_message("fr", "Range").as_deref(), Some("Range!"));
        assert_eq!(
            localizer.get_summary_message("de-DE", "Range").as_deref(),
            Some("Bereich")
        );
        assert!(localizer.get_summary_message("*", "Range").is_none());
    }

    #[test]
    fn test_calc_registry() {
        let registry = CalcFunctionRegistry::default();
        registry.register("one", |_| Ok(Some(Value::from(1))));
        assert!(registry.contains("one"));
        assert!(registry.get("one").is_ok());

        let err = registry.get("two").err().unwrap();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_condition_registry() {
        let registry = ConditionRegistry::new();
        assert!(!registry.can_create("AlwaysMatch"));
        registry.register("AlwaysMatch", |_| Box::new(AlwaysMatch));
        assert!(registry.can_create("AlwaysMatch"));

        let condition = registry.create(&ConditionConfig::new("AlwaysMatch")).unwrap();
        assert_eq!(condition.condition_type(), "AlwaysMatch");
        assert_eq!(condition.evaluate(None), ConditionEvaluateResult::Match);

        assert!(registry.create(&ConditionConfig::new("Unknown")).is_err());
    }

    #[test]
    fn test_condition_factory_shared_after_construction() {
        let registry = Rc::new(ConditionRegistry::new());
        let services = ValidationServices::new().with_condition_factory(registry.clone());
        registry.register("AlwaysMatch", |_| Box::new(AlwaysMatch));
        assert!(services.condition_factory().can_create("AlwaysMatch"));
    }

    #[test]
    fn test_default_merge_service_installed() {
        let services = ValidationServices::new();
        assert_eq!(
            services.config_merge_service().no_change_property_names(),
            ["valueHostType".to_string(), "dataType".to_string()]
        );
    }
}
