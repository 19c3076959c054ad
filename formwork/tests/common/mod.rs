//! Common test utilities for integration tests.
//!
//! This module provides services fixtures and a recorder that captures the
//! manager's notifications in the order they fire.

use std::cell::RefCell;
use std::rc::Rc;

use formwork::builder::ValueHostsManagerConfigBuilder;
use formwork::services::{TextLocalizer, ValidationServices};
use formwork::ValidationManagerConfigBuilder;
use serde_json::Value;

/// Creates a services bag with default components.
#[allow(dead_code)]
pub fn services() -> Rc<ValidationServices> {
    Rc::new(ValidationServices::new())
}

/// Creates a services bag whose localizer has wildcard-culture error messages
/// for the given error codes, and registers a `sum` calculation function.
#[allow(dead_code)]
pub fn services_with_messages(error_codes: &[&str]) -> Rc<ValidationServices> {
    let localizer = Rc::new(TextLocalizer::new());
    for code in error_codes {
        localizer.register_error_message(code, "*", &format!("{code} (localized)"));
    }
    let services = ValidationServices::new().with_text_localizer(localizer);
    services.calc_functions().register("sum", |context| {
        let a = context.number_of("a")?.unwrap_or_default();
        let b = context.number_of("b")?.unwrap_or_default();
        Ok(Some(Value::from(a + b)))
    });
    Rc::new(services)
}

/// One captured notification.
#[derive(Debug, Clone, PartialEq)]
#[allow(dead_code)]
pub enum Event {
    /// Config-changed, with the names in the payload.
    ConfigChanged(Vec<String>),
    /// Value host instance state changed.
    HostState(String),
    /// Value changed, with the old value.
    Value(String, Option<Value>),
    /// Input value changed, with the old value.
    InputValue(String, Option<Value>),
    /// Manager instance state changed, with the counter.
    ManagerState(u64),
    /// Validation status changed.
    ValidationStatus(String),
}

/// Shared, ordered log of notifications.
#[derive(Debug, Clone, Default)]
pub struct Recorder {
    events: Rc<RefCell<Vec<Event>>>,
}

#[allow(dead_code)]
impl Recorder {
    /// Creates an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every event so far.
    pub fn events(&self) -> Vec<Event> {
        self.events.borrow().clone()
    }

    /// Forgets every event so far.
    pub fn clear(&self) {
        self.events.borrow_mut().clear();
    }

    /// Number of config-changed events so far.
    pub fn config_changed_count(&self) -> usize {
        self.events
            .borrow()
            .iter()
            .filter(|e| matches!(e, Event::ConfigChanged(_)))
            .count()
    }

    fn push(&self, event: Event) {
        self.events.borrow_mut().push(event);
    }

    /// Installs recording handlers for every manager notification.
    pub fn attach(&self, builder: &mut ValueHostsManagerConfigBuilder) {
        let r = self.clone();
        builder
            .on_config_changed(move |configs| {
                r.push(Event::ConfigChanged(
                    configs.into_iter().map(|c| c.name).collect(),
                ));
            })
            .unwrap();
        let r = self.clone();
        builder
            .on_value_host_instance_state_changed(move |_, state| {
                r.push(Event::HostState(state.name.clone()));
            })
            .unwrap();
        let r = self.clone();
        builder
            .on_value_changed(move |host, old| {
                r.push(Event::Value(host.name().unwrap_or_default(), old.cloned()));
            })
            .unwrap();
        let r = self.clone();
        builder
            .on_input_value_changed(move |host, old| {
                r.push(Event::InputValue(host.name().unwrap_or_default(), old.cloned()));
            })
            .unwrap();
        let r = self.clone();
        builder
            .on_instance_state_changed(move |state| {
                r.push(Event::ManagerState(state.state_change_counter));
            })
            .unwrap();
    }

    /// Installs recording handlers on a validation builder, including the
    /// validation-status handler.
    pub fn attach_validation(&self, builder: &mut ValidationManagerConfigBuilder) {
        self.attach(builder.manager_builder_mut());
        let r = self.clone();
        builder
            .on_validation_status_changed(move |host, _| {
                r.push(Event::ValidationStatus(host.name().unwrap_or_default()));
            })
            .unwrap();
    }
}
