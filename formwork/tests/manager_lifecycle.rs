//! Integration tests for the value hosts manager.
//!
//! These tests drive the manager through its public surface: construction
//! from builders and raw configurations, replacement and discard, state
//! retention, notifications, enumeration and disposal.

mod common;

use common::{Event, Recorder};
use formwork::builder::{DeclareValueHosts, ValueHostsManagerConfigBuilder};
use formwork::config::{ManagerConfig, ValueHostConfig, ValueHostType};
use formwork::services::create_builder;
use formwork::value_host::SetValueOptions;
use formwork::{Error, ValidationStatus, ValueHostInstanceState, ValueHostsManager};
use serde_json::json;

// ============================================================================
// Test Utilities
// ============================================================================

fn f1_manager() -> ValueHostsManager {
    let config = ManagerConfig::new(common::services())
        .with_value_host(ValueHostConfig::new("F1", ValueHostType::Static));
    let config = ManagerConfig {
        saved_value_host_instance_states: vec![ValueHostInstanceState::new("F1").with_value(json!(10))],
        ..config
    };
    ValueHostsManager::new(config).unwrap()
}

fn recorded_manager(declare: impl FnOnce(&mut ValueHostsManagerConfigBuilder)) -> (ValueHostsManager, Recorder) {
    let recorder = Recorder::new();
    let mut builder = ValueHostsManagerConfigBuilder::new(common::services());
    declare(&mut builder);
    recorder.attach(&mut builder);
    (ValueHostsManager::from_builder(builder).unwrap(), recorder)
}

// ============================================================================
// State retention
// ============================================================================

#[test]
fn test_update_without_state_retains_value() {
    let manager = f1_manager();
    let f1 = manager.get_value_host("F1").unwrap().unwrap();
    assert_eq!(f1.value().unwrap(), Some(json!(10)));

    let replacement = ValueHostConfig::new("F1", ValueHostType::Static).with_label("First");
    let f1 = manager.add_or_update_value_host(&replacement, None).unwrap();
    assert_eq!(f1.value().unwrap(), Some(json!(10)));
    assert_eq!(f1.label().unwrap(), "First");
}

#[test]
fn test_discard_forgets_state() {
    let manager = f1_manager();
    manager.discard_value_host("F1").unwrap();
    assert!(manager.get_value_host("F1").unwrap().is_none());

    let f1 = manager
        .add_value_host(&ValueHostConfig::new("F1", ValueHostType::Static), None)
        .unwrap();
    assert_eq!(f1.value().unwrap(), None);
}

#[test]
fn test_explicit_state_wins_and_is_remembered() {
    let manager = f1_manager();
    let config = ValueHostConfig::new("F1", ValueHostType::Static);
    manager
        .add_or_update_value_host(&config, Some(ValueHostInstanceState::new("F1").with_value(json!(20))))
        .unwrap();
    let f1 = manager.add_or_update_value_host(&config, None).unwrap();
    assert_eq!(f1.value().unwrap(), Some(json!(20)));
}

#[test]
fn test_value_set_after_construction_survives_rebuild() {
    let manager = f1_manager();
    let f1 = manager.get_value_host("F1").unwrap().unwrap();
    f1.set_value(Some(json!(11)), SetValueOptions::default()).unwrap();

    let f1 = manager
        .add_or_merge_value_host(&ValueHostConfig::new("F1", ValueHostType::Static).with_label("F"), None)
        .unwrap();
    assert_eq!(f1.value().unwrap(), Some(json!(11)));
    assert!(f1.is_changed().unwrap());
}

#[test]
fn test_cleared_value_survives_rebuild() {
    let config = ManagerConfig::new(common::services())
        .with_value_host(ValueHostConfig::new("F", ValueHostType::Static).with_initial_value(json!(1)));
    let manager = ValueHostsManager::new(config).unwrap();
    let f = manager.get_value_host("F").unwrap().unwrap();
    f.set_value(None, SetValueOptions::default()).unwrap();
    assert_eq!(f.value().unwrap(), None);

    let replacement = ValueHostConfig::new("F", ValueHostType::Static).with_initial_value(json!(1));
    let f = manager.add_or_update_value_host(&replacement, None).unwrap();
    assert_eq!(f.value().unwrap(), None);

    let f = manager
        .add_or_merge_value_host(&ValueHostConfig::new("F", ValueHostType::Static).with_label("F"), None)
        .unwrap();
    assert_eq!(f.value().unwrap(), None);
    assert!(f.is_changed().unwrap());
}

#[test]
fn test_retyped_host_cleans_up_stale_state() {
    let config = ManagerConfig::new(common::services())
        .with_value_host(ValueHostConfig::new("x", ValueHostType::Input));
    let manager = ValueHostsManager::new(config).unwrap();
    let x = manager.get_value_host("x").unwrap().unwrap();
    x.set_input_value(Some(json!("abc")), SetValueOptions::default()).unwrap();
    assert_eq!(x.input_value().unwrap(), Some(json!("abc")));

    let x = manager
        .add_or_update_value_host(&ValueHostConfig::new("x", ValueHostType::Property), None)
        .unwrap();
    assert_eq!(x.instance_state().unwrap().input_value, None);
}

// ============================================================================
// Registry operations
// ============================================================================

#[test]
fn test_add_value_host_rejects_registered_name() {
    let manager = f1_manager();
    let err = manager
        .add_value_host(&ValueHostConfig::new("F1", ValueHostType::Static), None)
        .unwrap_err();
    assert!(matches!(err, Error::DuplicateValueHostName { .. }));
    assert_eq!(manager.value_host_names().unwrap(), ["F1"]);
}

#[test]
fn test_merge_keeps_unchangeable_fields() {
    let config = ManagerConfig::new(common::services())
        .with_value_host(ValueHostConfig::new("age", ValueHostType::Static).with_data_type("Integer"));
    let manager = ValueHostsManager::new(config).unwrap();

    let patch = ValueHostConfig::new("age", ValueHostType::Input)
        .with_data_type("String")
        .with_label("Age");
    let age = manager.add_or_merge_value_host(&patch, None).unwrap();
    assert_eq!(age.value_host_type().unwrap(), ValueHostType::Static);
    assert_eq!(age.data_type().unwrap().as_deref(), Some("Integer"));
    assert_eq!(age.label().unwrap(), "Age");
}

#[test]
fn test_update_replaces_verbatim() {
    let config = ManagerConfig::new(common::services())
        .with_value_host(ValueHostConfig::new("age", ValueHostType::Static).with_data_type("Integer"));
    let manager = ValueHostsManager::new(config).unwrap();

    manager
        .add_or_update_value_host(&ValueHostConfig::new("age", ValueHostType::Static), None)
        .unwrap();
    let config = manager.get_value_host_config("age").unwrap().unwrap();
    assert!(config.data_type.is_none());
}

#[test]
fn test_configs_are_copies() {
    let manager = f1_manager();
    let mut config = manager.get_value_host_config("F1").unwrap().unwrap();
    config.label = Some("changed".into());
    let stored = manager.get_value_host_config("F1").unwrap().unwrap();
    assert!(stored.label.is_none());
}

#[test]
fn test_enumeration_sees_live_registry() {
    let config = ManagerConfig::new(common::services())
        .with_value_host(ValueHostConfig::new("a", ValueHostType::Static))
        .with_value_host(ValueHostConfig::new("b", ValueHostType::Input))
        .with_value_host(ValueHostConfig::new("d", ValueHostType::Input));
    let manager = ValueHostsManager::new(config).unwrap();

    let mut iter = manager.enumerate_value_hosts(None).unwrap();
    assert_eq!(iter.next().unwrap().name().unwrap(), "a");
    manager
        .add_value_host(&ValueHostConfig::new("c", ValueHostType::Static), None)
        .unwrap();
    manager.discard_value_host("d").unwrap();
    let rest: Vec<_> = iter.map(|h| h.name().unwrap()).collect();
    assert_eq!(rest, ["b", "c"]);

    let inputs: Vec<_> = manager
        .enumerate_value_hosts(Some(Box::new(|host| {
            host.value_host_type().is_ok_and(|t| t == ValueHostType::Input)
        })))
        .unwrap()
        .map(|h| h.name().unwrap())
        .collect();
    assert_eq!(inputs, ["b"]);
}

#[test]
fn test_accessor_type_assertions() {
    let mut builder = create_builder(&common::services());
    builder.static_host("country").unwrap();
    builder.input("email").unwrap();
    let manager = ValueHostsManager::from_builder(builder).unwrap();

    let vh = manager.vh().unwrap();
    assert!(vh.get_static("country").is_ok());
    assert!(vh.get_validatable("email").is_ok());
    assert!(matches!(
        vh.get_input("country"),
        Err(Error::WrongValueHostType { .. })
    ));
    assert!(matches!(vh.get("missing"), Err(Error::ValueHostNotFound { .. })));
    assert!(manager.get_value_host("missing").unwrap().is_none());
}

// ============================================================================
// Notifications
// ============================================================================

#[test]
fn test_config_changed_notifications() {
    let (manager, recorder) = recorded_manager(|_| {});
    assert!(recorder.events().is_empty());

    manager
        .add_value_host(&ValueHostConfig::new("A", ValueHostType::Static), None)
        .unwrap();
    assert_eq!(recorder.events(), [Event::ConfigChanged(vec!["A".into()])]);

    manager.discard_value_host("A").unwrap();
    assert_eq!(recorder.config_changed_count(), 2);
    assert_eq!(recorder.events()[1], Event::ConfigChanged(vec![]));

    manager.discard_value_host("A").unwrap();
    assert_eq!(recorder.config_changed_count(), 2);
}

#[test]
fn test_config_changed_payload_is_a_copy() {
    let captured = std::rc::Rc::new(std::cell::RefCell::new(Vec::new()));
    let sink = std::rc::Rc::clone(&captured);
    let mut builder = ValueHostsManagerConfigBuilder::new(common::services());
    builder
        .on_config_changed(move |configs| sink.borrow_mut().extend(configs))
        .unwrap();
    let manager = ValueHostsManager::from_builder(builder).unwrap();

    manager
        .add_value_host(&ValueHostConfig::new("A", ValueHostType::Static), None)
        .unwrap();
    captured.borrow_mut()[0].label = Some("mutated".into());
    let stored = manager.get_value_host_config("A").unwrap().unwrap();
    assert!(stored.label.is_none());
}

#[test]
fn test_set_value_notification_order() {
    let (manager, recorder) = recorded_manager(|builder| {
        builder.static_host("a").unwrap();
    });
    let a = manager.get_value_host("a").unwrap().unwrap();
    a.set_value(Some(json!(1)), SetValueOptions::default()).unwrap();

    assert_eq!(
        recorder.events(),
        [
            Event::HostState("a".into()),
            Event::ManagerState(1),
            Event::Value("a".into(), None),
        ]
    );

    recorder.clear();
    a.set_value(Some(json!(1)), SetValueOptions::default()).unwrap();
    assert!(recorder.events().is_empty());
}

#[test]
fn test_input_value_marks_needs_validation() {
    let recorder = Recorder::new();
    let mut builder = create_builder(&common::services());
    builder
        .input("email")
        .unwrap()
        .condition(formwork::config::ConditionConfig::new("RequireText"));
    recorder.attach_validation(&mut builder);
    let manager = ValueHostsManager::from_builder(builder).unwrap();

    let email = manager.get_value_host("email").unwrap().unwrap();
    assert_eq!(email.validation_status().unwrap(), ValidationStatus::NotAttempted);
    email
        .set_input_value(Some(json!("x@y")), SetValueOptions::default())
        .unwrap();
    assert_eq!(email.validation_status().unwrap(), ValidationStatus::NeedsValidation);
    assert!(recorder
        .events()
        .contains(&Event::ValidationStatus("email".into())));
    assert!(recorder.events().contains(&Event::InputValue("email".into(), None)));
}

#[test]
fn test_dependent_host_needs_validation_after_change() {
    let mut builder = create_builder(&common::services());
    builder.static_host("country").unwrap();
    builder.input("postcode").unwrap().condition(
        formwork::config::ConditionConfig::new("RequireText").with_value_host_name("country"),
    );
    builder
        .input("unrelated")
        .unwrap()
        .condition(formwork::config::ConditionConfig::new("RequireText"));
    let manager = ValueHostsManager::from_builder(builder).unwrap();

    let country = manager.get_value_host("country").unwrap().unwrap();
    country
        .set_value(Some(json!("NZ")), SetValueOptions::validate())
        .unwrap();
    let vh = manager.vh().unwrap();
    assert_eq!(
        vh.get_input("postcode").unwrap().validation_status().unwrap(),
        ValidationStatus::NeedsValidation
    );
    assert_eq!(
        vh.get_input("unrelated").unwrap().validation_status().unwrap(),
        ValidationStatus::NotAttempted
    );
}

#[test]
fn test_update_instance_state_fires_handler() {
    let (manager, recorder) = recorded_manager(|_| {});
    manager
        .update_instance_state(|state| {
            state.extras.insert("page".into(), json!(2));
        })
        .unwrap();
    assert_eq!(recorder.events(), [Event::ManagerState(1)]);
    assert_eq!(manager.instance_state().unwrap().extras.get("page"), Some(&json!(2)));
}

#[test]
fn test_handler_may_call_back_into_manager() {
    let mut builder = ValueHostsManagerConfigBuilder::new(common::services());
    builder.static_host("a").unwrap();
    builder.static_host("mirror").unwrap();
    let manager = std::rc::Rc::new(std::cell::RefCell::new(None::<formwork::ManagerHandle>));
    let handle_slot = std::rc::Rc::clone(&manager);
    builder
        .on_value_changed(move |host, _| {
            if host.name().unwrap_or_default() == "a" {
                if let Some(handle) = handle_slot.borrow().as_ref() {
                    let value = handle.value_of("a").unwrap();
                    assert_eq!(value, Some(json!(5)));
                }
            }
        })
        .unwrap();
    let live = ValueHostsManager::from_builder(builder).unwrap();
    *manager.borrow_mut() = Some(live.handle());

    let a = live.get_value_host("a").unwrap().unwrap();
    a.set_value(Some(json!(5)), SetValueOptions::default()).unwrap();
}

// ============================================================================
// Calculated value hosts
// ============================================================================

#[test]
fn test_calc_reads_other_hosts() {
    let services = common::services_with_messages(&[]);
    let mut builder = create_builder(&services);
    builder.static_host("a").unwrap();
    builder.static_host("b").unwrap();
    builder.calc("total", "sum").unwrap();
    let manager = ValueHostsManager::from_builder(builder).unwrap();

    let vh = manager.vh().unwrap();
    vh.get_static("a").unwrap().set_value(Some(json!(2)), SetValueOptions::default()).unwrap();
    vh.get_static("b").unwrap().set_value(Some(json!(3.5)), SetValueOptions::default()).unwrap();
    let total = vh.get_calc("total").unwrap();
    assert_eq!(total.value().unwrap(), Some(json!(5.5)));
    assert!(matches!(
        total.set_value(Some(json!(1)), SetValueOptions::default()),
        Err(Error::Unsupported { .. })
    ));
}

// ============================================================================
// Disposal
// ============================================================================

#[test]
fn test_dispose_fails_fast_everywhere() {
    let manager = f1_manager();
    let f1 = manager.get_value_host("F1").unwrap().unwrap();
    let handle = manager.handle();

    manager.dispose();
    manager.dispose();

    assert!(manager.get_value_host("F1").unwrap_err().is_disposed());
    assert!(f1.data_type().unwrap_err().is_disposed());
    assert!(manager.value_host_names().unwrap_err().is_disposed());
    assert!(manager.start_modifying().unwrap_err().is_disposed());
    assert!(manager.vh().unwrap_err().is_disposed());
    assert!(manager.snapshot().unwrap_err().is_disposed());
    assert!(!handle.is_live());
}

#[test]
fn test_replaced_handle_fails_fast() {
    let manager = f1_manager();
    let old = manager.get_value_host("F1").unwrap().unwrap();
    manager
        .add_or_merge_value_host(&ValueHostConfig::new("F1", ValueHostType::Static), None)
        .unwrap();
    assert!(old.value().unwrap_err().is_disposed());
    assert!(manager.get_value_host("F1").unwrap().unwrap().is_live());
}
