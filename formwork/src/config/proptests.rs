//! Property-based tests for configuration merging.

use super::merger::{ConfigMerger, ValueHostConfigMergeService};
use super::schema::{ConditionConfig, ValidatorConfig, ValueHostConfig, ValueHostType};
use proptest::prelude::*;
use serde_json::Value;

fn value_host_type_strategy() -> impl Strategy<Value = ValueHostType> {
    prop_oneof![
        Just(ValueHostType::Static),
        Just(ValueHostType::Calc),
        Just(ValueHostType::Input),
        Just(ValueHostType::Property),
    ]
}

fn validator_strategy() -> impl Strategy<Value = ValidatorConfig> {
    (
        prop::sample::select(vec!["RequireText", "Range", "Regex", "NotNull"]),
        prop::option::of("[a-z]{1,10}"),
    )
        .prop_map(|(condition, message)| ValidatorConfig {
            error_message: message,
            ..ValidatorConfig::new(ConditionConfig::new(condition))
        })
}

// Validators with distinct error codes, as a validated config has.
fn validators_strategy() -> impl Strategy<Value = Option<Vec<ValidatorConfig>>> {
    prop::option::of(prop::collection::vec(validator_strategy(), 0..4).prop_map(|mut list| {
        let mut seen = std::collections::HashSet::new();
        list.retain(|v| seen.insert(v.effective_error_code().map(ToString::to_string)));
        list
    }))
}

fn config_strategy() -> impl Strategy<Value = ValueHostConfig> {
    (
        value_host_type_strategy(),
        prop::option::of("[A-Z][a-z]{0,8}"),
        prop::option::of("[a-z ]{1,20}"),
        prop::option::of(any::<i32>()),
        validators_strategy(),
        prop::collection::btree_map("[a-z]{1,6}", any::<bool>(), 0..3),
    )
        .prop_map(|(value_host_type, data_type, label, initial, validators, extras)| ValueHostConfig {
            name: "field".to_string(),
            value_host_type,
            data_type,
            label,
            initial_value: initial.map(Value::from),
            validator_configs: validators,
            extras: extras.into_iter().map(|(k, v)| (k, Value::from(v))).collect(),
            ..Default::default()
        })
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 2000,
        .. ProptestConfig::default()
    })]

    // Overridable fields take the source value when present
    #[test]
    fn merge_source_wins_when_present(base in config_strategy(), source in config_strategy()) {
        let mut merged = base.clone();
        ConfigMerger::new().merge(&source, &mut merged);

        if source.label.is_some() {
            prop_assert_eq!(&merged.label, &source.label);
        } else {
            prop_assert_eq!(&merged.label, &base.label);
        }
        if source.initial_value.is_some() {
            prop_assert_eq!(&merged.initial_value, &source.initial_value);
        } else {
            prop_assert_eq!(&merged.initial_value, &base.initial_value);
        }
        for (key, value) in &source.extras {
            prop_assert_eq!(merged.extras.get(key), Some(value));
        }
        for key in base.extras.keys() {
            prop_assert!(merged.extras.contains_key(key));
        }
    }

    // No-change fields keep the destination value once set
    #[test]
    fn merge_keeps_no_change_fields(base in config_strategy(), source in config_strategy()) {
        let mut merged = base.clone();
        ConfigMerger::new().merge(&source, &mut merged);

        prop_assert_eq!(&merged.value_host_type, &base.value_host_type);
        if base.data_type.is_some() {
            prop_assert_eq!(&merged.data_type, &base.data_type);
        } else {
            prop_assert_eq!(&merged.data_type, &source.data_type);
        }
    }

    // Merging an empty override changes nothing
    #[test]
    fn merge_with_empty_is_identity(base in config_strategy()) {
        let empty = ValueHostConfig::new("field", base.value_host_type.clone());
        let mut merged = base.clone();
        ConfigMerger::new().merge(&empty, &mut merged);
        prop_assert_eq!(merged, base);
    }

    // Merging is idempotent
    #[test]
    fn merge_twice_equals_once(base in config_strategy(), source in config_strategy()) {
        let merger = ConfigMerger::new();
        let mut once = base.clone();
        merger.merge(&source, &mut once);
        let mut twice = once.clone();
        merger.merge(&source, &mut twice);
        prop_assert_eq!(once, twice);
    }

    // Every error code from either side survives exactly once
    #[test]
    fn merge_validators_by_error_code(base in config_strategy(), source in config_strategy()) {
        let mut merged = base.clone();
        ConfigMerger::new().merge(&source, &mut merged);

        let codes: Vec<_> = merged.validators().iter().filter_map(ValidatorConfig::effective_error_code).collect();
        let unique: std::collections::BTreeSet<_> = codes.iter().collect();
        prop_assert_eq!(codes.len(), unique.len());
        for validator in base.validators().iter().chain(source.validators()) {
            let code = validator.effective_error_code();
            prop_assert!(merged.find_validator(code.unwrap_or_default()).is_some());
        }
    }

    // Config identity is the name
    #[test]
    fn conflict_found_by_name(names in prop::collection::btree_set("[a-z]{1,8}", 1..8), pick in any::<prop::sample::Index>()) {
        let existing: Vec<_> = names
            .iter()
            .map(|name| ValueHostConfig::new(name.clone(), ValueHostType::Static))
            .collect();
        let index = pick.index(existing.len());
        let candidate = ValueHostConfig::new(existing[index].name.clone(), ValueHostType::Input);
        let merger = ConfigMerger::new();
        prop_assert_eq!(merger.identify_value_host_conflict(&candidate, &existing), Some(index));

        let stranger = ValueHostConfig::new("NOT-A-NAME", ValueHostType::Static);
        prop_assert_eq!(merger.identify_value_host_conflict(&stranger, &existing), None);
    }
}
