//! Combining and replacing validator rules.
//!
//! Both operations locate a validator by value host name and error code,
//! searching the newest configuration list first, and change its condition in
//! place. The validator keeps the error code it was found under, so other
//! layers can still address it.

use crate::config::{ConditionConfig, ValidatorConfig, ValueHostConfig};
use crate::error::{Error, Result};

/// How a new condition is joined with a validator's existing condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CombineUsing {
    /// Both conditions must succeed.
    All,
    /// Either condition may succeed.
    Any,
    /// The existing condition only runs when the new condition succeeds.
    When,
}

/// Finds a validator in `lists`, which must be ordered newest first.
pub(crate) fn find_validator_mut<'a, I>(
    lists: I,
    value_host_name: &str,
    error_code: &str,
) -> Option<&'a mut ValidatorConfig>
where
    I: Iterator<Item = &'a mut Vec<ValueHostConfig>>,
{
    for list in lists {
        let found = list
            .iter_mut()
            .find(|config| config.name == value_host_name)
            .and_then(|config| config.find_validator_mut(error_code));
        if found.is_some() {
            return found;
        }
    }
    None
}

pub(crate) fn validator_not_found(value_host_name: &str, error_code: &str) -> Error {
    log::error!("No validator '{error_code}' on value host '{value_host_name}'");
    Error::ValidatorNotFound {
        value_host: value_host_name.to_string(),
        error_code: error_code.to_string(),
    }
}

/// Joins `condition` with the validator's existing condition.
pub(crate) fn combine(validator: &mut ValidatorConfig, using: CombineUsing, condition: ConditionConfig) {
    let error_code = validator.effective_error_code().map(ToString::to_string);
    let combined = match validator.condition_config.take() {
        Some(existing) => match using {
            CombineUsing::All => ConditionConfig::all(vec![existing, condition]),
            CombineUsing::Any => ConditionConfig::any(vec![existing, condition]),
            CombineUsing::When => ConditionConfig::when(condition, existing),
        },
        None => condition,
    };
    validator.condition_config = Some(combined);
    validator.error_code = error_code;
}

/// Replaces the validator's condition.
pub(crate) fn replace(validator: &mut ValidatorConfig, condition: ConditionConfig) {
    let error_code = validator.effective_error_code().map(ToString::to_string);
    validator.condition_config = Some(condition);
    validator.error_code = error_code;
}

/// Applies `change` to the validator found in `lists`.
///
/// # Errors
///
/// Returns `ValidatorNotFound` if no list has the validator.
pub(crate) fn modify<'a, I>(
    lists: I,
    value_host_name: &str,
    error_code: &str,
    change: impl FnOnce(&mut ValidatorConfig),
) -> Result<()>
where
    I: Iterator<Item = &'a mut Vec<ValueHostConfig>>,
{
    let validator = find_validator_mut(lists, value_host_name, error_code)
        .ok_or_else(|| validator_not_found(value_host_name, error_code))?;
    change(validator);
    Ok(())
}
