//! Error types for the formwork library.
//!
//! This module provides the error hierarchy for configuration building,
//! merging and value host registry operations, using `thiserror` for
//! ergonomic error handling.
//!
//! Every variant except the I/O and parsing conversions describes a
//! programming mistake by the configuration author or the embedding
//! application. None of them are retried.

use thiserror::Error;

/// Result type alias for operations that may fail with a formwork error.
///
/// # Examples
///
/// ```
/// use formwork::{Error, Result};
///
/// fn example_operation() -> Result<usize> {
///     Ok(3)
/// }
/// ```
pub type Result<T> = std::result::Result<T, Error>;

/// The main error type for the formwork library.
#[derive(Debug, Error)]
pub enum Error {
    /// A required argument was missing or malformed.
    #[error("invalid argument '{argument}': {reason}")]
    InvalidArgument {
        /// The offending argument.
        argument: String,
        /// The reason the argument is invalid.
        reason: String,
    },

    /// Constructor input was neither a usable services bag nor a usable
    /// pre-built configuration.
    #[error("configuration error: {reason}")]
    Configuration {
        /// What was wrong with the configuration.
        reason: String,
    },

    /// A value host name was declared twice in one destination list, or
    /// added to a manager that already has it.
    #[error("duplicate value host name '{name}'")]
    DuplicateValueHostName {
        /// The duplicated name.
        name: String,
    },

    /// No value host (or value host configuration) exists with this name.
    #[error("value host '{name}' not found")]
    ValueHostNotFound {
        /// The requested name.
        name: String,
    },

    /// No validator with this error code exists on the named value host.
    #[error("validator with error code '{error_code}' not found on value host '{value_host}'")]
    ValidatorNotFound {
        /// The value host that was searched.
        value_host: String,
        /// The requested error code.
        error_code: String,
    },

    /// The value host exists but is not of the expected type.
    #[error("value host '{name}' is a {actual} value host, expected {expected}")]
    WrongValueHostType {
        /// The value host name.
        name: String,
        /// The type the caller asked for.
        expected: String,
        /// The type the value host actually has.
        actual: String,
    },

    /// A component was used after it was disposed.
    #[error("{component} was used after it was disposed")]
    Disposed {
        /// The disposed component.
        component: &'static str,
    },

    /// The value host factory has no generator for a configuration.
    #[error("no value host generator supports value host type '{value_host_type}'")]
    NoValueHostGenerator {
        /// The unsupported value host type.
        value_host_type: String,
    },

    /// A calculated value host names a function that is not registered.
    #[error("calculation function '{name}' is not registered")]
    CalcFunctionNotFound {
        /// The unknown function name.
        name: String,
    },

    /// A calculated value host re-entered itself too many times.
    #[error("calculated value host '{name}' exceeded the evaluation depth limit")]
    CalcCycle {
        /// The calculated value host.
        name: String,
    },

    /// The operation is not supported by this kind of value host.
    #[error("{operation} is not supported by value host '{name}'")]
    Unsupported {
        /// The attempted operation.
        operation: &'static str,
        /// The value host name.
        name: String,
    },

    /// A configuration list failed static validation.
    #[error("validation error in {field}: {message}")]
    Validation {
        /// The value host or field that failed validation.
        field: String,
        /// What was wrong.
        message: String,
    },

    /// The registry reached a state that should be impossible.
    #[error("inconsistent registry state: {details}")]
    Inconsistent {
        /// What was inconsistent.
        details: String,
    },

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A YAML document could not be parsed or written.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// A JSON document could not be parsed or written.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Check if error indicates a missing value host, validator or function.
    ///
    /// # Examples
    ///
    /// ```
    /// use formwork::Error;
    ///
    /// let err = Error::ValueHostNotFound { name: "email".into() };
    /// assert!(err.is_not_found());
    /// ```
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::ValueHostNotFound { .. }
                | Self::ValidatorNotFound { .. }
                | Self::CalcFunctionNotFound { .. }
        )
    }

    /// Check if error reports use of a disposed component.
    ///
    /// # Examples
    ///
    /// ```
    /// use formwork::Error;
    ///
    /// let err = Error::Disposed { component: "ValueHostsManager" };
    /// assert!(err.is_disposed());
    /// ```
    #[must_use]
    pub fn is_disposed(&self) -> bool {
        matches!(self, Self::Disposed { .. })
    }

    pub(crate) fn invalid_argument(argument: &str, reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            argument: argument.to_string(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_name_error() {
        let err = Error::DuplicateValueHostName {
            name: "email".to_string(),
        };
        let display = format!("{err}");
        assert!(display.contains("duplicate"));
        assert!(display.contains("email"));
    }

    #[test]
    fn test_validator_not_found_error() {
        let err = Error::ValidatorNotFound {
            value_host: "age".to_string(),
            error_code: "Range".to_string(),
        };
        let display = format!("{err}");
        assert!(display.contains("age"));
        assert!(display.contains("Range"));
        assert!(err.is_not_found());
    }

    #[test]
    fn test_wrong_type_error() {
        let err = Error::WrongValueHostType {
            name: "total".to_string(),
            expected: "static".to_string(),
            actual: "calc".to_string(),
        };
        let display = format!("{err}");
        assert!(display.contains("total"));
        assert!(display.contains("expected static"));
        assert!(!err.is_not_found());
    }

    #[test]
    fn test_disposed_error() {
        let err = Error::Disposed {
            component: "ConfigBuilder",
        };
        assert!(err.is_disposed());
        assert!(format!("{err}").contains("after it was disposed"));
    }

    #[test]
    fn test_invalid_argument_helper() {
        let err = Error::invalid_argument("name", "must not be empty");
        let display = format!("{err}");
        assert!(display.contains("'name'"));
        assert!(display.contains("must not be empty"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(format!("{err}").contains("I/O error"));
    }

    #[test]
    fn test_result_type_alias() {
        fn returns_result() -> Result<u16> {
            Err(Error::Configuration {
                reason: "test".to_string(),
            })
        }

        assert!(returns_result().is_err());
    }
}
