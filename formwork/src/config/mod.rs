//! Configuration system for formwork.
//!
//! This module provides the plain-data configuration model and the services
//! that operate on it:
//! - Value host, validator and condition configurations (`schema`)
//! - Field-by-field merging of business and UI-layer configurations (`merger`)
//! - Static validation of configuration lists (`validator`)
//! - YAML/JSON loading of configurations and state snapshots (`loader`)
//! - The manager-level configuration and its notification handlers
//!
//! # Merge Precedence
//!
//! When a builder completes, configurations are merged with the following
//! precedence (highest to lowest):
//!
//! 1. The newest override list
//! 2. Older override lists, newest first
//! 3. The base list
//!
//! Fields listed by the merge service as no-change keep the first value
//! they were given.
//!
//! # Examples
//!
//! Loading and validating a document:
//!
//! ```
//! use formwork::config::{ConfigFormat, ConfigLoader, ConfigValidator};
//!
//! let yaml = "
//! valueHostConfigs:
//!   - name: email
//!     valueHostType: Input
//!     validatorConfigs:
//!       - conditionConfig:
//!           conditionType: RequireText
//! ";
//! let config = ConfigLoader::parse(yaml, ConfigFormat::Yaml).unwrap();
//! ConfigValidator::validate(&config.value_host_configs).unwrap();
//! ```

pub mod loader;
pub mod manager_config;
pub mod merger;
pub mod schema;
pub mod validator;

#[cfg(all(test, feature = "property-tests"))]
mod proptests;

// Re-export key types at module root
pub use loader::{ConfigFormat, ConfigLoader};
pub use manager_config::{
    ConfigChangedHandler, ManagerCallbacks, ManagerConfig, ManagerInstanceStateChangedHandler,
    ValidationStatusChangedHandler, ValueChangedHandler, ValueHostInstanceStateChangedHandler,
};
pub use merger::{ConfigMerger, ValueHostConfigMergeService};
pub use schema::{
    condition_types, property_names, ConditionConfig, ConfigMap, ConfigPatch, ValidatorConfig,
    ValidatorSeverity, ValueHostConfig, ValueHostType,
};
pub use validator::ConfigValidator;
