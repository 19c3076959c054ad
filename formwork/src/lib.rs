#![deny(missing_docs, unsafe_code)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

//! # formwork
//!
//! A configuration-driven value host registry for form validation.
//!
//! Value hosts are named containers for the values a form works with. This
//! library builds their configurations in layers (business logic first, UI
//! overrides later), merges the layers field by field, and keeps the live
//! value hosts, their configurations and their instance state in one
//! manager that can be persisted and rehydrated.
//!
//! ## Core Types
//!
//! - [`ValidationManagerConfigBuilder`]: layered configuration builder
//! - [`ValueHostsManager`]: the live registry
//! - [`ManagerConfigModifier`]: staged changes to a live registry
//! - [`ValueHostInstanceState`] and [`ManagerStateSnapshot`]: persistable state
//! - [`Error`] and [`Result`]: Error handling types
//! - [`Logger`] and [`LogLevel`]: Logging infrastructure
//!
//! ## Examples
//!
//! ```
//! use std::rc::Rc;
//! use formwork::builder::DeclareValueHosts;
//! use formwork::services::{create_builder, ValidationServices};
//! use formwork::{ManagerStateSnapshot, ValueHostsManager};
//! use serde_json::json;
//!
//! let services = Rc::new(ValidationServices::new());
//! let mut builder = create_builder(&services);
//! builder.static_host("F1").unwrap();
//! let config = builder.complete().unwrap();
//!
//! let manager = ValueHostsManager::new(config.clone()).unwrap();
//! let f1 = manager.get_value_host("F1").unwrap().unwrap();
//! f1.set_value(Some(json!(10)), Default::default()).unwrap();
//! let saved: ManagerStateSnapshot = manager.snapshot().unwrap();
//! drop(manager);
//!
//! let restored = ValueHostsManager::new(config.with_snapshot(saved)).unwrap();
//! let f1 = restored.get_value_host("F1").unwrap().unwrap();
//! assert_eq!(f1.value().unwrap(), Some(json!(10)));
//! ```

pub mod builder;
pub mod config;
pub mod error;
pub mod logging;
pub mod manager;
pub mod modifier;
pub mod services;
pub mod state;
pub mod value_host;

// Re-export key types at crate root for convenience
pub use builder::{
    CombineUsing, DeclareValueHosts, UiLayerOptions, ValidationManagerConfigBuilder,
    ValueHostsManagerConfigBuilder,
};
pub use config::{ManagerConfig, ValueHostConfig, ValueHostType};
pub use error::{Error, Result};
pub use logging::{init_logger, try_init_logger, LogLevel, Logger};
pub use manager::{ManagerHandle, ValueHostsManager};
pub use modifier::ManagerConfigModifier;
pub use services::ValidationServices;
pub use state::{ManagerInstanceState, ManagerStateSnapshot, ValidationStatus, ValueHostInstanceState};
pub use value_host::{ValueHost, ValueHostRef};
