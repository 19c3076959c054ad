//! CLI command implementations.
//!
//! This module contains the implementations of all CLI commands:
//! - `validate`: Check a configuration document for errors
//! - `merge`: Layer UI override documents over a business-logic document
//! - `inspect`: Build a manager from a document and show its value hosts

pub mod inspect;
pub mod merge;
pub mod validate;

pub use inspect::InspectCommand;
pub use merge::MergeCommand;
pub use validate::ValidateCommand;
