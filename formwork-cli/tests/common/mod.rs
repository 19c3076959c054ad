//! Common test utilities for CLI integration tests.
//!
//! This module provides shared helpers for CLI testing, including:
//! - Test environment setup with a temporary directory
//! - Command builder helpers
//! - Document fixtures

use assert_cmd::Command;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Business-logic document with a property, an input and a static host.
#[allow(dead_code)]
pub const BASE_FORM: &str = "
valueHostConfigs:
  - name: age
    valueHostType: Property
    dataType: Integer
    validatorConfigs:
      - conditionConfig:
          conditionType: RequireText
        errorMessage: Age is required
  - name: country
    valueHostType: Static
    initialValue: NZ
  - name: email
    valueHostType: Input
    validatorConfigs:
      - conditionConfig:
          conditionType: RequireText
        errorMessage: Email is required
";

/// Test environment with an isolated working directory.
pub struct TestEnv {
    /// Temporary directory (kept alive for the duration of the test)
    #[allow(dead_code)]
    temp_dir: TempDir,
    /// Path to the temporary directory
    pub temp_path: PathBuf,
}

#[allow(dead_code)]
impl TestEnv {
    /// Create a new test environment.
    pub fn new() -> Self {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let temp_path = temp_dir.path().to_path_buf();
        Self {
            temp_dir,
            temp_path,
        }
    }

    /// Get a command builder for the formwork binary.
    pub fn command(&self) -> Command {
        let mut cmd = Command::cargo_bin("formwork").expect("Failed to find formwork binary");
        cmd.current_dir(&self.temp_path);
        cmd.env_remove("FORMWORK_LOG_MODE");
        cmd
    }

    /// Get the temp path.
    pub fn path(&self) -> &Path {
        &self.temp_path
    }

    /// Write a file under the temporary directory and return its path.
    pub fn write_file(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.temp_path.join(name);
        std::fs::write(&path, contents).expect("Failed to write test file");
        path
    }
}
