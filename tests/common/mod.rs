//! Shared testing utilities for zap2xml-manager CLI tests.

use assert_cmd::Command;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Isolated config and data directories for CLI exercises.
#[allow(dead_code)]
pub struct TestContext {
    root: TempDir,
}

#[allow(dead_code)]
impl TestContext {
    pub fn new() -> Self {
        let root = TempDir::new().expect("Failed to create temp directory for tests");
        fs::create_dir_all(root.path().join("work")).expect("Failed to create work directory");
        Self { root }
    }

    pub fn root(&self) -> &Path {
        self.root.path()
    }

    pub fn config_dir(&self) -> PathBuf {
        self.root.path().join("config")
    }

    pub fn data_dir(&self) -> PathBuf {
        self.root.path().join("data")
    }

    pub fn config_file(&self) -> PathBuf {
        self.config_dir().join("config.toml")
    }

    /// Default EPG output directory.
    pub fn output_dir(&self) -> PathBuf {
        self.data_dir().join("epgs")
    }

    /// Build a command for the compiled binary, pointed at this context's directories.
    pub fn cli(&self) -> Command {
        let mut cmd =
            Command::cargo_bin("zap2xml-manager").expect("Failed to locate zap2xml-manager binary");
        cmd.current_dir(self.root.path().join("work"))
            .env("ZAP2XML_CONFIG_DIR", self.config_dir())
            .env("ZAP2XML_DATA_DIR", self.data_dir())
            .env("RUST_LOG", "warn");
        cmd
    }

    pub fn write_config(&self, content: &str) {
        fs::create_dir_all(self.config_dir()).expect("Failed to create config directory");
        fs::write(self.config_file(), content).expect("Failed to write config");
    }

    pub fn read_config(&self) -> toml::Value {
        let content = fs::read_to_string(self.config_file()).expect("Failed to read config");
        toml::from_str(&content).expect("Config should be valid TOML")
    }
}
