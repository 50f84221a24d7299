//! Configuration for the render module.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Configuration for the OpenSCAD-based renderer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RendererConfig {
    /// Path to the openscad binary.
    #[serde(default = "default_binary")]
    pub binary: PathBuf,

    /// Deadline for a single openscad invocation in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Parent directory for per-request staging directories.
    #[serde(default = "default_temp_dir")]
    pub temp_dir: PathBuf,

    /// Additional arguments passed to every export, e.g. `--debug=all`.
    #[serde(default)]
    pub extra_args: Vec<String>,
}

fn default_binary() -> PathBuf {
    PathBuf::from("openscad")
}

fn default_timeout() -> u64 {
    300 // 5 minutes
}

fn default_temp_dir() -> PathBuf {
    std::env::temp_dir()
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            binary: default_binary(),
            timeout_secs: default_timeout(),
            temp_dir: default_temp_dir(),
            extra_args: Vec::new(),
        }
    }
}

impl RendererConfig {
    /// Creates a new config with a custom openscad path.
    pub fn with_binary(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
            ..Default::default()
        }
    }

    /// Sets the temp directory.
    pub fn with_temp_dir(mut self, temp_dir: impl Into<PathBuf>) -> Self {
        self.temp_dir = temp_dir.into();
        self
    }

    /// Sets the timeout in seconds.
    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    /// Sets the extra arguments.
    pub fn with_extra_args(mut self, extra_args: Vec<String>) -> Self {
        self.extra_args = extra_args;
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}
