//! Tracer configuration

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Default activity pool buffer size (16 MiB).
pub const DEFAULT_BUFFER_SIZE: usize = 16 * 1024 * 1024;

/// Configuration for the tracer service.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TracerConfig {
    /// Enable device activity buffering and correlation.
    pub enable_tracing: bool,

    /// Resolve and demangle kernel symbol names at call-site interception
    /// time. Adds per-launch overhead.
    pub record_kernel_names: bool,

    /// Size of each backend activity buffer in bytes.
    pub buffer_size: usize,
}

impl Default for TracerConfig {
    fn default() -> Self {
        Self {
            enable_tracing: env_flag("ROCLENS_TRACE_ACTIVITIES").unwrap_or(true),
            record_kernel_names: env_flag("ROCLENS_RECORD_KERNEL_NAMES").unwrap_or(false),
            buffer_size: std::env::var("ROCLENS_BUFFER_SIZE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_BUFFER_SIZE),
        }
    }
}

impl TracerConfig {
    /// Load configuration from a JSON file. Missing fields fall back to
    /// the defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: Self = serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.enable_tracing && self.buffer_size == 0 {
            anyhow::bail!("Activity buffer size must be greater than 0");
        }
        Ok(())
    }
}

fn env_flag(name: &str) -> Option<bool> {
    std::env::var(name)
        .ok()
        .and_then(|v| match v.to_lowercase().as_str() {
            "1" | "true" | "on" | "yes" => Some(true),
            "0" | "false" | "off" | "no" => Some(false),
            _ => None,
        })
}
