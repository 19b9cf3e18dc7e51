//! CLI configuration loading.
//!
//! One optional TOML file with a section per concern. Absent sections and
//! absent files fall back to the same environment-backed defaults the
//! library configs use, so a bare `harbormaster verify` works with nothing
//! but `TRACKER_TOKEN` and `FORGE_TOKEN` exported.

use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use harbormaster_core::HostingPolicy;
use harbormaster_remote::{ForgeConfig, TrackerConfig};

/// Everything the binary needs, merged from file and environment.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    /// Verification policy knobs.
    pub policy: HostingPolicy,
    /// Ticket tracker connection.
    pub tracker: TrackerConfig,
    /// Source host connection.
    pub forge: ForgeConfig,
}

impl AppConfig {
    /// Load from `path` when given, otherwise fall back to defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        toml::from_str(&text)
            .with_context(|| format!("failed to parse config file {}", path.display()))
    }
}
