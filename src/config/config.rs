//! Root configuration structure and canonical output targets

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Value};
use std::path::Path;

use super::normalize::normalize_output_param;

/// Root configuration for a generation run
///
/// Schema and document pointers accept heterogeneous shapes (single value or
/// list, bare string or keyed mapping); they are kept as raw YAML values and
/// canonicalized by the normalization functions before use.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Root schema pointers
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<Value>,

    /// Root document pointers
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub documents: Option<Value>,

    /// Base configuration layer applied to every output
    #[serde(default)]
    pub config: Mapping,

    /// Output targets keyed by destination filename, in declaration order
    #[serde(default)]
    pub generates: Mapping,

    /// Extension modules preloaded once before any output is processed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub require: Option<Value>,

    /// Report document validation failures instead of aborting the run
    #[serde(default)]
    pub watch: bool,
}

impl Config {
    /// Load and validate a configuration from a YAML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow!("failed to read config file '{}': {e}", path.display()))?;
        Self::from_yaml(&content)
    }

    /// Parse and validate a configuration from YAML text
    pub fn from_yaml(content: &str) -> Result<Self> {
        let config: Config = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration shape
    ///
    /// Normalizes every output target once to surface malformed plugin chains
    /// before any generation work starts.
    pub fn validate(&self) -> Result<()> {
        if self.generates.is_empty() {
            return Err(anyhow!("at least one output must be configured under 'generates'"));
        }
        for (key, raw) in &self.generates {
            let filename = key
                .as_str()
                .ok_or_else(|| anyhow!("output filename must be a string, found {key:?}"))?;
            let target = normalize_output_param(filename, raw)?;
            if target.plugins.is_empty() {
                return Err(anyhow!("output '{filename}' declares no plugins"));
            }
        }
        Ok(())
    }

    /// Output targets in declaration order
    pub fn output_targets(&self) -> Result<Vec<OutputTarget>> {
        let mut targets = Vec::new();
        for (key, raw) in &self.generates {
            let filename = key
                .as_str()
                .ok_or_else(|| anyhow!("output filename must be a string, found {key:?}"))?;
            targets.push(normalize_output_param(filename, raw)?);
        }
        Ok(targets)
    }
}

/// A canonical output target: one named generation destination
#[derive(Debug, Clone)]
pub struct OutputTarget {
    /// Destination filename
    pub filename: String,

    /// Output-level schema pointers, merged on top of the root set
    pub schema: Vec<Value>,

    /// Output-level document pointers, appended after the root set
    pub documents: Vec<Value>,

    /// Ordered plugin chain; declaration order is execution order
    pub plugins: Vec<PluginSpec>,

    /// Output-level configuration layer
    pub config: Mapping,
}

/// A single plugin declaration inside an output's chain
#[derive(Debug, Clone, PartialEq)]
pub struct PluginSpec {
    /// Short plugin name as declared
    pub name: String,

    /// Inline settings attached to the declaration
    pub settings: PluginSettings,
}

/// Settings form attached to a plugin declaration
#[derive(Debug, Clone, PartialEq)]
pub enum PluginSettings {
    /// Bare name: the plugin receives the layered root and output config
    Bare,

    /// Primitive value: passed through as the plugin's entire configuration,
    /// bypassing layering
    Primitive(Value),

    /// Mapping: layered on top of root and output config
    Mapping(Mapping),
}
