//! Pure, synchronous shape canonicalization
//!
//! Input configuration accepts several shorthand shapes; everything here
//! turns them into one canonical form so downstream code always iterates
//! sequences and never branches on input shape again.

use anyhow::{anyhow, Result};
use serde_yaml::{Mapping, Value};

use super::config::{OutputTarget, PluginSettings, PluginSpec};

/// Canonicalize a maybe-missing, maybe-scalar, maybe-sequence value
///
/// Missing or null becomes an empty sequence, a scalar becomes a one-element
/// sequence, a sequence passes through unchanged.
pub fn normalize_instance_or_array(value: Option<&Value>) -> Vec<Value> {
    match value {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Sequence(sequence)) => sequence.clone(),
        Some(other) => vec![other.clone()],
    }
}

/// Canonicalize a plugin-chain declaration, preserving declaration order
pub fn normalize_plugins(value: &Value) -> Result<Vec<PluginSpec>> {
    normalize_instance_or_array(Some(value))
        .iter()
        .map(plugin_spec)
        .collect()
}

fn plugin_spec(value: &Value) -> Result<PluginSpec> {
    match value {
        Value::String(name) => Ok(PluginSpec {
            name: name.clone(),
            settings: PluginSettings::Bare,
        }),
        Value::Mapping(map) if map.len() == 1 => {
            let Some((key, settings)) = map.iter().next() else {
                return Err(anyhow!("plugin entry mapping is empty"));
            };
            let name = key
                .as_str()
                .ok_or_else(|| anyhow!("plugin name must be a string, found {key:?}"))?;
            let settings = match settings {
                Value::Null => PluginSettings::Bare,
                Value::Mapping(mapping) => PluginSettings::Mapping(mapping.clone()),
                primitive => PluginSettings::Primitive(primitive.clone()),
            };
            Ok(PluginSpec {
                name: name.to_string(),
                settings,
            })
        }
        other => Err(anyhow!(
            "plugin entry must be a name or a single-key mapping, found {other:?}"
        )),
    }
}

/// Canonicalize a raw output declaration into an [`OutputTarget`]
///
/// Accepts either a bare plugin sequence (an output with no overrides and
/// empty config) or a full output-target mapping.
pub fn normalize_output_param(filename: &str, raw: &Value) -> Result<OutputTarget> {
    match raw {
        Value::Sequence(_) | Value::String(_) => Ok(OutputTarget {
            filename: filename.to_string(),
            schema: Vec::new(),
            documents: Vec::new(),
            plugins: normalize_plugins(raw)?,
            config: Mapping::new(),
        }),
        Value::Mapping(map) => {
            let plugins_value = map
                .get(&Value::String("plugins".into()))
                .ok_or_else(|| anyhow!("output '{filename}' declares no plugins"))?;
            let config = match map.get(&Value::String("config".into())) {
                Some(Value::Mapping(config)) => config.clone(),
                Some(Value::Null) | None => Mapping::new(),
                Some(other) => {
                    return Err(anyhow!(
                        "output '{filename}' config must be a mapping, found {other:?}"
                    ))
                }
            };
            Ok(OutputTarget {
                filename: filename.to_string(),
                schema: normalize_instance_or_array(map.get(&Value::String("schema".into()))),
                documents: normalize_instance_or_array(
                    map.get(&Value::String("documents".into())),
                ),
                plugins: normalize_plugins(plugins_value)?,
                config,
            })
        }
        other => Err(anyhow!(
            "output '{filename}' must be a plugin list or an output mapping, found {other:?}"
        )),
    }
}

/// Compute one plugin's effective configuration
///
/// Strictly ordered three-layer override: root config, then output-level
/// config, then plugin-inline settings, each later layer winning key-by-key.
/// Primitive settings bypass layering entirely and become the plugin's whole
/// configuration. Operates on immutable snapshots and returns a fresh value
/// each call, so plugins in one chain never observe each other's config.
pub fn layer_config(root: &Mapping, output: &Mapping, settings: &PluginSettings) -> Value {
    match settings {
        PluginSettings::Primitive(value) => value.clone(),
        PluginSettings::Bare => Value::Mapping(merge_mappings(&[root, output])),
        PluginSettings::Mapping(inline) => Value::Mapping(merge_mappings(&[root, output, inline])),
    }
}

fn merge_mappings(layers: &[&Mapping]) -> Mapping {
    let mut merged = Mapping::new();
    for layer in layers {
        for (key, value) in layer.iter() {
            merged.insert(key.clone(), value.clone());
        }
    }
    merged
}
