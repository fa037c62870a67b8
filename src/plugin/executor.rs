//! Plugin execution protocol
//!
//! One linear sequence per plugin invocation: resolve the implementation,
//! augment the active schema with plugin-contributed SDL, run the
//! best-effort validation hook, then generate. Only resolution and
//! generation failures are fatal.

use anyhow::{Context, Result};
use serde_yaml::Value;
use std::sync::Arc;
use tracing::debug;

use crate::config::PluginSpec;
use crate::documents::DocumentFile;
use crate::schema::{sdl, Schema};

use super::ModuleRegistry;

/// Drives single plugin invocations against a schema/document pair
pub struct PluginExecutor {
    registry: Arc<ModuleRegistry>,
}

impl PluginExecutor {
    pub fn new(registry: Arc<ModuleRegistry>) -> Self {
        Self { registry }
    }

    /// Execute one plugin and return its textual contribution
    pub async fn execute(
        &self,
        name: &str,
        config: &Value,
        schema: Option<&Schema>,
        documents: &[DocumentFile],
        output_file: &str,
        all_plugins: &[PluginSpec],
    ) -> Result<String> {
        let plugin = self.registry.resolve_plugin(name).await?;

        // Augmentation merges onto a copy; the incoming schema is shared
        // across outputs and is never mutated in place.
        let augmented = match plugin.add_to_schema() {
            Some(extra) => {
                debug!(plugin = name, "augmenting schema with plugin SDL");
                let addition = sdl::parse_sdl(&extra)
                    .with_context(|| format!("plugin '{name}' contributed malformed SDL"))?;
                Some(match schema {
                    Some(base) => base.clone().merge(addition),
                    None => addition,
                })
            }
            None => schema.cloned(),
        };

        // Best-effort, non-propagating contract: the hook may warn through
        // its own logging but cannot halt generation.
        if let Err(error) = plugin
            .validate(augmented.as_ref(), documents, config, output_file, all_plugins)
            .await
        {
            debug!(plugin = name, "plugin validation hook failed: {error:#}");
        }

        plugin
            .generate(augmented.as_ref(), documents, config)
            .await
            .with_context(|| format!("plugin '{name}' failed while generating '{output_file}'"))
    }
}
