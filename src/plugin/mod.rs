//! Plugin architecture for extensible code generation

use anyhow::Result;
use async_trait::async_trait;
use serde_yaml::Value;

pub mod builtin;
pub mod executor;
pub mod registry;

pub use executor::PluginExecutor;
pub use registry::{candidate_names, ExtensionModule, ModuleRegistry};

use crate::config::PluginSpec;
use crate::documents::DocumentFile;
use crate::schema::Schema;

/// Generator plugin: turns a schema, documents and config into text
///
/// The only required capability is [`generate`](CodegenPlugin::generate).
/// Plugins may additionally contribute type-system text merged into the
/// active schema before generation, and a best-effort validation hook whose
/// failures never halt generation.
#[async_trait]
pub trait CodegenPlugin: Send + Sync {
    /// Short plugin name
    fn name(&self) -> &str;

    /// Extra SDL this plugin needs merged into the active schema, e.g. to
    /// introduce plugin-specific directives or types
    fn add_to_schema(&self) -> Option<String> {
        None
    }

    /// Optional self-check against the augmented schema and document set
    ///
    /// Failures are swallowed by the executor; a plugin may log its own
    /// warnings but cannot halt generation from here.
    async fn validate(
        &self,
        _schema: Option<&Schema>,
        _documents: &[DocumentFile],
        _config: &Value,
        _output_file: &str,
        _all_plugins: &[PluginSpec],
    ) -> Result<()> {
        Ok(())
    }

    /// Produce this plugin's textual contribution
    ///
    /// Errors raised here are fatal and abort the enclosing output's
    /// generation.
    async fn generate(
        &self,
        schema: Option<&Schema>,
        documents: &[DocumentFile],
        config: &Value,
    ) -> Result<String>;
}

impl std::fmt::Debug for dyn CodegenPlugin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CodegenPlugin")
            .field("name", &self.name())
            .finish()
    }
}
