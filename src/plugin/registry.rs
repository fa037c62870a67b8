//! Module registry: plugins, named schemas and extension modules
//!
//! The registry is the single place logical names resolve against. Plugin
//! lookup probes a fixed, ordered set of name-derived identifiers so short
//! names keep working however the implementation was registered.

use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::schema::Schema;
use crate::CodegenError;

use super::CodegenPlugin;

/// Package-identifier candidates probed for a short plugin name, in order:
/// the namespaced primary form, its "-template" variant, the shorter alias,
/// its "-template" variant, then the bare name itself.
pub fn candidate_names(name: &str) -> Vec<String> {
    vec![
        format!("graphql-codegen-{name}"),
        format!("graphql-codegen-{name}-template"),
        format!("codegen-{name}"),
        format!("codegen-{name}-template"),
        name.to_string(),
    ]
}

/// An auxiliary module preloaded before any output is processed
///
/// Loading happens once per run and must be idempotent; its effects are
/// process-wide.
#[async_trait]
pub trait ExtensionModule: Send + Sync {
    /// Logical module name used in the config `require` list
    fn name(&self) -> &str;

    /// Load the module
    async fn load(&self) -> Result<()>;
}

/// Registry mapping logical names to loadable implementations
pub struct ModuleRegistry {
    /// Registered plugins, keyed by registered identifier
    plugins: RwLock<HashMap<String, Arc<dyn CodegenPlugin>>>,

    /// Schemas registered by name, served by the registry schema handler;
    /// guarded synchronously because handler applicability tests are pure
    /// and synchronous
    schemas: std::sync::RwLock<HashMap<String, Schema>>,

    /// Extension modules available for preloading
    extensions: RwLock<HashMap<String, Arc<dyn ExtensionModule>>>,
}

impl ModuleRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            plugins: RwLock::new(HashMap::new()),
            schemas: std::sync::RwLock::new(HashMap::new()),
            extensions: RwLock::new(HashMap::new()),
        }
    }

    /// Register a plugin under an explicit identifier
    pub async fn register_plugin(&self, identifier: impl Into<String>, plugin: Arc<dyn CodegenPlugin>) {
        let identifier = identifier.into();
        debug!(%identifier, "registering plugin");
        self.plugins.write().await.insert(identifier, plugin);
    }

    /// Resolve a short plugin name by probing its candidate identifiers
    ///
    /// The first registered candidate wins. No candidate registered is a
    /// fatal error naming the plugin and everything that was tried.
    pub async fn resolve_plugin(&self, name: &str) -> Result<Arc<dyn CodegenPlugin>> {
        let plugins = self.plugins.read().await;
        let candidates = candidate_names(name);
        for candidate in &candidates {
            if let Some(plugin) = plugins.get(candidate) {
                debug!(plugin = name, resolved = %candidate, "resolved plugin");
                return Ok(Arc::clone(plugin));
            }
        }
        Err(CodegenError::PluginNotFound {
            name: name.to_string(),
            tried: candidates.join(", "),
        }
        .into())
    }

    /// Register a schema under a logical name
    pub fn register_schema(&self, name: impl Into<String>, schema: Schema) {
        if let Ok(mut schemas) = self.schemas.write() {
            schemas.insert(name.into(), schema);
        }
    }

    /// Whether a schema is registered under the name
    pub fn has_schema(&self, name: &str) -> bool {
        self.schemas
            .read()
            .map(|schemas| schemas.contains_key(name))
            .unwrap_or(false)
    }

    /// Fetch a copy of a registered schema
    pub fn schema(&self, name: &str) -> Option<Schema> {
        self.schemas
            .read()
            .ok()
            .and_then(|schemas| schemas.get(name).cloned())
    }

    /// Register an extension module for `require` preloading
    pub async fn register_extension(&self, extension: Arc<dyn ExtensionModule>) {
        self.extensions
            .write()
            .await
            .insert(extension.name().to_string(), extension);
    }

    /// Preload the named extension modules, in order
    pub async fn preload(&self, names: &[String]) -> Result<()> {
        for name in names {
            let extension = {
                let extensions = self.extensions.read().await;
                extensions.get(name).cloned()
            };
            match extension {
                Some(extension) => {
                    info!(module = %name, "preloading extension module");
                    extension.load().await?;
                }
                None => return Err(CodegenError::MissingExtension(name.clone()).into()),
            }
        }
        Ok(())
    }
}

impl Default for ModuleRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::documents::DocumentFile;
    use serde_yaml::Value;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct StubPlugin(&'static str);

    #[async_trait]
    impl CodegenPlugin for StubPlugin {
        fn name(&self) -> &str {
            self.0
        }

        async fn generate(
            &self,
            _schema: Option<&Schema>,
            _documents: &[DocumentFile],
            _config: &Value,
        ) -> Result<String> {
            Ok(format!("[{}]", self.0))
        }
    }

    #[test]
    fn candidate_names_are_probed_in_fixed_order() {
        assert_eq!(
            candidate_names("typescript"),
            vec![
                "graphql-codegen-typescript",
                "graphql-codegen-typescript-template",
                "codegen-typescript",
                "codegen-typescript-template",
                "typescript",
            ]
        );
    }

    #[tokio::test]
    async fn resolves_through_any_candidate_identifier() {
        let registry = ModuleRegistry::new();
        registry
            .register_plugin("codegen-stub-template", Arc::new(StubPlugin("stub")))
            .await;

        let plugin = registry.resolve_plugin("stub").await.unwrap();
        assert_eq!(plugin.name(), "stub");
    }

    #[tokio::test]
    async fn earlier_candidates_win_over_later_ones() {
        let registry = ModuleRegistry::new();
        registry
            .register_plugin("stub", Arc::new(StubPlugin("bare")))
            .await;
        registry
            .register_plugin("graphql-codegen-stub", Arc::new(StubPlugin("namespaced")))
            .await;

        let plugin = registry.resolve_plugin("stub").await.unwrap();
        assert_eq!(plugin.name(), "namespaced");
    }

    #[tokio::test]
    async fn unresolved_plugin_is_a_fatal_error_naming_candidates() {
        let registry = ModuleRegistry::new();
        let err = registry.resolve_plugin("missing").await.unwrap_err();

        match err.downcast_ref::<CodegenError>() {
            Some(CodegenError::PluginNotFound { name, tried }) => {
                assert_eq!(name, "missing");
                assert!(tried.contains("graphql-codegen-missing"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    struct CountingExtension {
        loads: AtomicUsize,
    }

    #[async_trait]
    impl ExtensionModule for CountingExtension {
        fn name(&self) -> &str {
            "counter"
        }

        async fn load(&self) -> Result<()> {
            self.loads.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[tokio::test]
    async fn preload_loads_registered_extensions_once_per_call() {
        let registry = ModuleRegistry::new();
        let extension = Arc::new(CountingExtension {
            loads: AtomicUsize::new(0),
        });
        registry.register_extension(Arc::clone(&extension) as Arc<dyn ExtensionModule>).await;

        registry.preload(&["counter".to_string()]).await.unwrap();
        assert_eq!(extension.loads.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn preload_of_unregistered_module_fails() {
        let registry = ModuleRegistry::new();
        let err = registry.preload(&["ghost".to_string()]).await.unwrap_err();
        match err.downcast_ref::<CodegenError>() {
            Some(CodegenError::MissingExtension(name)) => assert_eq!(name, "ghost"),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
