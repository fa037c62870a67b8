//! Schema pointer resolution
//!
//! A schema pointer is either a bare locator string or a single-key mapping
//! from locator to loader options. Resolution walks an ordered chain of
//! source handlers and dispatches to the first one whose applicability test
//! claims the locator. Adding a schema source kind means adding a handler,
//! never touching the resolver.

use anyhow::Result;
use async_trait::async_trait;
use serde_yaml::{Mapping, Value};
use std::sync::Arc;
use tracing::debug;

use crate::plugin::ModuleRegistry;
use crate::CodegenError;

use super::handlers::{
    IntrospectionFileHandler, RegistrySchemaHandler, SdlFileHandler, UrlIntrospectionHandler,
};
use super::{merge_all, Schema};

/// One strategy per schema-source kind
#[async_trait]
pub trait SchemaSourceHandler: Send + Sync {
    /// Handler name, for logging
    fn name(&self) -> &str;

    /// Whether this handler claims the locator; pure and synchronous
    fn can_handle(&self, locator: &str) -> bool;

    /// Load a schema for the locator; may suspend on file or network I/O
    async fn handle(&self, locator: &str, root_config: &Mapping, options: &Mapping)
        -> Result<Schema>;
}

/// Resolves schema pointers through an ordered handler chain
pub struct SchemaResolver {
    handlers: Vec<Box<dyn SchemaSourceHandler>>,
}

impl SchemaResolver {
    /// Create a resolver with the default handler chain, in priority order:
    /// remote introspection by URL, introspection from a local file, SDL from
    /// source files, then schemas registered by name on the module registry.
    pub fn new(registry: Arc<ModuleRegistry>) -> Self {
        Self {
            handlers: vec![
                Box::new(UrlIntrospectionHandler::new()),
                Box::new(IntrospectionFileHandler),
                Box::new(SdlFileHandler),
                Box::new(RegistrySchemaHandler::new(registry)),
            ],
        }
    }

    /// Create a resolver with a custom handler chain
    pub fn with_handlers(handlers: Vec<Box<dyn SchemaSourceHandler>>) -> Self {
        Self { handlers }
    }

    /// Split a pointer into its locator and options mapping
    fn split_pointer(pointer: &Value) -> Result<(String, Mapping)> {
        match pointer {
            Value::String(locator) => Ok((locator.clone(), Mapping::new())),
            Value::Mapping(map) if map.len() == 1 => {
                let Some((key, value)) = map.iter().next() else {
                    return Err(anyhow::anyhow!("schema pointer mapping is empty"));
                };
                let locator = key
                    .as_str()
                    .ok_or_else(|| anyhow::anyhow!("schema pointer key must be a string"))?;
                let options = match value {
                    Value::Mapping(options) => options.clone(),
                    Value::Null => Mapping::new(),
                    other => {
                        return Err(anyhow::anyhow!(
                            "schema pointer options for '{locator}' must be a mapping, found {other:?}"
                        ))
                    }
                };
                Ok((locator.to_string(), options))
            }
            other => Err(anyhow::anyhow!(
                "schema pointer must be a string or a single-key mapping, found {other:?}"
            )),
        }
    }

    /// Resolve one schema pointer into a schema
    pub async fn resolve(&self, pointer: &Value, root_config: &Mapping) -> Result<Schema> {
        let (locator, options) = Self::split_pointer(pointer)?;
        for handler in &self.handlers {
            if handler.can_handle(&locator) {
                debug!(handler = handler.name(), %locator, "resolving schema pointer");
                return handler.handle(&locator, root_config, &options).await;
            }
        }
        Err(CodegenError::UnresolvableSchemaSource(locator).into())
    }

    /// Resolve a list of pointers concurrently and merge the results
    ///
    /// Pointer resolutions have no ordering dependency on each other, so they
    /// run as independent tasks joined before merging.
    pub async fn resolve_all(
        &self,
        pointers: &[Value],
        root_config: &Mapping,
    ) -> Result<Option<Schema>> {
        let tasks = pointers
            .iter()
            .map(|pointer| self.resolve(pointer, root_config));
        let resolved = futures::future::try_join_all(tasks).await?;
        Ok(merge_all(resolved.into_iter().map(Some)))
    }
}
