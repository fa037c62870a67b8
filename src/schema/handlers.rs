//! Built-in schema source handlers
//!
//! The fixed priority order lives in [`super::SchemaResolver::new`]:
//! URL introspection, introspection files, SDL source files, registry lookup.

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use serde_yaml::{Mapping, Value};
use std::sync::Arc;
use tracing::debug;

use crate::plugin::ModuleRegistry;

use super::resolver::SchemaSourceHandler;
use super::{introspection, merge_all, sdl, Schema};

/// Loads a schema by posting the introspection query to a GraphQL endpoint
pub struct UrlIntrospectionHandler {
    client: reqwest::Client,
}

impl UrlIntrospectionHandler {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }
}

impl Default for UrlIntrospectionHandler {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SchemaSourceHandler for UrlIntrospectionHandler {
    fn name(&self) -> &str {
        "url-introspection"
    }

    fn can_handle(&self, locator: &str) -> bool {
        locator.starts_with("http://") || locator.starts_with("https://")
    }

    async fn handle(
        &self,
        locator: &str,
        _root_config: &Mapping,
        options: &Mapping,
    ) -> Result<Schema> {
        let mut request = self
            .client
            .post(locator)
            .json(&serde_json::json!({ "query": introspection::INTROSPECTION_QUERY }));

        // Pointer options may carry request headers, e.g. authorization
        if let Some(Value::Mapping(headers)) = options.get(&Value::String("headers".into())) {
            for (key, value) in headers {
                if let (Some(name), Some(header)) = (key.as_str(), value.as_str()) {
                    request = request.header(name, header);
                }
            }
        }

        let response = request
            .send()
            .await
            .with_context(|| format!("introspection request to '{locator}' failed"))?
            .error_for_status()
            .with_context(|| format!("introspection request to '{locator}' was rejected"))?;
        let body: serde_json::Value = response.json().await?;
        introspection::from_json(&body)
            .with_context(|| format!("malformed introspection result from '{locator}'"))
    }
}

/// Loads a schema from a local introspection-result JSON file
pub struct IntrospectionFileHandler;

#[async_trait]
impl SchemaSourceHandler for IntrospectionFileHandler {
    fn name(&self) -> &str {
        "introspection-file"
    }

    fn can_handle(&self, locator: &str) -> bool {
        locator.ends_with(".json")
    }

    async fn handle(
        &self,
        locator: &str,
        _root_config: &Mapping,
        _options: &Mapping,
    ) -> Result<Schema> {
        let content = tokio::fs::read_to_string(locator)
            .await
            .with_context(|| format!("failed to read introspection file '{locator}'"))?;
        introspection::parse_introspection(&content)
            .with_context(|| format!("malformed introspection file '{locator}'"))
    }
}

/// Loads a schema from SDL source files, glob patterns included
pub struct SdlFileHandler;

#[async_trait]
impl SchemaSourceHandler for SdlFileHandler {
    fn name(&self) -> &str {
        "sdl-files"
    }

    fn can_handle(&self, locator: &str) -> bool {
        locator.ends_with(".graphql") || locator.ends_with(".gql") || locator.ends_with(".graphqls")
    }

    async fn handle(
        &self,
        locator: &str,
        _root_config: &Mapping,
        _options: &Mapping,
    ) -> Result<Schema> {
        let mut schemas = Vec::new();
        for entry in glob::glob(locator)
            .with_context(|| format!("invalid schema file pattern '{locator}'"))?
        {
            let path = entry?;
            debug!(path = %path.display(), "loading SDL schema file");
            let content = tokio::fs::read_to_string(&path)
                .await
                .with_context(|| format!("failed to read schema file '{}'", path.display()))?;
            let schema = sdl::parse_sdl(&content)
                .with_context(|| format!("failed to parse schema file '{}'", path.display()))?;
            schemas.push(Some(schema));
        }
        merge_all(schemas).ok_or_else(|| anyhow!("no schema files matched '{locator}'"))
    }
}

/// Resolves a locator against schemas registered by name on the module
/// registry, the in-process stand-in for loading a schema exported from a
/// module.
pub struct RegistrySchemaHandler {
    registry: Arc<ModuleRegistry>,
}

impl RegistrySchemaHandler {
    pub fn new(registry: Arc<ModuleRegistry>) -> Self {
        Self { registry }
    }
}

#[async_trait]
impl SchemaSourceHandler for RegistrySchemaHandler {
    fn name(&self) -> &str {
        "registry-schema"
    }

    fn can_handle(&self, locator: &str) -> bool {
        self.registry.has_schema(locator)
    }

    async fn handle(
        &self,
        locator: &str,
        _root_config: &Mapping,
        _options: &Mapping,
    ) -> Result<Schema> {
        self.registry
            .schema(locator)
            .ok_or_else(|| anyhow!("schema '{locator}' disappeared from the registry"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_handler_claims_http_locators_only() {
        let handler = UrlIntrospectionHandler::new();
        assert!(handler.can_handle("https://api.example.com/graphql"));
        assert!(handler.can_handle("http://localhost:4000"));
        assert!(!handler.can_handle("schema.graphql"));
        assert!(!handler.can_handle("schema.json"));
    }

    #[test]
    fn file_handlers_claim_by_extension() {
        assert!(IntrospectionFileHandler.can_handle("introspection.json"));
        assert!(!IntrospectionFileHandler.can_handle("schema.graphql"));

        assert!(SdlFileHandler.can_handle("schema.graphql"));
        assert!(SdlFileHandler.can_handle("src/**/*.gql"));
        assert!(SdlFileHandler.can_handle("schema.graphqls"));
        assert!(!SdlFileHandler.can_handle("schema.yaml"));
    }

    #[tokio::test]
    async fn sdl_handler_loads_and_merges_matched_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.graphql"), "type Query { ping: String }").unwrap();
        std::fs::write(dir.path().join("b.graphql"), "type User { id: ID! }").unwrap();

        let pattern = format!("{}/*.graphql", dir.path().display());
        let schema = SdlFileHandler
            .handle(&pattern, &Mapping::new(), &Mapping::new())
            .await
            .unwrap();

        assert!(schema.types.contains_key("Query"));
        assert!(schema.types.contains_key("User"));
    }

    #[tokio::test]
    async fn sdl_handler_fails_when_nothing_matches() {
        let dir = tempfile::tempdir().unwrap();
        let pattern = format!("{}/*.graphql", dir.path().display());
        let err = SdlFileHandler
            .handle(&pattern, &Mapping::new(), &Mapping::new())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("no schema files matched"));
    }

    #[tokio::test]
    async fn registry_handler_claims_only_registered_names() {
        let registry = Arc::new(ModuleRegistry::new());
        registry.register_schema("base", Schema::new());

        let handler = RegistrySchemaHandler::new(Arc::clone(&registry));
        assert!(handler.can_handle("base"));
        assert!(!handler.can_handle("other"));

        let schema = handler
            .handle("base", &Mapping::new(), &Mapping::new())
            .await
            .unwrap();
        assert!(schema.types.is_empty());
    }
}
