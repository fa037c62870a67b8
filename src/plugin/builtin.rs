//! Built-in generator plugins
//!
//! Each is registered under its namespaced primary identifier so short
//! names resolve through the standard candidate probing.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde_yaml::Value;
use std::sync::Arc;

use crate::documents::DocumentFile;
use crate::schema::{introspection, sdl, Schema};

use super::{CodegenPlugin, ModuleRegistry};

/// `add` — emits its configuration value verbatim
///
/// Configured with a primitive string, or a mapping carrying a `content`
/// key. Useful for license headers and lint pragmas prepended to an output.
pub struct AddPlugin;

#[async_trait]
impl CodegenPlugin for AddPlugin {
    fn name(&self) -> &str {
        "add"
    }

    async fn generate(
        &self,
        _schema: Option<&Schema>,
        _documents: &[DocumentFile],
        config: &Value,
    ) -> Result<String> {
        let content = match config {
            Value::String(content) => content.as_str(),
            Value::Mapping(map) => map
                .get(&Value::String("content".into()))
                .and_then(Value::as_str)
                .ok_or_else(|| anyhow!("add plugin config needs a string 'content' key"))?,
            other => {
                return Err(anyhow!(
                    "add plugin config must be a string or a mapping, found {other:?}"
                ))
            }
        };
        Ok(format!("{content}\n"))
    }
}

/// `schema-ast` — prints the active schema as SDL
pub struct SchemaAstPlugin;

#[async_trait]
impl CodegenPlugin for SchemaAstPlugin {
    fn name(&self) -> &str {
        "schema-ast"
    }

    async fn generate(
        &self,
        schema: Option<&Schema>,
        _documents: &[DocumentFile],
        _config: &Value,
    ) -> Result<String> {
        let schema = schema.ok_or_else(|| anyhow!("schema-ast plugin requires a schema"))?;
        Ok(sdl::print_sdl(schema))
    }
}

/// `introspection` — prints the active schema as introspection-style JSON
pub struct IntrospectionPlugin;

#[async_trait]
impl CodegenPlugin for IntrospectionPlugin {
    fn name(&self) -> &str {
        "introspection"
    }

    async fn generate(
        &self,
        schema: Option<&Schema>,
        _documents: &[DocumentFile],
        _config: &Value,
    ) -> Result<String> {
        let schema =
            schema.ok_or_else(|| anyhow!("introspection plugin requires a schema"))?;
        let mut json = serde_json::to_string_pretty(&introspection::to_json(schema))?;
        json.push('\n');
        Ok(json)
    }
}

/// Register the built-in plugins on a registry
pub async fn register_builtin_plugins(registry: &ModuleRegistry) {
    let builtins: Vec<Arc<dyn CodegenPlugin>> = vec![
        Arc::new(AddPlugin),
        Arc::new(SchemaAstPlugin),
        Arc::new(IntrospectionPlugin),
    ];
    for plugin in builtins {
        registry
            .register_plugin(format!("graphql-codegen-{}", plugin.name()), plugin)
            .await;
    }
}
