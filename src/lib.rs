//! GraphQL Gen Library
//!
//! A Rust library for generating code from GraphQL schemas and operation
//! documents: schema sources are resolved and merged, documents discovered
//! and validated, and each configured output runs an ordered chain of
//! generator plugins whose results are concatenated and formatted.

pub mod cli;
pub mod config;
pub mod documents;
pub mod pipeline;
pub mod plugin;
pub mod schema;
pub mod utils;

pub use config::{Config, OutputTarget, PluginSettings, PluginSpec};
pub use documents::{DocumentCollector, DocumentFile, ValidationError};
pub use pipeline::{FileOutput, Formatter, OutputPipeline};
pub use plugin::{CodegenPlugin, ExtensionModule, ModuleRegistry, PluginExecutor};
pub use schema::{Schema, SchemaResolver, SchemaSourceHandler};

use anyhow::Result;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// Main application context that coordinates all components
pub struct GraphQLGen {
    config: Config,
    registry: Arc<ModuleRegistry>,
    pipeline: OutputPipeline,
}

impl GraphQLGen {
    /// Create a new instance with the given configuration
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        let registry = Arc::new(ModuleRegistry::new());
        let pipeline = OutputPipeline::new(Arc::clone(&registry));
        Ok(Self {
            config,
            registry,
            pipeline,
        })
    }

    /// Register the built-in plugins
    pub async fn initialize(&self) -> Result<()> {
        info!("initializing plugin registry");
        plugin::builtin::register_builtin_plugins(&self.registry).await;
        Ok(())
    }

    /// Module registry, for registering plugins, schemas and extensions
    pub fn registry(&self) -> &Arc<ModuleRegistry> {
        &self.registry
    }

    /// Loaded configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Run the full pipeline and return the generated file outputs
    pub async fn generate(&self) -> Result<Vec<FileOutput>> {
        self.pipeline.run(&self.config).await
    }

    /// Resolve schemas and validate documents without generating
    pub async fn check(&self) -> Result<Vec<ValidationError>> {
        self.pipeline.check(&self.config).await
    }

    /// Write generated outputs to disk, creating parent directories
    pub async fn write_outputs(&self, outputs: &[FileOutput]) -> Result<()> {
        for output in outputs {
            let path = Path::new(&output.filename);
            if let Some(parent) = path.parent() {
                if !parent.as_os_str().is_empty() {
                    utils::ensure_directory(parent)?;
                }
            }
            tokio::fs::write(path, &output.content).await?;
            info!(file = %output.filename, bytes = output.content.len(), "wrote output");
        }
        Ok(())
    }
}

/// Application error types
#[derive(thiserror::Error, Debug)]
pub enum CodegenError {
    #[error("no schema source handler can load '{0}'")]
    UnresolvableSchemaSource(String),

    #[error("plugin '{name}' could not be resolved (tried: {tried})")]
    PluginNotFound { name: String, tried: String },

    #[error("document validation failed:\n{0}")]
    DocumentValidation(String),

    #[error("required module '{0}' is not registered")]
    MissingExtension(String),
}
