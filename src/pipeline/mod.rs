//! Top-level generation pipeline
//!
//! For a run: preload required extension modules, resolve the root schema
//! and document set, then process each output target in declaration order.
//! Schema pointer resolution is the only concurrent fan-out; everything else
//! is one sequential chain of suspending operations per target.

use anyhow::Result;
use std::sync::Arc;
use tracing::{error, info};

use crate::config::{layer_config, normalize_instance_or_array, Config, OutputTarget};
use crate::documents::{DocumentCollector, DocumentFile, ValidationError};
use crate::plugin::{ModuleRegistry, PluginExecutor};
use crate::schema::{merge_all, Schema, SchemaResolver};
use crate::CodegenError;

pub mod format;

pub use format::{DefaultFormatter, Formatter};

/// Final artifact of one output target
#[derive(Debug, Clone, PartialEq)]
pub struct FileOutput {
    /// Destination filename
    pub filename: String,

    /// Formatted file content
    pub content: String,
}

/// Drives a whole generation run across all configured outputs
pub struct OutputPipeline {
    registry: Arc<ModuleRegistry>,
    resolver: SchemaResolver,
    collector: DocumentCollector,
    executor: PluginExecutor,
    formatter: Arc<dyn Formatter>,
}

impl OutputPipeline {
    /// Create a pipeline over a module registry, with the default formatter
    pub fn new(registry: Arc<ModuleRegistry>) -> Self {
        Self {
            resolver: SchemaResolver::new(Arc::clone(&registry)),
            collector: DocumentCollector::new(),
            executor: PluginExecutor::new(Arc::clone(&registry)),
            formatter: Arc::new(DefaultFormatter),
            registry,
        }
    }

    /// Replace the formatter collaborator
    pub fn with_formatter(mut self, formatter: Arc<dyn Formatter>) -> Self {
        self.formatter = formatter;
        self
    }

    /// Run every configured output target and collect the file outputs
    ///
    /// Fatal errors abort the whole run; no partial output list is returned.
    pub async fn run(&self, config: &Config) -> Result<Vec<FileOutput>> {
        config.validate()?;

        let require: Vec<String> = normalize_instance_or_array(config.require.as_ref())
            .iter()
            .filter_map(|value| value.as_str().map(str::to_string))
            .collect();
        self.registry.preload(&require).await?;

        let root_pointers = normalize_instance_or_array(config.schema.as_ref());
        let root_schema = self.resolver.resolve_all(&root_pointers, &config.config).await?;

        let document_pointers = normalize_instance_or_array(config.documents.as_ref());
        let root_documents = self.collector.collect(&document_pointers).await?;
        if let Some(schema) = &root_schema {
            let errors = self.collector.validate(schema, &root_documents);
            self.report_validation(config, &errors, "root documents")?;
        }

        let mut outputs = Vec::new();
        for target in config.output_targets()? {
            let output = self
                .run_target(config, &target, root_schema.as_ref(), &root_documents)
                .await?;
            outputs.push(output);
        }
        info!(outputs = outputs.len(), "generation run completed");
        Ok(outputs)
    }

    /// Resolve schema/documents for one target and run its plugin chain
    async fn run_target(
        &self,
        config: &Config,
        target: &OutputTarget,
        root_schema: Option<&Schema>,
        root_documents: &[DocumentFile],
    ) -> Result<FileOutput> {
        info!(output = %target.filename, plugins = target.plugins.len(), "generating output");

        // Output-level schema pointers merge on top of the root schema; the
        // root stays untouched for the remaining targets.
        let schema = if target.schema.is_empty() {
            root_schema.cloned()
        } else {
            let extra = self.resolver.resolve_all(&target.schema, &config.config).await?;
            merge_all([root_schema.cloned(), extra])
        };

        // The effective document set is additive: root documents first, then
        // anything the target declares on its own.
        let mut documents = root_documents.to_vec();
        if !target.documents.is_empty() {
            let own = self.collector.collect(&target.documents).await?;
            if let Some(schema) = &schema {
                let errors = self.collector.validate(schema, &own);
                self.report_validation(config, &errors, &target.filename)?;
            }
            documents.extend(own);
        }

        let mut text = String::new();
        for spec in &target.plugins {
            let plugin_config = layer_config(&config.config, &target.config, &spec.settings);
            let chunk = self
                .executor
                .execute(
                    &spec.name,
                    &plugin_config,
                    schema.as_ref(),
                    &documents,
                    &target.filename,
                    &target.plugins,
                )
                .await?;
            text.push_str(&chunk);
        }

        let content = self.formatter.prettify(&target.filename, &text).await?;
        Ok(FileOutput {
            filename: target.filename.clone(),
            content,
        })
    }

    /// Surface document validation errors per the watch-mode contract
    ///
    /// Fatal in normal runs; in watch mode errors are reported and the run
    /// continues. Validation itself always happens, only the severity flips.
    fn report_validation(
        &self,
        config: &Config,
        errors: &[ValidationError],
        scope: &str,
    ) -> Result<()> {
        if errors.is_empty() {
            return Ok(());
        }
        if config.watch {
            for validation_error in errors {
                error!(%scope, "{validation_error}");
            }
            return Ok(());
        }
        let summary = errors
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("\n");
        Err(CodegenError::DocumentValidation(summary).into())
    }

    /// Resolve schemas and validate documents without generating anything
    ///
    /// Backs the `validate` CLI command: returns the validation errors it
    /// found (empty means clean) and fails only on structural problems such
    /// as unresolvable schema sources or unknown plugins.
    pub async fn check(&self, config: &Config) -> Result<Vec<ValidationError>> {
        config.validate()?;

        let root_pointers = normalize_instance_or_array(config.schema.as_ref());
        let root_schema = self.resolver.resolve_all(&root_pointers, &config.config).await?;

        let document_pointers = normalize_instance_or_array(config.documents.as_ref());
        let root_documents = self.collector.collect(&document_pointers).await?;

        let mut errors = Vec::new();
        if let Some(schema) = &root_schema {
            errors.extend(self.collector.validate(schema, &root_documents));
        }

        for target in config.output_targets()? {
            let schema = if target.schema.is_empty() {
                root_schema.clone()
            } else {
                let extra = self.resolver.resolve_all(&target.schema, &config.config).await?;
                merge_all([root_schema.clone(), extra])
            };
            if !target.documents.is_empty() {
                let own = self.collector.collect(&target.documents).await?;
                if let Some(schema) = &schema {
                    errors.extend(self.collector.validate(schema, &own));
                }
            }
            for spec in &target.plugins {
                // Surfaces unknown plugins before a real run would
                let _ = self.registry.resolve_plugin(&spec.name).await?;
            }
        }
        Ok(errors)
    }
}
