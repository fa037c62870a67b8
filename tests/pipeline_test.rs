//! End-to-end pipeline tests

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde_yaml::Value;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

use graphql_gen::config::PluginSpec;
use graphql_gen::{CodegenError, CodegenPlugin, Config, DocumentFile, GraphQLGen, Schema};

/// Stub plugin that records every config it is invoked with
struct RecordingPlugin {
    name: &'static str,
    delay_ms: u64,
    configs: Arc<Mutex<Vec<Value>>>,
}

#[async_trait]
impl CodegenPlugin for RecordingPlugin {
    fn name(&self) -> &str {
        self.name
    }

    async fn generate(
        &self,
        _schema: Option<&Schema>,
        _documents: &[DocumentFile],
        config: &Value,
    ) -> Result<String> {
        if self.delay_ms > 0 {
            tokio::time::sleep(std::time::Duration::from_millis(self.delay_ms)).await;
        }
        self.configs.lock().unwrap().push(config.clone());
        Ok(format!("[{}]", self.name))
    }
}

/// Stub plugin that reports how many documents it received
struct DocumentCountPlugin;

#[async_trait]
impl CodegenPlugin for DocumentCountPlugin {
    fn name(&self) -> &str {
        "doc-count"
    }

    async fn generate(
        &self,
        _schema: Option<&Schema>,
        documents: &[DocumentFile],
        _config: &Value,
    ) -> Result<String> {
        Ok(format!("documents={}", documents.len()))
    }
}

fn write_project(dir: &TempDir) {
    std::fs::write(
        dir.path().join("schema.graphql"),
        r#"
        type Query {
          user(id: ID!): User
          posts: [Post!]
        }
        type User { id: ID! name: String }
        type Post { title: String }
        "#,
    )
    .unwrap();
    std::fs::write(dir.path().join("users.graphql"), "query Users { user(id: 1) { id } }")
        .unwrap();
    std::fs::write(dir.path().join("posts.graphql"), "{ posts { title } }").unwrap();
}

async fn app_with_recorders(
    config: Config,
    recorders: &[(&'static str, u64)],
) -> (GraphQLGen, Arc<Mutex<Vec<Value>>>) {
    let app = GraphQLGen::new(config).unwrap();
    app.initialize().await.unwrap();
    let configs = Arc::new(Mutex::new(Vec::new()));
    for &(name, delay_ms) in recorders {
        app.registry()
            .register_plugin(
                name,
                Arc::new(RecordingPlugin {
                    name,
                    delay_ms,
                    configs: Arc::clone(&configs),
                }),
            )
            .await;
    }
    (app, configs)
}

#[tokio::test]
async fn effective_config_layers_root_output_and_inline_settings() {
    let dir = TempDir::new().unwrap();
    write_project(&dir);

    let config = Config::from_yaml(&format!(
        r#"
        schema: {base}/schema.graphql
        documents: "{base}/*s.graphql"
        config: {{x: 0, y: 2}}
        generates:
          out.ts:
            plugins:
              - p1: {{x: 1}}
              - p2
        "#,
        base = dir.path().display()
    ))
    .unwrap();

    let (app, configs) = app_with_recorders(config, &[("p1", 0), ("p2", 0)]).await;
    let outputs = app.generate().await.unwrap();
    assert_eq!(outputs.len(), 1);

    let configs = configs.lock().unwrap();
    assert_eq!(configs.len(), 2);

    // p1: root {x:0, y:2} overridden by inline {x:1}
    let p1: serde_yaml::Mapping = serde_yaml::from_value(configs[0].clone()).unwrap();
    assert_eq!(p1.get(&Value::String("x".into())), Some(&Value::from(1)));
    assert_eq!(p1.get(&Value::String("y".into())), Some(&Value::from(2)));

    // p2: bare spec receives the layered root config unchanged
    let p2: serde_yaml::Mapping = serde_yaml::from_value(configs[1].clone()).unwrap();
    assert_eq!(p2.get(&Value::String("x".into())), Some(&Value::from(0)));
    assert_eq!(p2.get(&Value::String("y".into())), Some(&Value::from(2)));
}

#[tokio::test]
async fn primitive_plugin_settings_bypass_layering() {
    let dir = TempDir::new().unwrap();
    write_project(&dir);

    let config = Config::from_yaml(&format!(
        r#"
        schema: {base}/schema.graphql
        documents: {base}/users.graphql
        config: {{x: 0}}
        generates:
          out.ts:
            plugins:
              - p1: plain-string-config
        "#,
        base = dir.path().display()
    ))
    .unwrap();

    let (app, configs) = app_with_recorders(config, &[("p1", 0)]).await;
    app.generate().await.unwrap();

    let configs = configs.lock().unwrap();
    assert_eq!(configs[0], Value::String("plain-string-config".into()));
}

#[tokio::test]
async fn plugin_chain_output_is_concatenated_in_declared_order() {
    let dir = TempDir::new().unwrap();
    write_project(&dir);

    let config = Config::from_yaml(&format!(
        r#"
        schema: {base}/schema.graphql
        documents: {base}/users.graphql
        generates:
          out.ts:
            plugins: [a, b, c]
        "#,
        base = dir.path().display()
    ))
    .unwrap();

    // The slowest plugin comes first; order must still follow declaration
    let (app, _) = app_with_recorders(config, &[("a", 30), ("b", 10), ("c", 0)]).await;
    let outputs = app.generate().await.unwrap();

    assert_eq!(outputs[0].content, "[a][b][c]\n");
}

#[tokio::test]
async fn output_documents_are_appended_to_the_root_set() {
    let dir = TempDir::new().unwrap();
    write_project(&dir);

    let config = Config::from_yaml(&format!(
        r#"
        schema: {base}/schema.graphql
        documents: {base}/users.graphql
        generates:
          out.ts:
            documents: {base}/posts.graphql
            plugins: [doc-count]
        "#,
        base = dir.path().display()
    ))
    .unwrap();

    let app = GraphQLGen::new(config).unwrap();
    app.initialize().await.unwrap();
    app.registry()
        .register_plugin("doc-count", Arc::new(DocumentCountPlugin))
        .await;

    let outputs = app.generate().await.unwrap();
    assert_eq!(outputs[0].content, "documents=2\n");
}

#[tokio::test]
async fn validation_failure_aborts_the_run_without_watch_mode() {
    let dir = TempDir::new().unwrap();
    write_project(&dir);
    std::fs::write(dir.path().join("broken.graphql"), "query Broken { ghost }").unwrap();

    let config = Config::from_yaml(&format!(
        r#"
        schema: {base}/schema.graphql
        documents: {base}/broken.graphql
        generates:
          out.ts:
            plugins: [p1]
        "#,
        base = dir.path().display()
    ))
    .unwrap();

    let (app, configs) = app_with_recorders(config, &[("p1", 0)]).await;
    let err = app.generate().await.unwrap_err();

    match err.downcast_ref::<CodegenError>() {
        Some(CodegenError::DocumentValidation(summary)) => {
            assert!(summary.contains("ghost"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
    // Fatal validation means no plugin ever ran
    assert!(configs.lock().unwrap().is_empty());
}

#[tokio::test]
async fn watch_mode_reports_validation_errors_and_completes() {
    let dir = TempDir::new().unwrap();
    write_project(&dir);
    std::fs::write(dir.path().join("broken.graphql"), "query Broken { ghost }").unwrap();

    let config = Config::from_yaml(&format!(
        r#"
        schema: {base}/schema.graphql
        documents: {base}/broken.graphql
        watch: true
        generates:
          out.ts:
            plugins: [p1]
          other.ts:
            plugins: [p2]
        "#,
        base = dir.path().display()
    ))
    .unwrap();

    let (app, _) = app_with_recorders(config, &[("p1", 0), ("p2", 0)]).await;
    let outputs = app.generate().await.unwrap();

    // The run completed and produced every configured target
    assert_eq!(outputs.len(), 2);
    assert_eq!(outputs[0].filename, "out.ts");
    assert_eq!(outputs[1].filename, "other.ts");
}

#[tokio::test]
async fn missing_plugin_aborts_the_whole_run() {
    let dir = TempDir::new().unwrap();
    write_project(&dir);

    let config = Config::from_yaml(&format!(
        r#"
        schema: {base}/schema.graphql
        documents: {base}/users.graphql
        generates:
          out.ts:
            plugins: [missing]
        "#,
        base = dir.path().display()
    ))
    .unwrap();

    let app = GraphQLGen::new(config).unwrap();
    app.initialize().await.unwrap();
    let err = app.generate().await.unwrap_err();

    match err.downcast_ref::<CodegenError>() {
        Some(CodegenError::PluginNotFound { name, .. }) => assert_eq!(name, "missing"),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn generation_failure_propagates() {
    struct FailingPlugin;

    #[async_trait]
    impl CodegenPlugin for FailingPlugin {
        fn name(&self) -> &str {
            "failing"
        }

        async fn generate(
            &self,
            _schema: Option<&Schema>,
            _documents: &[DocumentFile],
            _config: &Value,
        ) -> Result<String> {
            Err(anyhow!("templating exploded"))
        }
    }

    let dir = TempDir::new().unwrap();
    write_project(&dir);

    let config = Config::from_yaml(&format!(
        r#"
        schema: {base}/schema.graphql
        documents: {base}/users.graphql
        generates:
          out.ts:
            plugins: [failing]
        "#,
        base = dir.path().display()
    ))
    .unwrap();

    let app = GraphQLGen::new(config).unwrap();
    app.initialize().await.unwrap();
    app.registry()
        .register_plugin("failing", Arc::new(FailingPlugin))
        .await;

    let err = app.generate().await.unwrap_err();
    assert!(format!("{err:#}").contains("templating exploded"));
}

#[tokio::test]
async fn failing_validation_hook_never_blocks_its_output() {
    struct SelfDoubtingPlugin;

    #[async_trait]
    impl CodegenPlugin for SelfDoubtingPlugin {
        fn name(&self) -> &str {
            "self-doubting"
        }

        async fn validate(
            &self,
            _schema: Option<&Schema>,
            _documents: &[DocumentFile],
            _config: &Value,
            _output_file: &str,
            _all_plugins: &[PluginSpec],
        ) -> Result<()> {
            Err(anyhow!("not good enough"))
        }

        async fn generate(
            &self,
            _schema: Option<&Schema>,
            _documents: &[DocumentFile],
            _config: &Value,
        ) -> Result<String> {
            Ok("still shipped".to_string())
        }
    }

    let dir = TempDir::new().unwrap();
    write_project(&dir);

    let config = Config::from_yaml(&format!(
        r#"
        schema: {base}/schema.graphql
        documents: {base}/users.graphql
        generates:
          out.ts:
            plugins: [self-doubting]
        "#,
        base = dir.path().display()
    ))
    .unwrap();

    let app = GraphQLGen::new(config).unwrap();
    app.initialize().await.unwrap();
    app.registry()
        .register_plugin("self-doubting", Arc::new(SelfDoubtingPlugin))
        .await;

    let outputs = app.generate().await.unwrap();
    assert_eq!(outputs[0].content, "still shipped\n");
}

#[tokio::test]
async fn builtin_schema_ast_end_to_end_with_output_files() {
    let dir = TempDir::new().unwrap();
    write_project(&dir);
    let out_file = dir.path().join("generated/schema.out.graphql");

    let config = Config::from_yaml(&format!(
        r##"
        schema: {base}/schema.graphql
        documents: {base}/users.graphql
        generates:
          {out}:
            plugins:
              - add: "# generated file"
              - schema-ast
        "##,
        base = dir.path().display(),
        out = out_file.display()
    ))
    .unwrap();

    let app = GraphQLGen::new(config).unwrap();
    app.initialize().await.unwrap();

    let outputs = app.generate().await.unwrap();
    app.write_outputs(&outputs).await.unwrap();

    let written = std::fs::read_to_string(&out_file).unwrap();
    assert!(written.starts_with("# generated file\n"));
    assert!(written.contains("type User"));
}

#[tokio::test]
async fn per_output_schema_pointers_extend_the_root_schema() {
    let dir = TempDir::new().unwrap();
    write_project(&dir);
    std::fs::write(
        dir.path().join("extra.graphql"),
        "type Comment { body: String }",
    )
    .unwrap();

    let config = Config::from_yaml(&format!(
        r#"
        schema: {base}/schema.graphql
        documents: {base}/users.graphql
        generates:
          merged.graphql:
            schema: {base}/extra.graphql
            plugins: [schema-ast]
          root-only.graphql:
            plugins: [schema-ast]
        "#,
        base = dir.path().display()
    ))
    .unwrap();

    let app = GraphQLGen::new(config).unwrap();
    app.initialize().await.unwrap();
    let outputs = app.generate().await.unwrap();

    assert!(outputs[0].content.contains("type Comment"));
    assert!(outputs[0].content.contains("type User"));
    // The shared root schema must not pick up the first target's extension
    assert!(!outputs[1].content.contains("type Comment"));
    assert!(outputs[1].content.contains("type User"));
}
