//! Operation document discovery, loading and validation
//!
//! Document pointers are glob-style path expressions. Each matched file is
//! loaded and parsed into its executable definitions; when a schema is
//! available, every operation and fragment is validated against it, producing
//! a flat list of location-annotated errors. Validation is shallow by design:
//! root types, top-level selections and fragment type conditions.

use anyhow::{anyhow, Context, Result};
use serde_yaml::Value;
use std::fmt;
use std::path::PathBuf;
use tracing::debug;

use crate::schema::sdl::{tokenize, Cursor, TokenKind};
use crate::schema::{Schema, TypeDefinition};

/// Kind of an executable operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationKind {
    Query,
    Mutation,
    Subscription,
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OperationKind::Query => write!(f, "query"),
            OperationKind::Mutation => write!(f, "mutation"),
            OperationKind::Subscription => write!(f, "subscription"),
        }
    }
}

/// A parsed executable definition inside a document file
#[derive(Debug, Clone)]
pub enum ExecutableDefinition {
    Operation {
        kind: OperationKind,
        name: Option<String>,
        /// Top-level selection field names
        fields: Vec<String>,
        line: usize,
    },
    Fragment {
        name: String,
        type_condition: String,
        fields: Vec<String>,
        line: usize,
    },
}

/// A loaded, parsed document plus its originating location
#[derive(Debug, Clone)]
pub struct DocumentFile {
    /// Source file path
    pub file_path: PathBuf,

    /// Raw document text
    pub content: String,

    /// Parsed operations and fragments
    pub definitions: Vec<ExecutableDefinition>,
}

/// A validation error annotated with its source location
#[derive(Debug, Clone)]
pub struct ValidationError {
    pub message: String,
    pub file_path: PathBuf,
    pub line: usize,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}: {}", self.file_path.display(), self.line, self.message)
    }
}

/// Expands document pointers and validates documents against a schema
#[derive(Default)]
pub struct DocumentCollector;

impl DocumentCollector {
    pub fn new() -> Self {
        Self
    }

    /// Expand glob-style document pointers into loaded document files
    pub async fn collect(&self, pointers: &[Value]) -> Result<Vec<DocumentFile>> {
        let mut documents = Vec::new();
        for pointer in pointers {
            let locator = pointer_locator(pointer)?;
            let mut matched = 0usize;
            for entry in glob::glob(&locator)
                .with_context(|| format!("invalid document pattern '{locator}'"))?
            {
                let path = entry?;
                if !path.is_file() {
                    continue;
                }
                matched += 1;
                debug!(path = %path.display(), "loading document file");
                let content = tokio::fs::read_to_string(&path)
                    .await
                    .with_context(|| format!("failed to read document '{}'", path.display()))?;
                let definitions = parse_document(&content)
                    .with_context(|| format!("failed to parse document '{}'", path.display()))?;
                documents.push(DocumentFile {
                    file_path: path,
                    content,
                    definitions,
                });
            }
            if matched == 0 {
                return Err(anyhow!("no documents matched pointer '{locator}'"));
            }
        }
        Ok(documents)
    }

    /// Validate every document's operations and fragments against the schema
    pub fn validate(&self, schema: &Schema, documents: &[DocumentFile]) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        for document in documents {
            for definition in &document.definitions {
                match definition {
                    ExecutableDefinition::Operation { kind, name, fields, line } => {
                        let root = match kind {
                            OperationKind::Query => schema.query_root(),
                            OperationKind::Mutation => schema.mutation_root(),
                            OperationKind::Subscription => schema.subscription_root(),
                        };
                        match root {
                            Some(root) => {
                                check_fields(&mut errors, document, root, fields, *line)
                            }
                            None => errors.push(ValidationError {
                                message: match name {
                                    Some(name) => format!(
                                        "schema has no {kind} type for operation '{name}'"
                                    ),
                                    None => format!("schema has no {kind} type"),
                                },
                                file_path: document.file_path.clone(),
                                line: *line,
                            }),
                        }
                    }
                    ExecutableDefinition::Fragment { name, type_condition, fields, line } => {
                        match schema.type_definition(type_condition) {
                            Some(target) => {
                                check_fields(&mut errors, document, target, fields, *line)
                            }
                            None => errors.push(ValidationError {
                                message: format!(
                                    "unknown type \"{type_condition}\" in fragment \"{name}\""
                                ),
                                file_path: document.file_path.clone(),
                                line: *line,
                            }),
                        }
                    }
                }
            }
        }
        errors
    }
}

fn check_fields(
    errors: &mut Vec<ValidationError>,
    document: &DocumentFile,
    target: &TypeDefinition,
    fields: &[String],
    line: usize,
) {
    if !target.has_fields() {
        return;
    }
    for field in fields {
        if field.starts_with("__") {
            continue;
        }
        if !target.fields.contains_key(field) {
            errors.push(ValidationError {
                message: format!(
                    "cannot query field \"{field}\" on type \"{}\"",
                    target.name
                ),
                file_path: document.file_path.clone(),
                line,
            });
        }
    }
}

fn pointer_locator(pointer: &Value) -> Result<String> {
    match pointer {
        Value::String(locator) => Ok(locator.clone()),
        Value::Mapping(map) if map.len() == 1 => map
            .iter()
            .next()
            .and_then(|(key, _)| key.as_str())
            .map(str::to_string)
            .ok_or_else(|| anyhow!("document pointer key must be a string")),
        other => Err(anyhow!(
            "document pointer must be a string or a single-key mapping, found {other:?}"
        )),
    }
}

/// Parse executable definitions out of a document source
pub fn parse_document(content: &str) -> Result<Vec<ExecutableDefinition>> {
    let mut cursor = Cursor::new(tokenize(content));
    let mut definitions = Vec::new();

    while let Some(token) = cursor.peek().cloned() {
        let line = token.line;
        if token.kind == TokenKind::Punct && token.text == "{" {
            // Anonymous query shorthand
            cursor.next();
            definitions.push(ExecutableDefinition::Operation {
                kind: OperationKind::Query,
                name: None,
                fields: collect_top_fields(&mut cursor)?,
                line,
            });
            continue;
        }
        if token.kind != TokenKind::Name {
            cursor.next();
            continue;
        }
        match token.text.as_str() {
            "query" | "mutation" | "subscription" => {
                let kind = match token.text.as_str() {
                    "mutation" => OperationKind::Mutation,
                    "subscription" => OperationKind::Subscription,
                    _ => OperationKind::Query,
                };
                cursor.next();
                let name = match cursor.peek() {
                    Some(t) if t.kind == TokenKind::Name => Some(t.text.clone()),
                    _ => None,
                };
                if name.is_some() {
                    cursor.next();
                }
                if cursor.peek_is_punct("(") {
                    cursor.skip_balanced("(", ")")?;
                }
                cursor.skip_directives()?;
                cursor.expect_punct("{")?;
                definitions.push(ExecutableDefinition::Operation {
                    kind,
                    name,
                    fields: collect_top_fields(&mut cursor)?,
                    line,
                });
            }
            "fragment" => {
                cursor.next();
                let name = cursor.expect_name()?.text;
                let on = cursor.expect_name()?;
                if on.text != "on" {
                    return Err(anyhow!(
                        "expected 'on' in fragment definition at line {}",
                        on.line
                    ));
                }
                let type_condition = cursor.expect_name()?.text;
                cursor.skip_directives()?;
                cursor.expect_punct("{")?;
                definitions.push(ExecutableDefinition::Fragment {
                    name,
                    type_condition,
                    fields: collect_top_fields(&mut cursor)?,
                    line,
                });
            }
            _ => {
                cursor.next();
            }
        }
    }

    Ok(definitions)
}

/// Collect depth-one selection field names; cursor positioned after `{`
fn collect_top_fields(cursor: &mut Cursor) -> Result<Vec<String>> {
    let mut fields = Vec::new();
    let mut depth = 1usize;
    while depth > 0 {
        let Some(token) = cursor.next() else {
            return Err(anyhow!("unbalanced selection set"));
        };
        match token.kind {
            TokenKind::Punct if token.text == "{" => depth += 1,
            TokenKind::Punct if token.text == "}" => depth -= 1,
            TokenKind::Punct if token.text == "(" => {
                // Arguments; already consumed the open paren
                let mut parens = 1usize;
                while parens > 0 {
                    match cursor.next() {
                        Some(t) if t.kind == TokenKind::Punct && t.text == "(" => parens += 1,
                        Some(t) if t.kind == TokenKind::Punct && t.text == ")" => parens -= 1,
                        Some(_) => {}
                        None => return Err(anyhow!("unbalanced argument list")),
                    }
                }
            }
            TokenKind::Punct if token.text == "..." => {
                // Fragment spread or inline fragment; nested selections are
                // beyond the shallow validation contract
                if cursor.peek_is_name("on") {
                    cursor.next();
                }
                if matches!(cursor.peek(), Some(t) if t.kind == TokenKind::Name) {
                    cursor.next();
                }
            }
            TokenKind::Punct if token.text == "@" => {
                cursor.expect_name()?;
            }
            TokenKind::Name if depth == 1 => {
                if cursor.eat_punct(":") {
                    // Alias form: record the aliased field
                    fields.push(cursor.expect_name()?.text);
                } else {
                    fields.push(token.text);
                }
            }
            _ => {}
        }
    }
    Ok(fields)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::sdl::parse_sdl;

    fn document(content: &str) -> DocumentFile {
        DocumentFile {
            file_path: PathBuf::from("test.graphql"),
            content: content.to_string(),
            definitions: parse_document(content).unwrap(),
        }
    }

    fn sample_schema() -> Schema {
        parse_sdl(
            r#"
            type Query { user(id: ID!): User posts: [Post!] }
            type User { id: ID! name: String }
            type Post { title: String }
            "#,
        )
        .unwrap()
    }

    #[test]
    fn parses_named_operations_and_fragments() {
        let doc = document(
            r#"
            query GetUser($id: ID!) {
              user(id: $id) { id name }
              posts @include(if: true) { title }
            }

            fragment UserFields on User {
              id
              displayName: name
            }
            "#,
        );

        assert_eq!(doc.definitions.len(), 2);
        match &doc.definitions[0] {
            ExecutableDefinition::Operation { kind, name, fields, .. } => {
                assert_eq!(*kind, OperationKind::Query);
                assert_eq!(name.as_deref(), Some("GetUser"));
                assert_eq!(fields, &["user", "posts"]);
            }
            other => panic!("unexpected definition: {other:?}"),
        }
        match &doc.definitions[1] {
            ExecutableDefinition::Fragment { name, type_condition, fields, .. } => {
                assert_eq!(name, "UserFields");
                assert_eq!(type_condition, "User");
                assert_eq!(fields, &["id", "name"]);
            }
            other => panic!("unexpected definition: {other:?}"),
        }
    }

    #[test]
    fn parses_anonymous_query_shorthand() {
        let doc = document("{ posts { title } }");
        match &doc.definitions[0] {
            ExecutableDefinition::Operation { kind, name, fields, .. } => {
                assert_eq!(*kind, OperationKind::Query);
                assert!(name.is_none());
                assert_eq!(fields, &["posts"]);
            }
            other => panic!("unexpected definition: {other:?}"),
        }
    }

    #[test]
    fn valid_documents_produce_no_errors() {
        let collector = DocumentCollector::new();
        let errors = collector.validate(
            &sample_schema(),
            &[document("query { user(id: 1) { id } posts { title } }")],
        );
        assert!(errors.is_empty());
    }

    #[test]
    fn unknown_root_field_is_reported_with_location() {
        let collector = DocumentCollector::new();
        let errors = collector.validate(&sample_schema(), &[document("query Broken { ghost }")]);

        assert_eq!(errors.len(), 1);
        assert!(errors[0].message.contains("\"ghost\""));
        assert!(errors[0].message.contains("\"Query\""));
        assert_eq!(errors[0].file_path, PathBuf::from("test.graphql"));
    }

    #[test]
    fn missing_mutation_root_is_reported() {
        let collector = DocumentCollector::new();
        let errors = collector.validate(
            &sample_schema(),
            &[document("mutation AddUser { addUser }")],
        );
        assert_eq!(errors.len(), 1);
        assert!(errors[0].message.contains("no mutation type"));
    }

    #[test]
    fn unknown_fragment_type_is_reported() {
        let collector = DocumentCollector::new();
        let errors = collector.validate(
            &sample_schema(),
            &[document("fragment F on Ghost { id }")],
        );
        assert_eq!(errors.len(), 1);
        assert!(errors[0].message.contains("\"Ghost\""));
    }

    #[test]
    fn meta_fields_are_always_allowed() {
        let collector = DocumentCollector::new();
        let errors = collector.validate(&sample_schema(), &[document("{ __typename posts }")]);
        assert!(errors.is_empty());
    }

    #[tokio::test]
    async fn collect_expands_globs_and_fails_on_no_match() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.graphql"), "{ posts }").unwrap();
        std::fs::write(dir.path().join("b.graphql"), "{ user(id: 1) }").unwrap();

        let collector = DocumentCollector::new();
        let pattern = Value::String(format!("{}/*.graphql", dir.path().display()));
        let documents = collector.collect(&[pattern]).await.unwrap();
        assert_eq!(documents.len(), 2);

        let missing = Value::String(format!("{}/missing/*.graphql", dir.path().display()));
        assert!(collector.collect(&[missing]).await.is_err());
    }
}
