//! Introspection-result parsing and printing
//!
//! Converts the standard GraphQL introspection JSON shape into the in-memory
//! [`Schema`] model and back. Accepts both a raw `{"__schema": ...}` object
//! and a full response envelope `{"data": {"__schema": ...}}`.

use anyhow::{anyhow, Result};
use serde_json::{json, Value};

use super::{DirectiveDefinition, FieldDefinition, Schema, TypeDefinition, TypeKind};

/// Introspection query posted to remote endpoints
pub const INTROSPECTION_QUERY: &str = r#"
query IntrospectionQuery {
  __schema {
    queryType { name }
    mutationType { name }
    subscriptionType { name }
    types {
      kind
      name
      fields(includeDeprecated: true) {
        name
        type { ...TypeRef }
      }
      inputFields {
        name
        type { ...TypeRef }
      }
      enumValues(includeDeprecated: true) { name }
      possibleTypes { name }
      interfaces { name }
    }
    directives {
      name
      locations
    }
  }
}

fragment TypeRef on __Type {
  kind
  name
  ofType {
    kind
    name
    ofType {
      kind
      name
      ofType { kind name }
    }
  }
}
"#;

/// Parse an introspection JSON document into a schema
pub fn parse_introspection(source: &str) -> Result<Schema> {
    let value: Value = serde_json::from_str(source)?;
    from_json(&value)
}

/// Build a schema from an already-deserialized introspection result
pub fn from_json(value: &Value) -> Result<Schema> {
    let root = value
        .get("data")
        .and_then(|data| data.get("__schema"))
        .or_else(|| value.get("__schema"))
        .ok_or_else(|| anyhow!("introspection result has no __schema object"))?;

    let mut schema = Schema::new();
    schema.query_type = root_type_name(root, "queryType");
    schema.mutation_type = root_type_name(root, "mutationType");
    schema.subscription_type = root_type_name(root, "subscriptionType");

    let types = root
        .get("types")
        .and_then(Value::as_array)
        .ok_or_else(|| anyhow!("introspection result has no types list"))?;

    for entry in types {
        let Some(name) = entry.get("name").and_then(Value::as_str) else {
            continue;
        };
        if name.starts_with("__") {
            continue;
        }
        let kind = match entry.get("kind").and_then(Value::as_str) {
            Some("OBJECT") => TypeKind::Object,
            Some("INTERFACE") => TypeKind::Interface,
            Some("UNION") => TypeKind::Union,
            Some("ENUM") => TypeKind::Enum,
            Some("SCALAR") => TypeKind::Scalar,
            Some("INPUT_OBJECT") => TypeKind::InputObject,
            other => {
                return Err(anyhow!(
                    "unsupported introspection type kind {:?} for '{name}'",
                    other
                ))
            }
        };

        let mut definition = TypeDefinition::new(name, kind);
        let field_key = if kind == TypeKind::InputObject {
            "inputFields"
        } else {
            "fields"
        };
        if let Some(fields) = entry.get(field_key).and_then(Value::as_array) {
            for field in fields {
                let Some(field_name) = field.get("name").and_then(Value::as_str) else {
                    continue;
                };
                let type_name = field
                    .get("type")
                    .map(base_type_name)
                    .unwrap_or_default();
                definition.fields.insert(
                    field_name.to_string(),
                    FieldDefinition {
                        name: field_name.to_string(),
                        type_name,
                    },
                );
            }
        }
        let member_key = match kind {
            TypeKind::Enum => Some("enumValues"),
            TypeKind::Union => Some("possibleTypes"),
            TypeKind::Object => Some("interfaces"),
            _ => None,
        };
        if let Some(key) = member_key {
            if let Some(members) = entry.get(key).and_then(Value::as_array) {
                for member in members {
                    if let Some(member_name) = member.get("name").and_then(Value::as_str) {
                        definition.members.push(member_name.to_string());
                    }
                }
            }
        }

        schema.types.insert(name.to_string(), definition);
    }

    if let Some(directives) = root.get("directives").and_then(Value::as_array) {
        for directive in directives {
            let Some(name) = directive.get("name").and_then(Value::as_str) else {
                continue;
            };
            let locations = directive
                .get("locations")
                .and_then(Value::as_array)
                .map(|values| {
                    values
                        .iter()
                        .filter_map(Value::as_str)
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or_default();
            schema.directives.insert(
                name.to_string(),
                DirectiveDefinition {
                    name: name.to_string(),
                    locations,
                },
            );
        }
    }

    Ok(schema)
}

fn root_type_name(root: &Value, key: &str) -> Option<String> {
    root.get(key)?
        .get("name")?
        .as_str()
        .map(str::to_string)
}

/// Unwrap NON_NULL/LIST wrappers down to the named type
fn base_type_name(type_ref: &Value) -> String {
    let mut current = type_ref;
    loop {
        if let Some(name) = current.get("name").and_then(Value::as_str) {
            return name.to_string();
        }
        match current.get("ofType") {
            Some(inner) if !inner.is_null() => current = inner,
            _ => return String::new(),
        }
    }
}

/// Render a schema as an introspection-style JSON value
pub fn to_json(schema: &Schema) -> Value {
    let types: Vec<Value> = schema
        .types
        .values()
        .map(|definition| {
            let kind = match definition.kind {
                TypeKind::Object => "OBJECT",
                TypeKind::Interface => "INTERFACE",
                TypeKind::Union => "UNION",
                TypeKind::Enum => "ENUM",
                TypeKind::Scalar => "SCALAR",
                TypeKind::InputObject => "INPUT_OBJECT",
            };
            let fields: Vec<Value> = definition
                .fields
                .values()
                .map(|field| {
                    json!({
                        "name": field.name,
                        "type": { "kind": "OBJECT", "name": field.type_name, "ofType": null },
                    })
                })
                .collect();
            let mut entry = json!({ "kind": kind, "name": definition.name });
            match definition.kind {
                TypeKind::InputObject => entry["inputFields"] = Value::Array(fields),
                TypeKind::Enum => {
                    entry["enumValues"] = definition
                        .members
                        .iter()
                        .map(|name| json!({ "name": name }))
                        .collect();
                }
                TypeKind::Union => {
                    entry["possibleTypes"] = definition
                        .members
                        .iter()
                        .map(|name| json!({ "name": name }))
                        .collect();
                }
                _ => entry["fields"] = Value::Array(fields),
            }
            entry
        })
        .collect();

    let root_ref = |name: &Option<String>| match name {
        Some(name) => json!({ "name": name }),
        None => Value::Null,
    };

    json!({
        "__schema": {
            "queryType": root_ref(&schema.query_type),
            "mutationType": root_ref(&schema.mutation_type),
            "subscriptionType": root_ref(&schema.subscription_type),
            "types": types,
            "directives": schema
                .directives
                .values()
                .map(|d| json!({ "name": d.name, "locations": d.locations }))
                .collect::<Vec<_>>(),
        }
    })
}
