//! GraphQL type-system model, schema loading and schema merging

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub mod handlers;
pub mod introspection;
pub mod resolver;
pub mod sdl;

pub use handlers::{
    IntrospectionFileHandler, RegistrySchemaHandler, SdlFileHandler, UrlIntrospectionHandler,
};
pub use resolver::{SchemaResolver, SchemaSourceHandler};

/// Kind of a named type definition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeKind {
    Object,
    Interface,
    Union,
    Enum,
    Scalar,
    InputObject,
}

/// A field on an object, interface or input type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDefinition {
    /// Field name
    pub name: String,

    /// Base named type with list/non-null wrappers stripped
    pub type_name: String,
}

/// A named type definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeDefinition {
    /// Type name
    pub name: String,

    /// Type kind
    pub kind: TypeKind,

    /// Fields, for object/interface/input types
    pub fields: BTreeMap<String, FieldDefinition>,

    /// Member types for unions, values for enums, implemented interfaces for objects
    pub members: Vec<String>,
}

impl TypeDefinition {
    /// Create an empty definition of the given kind
    pub fn new(name: impl Into<String>, kind: TypeKind) -> Self {
        Self {
            name: name.into(),
            kind,
            fields: BTreeMap::new(),
            members: Vec::new(),
        }
    }

    /// Whether the definition carries a field set worth validating against
    pub fn has_fields(&self) -> bool {
        matches!(self.kind, TypeKind::Object | TypeKind::Interface) && !self.fields.is_empty()
    }
}

/// A directive definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DirectiveDefinition {
    /// Directive name, without the leading `@`
    pub name: String,

    /// Locations the directive may be applied to
    pub locations: Vec<String>,
}

/// In-memory GraphQL type system
///
/// Built from SDL text, an introspection result, or a registered schema and
/// merged into a single type system per output target.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    /// Named type definitions
    pub types: BTreeMap<String, TypeDefinition>,

    /// Directive definitions
    pub directives: BTreeMap<String, DirectiveDefinition>,

    /// Root query type name, when declared explicitly
    pub query_type: Option<String>,

    /// Root mutation type name, when declared explicitly
    pub mutation_type: Option<String>,

    /// Root subscription type name, when declared explicitly
    pub subscription_type: Option<String>,
}

impl Schema {
    /// Create an empty schema
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a type definition by name
    pub fn type_definition(&self, name: &str) -> Option<&TypeDefinition> {
        self.types.get(name)
    }

    /// Root query type, defaulting to `Query`
    pub fn query_root(&self) -> Option<&TypeDefinition> {
        self.types.get(self.query_type.as_deref().unwrap_or("Query"))
    }

    /// Root mutation type, defaulting to `Mutation`
    pub fn mutation_root(&self) -> Option<&TypeDefinition> {
        self.types
            .get(self.mutation_type.as_deref().unwrap_or("Mutation"))
    }

    /// Root subscription type, defaulting to `Subscription`
    pub fn subscription_root(&self) -> Option<&TypeDefinition> {
        self.types
            .get(self.subscription_type.as_deref().unwrap_or("Subscription"))
    }

    /// Union this schema with another, consuming both
    ///
    /// Type and directive sets are unioned; on a duplicate name the later
    /// definition wins. Explicit root type names from the later schema take
    /// precedence. Always produces a new schema, inputs are discarded.
    pub fn merge(mut self, other: Schema) -> Schema {
        for (name, definition) in other.types {
            self.types.insert(name, definition);
        }
        for (name, directive) in other.directives {
            self.directives.insert(name, directive);
        }
        if other.query_type.is_some() {
            self.query_type = other.query_type;
        }
        if other.mutation_type.is_some() {
            self.mutation_type = other.mutation_type;
        }
        if other.subscription_type.is_some() {
            self.subscription_type = other.subscription_type;
        }
        self
    }
}

/// Merge a list of optionally-resolved schemas into one
///
/// Unset entries are filtered out. Zero inputs yield no schema, one input is
/// returned unchanged, more delegate to [`Schema::merge`] pairwise.
pub fn merge_all<I>(schemas: I) -> Option<Schema>
where
    I: IntoIterator<Item = Option<Schema>>,
{
    schemas.into_iter().flatten().reduce(Schema::merge)
}
