//! Minimal SDL parsing and printing
//!
//! Parses schema definition language source into the in-memory [`Schema`]
//! model. The parser is structural: it records type names, kinds, fields and
//! directive definitions, and tolerates constructs it does not model (field
//! arguments, default values, applied directives) by skipping them. Plugin
//! schema augmentation relies on this permissiveness.

use anyhow::{anyhow, Result};

use super::{DirectiveDefinition, FieldDefinition, Schema, TypeDefinition, TypeKind};

/// Token kind produced by [`tokenize`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TokenKind {
    Name,
    Punct,
    Str,
    Number,
}

/// A lexical token with its source line
#[derive(Debug, Clone)]
pub(crate) struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub line: usize,
}

/// Tokenize GraphQL source (SDL or executable documents)
///
/// Commas and comments are treated as whitespace per the GraphQL lexical
/// grammar. String and block-string contents are not needed downstream, so
/// both collapse to an empty `Str` token.
pub(crate) fn tokenize(source: &str) -> Vec<Token> {
    let chars: Vec<char> = source.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;
    let mut line = 1;

    while i < chars.len() {
        let c = chars[i];
        if c == '\n' {
            line += 1;
            i += 1;
        } else if c.is_whitespace() || c == ',' {
            i += 1;
        } else if c == '#' {
            while i < chars.len() && chars[i] != '\n' {
                i += 1;
            }
        } else if c == '"' {
            if chars[i..].starts_with(&['"', '"', '"']) {
                i += 3;
                while i < chars.len() && !chars[i..].starts_with(&['"', '"', '"']) {
                    if chars[i] == '\n' {
                        line += 1;
                    }
                    i += 1;
                }
                i = (i + 3).min(chars.len());
            } else {
                i += 1;
                while i < chars.len() && chars[i] != '"' && chars[i] != '\n' {
                    if chars[i] == '\\' {
                        i += 1;
                    }
                    i += 1;
                }
                i = (i + 1).min(chars.len());
            }
            tokens.push(Token {
                kind: TokenKind::Str,
                text: String::new(),
                line,
            });
        } else if c == '.' && chars[i..].starts_with(&['.', '.', '.']) {
            tokens.push(Token {
                kind: TokenKind::Punct,
                text: "...".to_string(),
                line,
            });
            i += 3;
        } else if c.is_alphabetic() || c == '_' {
            let start = i;
            while i < chars.len() && (chars[i].is_alphanumeric() || chars[i] == '_') {
                i += 1;
            }
            tokens.push(Token {
                kind: TokenKind::Name,
                text: chars[start..i].iter().collect(),
                line,
            });
        } else if c.is_ascii_digit() || (c == '-' && matches!(chars.get(i + 1), Some(d) if d.is_ascii_digit()))
        {
            let start = i;
            i += 1;
            while i < chars.len()
                && (chars[i].is_ascii_alphanumeric() || matches!(chars[i], '.' | '+' | '-'))
            {
                i += 1;
            }
            tokens.push(Token {
                kind: TokenKind::Number,
                text: chars[start..i].iter().collect(),
                line,
            });
        } else {
            tokens.push(Token {
                kind: TokenKind::Punct,
                text: c.to_string(),
                line,
            });
            i += 1;
        }
    }

    tokens
}

/// Token cursor shared by the SDL and executable-document parsers
pub(crate) struct Cursor {
    tokens: Vec<Token>,
    pos: usize,
}

impl Cursor {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self { tokens, pos: 0 }
    }

    pub fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    pub fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    pub fn peek_is_punct(&self, punct: &str) -> bool {
        matches!(self.peek(), Some(t) if t.kind == TokenKind::Punct && t.text == punct)
    }

    pub fn peek_is_name(&self, name: &str) -> bool {
        matches!(self.peek(), Some(t) if t.kind == TokenKind::Name && t.text == name)
    }

    pub fn eat_punct(&mut self, punct: &str) -> bool {
        if self.peek_is_punct(punct) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    pub fn expect_name(&mut self) -> Result<Token> {
        match self.next() {
            Some(t) if t.kind == TokenKind::Name => Ok(t),
            Some(t) => Err(anyhow!("expected a name at line {}, found '{}'", t.line, t.text)),
            None => Err(anyhow!("expected a name, found end of input")),
        }
    }

    pub fn expect_punct(&mut self, punct: &str) -> Result<()> {
        match self.next() {
            Some(t) if t.kind == TokenKind::Punct && t.text == punct => Ok(()),
            Some(t) => Err(anyhow!(
                "expected '{}' at line {}, found '{}'",
                punct,
                t.line,
                t.text
            )),
            None => Err(anyhow!("expected '{}', found end of input", punct)),
        }
    }

    /// Skip a balanced `open`...`close` group, cursor positioned on `open`
    pub fn skip_balanced(&mut self, open: &str, close: &str) -> Result<()> {
        self.expect_punct(open)?;
        let mut depth = 1usize;
        while depth > 0 {
            match self.next() {
                Some(t) if t.kind == TokenKind::Punct && t.text == open => depth += 1,
                Some(t) if t.kind == TokenKind::Punct && t.text == close => depth -= 1,
                Some(_) => {}
                None => return Err(anyhow!("unbalanced '{open}' group")),
            }
        }
        Ok(())
    }

    /// Skip any applied directives (`@name` with optional arguments)
    pub fn skip_directives(&mut self) -> Result<()> {
        while self.eat_punct("@") {
            self.expect_name()?;
            if self.peek_is_punct("(") {
                self.skip_balanced("(", ")")?;
            }
        }
        Ok(())
    }

    /// Skip one value literal (scalar, enum, list or object form)
    pub fn skip_value(&mut self) -> Result<()> {
        if self.peek_is_punct("[") {
            self.skip_balanced("[", "]")
        } else if self.peek_is_punct("{") {
            self.skip_balanced("{", "}")
        } else {
            self.next()
                .map(|_| ())
                .ok_or_else(|| anyhow!("expected a value, found end of input"))
        }
    }
}

/// Parse SDL source text into a schema
pub fn parse_sdl(source: &str) -> Result<Schema> {
    let mut cursor = Cursor::new(tokenize(source));
    let mut schema = Schema::new();
    let mut extending = false;

    while let Some(token) = cursor.peek().cloned() {
        if token.kind != TokenKind::Name {
            cursor.next();
            extending = false;
            continue;
        }
        match token.text.as_str() {
            "extend" => {
                cursor.next();
                extending = true;
                continue;
            }
            "schema" => {
                cursor.next();
                parse_schema_block(&mut cursor, &mut schema)?;
            }
            "type" => {
                cursor.next();
                parse_object_like(&mut cursor, &mut schema, TypeKind::Object, extending)?;
            }
            "interface" => {
                cursor.next();
                parse_object_like(&mut cursor, &mut schema, TypeKind::Interface, extending)?;
            }
            "input" => {
                cursor.next();
                parse_object_like(&mut cursor, &mut schema, TypeKind::InputObject, extending)?;
            }
            "enum" => {
                cursor.next();
                parse_enum(&mut cursor, &mut schema, extending)?;
            }
            "union" => {
                cursor.next();
                parse_union(&mut cursor, &mut schema, extending)?;
            }
            "scalar" => {
                cursor.next();
                let name = cursor.expect_name()?.text;
                cursor.skip_directives()?;
                schema
                    .types
                    .entry(name.clone())
                    .or_insert_with(|| TypeDefinition::new(name, TypeKind::Scalar));
            }
            "directive" => {
                cursor.next();
                parse_directive(&mut cursor, &mut schema)?;
            }
            _ => {
                cursor.next();
            }
        }
        extending = false;
    }

    Ok(schema)
}

fn parse_schema_block(cursor: &mut Cursor, schema: &mut Schema) -> Result<()> {
    cursor.skip_directives()?;
    cursor.expect_punct("{")?;
    while !cursor.eat_punct("}") {
        let operation = cursor.expect_name()?.text;
        cursor.expect_punct(":")?;
        let type_name = cursor.expect_name()?.text;
        match operation.as_str() {
            "query" => schema.query_type = Some(type_name),
            "mutation" => schema.mutation_type = Some(type_name),
            "subscription" => schema.subscription_type = Some(type_name),
            other => return Err(anyhow!("unknown root operation '{other}' in schema block")),
        }
    }
    Ok(())
}

fn parse_object_like(
    cursor: &mut Cursor,
    schema: &mut Schema,
    kind: TypeKind,
    extending: bool,
) -> Result<()> {
    let name = cursor.expect_name()?.text;
    let mut definition = take_definition(schema, &name, kind, extending);

    if cursor.peek_is_name("implements") {
        cursor.next();
        loop {
            let interface = cursor.expect_name()?.text;
            definition.members.push(interface);
            if !cursor.eat_punct("&") {
                break;
            }
        }
    }
    cursor.skip_directives()?;

    if cursor.eat_punct("{") {
        while !cursor.eat_punct("}") {
            if matches!(cursor.peek(), Some(t) if t.kind == TokenKind::Str) {
                cursor.next();
                continue;
            }
            let field = parse_field(cursor)?;
            definition.fields.insert(field.name.clone(), field);
        }
    }

    schema.types.insert(name, definition);
    Ok(())
}

fn parse_field(cursor: &mut Cursor) -> Result<FieldDefinition> {
    let name = cursor.expect_name()?.text;
    if cursor.peek_is_punct("(") {
        cursor.skip_balanced("(", ")")?;
    }
    cursor.expect_punct(":")?;
    let type_name = parse_type_ref(cursor)?;
    if cursor.eat_punct("=") {
        cursor.skip_value()?;
    }
    cursor.skip_directives()?;
    Ok(FieldDefinition { name, type_name })
}

/// Parse a type reference, returning the base named type
fn parse_type_ref(cursor: &mut Cursor) -> Result<String> {
    while cursor.eat_punct("[") {}
    let base = cursor.expect_name()?.text;
    while cursor.eat_punct("!") || cursor.eat_punct("]") {}
    Ok(base)
}

fn parse_enum(cursor: &mut Cursor, schema: &mut Schema, extending: bool) -> Result<()> {
    let name = cursor.expect_name()?.text;
    let mut definition = take_definition(schema, &name, TypeKind::Enum, extending);
    cursor.skip_directives()?;
    cursor.expect_punct("{")?;
    while !cursor.eat_punct("}") {
        if matches!(cursor.peek(), Some(t) if t.kind == TokenKind::Str) {
            cursor.next();
            continue;
        }
        let value = cursor.expect_name()?.text;
        cursor.skip_directives()?;
        definition.members.push(value);
    }
    schema.types.insert(name, definition);
    Ok(())
}

fn parse_union(cursor: &mut Cursor, schema: &mut Schema, extending: bool) -> Result<()> {
    let name = cursor.expect_name()?.text;
    let mut definition = take_definition(schema, &name, TypeKind::Union, extending);
    cursor.skip_directives()?;
    cursor.expect_punct("=")?;
    cursor.eat_punct("|");
    loop {
        let member = cursor.expect_name()?.text;
        definition.members.push(member);
        if !cursor.eat_punct("|") {
            break;
        }
    }
    schema.types.insert(name, definition);
    Ok(())
}

fn parse_directive(cursor: &mut Cursor, schema: &mut Schema) -> Result<()> {
    cursor.expect_punct("@")?;
    let name = cursor.expect_name()?.text;
    if cursor.peek_is_punct("(") {
        cursor.skip_balanced("(", ")")?;
    }
    if cursor.peek_is_name("repeatable") {
        cursor.next();
    }
    let on = cursor.expect_name()?;
    if on.text != "on" {
        return Err(anyhow!(
            "expected 'on' in directive definition at line {}",
            on.line
        ));
    }
    let mut locations = Vec::new();
    cursor.eat_punct("|");
    loop {
        locations.push(cursor.expect_name()?.text);
        if !cursor.eat_punct("|") {
            break;
        }
    }
    schema
        .directives
        .insert(name.clone(), DirectiveDefinition { name, locations });
    Ok(())
}

/// Reuse an existing definition when extending, otherwise start fresh
fn take_definition(
    schema: &mut Schema,
    name: &str,
    kind: TypeKind,
    extending: bool,
) -> TypeDefinition {
    if extending {
        if let Some(existing) = schema.types.remove(name) {
            return existing;
        }
    }
    TypeDefinition::new(name, kind)
}

/// Render a schema back to SDL text
pub fn print_sdl(schema: &Schema) -> String {
    let mut out = String::new();

    if schema.query_type.is_some()
        || schema.mutation_type.is_some()
        || schema.subscription_type.is_some()
    {
        out.push_str("schema {\n");
        if let Some(name) = &schema.query_type {
            out.push_str(&format!("  query: {name}\n"));
        }
        if let Some(name) = &schema.mutation_type {
            out.push_str(&format!("  mutation: {name}\n"));
        }
        if let Some(name) = &schema.subscription_type {
            out.push_str(&format!("  subscription: {name}\n"));
        }
        out.push_str("}\n\n");
    }

    for directive in schema.directives.values() {
        out.push_str(&format!(
            "directive @{} on {}\n\n",
            directive.name,
            directive.locations.join(" | ")
        ));
    }

    for definition in schema.types.values() {
        match definition.kind {
            TypeKind::Scalar => {
                out.push_str(&format!("scalar {}\n\n", definition.name));
            }
            TypeKind::Enum => {
                out.push_str(&format!("enum {} {{\n", definition.name));
                for value in &definition.members {
                    out.push_str(&format!("  {value}\n"));
                }
                out.push_str("}\n\n");
            }
            TypeKind::Union => {
                out.push_str(&format!(
                    "union {} = {}\n\n",
                    definition.name,
                    definition.members.join(" | ")
                ));
            }
            TypeKind::Object | TypeKind::Interface | TypeKind::InputObject => {
                let keyword = match definition.kind {
                    TypeKind::Interface => "interface",
                    TypeKind::InputObject => "input",
                    _ => "type",
                };
                out.push_str(&format!("{keyword} {}", definition.name));
                if keyword == "type" && !definition.members.is_empty() {
                    out.push_str(&format!(" implements {}", definition.members.join(" & ")));
                }
                out.push_str(" {\n");
                for field in definition.fields.values() {
                    out.push_str(&format!("  {}: {}\n", field.name, field.type_name));
                }
                out.push_str("}\n\n");
            }
        }
    }

    out.trim_end().to_string() + "\n"
}
