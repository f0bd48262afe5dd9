use crate::syntax::quote;

/// What a type alias points at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AliasTarget {
    /// `components["schemas"]["<raw key>"]`, keyed by the schema's raw name.
    Schema(String),
    /// Any other type expression, already rendered.
    Type(String),
}

impl AliasTarget {
    pub fn render(&self) -> String {
        match self {
            AliasTarget::Schema(key) => format!("components[\"schemas\"][{}]", quote(key)),
            AliasTarget::Type(ts) => ts.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumMember {
    pub name: String,
    /// TypeScript literal text, e.g. `"active"` or `3`.
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumDeclaration {
    pub name: String,
    /// Raw `components.schemas` key the enum was generated from.
    pub schema_key: String,
    /// Rendered JSDoc block.
    pub doc: Option<String>,
    pub members: Vec<EnumMember>,
}

/// One top-level export of the types file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Declaration {
    /// `export interface <name> <body>`; `body` includes the braces.
    Interface { name: String, body: String },
    /// `export type <name> = <target>;`
    TypeAlias { name: String, target: AliasTarget },
    Enum(EnumDeclaration),
}

impl Declaration {
    pub fn name(&self) -> &str {
        match self {
            Declaration::Interface { name, .. } | Declaration::TypeAlias { name, .. } => name,
            Declaration::Enum(e) => &e.name,
        }
    }

    /// The raw schema key when this is an alias of a component schema.
    pub fn aliased_schema(&self) -> Option<&str> {
        match self {
            Declaration::TypeAlias {
                target: AliasTarget::Schema(key),
                ..
            } => Some(key),
            _ => None,
        }
    }
}
