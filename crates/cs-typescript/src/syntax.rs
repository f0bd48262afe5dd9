//! Small building blocks for emitting TypeScript source text.

use std::fmt;

use cs_core::naming::is_valid_identifier;

pub const INDENT: &str = "    ";

/// How tightly a rendered type binds, for deciding where parentheses go.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Precedence {
    Union,
    Intersection,
    Atom,
}

/// A rendered TypeScript type expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TsType {
    text: String,
    precedence: Precedence,
}

impl TsType {
    pub fn atom(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            precedence: Precedence::Atom,
        }
    }

    pub fn unknown() -> Self {
        Self::atom("unknown")
    }

    pub fn never() -> Self {
        Self::atom("never")
    }

    pub fn with_precedence(text: impl Into<String>, precedence: Precedence) -> Self {
        Self {
            text: text.into(),
            precedence,
        }
    }

    /// `A | B | ...`, dropping repeated members. No members is `never`.
    pub fn union(members: Vec<TsType>) -> Self {
        let mut unique: Vec<TsType> = Vec::with_capacity(members.len());
        for member in members {
            if !unique.iter().any(|m| m.text == member.text) {
                unique.push(member);
            }
        }
        match unique.len() {
            0 => Self::never(),
            1 => unique.remove(0),
            _ => Self::with_precedence(
                unique
                    .iter()
                    .map(|m| m.text.as_str())
                    .collect::<Vec<_>>()
                    .join(" | "),
                Precedence::Union,
            ),
        }
    }

    /// `A & B & ...`, parenthesizing union members.
    pub fn intersection(parts: Vec<TsType>) -> Self {
        match parts.len() {
            0 => Self::unknown(),
            1 => parts.into_iter().next().unwrap_or_else(Self::unknown),
            _ => Self::with_precedence(
                parts
                    .iter()
                    .map(|p| p.grouped(Precedence::Intersection))
                    .collect::<Vec<_>>()
                    .join(" & "),
                Precedence::Intersection,
            ),
        }
    }

    /// The text, parenthesized when it binds looser than `context` requires.
    pub fn grouped(&self, context: Precedence) -> String {
        if self.precedence < context {
            format!("({})", self.text)
        } else {
            self.text.clone()
        }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn into_string(self) -> String {
        self.text
    }
}

impl fmt::Display for TsType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// One property of an object literal type.
#[derive(Debug, Clone)]
pub struct Member {
    pub key: String,
    pub value: TsType,
    pub optional: bool,
    pub readonly: bool,
    /// Rendered JSDoc block, if any.
    pub doc: Option<String>,
}

impl Member {
    pub fn required(key: impl Into<String>, value: TsType) -> Self {
        Self {
            key: key.into(),
            value,
            optional: false,
            readonly: false,
            doc: None,
        }
    }

    pub fn optional(key: impl Into<String>, value: TsType) -> Self {
        Self {
            optional: true,
            ..Self::required(key, value)
        }
    }

    pub fn doc(mut self, doc: Option<String>) -> Self {
        self.doc = doc;
        self
    }

    pub fn readonly(mut self, readonly: bool) -> Self {
        self.readonly = readonly;
        self
    }
}

/// A multi-line `{ ... }` object type.
#[derive(Debug, Clone, Default)]
pub struct ObjectLiteral {
    members: Vec<Member>,
    index: Option<(TsType, bool)>,
}

impl ObjectLiteral {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, member: Member) {
        self.members.push(member);
    }

    /// Add a `[key: string]: <value>` index signature after the named members.
    pub fn index_signature(&mut self, value: TsType, readonly: bool) {
        self.index = Some((value, readonly));
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty() && self.index.is_none()
    }

    pub fn sort(&mut self) {
        self.members.sort_by(|a, b| a.key.cmp(&b.key));
    }

    /// Render the literal. An empty literal renders as `fallback`.
    pub fn render_or(self, fallback: TsType) -> TsType {
        if self.is_empty() {
            return fallback;
        }

        let mut out = String::from("{\n");
        for member in self.members {
            if let Some(doc) = &member.doc {
                for line in doc.lines() {
                    out.push_str(INDENT);
                    out.push_str(line);
                    out.push('\n');
                }
            }
            out.push_str(INDENT);
            if member.readonly {
                out.push_str("readonly ");
            }
            out.push_str(&property_key(&member.key));
            if member.optional {
                out.push('?');
            }
            out.push_str(": ");
            out.push_str(&indent_tail(member.value.as_str()));
            out.push_str(";\n");
        }
        if let Some((value, readonly)) = self.index {
            out.push_str(INDENT);
            if readonly {
                out.push_str("readonly ");
            }
            out.push_str("[key: string]: ");
            out.push_str(&indent_tail(value.as_str()));
            out.push_str(";\n");
        }
        out.push('}');
        TsType::atom(out)
    }

    /// Render the literal, `Record<string, never>` when empty.
    pub fn render(self) -> TsType {
        self.render_or(TsType::atom("Record<string, never>"))
    }
}

/// A JSON string literal, which is also a valid TypeScript string literal.
pub fn quote(value: &str) -> String {
    serde_json::Value::String(value.to_string()).to_string()
}

/// A property key: bare when it is an identifier or a plain integer, quoted otherwise.
pub fn property_key(key: &str) -> String {
    let is_index = !key.is_empty() && key.bytes().all(|b| b.is_ascii_digit());
    if is_valid_identifier(key) || is_index {
        key.to_string()
    } else {
        quote(key)
    }
}

/// A value literal for a JSON value.
pub fn literal(value: &serde_json::Value) -> TsType {
    match value {
        serde_json::Value::String(s) => TsType::atom(quote(s)),
        serde_json::Value::Number(n) => TsType::atom(n.to_string()),
        serde_json::Value::Bool(b) => TsType::atom(b.to_string()),
        serde_json::Value::Null => TsType::atom("null"),
        serde_json::Value::Array(_) | serde_json::Value::Object(_) => TsType::unknown(),
    }
}

/// Indent every line after the first by one level.
pub fn indent_tail(text: &str) -> String {
    let mut lines = text.lines();
    let mut out = lines.next().unwrap_or_default().to_string();
    for line in lines {
        out.push('\n');
        if !line.is_empty() {
            out.push_str(INDENT);
        }
        out.push_str(line);
    }
    out
}

/// Build a JSDoc block from tag lines such as `@description ...`.
pub fn jsdoc(lines: &[String]) -> Option<String> {
    let lines: Vec<String> = lines
        .iter()
        .flat_map(|l| l.lines())
        .map(|l| l.trim_end().replace("*/", "*\\/"))
        .collect();

    match lines.as_slice() {
        [] => None,
        [single] => Some(format!("/** {single} */")),
        many => {
            let mut out = String::from("/**\n");
            for line in many {
                if line.is_empty() {
                    out.push_str(" *\n");
                } else {
                    out.push_str(" * ");
                    out.push_str(line);
                    out.push('\n');
                }
            }
            out.push_str(" */");
            Some(out)
        }
    }
}
