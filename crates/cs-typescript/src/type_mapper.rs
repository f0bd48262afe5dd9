use cs_core::config::CompilerOptions;
use cs_core::document::{
    AdditionalProperties, RefOr, Schema, SchemaOrRef, SchemaType, unescape_pointer,
};
use log::warn;

use crate::syntax::{Member, ObjectLiteral, Precedence, TsType, jsdoc, literal, quote};

/// Roots a local `$ref` may point into.
const REF_ROOTS: [&str; 3] = ["components", "paths", "webhooks"];

/// Maps schemas to TypeScript type expressions under one set of compiler options.
#[derive(Debug, Clone, Copy)]
pub struct TypeMapper<'a> {
    options: &'a CompilerOptions,
}

impl<'a> TypeMapper<'a> {
    pub fn new(options: &'a CompilerOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &CompilerOptions {
        self.options
    }

    pub fn map(&self, schema: &SchemaOrRef) -> TsType {
        match schema {
            RefOr::Ref { ref_path } => ref_to_ts(ref_path),
            RefOr::Item(schema) => self.map_schema(schema),
        }
    }

    /// Map an optional schema, `unknown` when absent.
    pub fn map_or_unknown(&self, schema: Option<&SchemaOrRef>) -> TsType {
        schema.map_or_else(TsType::unknown, |s| self.map(s))
    }

    pub fn map_schema(&self, schema: &Schema) -> TsType {
        let shape = self.map_shape(schema);
        if schema.is_nullable() {
            TsType::union(vec![shape, TsType::atom("null")])
        } else {
            shape
        }
    }

    /// JSDoc for a schema used as a property or entry. References carry none.
    pub fn doc(&self, schema: &SchemaOrRef) -> Option<String> {
        schema.as_item().and_then(|s| jsdoc(&schema_tags(s)))
    }

    fn map_shape(&self, schema: &Schema) -> TsType {
        if let Some(value) = &schema.const_value {
            return literal(value);
        }
        if !schema.enum_values.is_empty() {
            return TsType::union(schema.enum_values.iter().map(literal).collect());
        }

        if !schema.all_of.is_empty() {
            let mut parts: Vec<TsType> = schema.all_of.iter().map(|s| self.map(s)).collect();
            if has_own_shape(schema) {
                parts.push(self.object(schema));
            }
            return TsType::intersection(parts);
        }

        let variants: Vec<TsType> = schema
            .one_of
            .iter()
            .chain(&schema.any_of)
            .map(|s| self.map(s))
            .collect();
        if !variants.is_empty() {
            let union = TsType::union(variants);
            if has_own_shape(schema) {
                return TsType::intersection(vec![self.object(schema), union]);
            }
            return union;
        }

        let types = schema.types();
        let members: Vec<TsType> = types
            .iter()
            .filter(|t| **t != SchemaType::Null)
            .map(|t| match t {
                SchemaType::String => TsType::atom("string"),
                SchemaType::Number | SchemaType::Integer => TsType::atom("number"),
                SchemaType::Boolean => TsType::atom("boolean"),
                SchemaType::Array => self.array(schema),
                SchemaType::Object => self.object(schema),
                SchemaType::Null => TsType::atom("null"),
            })
            .collect();
        if !members.is_empty() {
            return TsType::union(members);
        }

        if types.contains(&SchemaType::Null) {
            TsType::atom("null")
        } else if has_own_shape(schema) {
            self.object(schema)
        } else if schema.items.is_some() || !schema.prefix_items.is_empty() {
            self.array(schema)
        } else {
            TsType::unknown()
        }
    }

    fn object(&self, schema: &Schema) -> TsType {
        let mut literal = ObjectLiteral::new();
        for (key, property) in &schema.properties {
            let read_only = property.as_item().is_some_and(|p| p.read_only);
            let member = if schema.is_required(key) {
                Member::required(key.clone(), self.map(property))
            } else {
                Member::optional(key.clone(), self.map(property))
            };
            literal.push(
                member
                    .doc(self.doc(property))
                    .readonly(self.options.immutable || read_only),
            );
        }

        let index = match &schema.additional_properties {
            Some(AdditionalProperties::Bool(true)) => Some(TsType::unknown()),
            Some(AdditionalProperties::Schema(value)) => Some(self.map(value)),
            Some(AdditionalProperties::Bool(false)) => None,
            None if self.options.additional_properties => Some(TsType::unknown()),
            None => None,
        };
        if let Some(index) = index {
            literal.index_signature(index, self.options.immutable);
        }

        if self.options.alphabetize {
            literal.sort();
        }
        literal.render()
    }

    fn array(&self, schema: &Schema) -> TsType {
        let text = if schema.prefix_items.is_empty() {
            let item = self.map_or_unknown(schema.items.as_ref());
            format!("{}[]", item.grouped(Precedence::Atom))
        } else {
            let items: Vec<String> = schema
                .prefix_items
                .iter()
                .map(|s| self.map(s).into_string())
                .collect();
            format!("[{}]", items.join(", "))
        };

        if self.options.immutable {
            TsType::with_precedence(format!("readonly {text}"), Precedence::Intersection)
        } else {
            TsType::atom(text)
        }
    }
}

fn has_own_shape(schema: &Schema) -> bool {
    !schema.properties.is_empty() || schema.additional_properties.is_some()
}

/// JSDoc tag lines describing a schema.
pub fn schema_tags(schema: &Schema) -> Vec<String> {
    let mut tags = Vec::new();
    if schema.deprecated {
        tags.push("@deprecated".to_string());
    }
    if let Some(description) = &schema.description {
        tags.push(format!("@description {description}"));
    }
    if let Some(format) = &schema.format {
        tags.push(format!("@format {format}"));
    }
    if let Some(default) = &schema.default_value {
        tags.push(format!("@default {default}"));
    }
    if let Some(example) = &schema.example {
        tags.push(format!("@example {example}"));
    }
    tags
}

/// Translate a local JSON pointer into an indexed access type.
///
/// `#/components/schemas/user-status` becomes
/// `components["schemas"]["user-status"]`. Anything that is not a pointer into
/// `components`, `paths` or `webhooks` maps to `unknown`.
pub fn ref_to_ts(ref_path: &str) -> TsType {
    let Some(pointer) = ref_path.strip_prefix("#/") else {
        warn!("unsupported reference {ref_path}, typed as unknown");
        return TsType::unknown();
    };

    let mut segments = pointer.split('/').map(unescape_pointer);
    let root = segments.next().unwrap_or_default();
    if !REF_ROOTS.contains(&root.as_str()) {
        warn!("unsupported reference {ref_path}, typed as unknown");
        return TsType::unknown();
    }

    let mut text = root;
    for segment in segments {
        text.push('[');
        text.push_str(&quote(&segment));
        text.push(']');
    }
    TsType::atom(text)
}
