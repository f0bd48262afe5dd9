use std::collections::HashSet;

use cs_core::document::{OpenApiDocument, Schema, SchemaOrRef};
use cs_core::naming::{is_valid_identifier, normalize_name};
use serde_json::Value;

use crate::declarations::{EnumDeclaration, EnumMember};
use crate::syntax::{jsdoc, literal};
use crate::type_mapper::schema_tags;

/// An enum declaration for every top-level component schema that qualifies, in
/// document order.
pub fn collect_enums(document: &OpenApiDocument) -> Vec<EnumDeclaration> {
    document
        .components
        .schemas
        .iter()
        .filter_map(|(key, schema)| enum_declaration(key, schema))
        .collect()
}

/// Whether a schema can be emitted as a TypeScript enum: an inline schema with
/// a non-empty `enum` of strings and numbers. `null` entries are ignored.
pub fn is_enum_schema(schema: &SchemaOrRef) -> bool {
    schema.as_item().is_some_and(|s| enum_values(s).is_some())
}

pub fn enum_declaration(key: &str, schema: &SchemaOrRef) -> Option<EnumDeclaration> {
    let schema = schema.as_item()?;
    let values = enum_values(schema)?;

    Some(EnumDeclaration {
        name: normalize_name(key).pascal_case,
        schema_key: key.to_string(),
        doc: jsdoc(&schema_tags(schema)),
        members: members(schema, &values),
    })
}

/// Non-null enum values with their position in the original list.
fn enum_values(schema: &Schema) -> Option<Vec<(usize, &Value)>> {
    let mut values = Vec::new();
    for (position, value) in schema.enum_values.iter().enumerate() {
        match value {
            Value::String(_) | Value::Number(_) => values.push((position, value)),
            Value::Null => {}
            Value::Bool(_) | Value::Array(_) | Value::Object(_) => return None,
        }
    }
    (!values.is_empty()).then_some(values)
}

fn members(schema: &Schema, values: &[(usize, &Value)]) -> Vec<EnumMember> {
    let use_varnames = schema.enum_varnames.len() >= schema.enum_values.len();
    let mut taken = HashSet::new();

    values
        .iter()
        .map(|(position, value)| {
            let base = if use_varnames {
                varname(&schema.enum_varnames[*position])
            } else {
                member_name(value)
            };
            EnumMember {
                name: unique(base, &mut taken),
                value: literal(value).into_string(),
            }
        })
        .collect()
}

fn varname(name: &str) -> String {
    if is_valid_identifier(name) {
        name.to_string()
    } else {
        normalize_name(name).pascal_case
    }
}

/// Member name derived from the value itself.
pub fn member_name(value: &Value) -> String {
    match value {
        Value::String(s) if s.is_empty() => "Empty".to_string(),
        Value::String(s) => normalize_name(s).pascal_case,
        Value::Number(n) => {
            let digits = n.to_string().replace('-', "Minus").replace(['.', '+'], "_");
            format!("Value{digits}")
        }
        _ => "Value".to_string(),
    }
}

fn unique(base: String, taken: &mut HashSet<String>) -> String {
    if taken.insert(base.clone()) {
        return base;
    }
    let mut suffix = 2;
    loop {
        let candidate = format!("{base}{suffix}");
        if taken.insert(candidate.clone()) {
            return candidate;
        }
        suffix += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema(json: &str) -> SchemaOrRef {
        serde_json::from_str(json).unwrap()
    }

    fn member_pairs(decl: &EnumDeclaration) -> Vec<(&str, &str)> {
        decl.members
            .iter()
            .map(|m| (m.name.as_str(), m.value.as_str()))
            .collect()
    }

    #[test]
    fn test_classification() {
        assert!(is_enum_schema(&schema(r#"{ "type": "string", "enum": ["a"] }"#)));
        assert!(is_enum_schema(&schema(r#"{ "enum": [1, 2, null] }"#)));
        assert!(is_enum_schema(&schema(r#"{ "enum": ["a", 1] }"#)));
        assert!(!is_enum_schema(&schema(r#"{ "type": "string" }"#)));
        assert!(!is_enum_schema(&schema(r#"{ "enum": [] }"#)));
        assert!(!is_enum_schema(&schema(r#"{ "enum": [null] }"#)));
        assert!(!is_enum_schema(&schema(r#"{ "enum": [true, false] }"#)));
        assert!(!is_enum_schema(&schema(
            r##"{ "$ref": "#/components/schemas/Status" }"##
        )));
    }

    #[test]
    fn test_names_from_raw_keys() {
        let decl = enum_declaration(
            "user-status",
            &schema(r#"{ "type": "string", "enum": ["online", "offline"] }"#),
        )
        .unwrap();
        assert_eq!(decl.name, "UserStatus");
        assert_eq!(decl.schema_key, "user-status");
        assert_eq!(
            member_pairs(&decl),
            vec![("Online", "\"online\""), ("Offline", "\"offline\"")]
        );

        let decl = enum_declaration("task.priority", &schema(r#"{ "enum": [1] }"#)).unwrap();
        assert_eq!(decl.name, "TaskPriority");
    }

    #[test]
    fn test_varnames() {
        let decl = enum_declaration(
            "Rank",
            &schema(r#"{ "type": "integer", "enum": [1, 2], "x-enum-varnames": ["Low", "high value"] }"#),
        )
        .unwrap();
        assert_eq!(member_pairs(&decl), vec![("Low", "1"), ("HighValue", "2")]);

        // Too short to cover every value: ignored.
        let decl = enum_declaration(
            "Rank",
            &schema(r#"{ "enum": [1, 2], "x-enum-varnames": ["Low"] }"#),
        )
        .unwrap();
        assert_eq!(member_pairs(&decl), vec![("Value1", "1"), ("Value2", "2")]);
    }

    #[test]
    fn test_member_name_edge_cases() {
        assert_eq!(member_name(&serde_json::json!("")), "Empty");
        assert_eq!(member_name(&serde_json::json!("in-progress")), "InProgress");
        assert_eq!(member_name(&serde_json::json!(-1)), "ValueMinus1");
        assert_eq!(member_name(&serde_json::json!(1.5)), "Value1_5");
    }

    #[test]
    fn test_colliding_members_get_suffixes() {
        let decl = enum_declaration(
            "Mode",
            &schema(r#"{ "enum": ["read-only", "read_only", "READ ONLY"] }"#),
        )
        .unwrap();
        let names: Vec<_> = decl.members.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["ReadOnly", "ReadOnly2", "ReadOnly3"]);
    }

    #[test]
    fn test_nulls_skipped() {
        let decl = enum_declaration("Maybe", &schema(r#"{ "enum": ["a", null, "b"] }"#)).unwrap();
        assert_eq!(member_pairs(&decl), vec![("A", "\"a\""), ("B", "\"b\"")]);
    }

    #[test]
    fn test_description_becomes_doc() {
        let decl = enum_declaration(
            "Status",
            &schema(r#"{ "type": "string", "description": "Lifecycle", "enum": ["on"] }"#),
        )
        .unwrap();
        assert_eq!(decl.doc.as_deref(), Some("/** @description Lifecycle */"));
    }
}
