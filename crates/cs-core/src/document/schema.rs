use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::{RefOr, lenient};

/// A reference or inline schema.
pub type SchemaOrRef = RefOr<Schema>;

/// A JSON Schema type keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaType {
    String,
    Number,
    Integer,
    Boolean,
    Array,
    Object,
    Null,
}

impl SchemaType {
    /// Recognize a `type` keyword. Unknown keywords yield `None` rather than an error.
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword {
            "string" => Some(SchemaType::String),
            "number" => Some(SchemaType::Number),
            "integer" => Some(SchemaType::Integer),
            "boolean" => Some(SchemaType::Boolean),
            "array" => Some(SchemaType::Array),
            "object" => Some(SchemaType::Object),
            "null" => Some(SchemaType::Null),
            _ => None,
        }
    }
}

/// The `type` field: one keyword (3.0) or a list of keywords (3.1).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TypeSet {
    Single(String),
    Multiple(Vec<String>),
}

impl TypeSet {
    /// Recognized keywords in declaration order.
    pub fn types(&self) -> Vec<SchemaType> {
        match self {
            TypeSet::Single(keyword) => SchemaType::from_keyword(keyword).into_iter().collect(),
            TypeSet::Multiple(keywords) => keywords
                .iter()
                .filter_map(|k| SchemaType::from_keyword(k))
                .collect(),
        }
    }
}

/// `additionalProperties` is either a boolean or a schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AdditionalProperties {
    Bool(bool),
    Schema(SchemaOrRef),
}

/// The subset of a JSON Schema object that drives type generation.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Schema {
    #[serde(
        rename = "type",
        deserialize_with = "lenient::or_default",
        skip_serializing_if = "Option::is_none"
    )]
    pub schema_type: Option<TypeSet>,

    #[serde(deserialize_with = "lenient::or_default", skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,

    #[serde(deserialize_with = "lenient::or_default", skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(deserialize_with = "lenient::or_default", skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(rename = "default", skip_serializing_if = "Option::is_none")]
    pub default_value: Option<serde_json::Value>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub example: Option<serde_json::Value>,

    #[serde(deserialize_with = "lenient::or_default")]
    pub nullable: bool,
    #[serde(deserialize_with = "lenient::or_default")]
    pub deprecated: bool,
    #[serde(deserialize_with = "lenient::or_default")]
    pub read_only: bool,
    #[serde(deserialize_with = "lenient::or_default")]
    pub write_only: bool,

    #[serde(deserialize_with = "lenient::schema_map", skip_serializing_if = "IndexMap::is_empty")]
    pub properties: IndexMap<String, SchemaOrRef>,

    #[serde(deserialize_with = "lenient::or_default", skip_serializing_if = "Vec::is_empty")]
    pub required: Vec<String>,

    #[serde(deserialize_with = "lenient::or_default", skip_serializing_if = "Option::is_none")]
    pub additional_properties: Option<AdditionalProperties>,

    #[serde(deserialize_with = "lenient::schema_option", skip_serializing_if = "Option::is_none")]
    pub items: Option<SchemaOrRef>,

    #[serde(deserialize_with = "lenient::schema_list", skip_serializing_if = "Vec::is_empty")]
    pub prefix_items: Vec<SchemaOrRef>,

    #[serde(deserialize_with = "lenient::schema_list", skip_serializing_if = "Vec::is_empty")]
    pub all_of: Vec<SchemaOrRef>,

    #[serde(deserialize_with = "lenient::schema_list", skip_serializing_if = "Vec::is_empty")]
    pub one_of: Vec<SchemaOrRef>,

    #[serde(deserialize_with = "lenient::schema_list", skip_serializing_if = "Vec::is_empty")]
    pub any_of: Vec<SchemaOrRef>,

    #[serde(
        rename = "enum",
        deserialize_with = "lenient::or_default",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub enum_values: Vec<serde_json::Value>,

    #[serde(rename = "const", skip_serializing_if = "Option::is_none")]
    pub const_value: Option<serde_json::Value>,

    /// Member names for `enum` values, by position.
    #[serde(
        rename = "x-enum-varnames",
        deserialize_with = "lenient::or_default",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub enum_varnames: Vec<String>,
}

impl Schema {
    /// Recognized `type` keywords, empty when the schema has no `type`.
    pub fn types(&self) -> Vec<SchemaType> {
        self.schema_type
            .as_ref()
            .map(TypeSet::types)
            .unwrap_or_default()
    }

    /// Whether `null` is an accepted value, via 3.0 `nullable` or a 3.1 type list.
    pub fn is_nullable(&self) -> bool {
        self.nullable || self.types().contains(&SchemaType::Null)
    }

    pub fn is_required(&self, property: &str) -> bool {
        self.required.iter().any(|r| r == property)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_set_single_and_multiple() {
        let schema: Schema = serde_json::from_str(r#"{ "type": "string" }"#).unwrap();
        assert_eq!(schema.types(), vec![SchemaType::String]);
        assert!(!schema.is_nullable());

        let schema: Schema = serde_json::from_str(r#"{ "type": ["integer", "null"] }"#).unwrap();
        assert_eq!(schema.types(), vec![SchemaType::Integer, SchemaType::Null]);
        assert!(schema.is_nullable());
    }

    #[test]
    fn test_unknown_type_keyword_is_ignored() {
        let schema: Schema = serde_json::from_str(r#"{ "type": "file" }"#).unwrap();
        assert!(schema.types().is_empty());
    }

    #[test]
    fn test_nullable_30() {
        let schema: Schema =
            serde_json::from_str(r#"{ "type": "string", "nullable": true }"#).unwrap();
        assert!(schema.is_nullable());
    }

    #[test]
    fn test_additional_properties_forms() {
        let schema: Schema =
            serde_json::from_str(r#"{ "additionalProperties": true }"#).unwrap();
        assert_eq!(
            schema.additional_properties,
            Some(AdditionalProperties::Bool(true))
        );

        let schema: Schema =
            serde_json::from_str(r#"{ "additionalProperties": { "type": "integer" } }"#).unwrap();
        assert!(matches!(
            schema.additional_properties,
            Some(AdditionalProperties::Schema(RefOr::Item(_)))
        ));
    }

    #[test]
    fn test_enum_varnames_extension() {
        let schema: Schema = serde_json::from_str(
            r#"{ "type": "integer", "enum": [1, 2], "x-enum-varnames": ["Low", "High"] }"#,
        )
        .unwrap();
        assert_eq!(schema.enum_values.len(), 2);
        assert_eq!(schema.enum_varnames, vec!["Low", "High"]);
    }
}
