//! Canonical in-memory form of an OpenAPI 3.x document.
//!
//! The model is deliberately lenient: it carries only what the plugins read,
//! ignores unknown fields, and defaults anything missing. A document that
//! parses is handed to the plugins as-is; no schema validation happens here.

mod lenient;
pub mod operation;
pub mod schema;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

pub use operation::{
    Header, MediaType, Operation, Parameter, ParameterLocation, PathItem, RequestBody, Response,
};
pub use schema::{AdditionalProperties, Schema, SchemaOrRef, SchemaType, TypeSet};

/// Either a `$ref` pointer or an inline value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RefOr<T> {
    Ref {
        #[serde(rename = "$ref")]
        ref_path: String,
    },
    Item(Box<T>),
}

impl<T> RefOr<T> {
    pub fn as_item(&self) -> Option<&T> {
        match self {
            RefOr::Item(item) => Some(item),
            RefOr::Ref { .. } => None,
        }
    }

    pub fn as_ref_path(&self) -> Option<&str> {
        match self {
            RefOr::Ref { ref_path } => Some(ref_path),
            RefOr::Item(_) => None,
        }
    }
}

/// API metadata.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Info {
    pub title: String,
    pub version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// A server URL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Server {
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Reusable definitions under `components`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Components {
    #[serde(
        deserialize_with = "lenient::schema_map",
        skip_serializing_if = "IndexMap::is_empty"
    )]
    pub schemas: IndexMap<String, SchemaOrRef>,

    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub responses: IndexMap<String, RefOr<Response>>,

    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub parameters: IndexMap<String, RefOr<Parameter>>,

    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub request_bodies: IndexMap<String, RefOr<RequestBody>>,

    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub headers: IndexMap<String, RefOr<Header>>,

    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub path_items: IndexMap<String, RefOr<PathItem>>,
}

/// Maximum number of `$ref` hops followed when looking through reference chains.
const MAX_REF_DEPTH: usize = 16;

impl Components {
    /// Follow a `#/components/parameters/...` reference to the inline parameter.
    pub fn parameter(&self, ref_path: &str) -> Option<&Parameter> {
        let mut current = ref_path;
        for _ in 0..MAX_REF_DEPTH {
            let name = current.strip_prefix("#/components/parameters/")?;
            match self.parameters.get(&unescape_pointer(name))? {
                RefOr::Item(parameter) => return Some(parameter),
                RefOr::Ref { ref_path } => current = ref_path,
            }
        }
        None
    }
}

/// Top-level OpenAPI document.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OpenApiDocument {
    pub openapi: String,

    pub info: Info,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub servers: Vec<Server>,

    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub paths: IndexMap<String, PathItem>,

    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub webhooks: IndexMap<String, PathItem>,

    pub components: Components,
}

/// Decode one JSON-pointer segment (`~1` is `/`, `~0` is `~`).
pub fn unescape_pointer(segment: &str) -> String {
    segment.replace("~1", "/").replace("~0", "~")
}
