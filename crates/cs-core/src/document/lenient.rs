//! Field deserializers that fall back instead of failing the whole document.
//!
//! Values are buffered as `serde_yaml_ng::Value`, which keeps mapping order.

use indexmap::IndexMap;
use log::debug;
use serde::de::{DeserializeOwned, Deserializer};
use serde::Deserialize;
use serde_yaml_ng::Value;

use super::RefOr;
use super::schema::SchemaOrRef;

/// Keep the value only when it has the expected shape, otherwise use the default.
pub(crate) fn or_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = Value::deserialize(deserializer)?;
    Ok(T::deserialize(value).unwrap_or_else(|err| {
        debug!("ignoring malformed schema keyword: {err}");
        T::default()
    }))
}

/// An unusable schema reads as an empty one, which places no constraint.
pub(crate) fn schema(value: Value) -> SchemaOrRef {
    SchemaOrRef::deserialize(value).unwrap_or_else(|err| {
        debug!("ignoring malformed schema: {err}");
        RefOr::Item(Box::default())
    })
}

pub(crate) fn schema_option<'de, D>(deserializer: D) -> Result<Option<SchemaOrRef>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Value>::deserialize(deserializer)?.map(schema))
}

pub(crate) fn schema_list<'de, D>(deserializer: D) -> Result<Vec<SchemaOrRef>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Sequence(items) => Ok(items.into_iter().map(schema).collect()),
        _ => Ok(Vec::new()),
    }
}

pub(crate) fn schema_map<'de, D>(
    deserializer: D,
) -> Result<IndexMap<String, SchemaOrRef>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Mapping(entries) => Ok(entries
            .into_iter()
            .filter_map(|(key, value)| map_key(key).map(|key| (key, schema(value))))
            .collect()),
        _ => Ok(IndexMap::new()),
    }
}

/// YAML allows non-string keys; scalars are read by their text.
fn map_key(key: Value) -> Option<String> {
    match key {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
