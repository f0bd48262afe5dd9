//! Compiles an OpenAPI document into the declarations of the types file.
//!
//! The layout follows what `openapi-typescript` emits: `paths`, `webhooks`,
//! `components`, `$defs`, one alias per component schema, then `operations`.
//! Component schemas that became enums are entered as the enum identifier.

mod paths;

use cs_core::EnumRecord;
use cs_core::config::CompilerOptions;
use cs_core::document::{Components, OpenApiDocument, RefOr, SchemaOrRef, unescape_pointer};
use cs_core::naming::normalize_name;
use indexmap::IndexMap;

use crate::declarations::{AliasTarget, Declaration};
use crate::syntax::{Member, ObjectLiteral, TsType, jsdoc};
use crate::type_mapper::{TypeMapper, ref_to_ts};

const MAX_REF_DEPTH: usize = 16;

/// Root names the compiler always declares.
pub const ROOT_NAMES: [&str; 5] = ["paths", "webhooks", "components", "$defs", "operations"];

pub fn compile(
    document: &OpenApiDocument,
    options: &CompilerOptions,
    enums: &[EnumRecord],
) -> Vec<Declaration> {
    let mapper = TypeMapper::new(options);
    let components = &document.components;

    let mut declarations = vec![
        root("paths", paths::path_map(&mapper, &document.paths, components)),
        root(
            "webhooks",
            paths::path_map(&mapper, &document.webhooks, components),
        ),
        root("components", render_components(&mapper, components, enums)),
        Declaration::TypeAlias {
            name: "$defs".to_string(),
            target: AliasTarget::Type("Record<string, never>".to_string()),
        },
    ];

    if options.root_types {
        declarations.extend(components.schemas.keys().map(|key| Declaration::TypeAlias {
            name: normalize_name(key).pascal_case,
            target: AliasTarget::Schema(key.clone()),
        }));
    }

    declarations.push(root("operations", paths::operations(&mapper, document)));
    declarations
}

/// Object types become interfaces; anything else (an empty map) a type alias.
fn root(name: &str, ty: TsType) -> Declaration {
    if ty.as_str().starts_with('{') {
        Declaration::Interface {
            name: name.to_string(),
            body: ty.into_string(),
        }
    } else {
        Declaration::TypeAlias {
            name: name.to_string(),
            target: AliasTarget::Type(ty.into_string()),
        }
    }
}

fn render_components(
    mapper: &TypeMapper<'_>,
    components: &Components,
    enums: &[EnumRecord],
) -> TsType {
    let mut literal = ObjectLiteral::new();

    let mut schemas = ObjectLiteral::new();
    for (key, schema) in &components.schemas {
        let ty = match enums.iter().find(|record| &record.schema_key == key) {
            Some(record) => enum_reference(&record.identifier, schema),
            None => mapper.map(schema),
        };
        schemas.push(Member::required(key.clone(), ty).doc(mapper.doc(schema)));
    }
    if mapper.options().alphabetize {
        schemas.sort();
    }
    literal.push(Member::required("schemas", schemas.render_or(TsType::never())));
    literal.push(Member::required(
        "responses",
        entries(mapper, &components.responses, |response| match response {
            RefOr::Ref { ref_path } => (ref_to_ts(ref_path), None),
            RefOr::Item(response) => (
                paths::response_type(mapper, response, components),
                description_doc(response.description.as_deref(), false),
            ),
        }),
    ));
    literal.push(Member::required(
        "parameters",
        entries(mapper, &components.parameters, |parameter| match parameter {
            RefOr::Ref { ref_path } => (ref_to_ts(ref_path), None),
            RefOr::Item(parameter) => (
                mapper.map_or_unknown(parameter.schema.as_ref()),
                description_doc(parameter.description.as_deref(), parameter.deprecated),
            ),
        }),
    ));
    literal.push(Member::required(
        "requestBodies",
        entries(mapper, &components.request_bodies, |body| match body {
            RefOr::Ref { ref_path } => (ref_to_ts(ref_path), None),
            RefOr::Item(body) => (
                paths::request_body_type(mapper, body),
                description_doc(body.description.as_deref(), false),
            ),
        }),
    ));
    literal.push(Member::required(
        "headers",
        entries(mapper, &components.headers, |header| match header {
            RefOr::Ref { ref_path } => (ref_to_ts(ref_path), None),
            RefOr::Item(header) => (
                mapper.map_or_unknown(header.schema.as_ref()),
                description_doc(header.description.as_deref(), header.deprecated),
            ),
        }),
    ));
    literal.push(Member::required(
        "pathItems",
        entries(mapper, &components.path_items, |item| match item {
            RefOr::Ref { ref_path } => (ref_to_ts(ref_path), None),
            RefOr::Item(item) => (paths::path_item_type(mapper, item, components), None),
        }),
    ));

    literal.render()
}

fn enum_reference(identifier: &str, schema: &SchemaOrRef) -> TsType {
    let ty = TsType::atom(identifier);
    match schema.as_item() {
        Some(schema) if schema.is_nullable() => TsType::union(vec![ty, TsType::atom("null")]),
        _ => ty,
    }
}

/// One component kind as an object type; `never` when the kind is empty.
fn entries<T>(
    mapper: &TypeMapper<'_>,
    map: &IndexMap<String, T>,
    render: impl Fn(&T) -> (TsType, Option<String>),
) -> TsType {
    let mut literal = ObjectLiteral::new();
    for (key, value) in map {
        let (ty, doc) = render(value);
        literal.push(Member::required(key.clone(), ty).doc(doc));
    }
    if mapper.options().alphabetize {
        literal.sort();
    }
    literal.render_or(TsType::never())
}

fn description_doc(description: Option<&str>, deprecated: bool) -> Option<String> {
    let mut tags = Vec::new();
    if deprecated {
        tags.push("@deprecated".to_string());
    }
    if let Some(description) = description {
        tags.push(format!("@description {description}"));
    }
    jsdoc(&tags)
}

/// Follow `#/components/<kind>/<name>` references within one component kind.
fn lookup<'a, T>(map: &'a IndexMap<String, RefOr<T>>, kind: &str, ref_path: &str) -> Option<&'a T> {
    let prefix = format!("#/components/{kind}/");
    let mut current = ref_path;
    for _ in 0..MAX_REF_DEPTH {
        let name = current.strip_prefix(&prefix)?;
        match map.get(&unescape_pointer(name))? {
            RefOr::Item(item) => return Some(item),
            RefOr::Ref { ref_path } => current = ref_path,
        }
    }
    None
}
