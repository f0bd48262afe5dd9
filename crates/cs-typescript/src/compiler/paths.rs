use std::collections::HashSet;

use cs_core::document::{
    Components, Header, MediaType, OpenApiDocument, Operation, Parameter, ParameterLocation,
    PathItem, RefOr, RequestBody, Response,
};
use indexmap::IndexMap;
use log::warn;

use super::{description_doc, lookup};
use crate::syntax::{Member, ObjectLiteral, TsType, jsdoc, quote};
use crate::type_mapper::{TypeMapper, ref_to_ts};

const METHODS: [&str; 8] = [
    "get", "put", "post", "delete", "options", "head", "patch", "trace",
];

/// `paths` or `webhooks`: one entry per path item.
pub(super) fn path_map(
    mapper: &TypeMapper<'_>,
    paths: &IndexMap<String, PathItem>,
    components: &Components,
) -> TsType {
    let mut literal = ObjectLiteral::new();
    for (path, item) in paths {
        literal.push(Member::required(
            path.clone(),
            path_item_type(mapper, item, components),
        ));
    }
    if mapper.options().alphabetize {
        literal.sort();
    }
    literal.render()
}

pub(super) fn path_item_type(
    mapper: &TypeMapper<'_>,
    item: &PathItem,
    components: &Components,
) -> TsType {
    if let Some(ref_path) = &item.ref_path {
        return ref_to_ts(ref_path);
    }

    let mut literal = ObjectLiteral::new();
    literal.push(Member::required(
        "parameters",
        parameters_type(mapper, &item.parameters, &[], components),
    ));
    for method in METHODS {
        match method_operation(item, method) {
            Some(operation) => {
                let ty = match &operation.operation_id {
                    Some(id) => TsType::atom(format!("operations[{}]", quote(id))),
                    None => operation_type(mapper, &item.parameters, operation, components),
                };
                literal.push(Member::required(method, ty).doc(operation_doc(operation)));
            }
            None => literal.push(Member::optional(method, TsType::never())),
        }
    }
    literal.render()
}

/// The `operations` interface: every operation that has an `operationId`.
pub(super) fn operations(mapper: &TypeMapper<'_>, document: &OpenApiDocument) -> TsType {
    let mut seen = HashSet::new();
    let mut literal = ObjectLiteral::new();

    let items = document.paths.values().chain(document.webhooks.values());
    for item in items {
        for (method, operation) in item.operations() {
            let Some(id) = &operation.operation_id else {
                continue;
            };
            if !seen.insert(id.clone()) {
                warn!("duplicate operationId {id} on {method}, keeping the first");
                continue;
            }
            literal.push(
                Member::required(
                    id.clone(),
                    operation_type(mapper, &item.parameters, operation, &document.components),
                )
                .doc(operation_doc(operation)),
            );
        }
    }
    if mapper.options().alphabetize {
        literal.sort();
    }
    literal.render()
}

fn method_operation<'a>(item: &'a PathItem, method: &str) -> Option<&'a Operation> {
    match method {
        "get" => item.get.as_ref(),
        "put" => item.put.as_ref(),
        "post" => item.post.as_ref(),
        "delete" => item.delete.as_ref(),
        "options" => item.options.as_ref(),
        "head" => item.head.as_ref(),
        "patch" => item.patch.as_ref(),
        "trace" => item.trace.as_ref(),
        _ => None,
    }
}

fn operation_doc(operation: &Operation) -> Option<String> {
    let mut tags = Vec::new();
    if let Some(summary) = &operation.summary {
        tags.push(summary.clone());
    }
    if operation.deprecated {
        tags.push("@deprecated".to_string());
    }
    if let Some(description) = &operation.description {
        tags.push(format!("@description {description}"));
    }
    jsdoc(&tags)
}

fn operation_type(
    mapper: &TypeMapper<'_>,
    path_parameters: &[RefOr<Parameter>],
    operation: &Operation,
    components: &Components,
) -> TsType {
    let mut literal = ObjectLiteral::new();
    literal.push(Member::required(
        "parameters",
        parameters_type(mapper, path_parameters, &operation.parameters, components),
    ));

    match &operation.request_body {
        None => literal.push(Member::optional("requestBody", TsType::never())),
        Some(RefOr::Ref { ref_path }) => {
            let required = lookup(&components.request_bodies, "requestBodies", ref_path)
                .is_some_and(|body| body.required);
            let member = if required {
                Member::required("requestBody", ref_to_ts(ref_path))
            } else {
                Member::optional("requestBody", ref_to_ts(ref_path))
            };
            literal.push(member);
        }
        Some(RefOr::Item(body)) => {
            let ty = request_body_type(mapper, body);
            let member = if body.required {
                Member::required("requestBody", ty)
            } else {
                Member::optional("requestBody", ty)
            };
            literal.push(member.doc(description_doc(body.description.as_deref(), false)));
        }
    }

    let mut responses = ObjectLiteral::new();
    for (status, response) in &operation.responses {
        let member = match response {
            RefOr::Ref { ref_path } => Member::required(status.clone(), ref_to_ts(ref_path)),
            RefOr::Item(response) => Member::required(
                status.clone(),
                response_type(mapper, response, components),
            )
            .doc(description_doc(response.description.as_deref(), false)),
        };
        responses.push(member);
    }
    literal.push(Member::required("responses", responses.render()));

    literal.render()
}

/// `{ query; header; path; cookie }` for path-level parameters overridden by
/// operation-level ones with the same name and location.
fn parameters_type(
    mapper: &TypeMapper<'_>,
    path_parameters: &[RefOr<Parameter>],
    operation_parameters: &[RefOr<Parameter>],
    components: &Components,
) -> TsType {
    let mut effective: IndexMap<(ParameterLocation, String), (&RefOr<Parameter>, &Parameter)> =
        IndexMap::new();
    for entry in path_parameters.iter().chain(operation_parameters) {
        let resolved = match entry {
            RefOr::Item(parameter) => Some(&**parameter),
            RefOr::Ref { ref_path } => components.parameter(ref_path),
        };
        match resolved {
            Some(parameter) => {
                effective.insert(
                    (parameter.location, parameter.name.clone()),
                    (entry, parameter),
                );
            }
            None => warn!(
                "unresolved parameter reference {}",
                entry.as_ref_path().unwrap_or_default()
            ),
        }
    }

    let mut literal = ObjectLiteral::new();
    for location in ParameterLocation::ALL {
        let mut group = ObjectLiteral::new();
        let mut any_required = false;
        for ((_, name), (entry, parameter)) in &effective {
            if parameter.location != location {
                continue;
            }
            let required = parameter.required || location == ParameterLocation::Path;
            any_required |= required;

            let ty = match entry {
                RefOr::Ref { ref_path } => ref_to_ts(ref_path),
                RefOr::Item(_) => mapper.map_or_unknown(parameter.schema.as_ref()),
            };
            let doc = description_doc(parameter.description.as_deref(), parameter.deprecated);
            let member = if required {
                Member::required(name.clone(), ty)
            } else {
                Member::optional(name.clone(), ty)
            };
            group.push(member.doc(doc));
        }

        let key = location.as_str();
        if group.is_empty() {
            literal.push(Member::optional(key, TsType::never()));
        } else if any_required {
            literal.push(Member::required(key, group.render()));
        } else {
            literal.push(Member::optional(key, group.render()));
        }
    }
    literal.render()
}

pub(super) fn request_body_type(mapper: &TypeMapper<'_>, body: &RequestBody) -> TsType {
    let mut literal = ObjectLiteral::new();
    literal.push(Member::required(
        "content",
        content_type(mapper, &body.content),
    ));
    literal.render()
}

pub(super) fn response_type(
    mapper: &TypeMapper<'_>,
    response: &Response,
    components: &Components,
) -> TsType {
    let mut headers = ObjectLiteral::new();
    for (name, header) in &response.headers {
        headers.push(header_member(mapper, name, header, components));
    }
    headers.index_signature(TsType::unknown(), false);

    let mut literal = ObjectLiteral::new();
    literal.push(Member::required("headers", headers.render()));
    if response.content.is_empty() {
        literal.push(Member::optional("content", TsType::never()));
    } else {
        literal.push(Member::required(
            "content",
            content_type(mapper, &response.content),
        ));
    }
    literal.render()
}

fn header_member(
    mapper: &TypeMapper<'_>,
    name: &str,
    header: &RefOr<Header>,
    components: &Components,
) -> Member {
    match header {
        RefOr::Ref { ref_path } => {
            let required = lookup(&components.headers, "headers", ref_path)
                .is_some_and(|h| h.required);
            if required {
                Member::required(name, ref_to_ts(ref_path))
            } else {
                Member::optional(name, ref_to_ts(ref_path))
            }
        }
        RefOr::Item(header) => {
            let ty = mapper.map_or_unknown(header.schema.as_ref());
            let member = if header.required {
                Member::required(name, ty)
            } else {
                Member::optional(name, ty)
            };
            member.doc(description_doc(
                header.description.as_deref(),
                header.deprecated,
            ))
        }
    }
}

fn content_type(mapper: &TypeMapper<'_>, content: &IndexMap<String, MediaType>) -> TsType {
    let mut literal = ObjectLiteral::new();
    for (media_type, media) in content {
        literal.push(Member::required(
            media_type.clone(),
            mapper.map_or_unknown(media.schema.as_ref()),
        ));
    }
    literal.render_or(TsType::never())
}
