use std::collections::HashSet;

use cs_core::config::{CompilerOptions, RunConfiguration};
use cs_core::document::OpenApiDocument;
use cs_core::naming::normalize_name;
use cs_core::{EnumRecord, GeneratedFile, GenerationContext, Plugin, PluginError};
use log::{debug, warn};
use minijinja::{Environment, context};

use crate::compiler::{ROOT_NAMES, compile};
use crate::declarations::{Declaration, EnumDeclaration};
use crate::enums::collect_enums;
use crate::reconcile::reconcile_declarations;

pub const PLUGIN_NAME: &str = "openapi-typescript";

/// Name of the type-declaration file.
pub const TYPES_FILENAME: &str = "types.ts";

/// The base type-generation plugin. It always runs first and publishes what
/// it emitted through the [`GenerationContext`].
#[derive(Debug, Default, Clone, Copy)]
pub struct OpenApiTypeScriptPlugin;

impl Plugin for OpenApiTypeScriptPlugin {
    fn name(&self) -> &str {
        PLUGIN_NAME
    }

    fn generate(
        &self,
        document: &OpenApiDocument,
        config: &RunConfiguration,
        context: &mut GenerationContext,
    ) -> Result<Vec<GeneratedFile>, PluginError> {
        let options = &config.compiler;

        let enums = if options.enums {
            claim_enums(document, options)
        } else {
            Vec::new()
        };
        let records: Vec<EnumRecord> = enums
            .iter()
            .map(|e| EnumRecord {
                identifier: e.name.clone(),
                schema_key: e.schema_key.clone(),
            })
            .collect();
        debug!("emitting {} enum(s)", records.len());

        let mut declarations = compile(document, options, &records);
        declarations.extend(enums.into_iter().map(Declaration::Enum));
        reconcile_declarations(&mut declarations, &records);
        let declarations = drop_shadowed(declarations);

        let code = render_types(&declarations).map_err(|e| PluginError::Render(e.to_string()))?;

        context.enum_mode = options.enums;
        context.types_module = Some(TYPES_FILENAME.to_string());
        context.type_names = declarations.iter().map(|d| d.name().to_string()).collect();
        context.enum_records = records;

        Ok(vec![GeneratedFile::new(TYPES_FILENAME, code)])
    }
}

/// Enum declarations whose names no compiled declaration already exports.
///
/// Aliases of schemas that become enums are reconciled away, so only the
/// roots and the aliases of other schemas are reserved.
fn claim_enums(document: &OpenApiDocument, options: &CompilerOptions) -> Vec<EnumDeclaration> {
    let enums = collect_enums(document);

    let mut taken: HashSet<String> = ROOT_NAMES.iter().map(|name| name.to_string()).collect();
    if options.root_types {
        let enum_keys: HashSet<&str> = enums.iter().map(|e| e.schema_key.as_str()).collect();
        let aliases: Vec<String> = document
            .components
            .schemas
            .keys()
            .filter(|key| !enum_keys.contains(key.as_str()))
            .map(|key| normalize_name(key).pascal_case)
            .collect();
        taken.extend(aliases);
    }

    enums
        .into_iter()
        .filter(|e| {
            let fresh = taken.insert(e.name.clone());
            if !fresh {
                warn!(
                    "not emitting enum {} for schema {}, the name is already exported",
                    e.name, e.schema_key
                );
            }
            fresh
        })
        .collect()
}

/// Keep the first declaration of every exported name.
fn drop_shadowed(declarations: Vec<Declaration>) -> Vec<Declaration> {
    let mut taken = HashSet::new();
    declarations
        .into_iter()
        .filter(|declaration| {
            let fresh = taken.insert(declaration.name().to_string());
            if !fresh {
                warn!(
                    "dropping a second declaration named {}, the name is already exported",
                    declaration.name()
                );
            }
            fresh
        })
        .collect()
}

/// Render declarations as the text of the types file.
pub fn render_types(declarations: &[Declaration]) -> Result<String, minijinja::Error> {
    let mut env = Environment::new();
    env.set_trim_blocks(true);
    env.set_lstrip_blocks(true);
    env.add_template("types.ts.j2", include_str!("../templates/types.ts.j2"))?;
    let tmpl = env.get_template("types.ts.j2")?;

    let declarations: Vec<minijinja::Value> = declarations.iter().map(declaration_ctx).collect();
    tmpl.render(context! { declarations => declarations })
}

fn declaration_ctx(declaration: &Declaration) -> minijinja::Value {
    match declaration {
        Declaration::Interface { name, body } => context! {
            kind => "interface",
            name => name,
            body => body,
        },
        Declaration::TypeAlias { name, target } => context! {
            kind => "alias",
            name => name,
            target => target.render(),
        },
        Declaration::Enum(e) => {
            let members: Vec<minijinja::Value> = e
                .members
                .iter()
                .map(|m| context! { name => m.name, value => m.value })
                .collect();
            context! {
                kind => "enum",
                name => e.name,
                doc => e.doc,
                members => members,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::declarations::{AliasTarget, EnumDeclaration, EnumMember};

    #[test]
    fn test_render_layout() {
        let declarations = vec![
            Declaration::Interface {
                name: "paths".to_string(),
                body: "{\n    \"/a\": string;\n}".to_string(),
            },
            Declaration::TypeAlias {
                name: "Task".to_string(),
                target: AliasTarget::Schema("Task".to_string()),
            },
            Declaration::Enum(EnumDeclaration {
                name: "Status".to_string(),
                schema_key: "Status".to_string(),
                doc: Some("/** @description State */".to_string()),
                members: vec![
                    EnumMember {
                        name: "Active".to_string(),
                        value: "\"active\"".to_string(),
                    },
                    EnumMember {
                        name: "Inactive".to_string(),
                        value: "\"inactive\"".to_string(),
                    },
                ],
            }),
        ];

        let text = render_types(&declarations).unwrap();
        assert_eq!(
            text,
            "/**\n * This file was auto-generated by create-schemas.\n * Do not make direct changes to the file.\n */\n\n\
export interface paths {\n    \"/a\": string;\n}\n\
export type Task = components[\"schemas\"][\"Task\"];\n\
/** @description State */\n\
export enum Status {\n    Active = \"active\",\n    Inactive = \"inactive\",\n}\n"
        );
    }

    #[test]
    fn test_drop_shadowed_keeps_first() {
        let declarations = drop_shadowed(vec![
            Declaration::TypeAlias {
                name: "Pet".to_string(),
                target: AliasTarget::Schema("Pet".to_string()),
            },
            Declaration::TypeAlias {
                name: "Pet".to_string(),
                target: AliasTarget::Schema("pet".to_string()),
            },
        ]);
        assert_eq!(declarations.len(), 1);
        assert_eq!(declarations[0].aliased_schema(), Some("Pet"));
    }
}
