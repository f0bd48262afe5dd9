//! `openapi-fetch` client plugin.
//!
//! Emits `client.ts`, a typed `createApiClient` factory over the `paths`
//! interface of the types file produced earlier in the run.

use std::sync::Arc;

use cs_core::config::RunConfiguration;
use cs_core::document::OpenApiDocument;
use cs_core::{GeneratedFile, GenerationContext, Plugin, PluginError};
use log::debug;
use minijinja::{Environment, context};
use serde::Deserialize;

pub const PLUGIN_NAME: &str = "openapi-fetch";

pub const CLIENT_FILENAME: &str = "client.ts";

/// Options accepted under `plugins: [{ name: openapi-fetch, options: ... }]`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct OpenApiFetchOptions {
    /// Base URL baked into the client; defaults to the document's first server.
    pub base_url: Option<String>,
    /// Output filename; defaults to `client.ts`.
    pub filename: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct OpenApiFetchPlugin {
    options: OpenApiFetchOptions,
}

impl OpenApiFetchPlugin {
    pub fn new(options: OpenApiFetchOptions) -> Self {
        Self { options }
    }

    /// Registry factory: `null` options mean defaults.
    pub fn factory(options: &serde_json::Value) -> Result<Arc<dyn Plugin>, String> {
        let options = if options.is_null() {
            OpenApiFetchOptions::default()
        } else {
            OpenApiFetchOptions::deserialize(options).map_err(|e| e.to_string())?
        };
        Ok(Arc::new(Self::new(options)))
    }

    fn filename(&self) -> &str {
        self.options.filename.as_deref().unwrap_or(CLIENT_FILENAME)
    }
}

impl Plugin for OpenApiFetchPlugin {
    fn name(&self) -> &str {
        PLUGIN_NAME
    }

    fn generate(
        &self,
        document: &OpenApiDocument,
        _config: &RunConfiguration,
        context: &mut GenerationContext,
    ) -> Result<Vec<GeneratedFile>, PluginError> {
        let types_module = context.types_module.as_deref().ok_or_else(|| {
            PluginError::MissingPrerequisite("no types module was generated".to_string())
        })?;
        if !context.type_names.iter().any(|n| n == "paths") {
            return Err(PluginError::MissingPrerequisite(format!(
                "{types_module} does not export `paths`"
            )));
        }

        let base_url = self
            .options
            .base_url
            .clone()
            .or_else(|| document.servers.first().map(|s| s.url.clone()));
        debug!("client base URL: {base_url:?}");

        let code = emit_client(&import_path(types_module), base_url.as_deref())
            .map_err(|e| PluginError::Render(e.to_string()))?;
        Ok(vec![GeneratedFile::new(self.filename(), code)])
    }
}

/// Relative module specifier for a generated file: `types.ts` becomes `./types`.
fn import_path(filename: &str) -> String {
    let stem = filename.strip_suffix(".ts").unwrap_or(filename);
    format!("./{stem}")
}

fn emit_client(types_import: &str, base_url: Option<&str>) -> Result<String, minijinja::Error> {
    let mut env = Environment::new();
    env.set_trim_blocks(true);
    env.set_lstrip_blocks(true);
    env.set_keep_trailing_newline(true);
    env.add_template("client.ts.j2", include_str!("../templates/client.ts.j2"))?;
    let tmpl = env.get_template("client.ts.j2")?;

    let base_url = base_url.map(|url| serde_json::Value::String(url.to_string()).to_string());
    tmpl.render(context! {
        types_import => types_import,
        base_url => base_url,
    })
}
