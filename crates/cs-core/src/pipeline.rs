use log::{debug, info};

use crate::GeneratedFile;
use crate::config::RunConfiguration;
use crate::document::OpenApiDocument;
use crate::error::GenerateError;
use crate::plugin::{GenerationContext, Plugin};

/// Run `base` and then every configured plugin, in order, against one shared context.
///
/// Files are collected as each plugin returns, so a filename conflict stops
/// the run at the plugin that caused it. The result preserves the order in
/// which files were first contributed.
pub fn run(
    document: &OpenApiDocument,
    config: &RunConfiguration,
    base: &dyn Plugin,
) -> Result<Vec<GeneratedFile>, GenerateError> {
    let mut context = GenerationContext::new();

    run_plugin(base, document, config, &mut context)?;
    for plugin in &config.plugins {
        run_plugin(plugin.as_ref(), document, config, &mut context)?;
    }

    let files = context.into_files();
    info!("generated {} file(s)", files.len());
    Ok(files)
}

fn run_plugin(
    plugin: &dyn Plugin,
    document: &OpenApiDocument,
    config: &RunConfiguration,
    context: &mut GenerationContext,
) -> Result<(), GenerateError> {
    debug!("running plugin {}", plugin.name());
    let files = plugin
        .generate(document, config, context)
        .map_err(|source| GenerateError::PluginExecution {
            plugin: plugin.name().to_string(),
            source,
        })?;
    debug!("plugin {} contributed {} file(s)", plugin.name(), files.len());
    context.record(plugin.name(), files)
}
