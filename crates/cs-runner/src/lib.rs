//! Runs a whole generation: configuration, source, document, plugins, files.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use cs_core::config::{self, Invocation, PluginRegistry, RunConfiguration};
use cs_core::{GenerateError, GeneratedFile, load, pipeline, source};
use cs_openapi_fetch::OpenApiFetchPlugin;
use cs_typescript::OpenApiTypeScriptPlugin;
use log::{debug, info};
use tempfile::NamedTempFile;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WriteError {
    #[error("failed to create directory {path}: {source}")]
    CreateDir { path: PathBuf, source: io::Error },

    #[error("failed to write {path}: {source}")]
    Write { path: PathBuf, source: io::Error },

    #[error("invalid output filename `{0}`")]
    InvalidFilename(String),
}

/// Every plugin that can be named in a config file.
pub fn default_registry() -> PluginRegistry {
    let mut registry = PluginRegistry::new();
    registry.register(cs_openapi_fetch::PLUGIN_NAME, OpenApiFetchPlugin::factory);
    registry
}

/// Resolve the run configuration for an invocation against the default registry.
pub fn resolve(invocation: &Invocation) -> Result<RunConfiguration, GenerateError> {
    config::resolve(invocation, &default_registry())
}

/// Resolve configuration, then generate. Nothing is written.
pub fn generate(invocation: &Invocation) -> Result<Vec<GeneratedFile>, GenerateError> {
    generate_with(&resolve(invocation)?)
}

/// Generate the file set for an already-resolved configuration.
pub fn generate_with(config: &RunConfiguration) -> Result<Vec<GeneratedFile>, GenerateError> {
    let source = source::resolve(&config.source, Some(&config.cwd))?;
    info!("generating from {}", source.identity);

    let document = load::load(&source)?;
    debug!(
        "loaded {} path(s), {} schema(s)",
        document.paths.len(),
        document.components.schemas.len()
    );

    pipeline::run(&document, config, &OpenApiTypeScriptPlugin)
}

/// Write a collected file set under `outdir`.
///
/// Every file is first staged in a temporary file beside its destination;
/// destinations are only replaced once all files are staged.
pub fn write_files(outdir: &Path, files: &[GeneratedFile]) -> Result<Vec<PathBuf>, WriteError> {
    let mut staged = Vec::with_capacity(files.len());
    for file in files {
        let path = output_path(outdir, &file.filename)?;
        let parent = path.parent().unwrap_or(outdir);
        fs::create_dir_all(parent).map_err(|e| WriteError::CreateDir {
            path: parent.to_path_buf(),
            source: e,
        })?;

        let write_error = |source: io::Error| WriteError::Write {
            path: path.clone(),
            source,
        };
        let mut temp = NamedTempFile::new_in(parent).map_err(write_error)?;
        temp.write_all(file.code.as_bytes()).map_err(write_error)?;
        staged.push((temp, path));
    }

    let mut written = Vec::with_capacity(staged.len());
    for (temp, path) in staged {
        temp.persist(&path).map_err(|e| WriteError::Write {
            path: path.clone(),
            source: e.error,
        })?;
        debug!("wrote {}", path.display());
        written.push(path);
    }
    Ok(written)
}

/// Filenames are relative to the output directory and may not climb out of it.
fn output_path(outdir: &Path, filename: &str) -> Result<PathBuf, WriteError> {
    let relative = Path::new(filename);
    let escapes = relative.is_absolute()
        || relative
            .components()
            .any(|c| !matches!(c, std::path::Component::Normal(_)));
    if filename.is_empty() || escapes {
        return Err(WriteError::InvalidFilename(filename.to_string()));
    }
    Ok(outdir.join(relative))
}
