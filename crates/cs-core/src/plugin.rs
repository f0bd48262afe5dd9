use thiserror::Error;

use crate::GeneratedFile;
use crate::collect::OutputCollector;
use crate::config::RunConfiguration;
use crate::document::OpenApiDocument;
use crate::error::GenerateError;

#[derive(Debug, Error)]
pub enum PluginError {
    #[error("template render failed: {0}")]
    Render(String),

    #[error("missing prerequisite: {0}")]
    MissingPrerequisite(String),

    #[error("{0}")]
    Other(String),
}

/// A unit of generation logic contributing named files for one run.
///
/// Plugins are built by typed factory functions and invoked one at a time,
/// in configuration order, against the same [`GenerationContext`].
pub trait Plugin: Send + Sync {
    /// Stable identity, used in logs and to attribute failures.
    fn name(&self) -> &str;

    fn generate(
        &self,
        document: &OpenApiDocument,
        config: &RunConfiguration,
        context: &mut GenerationContext,
    ) -> Result<Vec<GeneratedFile>, PluginError>;
}

/// Links a generated enum identifier to the raw `components.schemas` key it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumRecord {
    pub identifier: String,
    pub schema_key: String,
}

/// Facts shared across the plugins of a single run.
///
/// The base type plugin writes `enum_mode`, `types_module`, `type_names` and
/// `enum_records`; later plugins read them. Files produced so far are
/// readable through [`GenerationContext::file`] but only the pipeline adds
/// to them, so no plugin can rewrite another plugin's output.
#[derive(Debug, Default)]
pub struct GenerationContext {
    /// Whether enum declarations were emitted.
    pub enum_mode: bool,
    /// Filename of the type-declaration file.
    pub types_module: Option<String>,
    /// Names exported by the type-declaration file, in emission order.
    pub type_names: Vec<String>,
    pub enum_records: Vec<EnumRecord>,
    outputs: OutputCollector,
}

impl GenerationContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// A file contributed by an earlier plugin.
    pub fn file(&self, filename: &str) -> Option<&GeneratedFile> {
        self.outputs.get(filename)
    }

    /// Every file contributed so far, in contribution order.
    pub fn files(&self) -> impl Iterator<Item = &GeneratedFile> {
        self.outputs.files()
    }

    pub(crate) fn record(
        &mut self,
        plugin: &str,
        files: Vec<GeneratedFile>,
    ) -> Result<(), GenerateError> {
        for file in files {
            self.outputs.insert(plugin, file)?;
        }
        Ok(())
    }

    pub(crate) fn into_files(self) -> Vec<GeneratedFile> {
        self.outputs.into_files()
    }
}
