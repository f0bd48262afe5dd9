use std::path::PathBuf;

use thiserror::Error;

use crate::load::DocumentFormat;
use crate::plugin::PluginError;

/// Failure while parsing the bytes of a source document.
#[derive(Debug, Error)]
#[error("invalid {format} document{}: {message}", offset_suffix(.offset))]
pub struct DocumentParseError {
    pub format: DocumentFormat,
    pub message: String,
    /// Byte offset of the failure, when the parser reports one.
    pub offset: Option<usize>,
}

fn offset_suffix(offset: &Option<usize>) -> String {
    offset.map(|o| format!(" at byte {o}")).unwrap_or_default()
}

/// Problems with the project configuration or the invocation parameters.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {path}: {message}")]
    Malformed { path: PathBuf, message: String },

    #[error("unknown plugin `{0}`")]
    UnknownPlugin(String),

    #[error("invalid options for plugin `{plugin}`: {message}")]
    InvalidPluginOptions { plugin: String, message: String },

    #[error("no source given: pass one on the command line or set `input` in the config file")]
    MissingSource,

    #[error("cannot determine the working directory: {0}")]
    WorkingDirectory(#[source] std::io::Error),
}

/// Every way a generation run can fail. A run stops at the first one.
#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("source not found: {path}: {source}")]
    SourceNotFound {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("source unreachable: {url}: {reason}")]
    SourceUnreachable { url: String, reason: String },

    #[error("failed to parse {identity}: {source}")]
    DocumentParse {
        identity: String,
        #[source]
        source: DocumentParseError,
    },

    #[error("plugin `{plugin}` failed: {source}")]
    PluginExecution {
        plugin: String,
        #[source]
        source: PluginError,
    },

    #[error(
        "duplicate output file `{filename}`: contributed by `{first_plugin}` and `{second_plugin}` with different content"
    )]
    DuplicateOutputFile {
        filename: String,
        first_plugin: String,
        second_plugin: String,
    },

    #[error("configuration error: {0}")]
    Configuration(#[from] ConfigError),
}

impl GenerateError {
    /// Name of the pipeline stage that produced this error.
    pub fn stage(&self) -> &'static str {
        match self {
            GenerateError::SourceNotFound { .. } | GenerateError::SourceUnreachable { .. } => {
                "source"
            }
            GenerateError::DocumentParse { .. } => "load",
            GenerateError::PluginExecution { .. } => "plugin",
            GenerateError::DuplicateOutputFile { .. } => "collect",
            GenerateError::Configuration(_) => "config",
        }
    }
}
