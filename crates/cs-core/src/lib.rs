pub mod collect;
pub mod config;
pub mod document;
pub mod error;
pub mod load;
pub mod naming;
pub mod pipeline;
pub mod plugin;
pub mod source;

pub use error::GenerateError;
pub use plugin::{EnumRecord, GenerationContext, Plugin, PluginError};

/// A generated file: its name relative to the output directory and its source text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedFile {
    pub filename: String,
    pub code: String,
}

impl GeneratedFile {
    pub fn new(filename: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            code: code.into(),
        }
    }
}
