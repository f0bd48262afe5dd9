use std::fmt;

use log::debug;

use crate::document::OpenApiDocument;
use crate::error::{DocumentParseError, GenerateError};
use crate::source::ResolvedSource;

/// Serialization format of a source document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Json,
    Yaml,
}

impl DocumentFormat {
    /// Guess the format from a file extension (without the dot).
    pub fn from_extension(extension: &str) -> Option<Self> {
        match extension.to_ascii_lowercase().as_str() {
            "json" => Some(DocumentFormat::Json),
            "yaml" | "yml" => Some(DocumentFormat::Yaml),
            _ => None,
        }
    }

    /// Guess the format from the content: JSON documents open with `{` or `[`.
    pub fn sniff(text: &str) -> Self {
        match text.trim_start_matches('\u{feff}').trim_start().chars().next() {
            Some('{') | Some('[') => DocumentFormat::Json,
            _ => DocumentFormat::Yaml,
        }
    }
}

impl fmt::Display for DocumentFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocumentFormat::Json => write!(f, "JSON"),
            DocumentFormat::Yaml => write!(f, "YAML"),
        }
    }
}

/// Parse raw document bytes. Without a hint the format is sniffed from the content.
pub fn parse(
    bytes: &[u8],
    hint: Option<DocumentFormat>,
) -> Result<OpenApiDocument, DocumentParseError> {
    let text = std::str::from_utf8(bytes).map_err(|e| DocumentParseError {
        format: hint.unwrap_or(DocumentFormat::Yaml),
        message: format!("document is not valid UTF-8: {e}"),
        offset: Some(e.valid_up_to()),
    })?;
    let text = text.trim_start_matches('\u{feff}');

    let format = hint.unwrap_or_else(|| DocumentFormat::sniff(text));
    debug!("parsing document as {format}");

    match format {
        DocumentFormat::Json => serde_json::from_str(text).map_err(|e| DocumentParseError {
            format,
            message: e.to_string(),
            offset: byte_offset(text, e.line(), e.column()),
        }),
        DocumentFormat::Yaml => serde_yaml_ng::from_str(text).map_err(|e| DocumentParseError {
            format,
            offset: e.location().map(|loc| loc.index()),
            message: e.to_string(),
        }),
    }
}

/// Parse a resolved source, tagging failures with the source identity.
pub fn load(source: &ResolvedSource) -> Result<OpenApiDocument, GenerateError> {
    parse(&source.bytes, source.format_hint).map_err(|e| GenerateError::DocumentParse {
        identity: source.identity.clone(),
        source: e,
    })
}

/// Convert a 1-based line/column pair to a byte offset. `serde_json` reports
/// line 0 for errors that have no position.
fn byte_offset(text: &str, line: usize, column: usize) -> Option<usize> {
    if line == 0 {
        return None;
    }
    let line_start: usize = text
        .split_inclusive('\n')
        .take(line - 1)
        .map(str::len)
        .sum();
    Some((line_start + column.saturating_sub(1)).min(text.len()))
}
