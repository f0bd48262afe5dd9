use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use log::debug;
use url::Url;

use crate::error::{ConfigError, GenerateError};
use crate::load::DocumentFormat;

const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// A user-supplied source reference, classified but not yet read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceReference {
    /// `http` or `https` URL.
    Remote(Url),
    /// `file:` URL.
    FileUrl(Url),
    Absolute(PathBuf),
    /// Needs a base directory before it can be read.
    Relative(PathBuf),
}

impl SourceReference {
    /// Classify a reference string. Only `http`, `https` and `file` URLs are
    /// treated as URLs; anything else (Windows drive letters included) is a path.
    pub fn classify(reference: &str) -> Self {
        if let Ok(url) = Url::parse(reference) {
            match url.scheme() {
                "http" | "https" => return SourceReference::Remote(url),
                "file" => return SourceReference::FileUrl(url),
                _ => {}
            }
        }
        let path = PathBuf::from(reference);
        if path.is_absolute() {
            SourceReference::Absolute(path)
        } else {
            SourceReference::Relative(path)
        }
    }
}

/// Bytes of a source document plus how to refer to it.
#[derive(Debug, Clone)]
pub struct ResolvedSource {
    pub bytes: Vec<u8>,
    /// URL or absolute path, for logs and error messages only.
    pub identity: String,
    pub format_hint: Option<DocumentFormat>,
}

/// Read the document behind `reference`. Relative paths are joined onto `cwd`,
/// or onto the process working directory when `cwd` is `None`.
pub fn resolve(reference: &str, cwd: Option<&Path>) -> Result<ResolvedSource, GenerateError> {
    match SourceReference::classify(reference) {
        SourceReference::Remote(url) => fetch(&url),
        SourceReference::FileUrl(url) => {
            let path = url
                .to_file_path()
                .map_err(|()| GenerateError::SourceNotFound {
                    path: PathBuf::from(reference),
                    source: std::io::Error::new(
                        std::io::ErrorKind::InvalidInput,
                        "file URL does not map to a local path",
                    ),
                })?;
            read_file(&path)
        }
        SourceReference::Absolute(path) => read_file(&path),
        SourceReference::Relative(path) => {
            let base = match cwd {
                Some(dir) => dir.to_path_buf(),
                None => std::env::current_dir()
                    .map_err(|e| GenerateError::Configuration(ConfigError::WorkingDirectory(e)))?,
            };
            read_file(&base.join(path))
        }
    }
}

fn read_file(path: &Path) -> Result<ResolvedSource, GenerateError> {
    debug!("reading source {}", path.display());
    let bytes = fs::read(path).map_err(|e| GenerateError::SourceNotFound {
        path: path.to_path_buf(),
        source: e,
    })?;
    Ok(ResolvedSource {
        bytes,
        identity: path.display().to_string(),
        format_hint: extension_hint(path),
    })
}

/// Single GET, no retries.
fn fetch(url: &Url) -> Result<ResolvedSource, GenerateError> {
    debug!("fetching source {url}");
    let unreachable = |reason: String| GenerateError::SourceUnreachable {
        url: url.to_string(),
        reason,
    };

    let client = reqwest::blocking::Client::builder()
        .timeout(FETCH_TIMEOUT)
        .build()
        .map_err(|e| unreachable(e.to_string()))?;
    let response = client
        .get(url.clone())
        .send()
        .map_err(|e| unreachable(e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        return Err(unreachable(format!("HTTP status {status}")));
    }

    let content_type_hint = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(content_type_hint);
    let bytes = response
        .bytes()
        .map_err(|e| unreachable(e.to_string()))?;

    Ok(ResolvedSource {
        bytes: bytes.to_vec(),
        identity: url.to_string(),
        format_hint: extension_hint(Path::new(url.path())).or(content_type_hint),
    })
}

fn extension_hint(path: &Path) -> Option<DocumentFormat> {
    path.extension()
        .and_then(|e| e.to_str())
        .and_then(DocumentFormat::from_extension)
}

fn content_type_hint(content_type: &str) -> Option<DocumentFormat> {
    let mime = content_type.split(';').next()?.trim();
    if mime.ends_with("json") {
        Some(DocumentFormat::Json)
    } else if mime.ends_with("yaml") || mime.ends_with("yml") {
        Some(DocumentFormat::Yaml)
    } else {
        None
    }
}
