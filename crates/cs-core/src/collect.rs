use indexmap::IndexMap;
use log::debug;

use crate::GeneratedFile;
use crate::error::GenerateError;

/// Accumulates plugin contributions keyed by filename, in first-contribution order.
#[derive(Debug, Default)]
pub struct OutputCollector {
    files: IndexMap<String, Contribution>,
}

#[derive(Debug)]
struct Contribution {
    plugin: String,
    file: GeneratedFile,
}

impl OutputCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one file. Re-contributing identical code under the same name is a
    /// no-op; different code under the same name is a conflict.
    pub fn insert(&mut self, plugin: &str, file: GeneratedFile) -> Result<(), GenerateError> {
        if let Some(existing) = self.files.get(&file.filename) {
            if existing.file.code == file.code {
                debug!(
                    "{} re-contributed {} with identical content",
                    plugin, file.filename
                );
                return Ok(());
            }
            return Err(GenerateError::DuplicateOutputFile {
                filename: file.filename,
                first_plugin: existing.plugin.clone(),
                second_plugin: plugin.to_string(),
            });
        }

        self.files.insert(
            file.filename.clone(),
            Contribution {
                plugin: plugin.to_string(),
                file,
            },
        );
        Ok(())
    }

    pub fn get(&self, filename: &str) -> Option<&GeneratedFile> {
        self.files.get(filename).map(|c| &c.file)
    }

    pub fn files(&self) -> impl Iterator<Item = &GeneratedFile> {
        self.files.values().map(|c| &c.file)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn into_files(self) -> Vec<GeneratedFile> {
        self.files.into_values().map(|c| c.file).collect()
    }

    pub fn into_map(self) -> IndexMap<String, GeneratedFile> {
        self.files
            .into_iter()
            .map(|(name, c)| (name, c.file))
            .collect()
    }
}

/// Merge ordered `(plugin, files)` contributions into one map keyed by filename.
pub fn collect<I>(contributions: I) -> Result<IndexMap<String, GeneratedFile>, GenerateError>
where
    I: IntoIterator<Item = (String, Vec<GeneratedFile>)>,
{
    let mut collector = OutputCollector::new();
    for (plugin, files) in contributions {
        for file in files {
            collector.insert(&plugin, file)?;
        }
    }
    Ok(collector.into_map())
}
