use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use indexmap::IndexMap;
use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, GenerateError};
use crate::plugin::Plugin;

/// Config file names looked up in the project directory, in order.
pub const CONFIG_FILE_NAMES: [&str; 3] = [
    "create-schemas.config.yaml",
    "create-schemas.config.yml",
    "create-schemas.config.json",
];

/// Output directory used when neither the invocation nor the config names one.
pub const DEFAULT_OUTDIR: &str = "openapi-types";

/// Options for the type-declaration compiler (`openApiTsOptions`).
///
/// Keys this crate does not interpret are kept in `passthrough` so they reach
/// the compiler untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CompilerOptions {
    /// Emit `export enum` declarations for enum schemas.
    #[serde(rename = "enum")]
    pub enums: bool,
    /// Emit `export type <Name> = components["schemas"]["<key>"]` aliases.
    pub root_types: bool,
    /// Sort object keys alphabetically.
    pub alphabetize: bool,
    /// Mark every generated property `readonly`.
    pub immutable: bool,
    /// Allow unknown keys on every object type.
    pub additional_properties: bool,
    #[serde(flatten)]
    pub passthrough: IndexMap<String, serde_json::Value>,
}

impl Default for CompilerOptions {
    fn default() -> Self {
        Self {
            enums: false,
            root_types: true,
            alphabetize: false,
            immutable: false,
            additional_properties: false,
            passthrough: IndexMap::new(),
        }
    }
}

static NO_OPTIONS: serde_json::Value = serde_json::Value::Null;

/// A `plugins` entry: a bare name, or a name with plugin-specific options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PluginEntry {
    Name(String),
    Detailed {
        name: String,
        #[serde(default)]
        options: serde_json::Value,
    },
}

impl PluginEntry {
    pub fn name(&self) -> &str {
        match self {
            PluginEntry::Name(name) | PluginEntry::Detailed { name, .. } => name,
        }
    }

    /// Plugin options; `null` for bare names.
    pub fn options(&self) -> &serde_json::Value {
        match self {
            PluginEntry::Name(_) => &NO_OPTIONS,
            PluginEntry::Detailed { options, .. } => options,
        }
    }
}

/// Project configuration as written in `create-schemas.config.*`.
///
/// Every key replaces its default wholesale; nothing is deep-merged.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct ProjectConfig {
    /// Source reference used when the invocation does not give one.
    pub input: Option<String>,
    pub open_api_ts_options: Option<CompilerOptions>,
    pub plugins: Option<Vec<PluginEntry>>,
    pub outdir: Option<PathBuf>,
    pub cwd: Option<PathBuf>,
}

/// Builds a plugin from its config options.
pub type PluginFactory = fn(&serde_json::Value) -> Result<Arc<dyn Plugin>, String>;

/// Maps plugin names to typed factory functions.
#[derive(Debug, Clone, Default)]
pub struct PluginRegistry {
    factories: IndexMap<String, PluginFactory>,
}

impl PluginRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, name: impl Into<String>, factory: PluginFactory) -> &mut Self {
        self.factories.insert(name.into(), factory);
        self
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.factories.keys().map(String::as_str)
    }

    pub fn build(&self, entry: &PluginEntry) -> Result<Arc<dyn Plugin>, ConfigError> {
        let factory = self
            .factories
            .get(entry.name())
            .ok_or_else(|| ConfigError::UnknownPlugin(entry.name().to_string()))?;
        factory(entry.options()).map_err(|message| ConfigError::InvalidPluginOptions {
            plugin: entry.name().to_string(),
            message,
        })
    }
}

/// Parameters supplied by whoever launches a run (CLI flags, tests).
#[derive(Debug, Clone, Default)]
pub struct Invocation {
    pub source: Option<String>,
    pub outdir: Option<PathBuf>,
    pub cwd: Option<PathBuf>,
}

/// Fully merged settings for one generation run. Built once, then only shared.
#[derive(Clone)]
pub struct RunConfiguration {
    pub source: String,
    pub compiler: CompilerOptions,
    /// Plugins run after the base type plugin, in this order.
    pub plugins: Vec<Arc<dyn Plugin>>,
    pub outdir: PathBuf,
    /// Base directory for relative sources.
    pub cwd: PathBuf,
}

impl RunConfiguration {
    /// Defaults for `source`: compiler defaults, no extra plugins.
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            compiler: CompilerOptions::default(),
            plugins: Vec::new(),
            outdir: PathBuf::from(DEFAULT_OUTDIR),
            cwd: PathBuf::from("."),
        }
    }
}

impl fmt::Debug for RunConfiguration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let plugins: Vec<&str> = self.plugins.iter().map(|p| p.name()).collect();
        f.debug_struct("RunConfiguration")
            .field("source", &self.source)
            .field("compiler", &self.compiler)
            .field("plugins", &plugins)
            .field("outdir", &self.outdir)
            .field("cwd", &self.cwd)
            .finish()
    }
}

/// First config file present in `dir`, if any.
pub fn find_config_file(dir: &Path) -> Option<PathBuf> {
    CONFIG_FILE_NAMES
        .iter()
        .map(|name| dir.join(name))
        .find(|path| path.is_file())
}

/// Load a config file. Returns `None` if the file doesn't exist.
pub fn load_config(path: &Path) -> Result<Option<ProjectConfig>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path).map_err(|e| ConfigError::Read {
        path: path.to_path_buf(),
        source: e,
    })?;
    let malformed = |message: String| ConfigError::Malformed {
        path: path.to_path_buf(),
        message,
    };
    let config = if path.extension().is_some_and(|e| e == "json") {
        serde_json::from_str(&content).map_err(|e| malformed(e.to_string()))?
    } else {
        serde_yaml_ng::from_str(&content).map_err(|e| malformed(e.to_string()))?
    };
    Ok(Some(config))
}

/// Resolve the run configuration for a project directory with no further overrides.
pub fn resolve_dir(cwd: &Path, registry: &PluginRegistry) -> Result<RunConfiguration, GenerateError> {
    resolve(
        &Invocation {
            cwd: Some(cwd.to_path_buf()),
            ..Invocation::default()
        },
        registry,
    )
}

/// Build the run configuration: defaults, then the project config found in
/// the invocation's directory, then the invocation parameters.
pub fn resolve(
    invocation: &Invocation,
    registry: &PluginRegistry,
) -> Result<RunConfiguration, GenerateError> {
    let search_dir = match &invocation.cwd {
        Some(dir) => dir.clone(),
        None => std::env::current_dir().map_err(ConfigError::WorkingDirectory)?,
    };

    let project = match find_config_file(&search_dir) {
        Some(path) => {
            info!("using config {}", path.display());
            load_config(&path)?.unwrap_or_default()
        }
        None => {
            debug!("no config file in {}, using defaults", search_dir.display());
            ProjectConfig::default()
        }
    };

    Ok(merge(invocation, project, &search_dir, registry)?)
}

/// Merge already-loaded project config with invocation parameters.
pub fn merge(
    invocation: &Invocation,
    project: ProjectConfig,
    search_dir: &Path,
    registry: &PluginRegistry,
) -> Result<RunConfiguration, ConfigError> {
    let cwd = match (&invocation.cwd, project.cwd) {
        (Some(dir), _) => dir.clone(),
        (None, Some(dir)) => search_dir.join(dir),
        (None, None) => search_dir.to_path_buf(),
    };

    let outdir = invocation
        .outdir
        .clone()
        .or(project.outdir)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTDIR));
    let outdir = cwd.join(outdir);

    let source = invocation
        .source
        .clone()
        .or(project.input)
        .ok_or(ConfigError::MissingSource)?;

    let plugins = project
        .plugins
        .unwrap_or_default()
        .iter()
        .map(|entry| registry.build(entry))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(RunConfiguration {
        source,
        compiler: project.open_api_ts_options.unwrap_or_default(),
        plugins,
        outdir,
        cwd,
    })
}

/// Content written by `create-schemas init`.
pub fn default_config_content() -> &'static str {
    r#"# create-schemas configuration
# input: openapi.yaml
outdir: openapi-types

openApiTsOptions:
  enum: false           # emit `export enum` for enum schemas
  rootTypes: true       # emit `export type Name = components["schemas"]["Name"]`
  alphabetize: false
  immutable: false
  additionalProperties: false

plugins: []
  # - openapi-fetch
  # - name: openapi-fetch
  #   options:
  #     baseUrl: https://api.example.com
"#
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::GeneratedFile;
    use crate::document::OpenApiDocument;
    use crate::plugin::{GenerationContext, PluginError};

    struct Named(String);

    impl Plugin for Named {
        fn name(&self) -> &str {
            &self.0
        }

        fn generate(
            &self,
            _document: &OpenApiDocument,
            _config: &RunConfiguration,
            _context: &mut GenerationContext,
        ) -> Result<Vec<GeneratedFile>, PluginError> {
            Ok(Vec::new())
        }
    }

    fn named_factory(options: &serde_json::Value) -> Result<Arc<dyn Plugin>, String> {
        match options {
            serde_json::Value::Null => Ok(Arc::new(Named("named".to_string()))),
            serde_json::Value::Object(map) => match map.get("label") {
                Some(serde_json::Value::String(label)) => Ok(Arc::new(Named(label.clone()))),
                _ => Err("`label` must be a string".to_string()),
            },
            _ => Err("expected an object".to_string()),
        }
    }

    fn registry() -> PluginRegistry {
        let mut registry = PluginRegistry::new();
        registry.register("named", named_factory);
        registry
    }

    fn invocation(source: &str) -> Invocation {
        Invocation {
            source: Some(source.to_string()),
            ..Invocation::default()
        }
    }

    #[test]
    fn test_default_config() {
        let config = merge(
            &invocation("spec.yaml"),
            ProjectConfig::default(),
            Path::new("/project"),
            &registry(),
        )
        .unwrap();
        assert_eq!(config.source, "spec.yaml");
        assert!(!config.compiler.enums);
        assert!(config.compiler.root_types);
        assert!(config.plugins.is_empty());
        assert_eq!(config.cwd, PathBuf::from("/project"));
        assert_eq!(config.outdir, PathBuf::from("/project/openapi-types"));
    }

    #[test]
    fn test_parse_config_yaml() {
        let yaml = r#"
input: petstore.json
outdir: dist
cwd: api
openApiTsOptions:
  enum: true
  exportType: true
plugins:
  - named
  - name: named
    options:
      label: second
"#;
        let project: ProjectConfig = serde_yaml_ng::from_str(yaml).unwrap();
        let options = project.open_api_ts_options.as_ref().unwrap();
        assert!(options.enums);
        assert_eq!(
            options.passthrough.get("exportType"),
            Some(&serde_json::Value::Bool(true))
        );

        let config = merge(
            &Invocation::default(),
            project,
            Path::new("/project"),
            &registry(),
        )
        .unwrap();
        assert_eq!(config.source, "petstore.json");
        assert_eq!(config.cwd, PathBuf::from("/project/api"));
        assert_eq!(config.outdir, PathBuf::from("/project/api/dist"));
        let names: Vec<_> = config.plugins.iter().map(|p| p.name()).collect();
        assert_eq!(names, vec!["named", "second"]);
    }

    #[test]
    fn test_compiler_options_replaced_wholesale() {
        let yaml = "openApiTsOptions:\n  enum: true\n";
        let project: ProjectConfig = serde_yaml_ng::from_str(yaml).unwrap();
        let config = merge(
            &invocation("spec.yaml"),
            project,
            Path::new("/project"),
            &registry(),
        )
        .unwrap();
        // Unspecified keys take the type's defaults, not a merge with anything else.
        assert!(config.compiler.enums);
        assert!(config.compiler.root_types);
        assert!(!config.compiler.alphabetize);
    }

    #[test]
    fn test_invocation_overrides_config() {
        let project = ProjectConfig {
            input: Some("from-config.yaml".to_string()),
            outdir: Some(PathBuf::from("config-out")),
            cwd: Some(PathBuf::from("config-cwd")),
            ..ProjectConfig::default()
        };
        let invocation = Invocation {
            source: Some("from-cli.yaml".to_string()),
            outdir: Some(PathBuf::from("/abs/out")),
            cwd: Some(PathBuf::from("/cli-cwd")),
        };
        let config = merge(&invocation, project, Path::new("/cli-cwd"), &registry()).unwrap();
        assert_eq!(config.source, "from-cli.yaml");
        assert_eq!(config.cwd, PathBuf::from("/cli-cwd"));
        assert_eq!(config.outdir, PathBuf::from("/abs/out"));
    }

    #[test]
    fn test_unknown_key_is_rejected() {
        let yaml = "outdir: dist\nplugin: []\n";
        let result: Result<ProjectConfig, _> = serde_yaml_ng::from_str(yaml);
        assert!(result.is_err());
    }

    #[test]
    fn test_malformed_option_is_rejected() {
        let yaml = "openApiTsOptions:\n  enum: sometimes\n";
        let result: Result<ProjectConfig, _> = serde_yaml_ng::from_str(yaml);
        assert!(result.is_err());
    }

    #[test]
    fn test_unknown_plugin() {
        let project = ProjectConfig {
            plugins: Some(vec![PluginEntry::Name("missing".to_string())]),
            ..ProjectConfig::default()
        };
        let err = merge(&invocation("a.yaml"), project, Path::new("/p"), &registry()).unwrap_err();
        assert!(matches!(err, ConfigError::UnknownPlugin(ref name) if name == "missing"));
    }

    #[test]
    fn test_invalid_plugin_options() {
        let project = ProjectConfig {
            plugins: Some(vec![PluginEntry::Detailed {
                name: "named".to_string(),
                options: serde_json::json!({ "label": 3 }),
            }]),
            ..ProjectConfig::default()
        };
        let err = merge(&invocation("a.yaml"), project, Path::new("/p"), &registry()).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidPluginOptions { .. }));
    }

    #[test]
    fn test_missing_source() {
        let err = merge(
            &Invocation::default(),
            ProjectConfig::default(),
            Path::new("/p"),
            &registry(),
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::MissingSource));
    }

    #[test]
    fn test_resolve_reads_config_from_cwd() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("create-schemas.config.json"),
            r#"{ "openApiTsOptions": { "enum": true }, "plugins": ["named"] }"#,
        )
        .unwrap();

        let config = resolve(
            &Invocation {
                source: Some("spec.yaml".to_string()),
                cwd: Some(dir.path().to_path_buf()),
                ..Invocation::default()
            },
            &registry(),
        )
        .unwrap();
        assert!(config.compiler.enums);
        assert_eq!(config.plugins.len(), 1);
        assert_eq!(config.cwd, dir.path());
    }

    #[test]
    fn test_resolve_dir_takes_everything_from_the_project() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("create-schemas.config.yaml"),
            "input: petstore.json\noutdir: generated\nplugins:\n  - named\n",
        )
        .unwrap();

        let config = resolve_dir(dir.path(), &registry()).unwrap();
        assert_eq!(config.source, "petstore.json");
        assert_eq!(config.cwd, dir.path());
        assert_eq!(config.outdir, dir.path().join("generated"));
        assert_eq!(config.plugins.len(), 1);
    }

    #[test]
    fn test_resolve_dir_without_input() {
        let dir = tempfile::tempdir().unwrap();
        let err = resolve_dir(dir.path(), &registry()).unwrap_err();
        assert!(matches!(
            err,
            GenerateError::Configuration(ConfigError::MissingSource)
        ));
        assert_eq!(err.stage(), "config");
    }

    #[test]
    fn test_yaml_config_takes_precedence_over_json() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("create-schemas.config.json"), "{}").unwrap();
        fs::write(dir.path().join("create-schemas.config.yaml"), "outdir: x\n").unwrap();
        assert_eq!(
            find_config_file(dir.path()),
            Some(dir.path().join("create-schemas.config.yaml"))
        );
    }

    #[test]
    fn test_malformed_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("create-schemas.config.yaml");
        fs::write(&path, "plugins: 12\n").unwrap();
        let err = load_config(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Malformed { .. }));
    }

    #[test]
    fn test_missing_config_file() {
        assert!(load_config(Path::new("/nonexistent/create-schemas.config.yaml"))
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_default_config_content_parses() {
        let project: ProjectConfig = serde_yaml_ng::from_str(default_config_content()).unwrap();
        assert_eq!(project.outdir, Some(PathBuf::from("openapi-types")));
        assert_eq!(project.plugins, Some(Vec::new()));
    }
}
