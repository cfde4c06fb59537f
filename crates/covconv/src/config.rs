//! Converter configuration.
//!
//! Tells covconv which external tools implement the coverage engine and the
//! XSLT transform, and how to call them. Loaded from YAML:
//!
//! ```yaml
//! engine:
//!   program: dotnet-coverage
//!   merge_args: [merge, --output, "{output}", --output-format, coverage, "{first}", "{second}"]
//!   report_args: [merge, --output, "{output}", --output-format, xml, "{input}"]
//!   search_dir_args: []
//!   artifact_extension: coverage
//! transform:
//!   program: xsltproc
//!   args: [--output, "{output}", "{stylesheet}", "{input}"]
//! scratch_root: /var/tmp
//! ```
//!
//! `dotnet-coverage` takes no symbol or binary search paths, so the default
//! `report_args` carries no `{search_dirs}` and the engine logs a warning when
//! directories are given. A tool that accepts them lists `"{search_dirs}"` in
//! `report_args` with e.g. `search_dir_args: [--symbols, "{dir}"]`.

use crate::command::SEARCH_DIRS_PLACEHOLDER;
use crate::result::{ConvertError, ConvertResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable naming a configuration file
pub const CONFIG_ENV: &str = "COVCONV_CONFIG";
/// Environment variable overriding the engine program
pub const ENGINE_ENV: &str = "COVCONV_ENGINE";
/// Environment variable overriding the XSLT program
pub const XSLT_ENV: &str = "COVCONV_XSLT";
/// Configuration file picked up from the working directory
pub const DEFAULT_CONFIG_FILE: &str = "covconv.yaml";

/// Coverage engine command settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Engine executable
    pub program: String,
    /// Arguments for merging `{first}` and `{second}` into `{output}`
    pub merge_args: Vec<String>,
    /// Arguments for writing the XML report of `{input}` to `{output}`
    pub report_args: Vec<String>,
    /// Arguments repeated per search directory `{dir}` where `{search_dirs}` appears
    pub search_dir_args: Vec<String>,
    /// Extension of coverage artifacts, without the dot
    pub artifact_extension: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            program: "dotnet-coverage".to_string(),
            merge_args: args(&[
                "merge",
                "--output",
                "{output}",
                "--output-format",
                "coverage",
                "{first}",
                "{second}",
            ]),
            report_args: args(&[
                "merge",
                "--output",
                "{output}",
                "--output-format",
                "xml",
                "{input}",
            ]),
            search_dir_args: Vec::new(),
            artifact_extension: "coverage".to_string(),
        }
    }
}

impl EngineConfig {
    /// True when `report_args` hands search directories to the engine
    #[must_use]
    pub fn forwards_search_dirs(&self) -> bool {
        !self.search_dir_args.is_empty()
            && self.report_args.iter().any(|arg| arg == SEARCH_DIRS_PLACEHOLDER)
    }
}

/// XSLT processor command settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TransformConfig {
    /// Processor executable
    pub program: String,
    /// Arguments applying `{stylesheet}` to `{input}`, writing `{output}`
    pub args: Vec<String>,
}

impl Default for TransformConfig {
    fn default() -> Self {
        Self {
            program: "xsltproc".to_string(),
            args: args(&["--output", "{output}", "{stylesheet}", "{input}"]),
        }
    }
}

/// Complete converter configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConverterConfig {
    /// Coverage engine
    pub engine: EngineConfig,
    /// XSLT processor
    pub transform: TransformConfig,
    /// Directory in which the per-run scratch directory is created
    pub scratch_root: Option<PathBuf>,
}

impl ConverterConfig {
    /// Parse a YAML document
    pub fn from_yaml_str(yaml: &str) -> ConvertResult<Self> {
        serde_yaml_ng::from_str(yaml).map_err(|e| ConvertError::config(e.to_string()))
    }

    /// Load a YAML file
    pub fn load(path: &Path) -> ConvertResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConvertError::io(format!("read config {}", path.display()), e))?;
        serde_yaml_ng::from_str(&content)
            .map_err(|e| ConvertError::config(format!("{}: {e}", path.display())))
    }

    /// Resolve the configuration for a run.
    ///
    /// Uses `explicit` if given, else the file named by `COVCONV_CONFIG`, else
    /// `covconv.yaml` in the working directory if it exists, else defaults.
    /// Program overrides from the environment are applied last.
    pub fn discover(explicit: Option<&Path>) -> ConvertResult<Self> {
        Self::discover_with(explicit, |key| std::env::var(key).ok())
    }

    /// [`Self::discover`] with an injectable environment lookup
    pub fn discover_with(
        explicit: Option<&Path>,
        env: impl Fn(&str) -> Option<String>,
    ) -> ConvertResult<Self> {
        let from_env = env(CONFIG_ENV)
            .filter(|value| !value.trim().is_empty())
            .map(PathBuf::from);

        let mut config = match explicit.map(Path::to_path_buf).or(from_env) {
            Some(path) => {
                tracing::debug!(config = %path.display(), "loading configuration");
                Self::load(&path)?
            }
            None if Path::new(DEFAULT_CONFIG_FILE).is_file() => {
                tracing::debug!(config = DEFAULT_CONFIG_FILE, "loading configuration");
                Self::load(Path::new(DEFAULT_CONFIG_FILE))?
            }
            None => Self::default(),
        };

        config.apply_overrides(env);
        Ok(config)
    }

    /// Apply `COVCONV_ENGINE` / `COVCONV_XSLT` program overrides
    pub fn apply_overrides(&mut self, env: impl Fn(&str) -> Option<String>) {
        if let Some(program) = env(ENGINE_ENV).filter(|p| !p.trim().is_empty()) {
            self.engine.program = program;
        }
        if let Some(program) = env(XSLT_ENV).filter(|p| !p.trim().is_empty()) {
            self.transform.program = program;
        }
    }
}

fn args(items: &[&str]) -> Vec<String> {
    items.iter().map(ToString::to_string).collect()
}
