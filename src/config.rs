//! Interceptor configuration.
//!
//! Read from the JSON file named by `MOCKEXEC_CONFIG`, then overridden by
//! individual environment variables. Cargo forwards its environment to
//! `RUSTC_WRAPPER`, so both reach the interceptor.

use std::fs;
use std::path::{Path, PathBuf};

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::codegen::DEFAULT_RUNTIME_PATH;
use crate::error::Error;
use crate::transform::{FunctionPolicy, TransformOptions};

pub const ENV_CONFIG: &str = "MOCKEXEC_CONFIG";
pub const ENV_TARGETS: &str = "MOCKEXEC_TARGETS";
pub const ENV_FUNCTIONS: &str = "MOCKEXEC_FUNCTIONS";
pub const ENV_EXCLUDE: &str = "MOCKEXEC_EXCLUDE";
pub const ENV_CACHE_DIR: &str = "MOCKEXEC_CACHE_DIR";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    /// Substrings selecting which compiled `.rs` arguments get instrumented.
    pub targets: Vec<String>,
    /// Regex alternative to `targets`.
    pub target_pattern: Option<String>,
    /// Functions to instrument; empty means every interceptable function.
    pub functions: Vec<String>,
    /// Names left alone when `functions` is empty.
    pub exclude: Vec<String>,
    /// Tool basenames treated as the compile step.
    pub compile_tools: Vec<String>,
    /// First arguments that mark a version query, passed through untouched.
    pub version_flags: Vec<String>,
    pub runtime_path: String,
    /// Map the temporary file back to the original path in diagnostics.
    pub remap_path_prefix: bool,
    pub cache_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            targets: Vec::new(),
            target_pattern: None,
            functions: Vec::new(),
            exclude: vec!["main".to_string()],
            compile_tools: vec!["rustc".to_string(), "compile".to_string()],
            version_flags: ["-vV", "-V", "--version", "-V=full"]
                .into_iter()
                .map(String::from)
                .collect(),
            runtime_path: DEFAULT_RUNTIME_PATH.to_string(),
            remap_path_prefix: true,
            cache_dir: None,
        }
    }
}

impl Config {
    pub fn from_json(json: &str) -> Result<Self, Error> {
        let config: Config =
            serde_json::from_str(json).map_err(|err| Error::Config(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, Error> {
        let json = fs::read_to_string(path)
            .map_err(|err| Error::Config(format!("cannot read {}: {err}", path.display())))?;
        Self::from_json(&json)
    }

    pub fn from_env() -> Result<Self, Error> {
        Self::load(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an environment lookup.
    pub fn load(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, Error> {
        let mut config = match lookup(ENV_CONFIG) {
            Some(path) if !path.is_empty() => Self::from_file(Path::new(&path))?,
            _ => Self::default(),
        };

        if let Some(targets) = lookup(ENV_TARGETS) {
            config.targets = split_list(&targets);
        }
        if let Some(functions) = lookup(ENV_FUNCTIONS) {
            config.functions = split_list(&functions);
        }
        if let Some(exclude) = lookup(ENV_EXCLUDE) {
            config.exclude = split_list(&exclude);
        }
        if let Some(dir) = lookup(ENV_CACHE_DIR) {
            config.cache_dir = (!dir.is_empty()).then(|| PathBuf::from(dir));
        }

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), Error> {
        self.target_regex()?;
        crate::codegen::parse_runtime_path(&self.runtime_path).map_err(|err| {
            Error::Config(format!(
                "runtimePath `{}` is not a Rust path: {err}",
                self.runtime_path
            ))
        })?;
        Ok(())
    }

    pub fn target_regex(&self) -> Result<Option<Regex>, Error> {
        self.target_pattern
            .as_deref()
            .map(|pattern| {
                Regex::new(pattern)
                    .map_err(|err| Error::Config(format!("invalid targetPattern: {err}")))
            })
            .transpose()
    }

    pub fn transform_options(&self) -> TransformOptions {
        let policy = if self.functions.is_empty() {
            FunctionPolicy::All {
                exclude: self.exclude.clone(),
            }
        } else {
            FunctionPolicy::Named {
                names: self.functions.clone(),
            }
        };
        TransformOptions {
            policy,
            runtime_path: self.runtime_path.clone(),
        }
    }
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(String::from)
        .collect()
}
