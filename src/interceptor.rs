//! Toolchain command interceptor.
//!
//! Installed as `RUSTC_WRAPPER`, mockexec is invoked as `mockexec <rustc> [args...]`.
//! Compile invocations that name a target source file get that argument swapped
//! for an instrumented copy; every other invocation reaches the real tool as is.

use std::ffi::{OsStr, OsString};
use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitStatus;

use regex::Regex;
use tempfile::NamedTempFile;

use crate::cache::IncrementalCache;
use crate::config::Config;
use crate::error::Error;
use crate::exec;
use crate::parse::read_source;
use crate::transform::{transform_source, TransformOptions, TransformOutput};

/// File name prefix of instrumented copies. Arguments carrying it are never
/// instrumented again.
pub const TEMP_PREFIX: &str = ".mockexec-";

// ═══════════════════════════════════════════════════════════════════════════════
// INVOCATION
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileInvocation {
    /// The real tool, exactly as it was given.
    pub tool: OsString,
    pub args: Vec<OsString>,
}

impl CompileInvocation {
    pub fn new<I, S>(tool: impl Into<OsString>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        Self {
            tool: tool.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    /// Split `<tool> [args...]`, as received after the wrapper's own name.
    pub fn from_args<I>(args: I) -> Result<Self, Error>
    where
        I: IntoIterator<Item = OsString>,
    {
        let mut args = args.into_iter();
        let tool = args.next().ok_or(Error::MissingTool)?;
        Ok(Self {
            tool,
            args: args.collect(),
        })
    }

    /// Tool name without directories or extension, e.g. `rustc` for `/opt/bin/rustc.exe`.
    pub fn tool_name(&self) -> Option<&str> {
        Path::new(&self.tool).file_stem().and_then(OsStr::to_str)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// PLAN
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassReason {
    NoArguments,
    VersionQuery,
    NotCompileStep,
    NoTargetFile,
}

impl fmt::Display for PassReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PassReason::NoArguments => "no arguments",
            PassReason::VersionQuery => "version query",
            PassReason::NotCompileStep => "not a compile step",
            PassReason::NoTargetFile => "no target source file",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Plan {
    PassThrough(PassReason),
    /// Instrument the source file at `args[index]`.
    Transform { index: usize, source: PathBuf },
}

/// Decide what to do with `invocation`. Nothing is read or written.
pub fn plan(invocation: &CompileInvocation, config: &Config) -> Result<Plan, Error> {
    let pattern = config.target_regex()?;
    Ok(plan_with(invocation, config, pattern.as_ref()))
}

fn plan_with(invocation: &CompileInvocation, config: &Config, pattern: Option<&Regex>) -> Plan {
    let Some(first) = invocation.args.first() else {
        return Plan::PassThrough(PassReason::NoArguments);
    };
    if let Some(first) = first.to_str() {
        if config.version_flags.iter().any(|flag| flag == first) {
            return Plan::PassThrough(PassReason::VersionQuery);
        }
    }

    let is_compile_step = invocation
        .tool_name()
        .map(|name| config.compile_tools.iter().any(|tool| tool == name))
        .unwrap_or(false);
    if !is_compile_step {
        return Plan::PassThrough(PassReason::NotCompileStep);
    }

    // args[0] is never a candidate.
    invocation
        .args
        .iter()
        .enumerate()
        .skip(1)
        .find_map(|(index, arg)| {
            let arg = arg.to_str()?;
            is_target_file(arg, config, pattern).then(|| Plan::Transform {
                index,
                source: PathBuf::from(arg),
            })
        })
        .unwrap_or(Plan::PassThrough(PassReason::NoTargetFile))
}

fn is_target_file(arg: &str, config: &Config, pattern: Option<&Regex>) -> bool {
    if arg.starts_with('-') || !arg.ends_with(".rs") {
        return false;
    }
    let is_temp_copy = Path::new(arg)
        .file_name()
        .and_then(OsStr::to_str)
        .map(|name| name.starts_with(TEMP_PREFIX))
        .unwrap_or(false);
    if is_temp_copy {
        return false;
    }
    config.targets.iter().any(|target| arg.contains(target.as_str()))
        || pattern.map(|re| re.is_match(arg)).unwrap_or(false)
}

// ═══════════════════════════════════════════════════════════════════════════════
// PREPARED COMMAND
// ═══════════════════════════════════════════════════════════════════════════════

/// The real tool's command line, holding the instrumented copy (if any)
/// alive until it is dropped.
#[derive(Debug)]
pub struct PreparedCommand {
    pub tool: OsString,
    pub args: Vec<OsString>,
    rewritten: Option<Rewritten>,
}

#[derive(Debug)]
struct Rewritten {
    original: PathBuf,
    temp: NamedTempFile,
}

impl PreparedCommand {
    fn unchanged(invocation: &CompileInvocation) -> Self {
        Self {
            tool: invocation.tool.clone(),
            args: invocation.args.clone(),
            rewritten: None,
        }
    }

    pub fn is_rewritten(&self) -> bool {
        self.rewritten.is_some()
    }

    pub fn temp_path(&self) -> Option<&Path> {
        self.rewritten.as_ref().map(|rewritten| rewritten.temp.path())
    }

    pub fn original_path(&self) -> Option<&Path> {
        self.rewritten.as_ref().map(|rewritten| rewritten.original.as_path())
    }

    pub fn status(&self) -> Result<ExitStatus, Error> {
        exec::spawn(&self.tool, &self.args)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// INTERCEPTOR
// ═══════════════════════════════════════════════════════════════════════════════

pub struct Interceptor {
    config: Config,
    pattern: Option<Regex>,
    options: TransformOptions,
    cache: Option<IncrementalCache>,
}

impl Interceptor {
    pub fn new(config: Config) -> Result<Self, Error> {
        let pattern = config.target_regex()?;
        let options = config.transform_options();
        let cache = config.cache_dir.clone().map(IncrementalCache::new);
        Ok(Self {
            config,
            pattern,
            options,
            cache,
        })
    }

    pub fn from_env() -> Result<Self, Error> {
        Self::new(Config::from_env()?)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn plan(&self, invocation: &CompileInvocation) -> Plan {
        plan_with(invocation, &self.config, self.pattern.as_ref())
    }

    pub fn prepare(&self, invocation: &CompileInvocation) -> Result<PreparedCommand, Error> {
        let (index, original) = match self.plan(invocation) {
            Plan::PassThrough(reason) => {
                tracing::debug!(%reason, "passing through");
                return Ok(PreparedCommand::unchanged(invocation));
            }
            Plan::Transform { index, source } => (index, source),
        };

        let output = self.instrumented_source(&original)?;
        if output.instrumented.is_empty() {
            tracing::debug!(file = %original.display(), "nothing to instrument");
            return Ok(PreparedCommand::unchanged(invocation));
        }

        let temp = write_beside(&original, &output.source)?;
        tracing::info!(
            file = %original.display(),
            temp = %temp.path().display(),
            functions = output.instrumented.len(),
            "instrumented"
        );

        let mut args = invocation.args.clone();
        args[index] = temp.path().as_os_str().to_owned();
        if self.config.remap_path_prefix {
            let mut mapping = temp.path().as_os_str().to_owned();
            mapping.push("=");
            mapping.push(original.as_os_str());
            args.push("--remap-path-prefix".into());
            args.push(mapping);
        }

        Ok(PreparedCommand {
            tool: invocation.tool.clone(),
            args,
            rewritten: Some(Rewritten { original, temp }),
        })
    }

    /// Prepare `invocation`, run the real tool and return the exit code to report.
    pub fn run(&self, invocation: &CompileInvocation) -> Result<i32, Error> {
        let prepared = self.prepare(invocation)?;
        let status = prepared.status()?;
        Ok(exec::exit_code(status))
    }

    fn instrumented_source(&self, original: &Path) -> Result<TransformOutput, Error> {
        let source = read_source(original)?;
        if let Some(cached) = self
            .cache
            .as_ref()
            .and_then(|cache| cache.get(original, &source, &self.options))
        {
            tracing::debug!(file = %original.display(), "cache hit");
            return Ok(cached);
        }

        let output = transform_source(&source, &original.display().to_string(), &self.options)?;
        if let Some(cache) = &self.cache {
            cache.set(original, &source, &self.options, &output);
        }
        Ok(output)
    }
}

/// Write `source` to a fresh file in the same directory as `original`, so
/// `mod` declarations and relative `include!` paths resolve the same way.
fn write_beside(original: &Path, source: &str) -> Result<NamedTempFile, Error> {
    let dir = match original.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let to_error = |source| Error::TempFile {
        path: original.to_path_buf(),
        source,
    };

    let mut temp = tempfile::Builder::new()
        .prefix(TEMP_PREFIX)
        .suffix(".rs")
        .tempfile_in(dir)
        .map_err(to_error)?;
    temp.write_all(source.as_bytes()).map_err(to_error)?;
    temp.flush().map_err(to_error)?;
    Ok(temp)
}
