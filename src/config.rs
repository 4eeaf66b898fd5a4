//! Build configuration.
//!
//! [`BuildConfig`] is the immutable value every builder receives. It is built
//! once per command by the CLI from flags, an optional `craftc.toml` and the
//! environment, then owned by that command alone.

use crate::build::CancelToken;
use anyhow::{Context, Result};
use colored::*;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULTS_FILE: &str = "craftc.toml";
pub const DEFAULT_CC: &str = "cc";
pub const DEFAULT_AR: &str = "ar";
pub const DEFAULT_ARFLAGS: &str = "rcs";

/// Settings shared by every target: how to compile and where objects go.
#[derive(Debug, Clone)]
pub struct BuildConfig {
    pub cc: String,
    pub cflags: Vec<String>,
    pub objdir: PathBuf,
    pub force: bool,
    pub verbose: bool,
    /// Worker count for object sets. `None` uses the available parallelism.
    pub jobs: Option<usize>,
    pub cancel: CancelToken,
}

impl BuildConfig {
    pub fn new(cc: impl Into<String>, objdir: impl Into<PathBuf>) -> Self {
        Self {
            cc: cc.into(),
            cflags: Vec::new(),
            objdir: objdir.into(),
            force: false,
            verbose: false,
            jobs: None,
            cancel: CancelToken::new(),
        }
    }

    pub fn with_cflags(mut self, cflags: Vec<String>) -> Self {
        self.cflags = cflags;
        self
    }

    pub fn with_force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn with_jobs(mut self, jobs: Option<usize>) -> Self {
        self.jobs = jobs;
        self
    }

    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }
}

/// Archiver program and its mode flags (`ar rcs` by default).
#[derive(Debug, Clone)]
pub struct Archiver {
    pub program: String,
    pub flags: Vec<String>,
}

impl Default for Archiver {
    fn default() -> Self {
        Self {
            program: DEFAULT_AR.to_string(),
            flags: vec![DEFAULT_ARFLAGS.to_string()],
        }
    }
}

/// Project defaults read from `craftc.toml`. Command-line flags win.
#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ProjectDefaults {
    pub cc: Option<String>,
    pub cflags: Option<String>,
    pub ldflags: Option<String>,
    pub ar: Option<String>,
    pub arflags: Option<String>,
    pub jobs: Option<usize>,
}

/// Loads `path`, or `craftc.toml` in the current directory when it exists.
///
/// An explicitly requested file must exist; the implicit one is optional.
pub fn load_defaults(path: Option<&Path>) -> Result<ProjectDefaults> {
    let (path, explicit) = match path {
        Some(p) => (p.to_path_buf(), true),
        None => (PathBuf::from(DEFAULTS_FILE), false),
    };

    if !path.exists() {
        if explicit {
            return Err(anyhow::anyhow!("config file {} not found", path.display()));
        }
        return Ok(ProjectDefaults::default());
    }

    let text = fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {} - check file permissions", path.display()))?;
    parse_defaults(&text).with_context(|| format!("Failed to parse {}", path.display()))
}

pub fn parse_defaults(text: &str) -> Result<ProjectDefaults> {
    let defaults: ProjectDefaults = toml::from_str(text)?;
    if defaults.jobs == Some(0) {
        return Err(anyhow::anyhow!("'jobs' must be at least 1"));
    }
    Ok(defaults)
}

/// Splits a flag string with shell quoting rules (`-DNAME="a b"` stays one word).
pub fn split_flags(flags: &str) -> Result<Vec<String>> {
    shell_words::split(flags).with_context(|| format!("Malformed flag string: {}", flags))
}

/// Picks the first value present: flag, then file, then environment, then `fallback`.
pub fn resolve_tool(
    flag: Option<&str>,
    file: Option<&str>,
    env_var: &str,
    fallback: &str,
    verbose: bool,
) -> String {
    if let Some(v) = flag.filter(|v| !v.trim().is_empty()) {
        return v.to_string();
    }
    if let Some(v) = file.filter(|v| !v.trim().is_empty()) {
        return v.to_string();
    }
    if let Ok(v) = std::env::var(env_var)
        && !v.trim().is_empty()
    {
        if verbose {
            eprintln!("   {} Using ${} = {}", "⚙".blue(), env_var, v);
        }
        return v;
    }
    fallback.to_string()
}
