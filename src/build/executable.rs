use super::feedback::FeedbackAnalyzer;
use super::objects::{ObjectSetBuilder, parse_file_list};
use super::process::{command_line, path_arg, run_tool};
use super::staleness::is_stale;
use super::{BuildResult, ensure_parent_dir};
use crate::config::BuildConfig;
use crate::error::{BuildError, Result};
use colored::*;
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Compiles sources and links them, plus any libraries, into an executable.
#[derive(Debug, Clone)]
pub struct ExecutableBuilder {
    pub config: BuildConfig,
    pub cfiles: String,
    pub exe_path: PathBuf,
    /// Whitespace-separated library files to link against. May be empty.
    pub lib_paths: String,
    pub ldflags: Vec<String>,
}

impl ExecutableBuilder {
    pub fn new(
        config: BuildConfig,
        cfiles: impl Into<String>,
        exe_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            config,
            cfiles: cfiles.into(),
            exe_path: exe_path.into(),
            lib_paths: String::new(),
            ldflags: Vec::new(),
        }
    }

    pub fn with_lib_paths(mut self, lib_paths: impl Into<String>) -> Self {
        self.lib_paths = lib_paths.into();
        self
    }

    pub fn with_ldflags(mut self, ldflags: Vec<String>) -> Self {
        self.ldflags = ldflags;
        self
    }

    pub fn run(&self) -> Result<BuildResult> {
        let start_time = Instant::now();

        let libs = parse_file_list(&self.lib_paths);
        if let Some(missing) = libs.iter().find(|lib| !lib.exists()) {
            return Err(BuildError::MissingInput(missing.clone()));
        }

        let set = ObjectSetBuilder::new(self.config.clone(), self.cfiles.clone()).run()?;

        let mut inputs = set.objects.clone();
        inputs.extend(libs.iter().cloned());
        if !is_stale(&self.exe_path, &inputs, self.config.force)? {
            println!("{} {} is up to date", "⚡".green(), self.exe_path.display());
            return Ok(BuildResult {
                built: false,
                output: self.exe_path.clone(),
            });
        }

        ensure_parent_dir(&self.exe_path)?;

        let args = link_args(&self.config, &self.ldflags, &self.exe_path, &set.objects, &libs);
        if self.config.verbose {
            println!("   {} {}", "⚙".blue(), command_line(&self.config.cc, &args));
        }
        println!("   {} Linking {}...", "🔗".cyan(), self.exe_path.display());

        let output = run_tool(&self.config.cc, &args, &self.config.cancel)?;
        if !output.success {
            if let Some(hint) = FeedbackAnalyzer::analyze(&output.stderr) {
                eprintln!("{} {}", "💡".yellow(), hint);
            }
            return Err(BuildError::Link {
                path: self.exe_path.clone(),
                code: output.code,
                stderr: output.stderr,
            });
        }

        println!(
            "{} Build finished in {:.2?}",
            "✓".green(),
            start_time.elapsed()
        );
        Ok(BuildResult {
            built: true,
            output: self.exe_path.clone(),
        })
    }
}

pub fn link_args(
    config: &BuildConfig,
    ldflags: &[String],
    exe_path: &Path,
    objects: &[PathBuf],
    libs: &[PathBuf],
) -> Vec<String> {
    let mut args = config.cflags.clone();
    args.push("-o".to_string());
    args.push(path_arg(exe_path));
    args.extend(objects.iter().map(|o| path_arg(o)));
    args.extend(libs.iter().map(|l| path_arg(l)));
    // After the inputs so `-lfoo` resolves symbols the objects reference.
    args.extend(ldflags.iter().cloned());
    args
}
