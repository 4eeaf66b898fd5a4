use super::feedback::FeedbackAnalyzer;
use super::process::{command_line, path_arg, run_tool};
use super::staleness::is_stale;
use super::BuildResult;
use crate::config::BuildConfig;
use crate::error::{BuildError, Result};
use colored::*;
use indicatif::ProgressBar;
use std::fs;
use std::path::{Path, PathBuf};

pub const OBJECT_EXTENSION: &str = "o";

/// Compiles one C source file into `<objdir>/<stem>.o`.
#[derive(Debug, Clone)]
pub struct ObjectBuilder {
    pub config: BuildConfig,
    pub cfile: PathBuf,
}

impl ObjectBuilder {
    pub fn new(config: BuildConfig, cfile: impl Into<PathBuf>) -> Self {
        Self {
            config,
            cfile: cfile.into(),
        }
    }

    pub fn run(&self) -> Result<BuildResult> {
        if self.cfile.as_os_str().to_string_lossy().trim().is_empty() {
            return Err(BuildError::InvalidInput("no source file given".to_string()));
        }
        let (output, built) = compile_object(&self.config, &self.cfile, None)?;
        Ok(BuildResult { built, output })
    }
}

/// Object path for `source`: its file stem plus `.o`, inside `objdir`.
pub fn object_path(objdir: &Path, source: &Path) -> Result<PathBuf> {
    let stem = source
        .file_stem()
        .filter(|s| !s.is_empty())
        .ok_or_else(|| {
            BuildError::InvalidInput(format!("{} has no file name", source.display()))
        })?;
    let mut name = stem.to_os_string();
    name.push(".");
    name.push(OBJECT_EXTENSION);
    Ok(objdir.join(name))
}

pub fn compile_args(config: &BuildConfig, source: &Path, object: &Path) -> Vec<String> {
    let mut args = config.cflags.clone();
    args.push("-c".to_string());
    args.push("-o".to_string());
    args.push(path_arg(object));
    args.push(path_arg(source));
    args
}

/// Compiles `source` if its object is stale. Returns the object path and
/// whether the compiler ran. Messages go through `progress` when one is shown.
pub(crate) fn compile_object(
    config: &BuildConfig,
    source: &Path,
    progress: Option<&ProgressBar>,
) -> Result<(PathBuf, bool)> {
    let object = object_path(&config.objdir, source)?;

    if config.cancel.is_cancelled() {
        return Err(BuildError::Cancelled);
    }

    if !is_stale(&object, &[source], config.force)? {
        if config.verbose {
            say(
                progress,
                format!("   {} {} is up to date", "⚡".green(), object.display()),
            );
        }
        return Ok((object, false));
    }

    // Concurrent callers may race here; create_dir_all tolerates that.
    fs::create_dir_all(&config.objdir).map_err(|e| {
        BuildError::io(
            format!("failed to create object directory {}", config.objdir.display()),
            e,
        )
    })?;

    let args = compile_args(config, source, &object);
    if config.verbose {
        say(
            progress,
            format!("   {} {}", "⚙".blue(), command_line(&config.cc, &args)),
        );
    }

    let output = run_tool(&config.cc, &args, &config.cancel)?;
    if !output.success {
        if let Some(hint) = FeedbackAnalyzer::analyze(&output.stderr) {
            say(progress, format!("{} {}", "💡".yellow(), hint));
        }
        return Err(BuildError::Compile {
            source_file: source.to_path_buf(),
            code: output.code,
            stderr: output.stderr,
        });
    }

    let warnings = output.stderr.trim();
    if !warnings.is_empty() {
        say(
            progress,
            format!(
                "{} Warning in {}:\n{}",
                "!".yellow(),
                source.display(),
                warnings
            ),
        );
    }

    Ok((object, true))
}

/// Prints above the progress bar. A hidden bar (stderr not a terminal) drops
/// `ProgressBar::println` output, so lines are printed while it is suspended.
fn say(progress: Option<&ProgressBar>, line: String) {
    match progress {
        Some(pb) => pb.suspend(|| println!("{}", line)),
        None => println!("{}", line),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_path_uses_stem() {
        let out = object_path(Path::new("build/obj"), Path::new("src/net/socket.c")).unwrap();
        assert_eq!(out, PathBuf::from("build/obj/socket.o"));
    }

    #[test]
    fn test_object_path_without_extension() {
        let out = object_path(Path::new("obj"), Path::new("main")).unwrap();
        assert_eq!(out, PathBuf::from("obj/main.o"));
    }

    #[test]
    fn test_object_path_rejects_dir_like_source() {
        assert!(object_path(Path::new("obj"), Path::new("/")).is_err());
    }

    #[test]
    fn test_compile_args_order() {
        let cfg = BuildConfig::new("gcc", "obj").with_cflags(vec!["-O2".into(), "-Wall".into()]);
        let args = compile_args(&cfg, Path::new("a.c"), Path::new("obj/a.o"));
        assert_eq!(args, vec!["-O2", "-Wall", "-c", "-o", "obj/a.o", "a.c"]);
    }

    #[test]
    fn test_empty_source_is_invalid() {
        let builder = ObjectBuilder::new(BuildConfig::new("cc", "obj"), "  ");
        assert!(matches!(builder.run(), Err(BuildError::InvalidInput(_))));
    }
}
