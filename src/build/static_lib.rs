use super::objects::ObjectSetBuilder;
use super::process::{command_line, path_arg, run_tool};
use super::staleness::is_stale;
use super::{BuildResult, ensure_parent_dir};
use crate::config::{Archiver, BuildConfig};
use crate::error::{BuildError, Result};
use colored::*;
use std::fs;
use std::path::{Path, PathBuf};

/// Compiles sources and archives their objects into a static library.
#[derive(Debug, Clone)]
pub struct StaticLibraryBuilder {
    pub config: BuildConfig,
    pub cfiles: String,
    pub lib_path: PathBuf,
    pub archiver: Archiver,
}

impl StaticLibraryBuilder {
    pub fn new(
        config: BuildConfig,
        cfiles: impl Into<String>,
        lib_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            config,
            cfiles: cfiles.into(),
            lib_path: lib_path.into(),
            archiver: Archiver::default(),
        }
    }

    pub fn with_archiver(mut self, archiver: Archiver) -> Self {
        self.archiver = archiver;
        self
    }

    pub fn run(&self) -> Result<BuildResult> {
        let set = ObjectSetBuilder::new(self.config.clone(), self.cfiles.clone()).run()?;

        if !is_stale(&self.lib_path, &set.objects, self.config.force)? {
            println!("{} {} is up to date", "⚡".green(), self.lib_path.display());
            return Ok(BuildResult {
                built: false,
                output: self.lib_path.clone(),
            });
        }

        ensure_parent_dir(&self.lib_path)?;
        // ar only adds and replaces members; start from scratch so removed
        // sources do not linger in the archive.
        match fs::remove_file(&self.lib_path) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                return Err(BuildError::io(
                    format!("failed to replace {}", self.lib_path.display()),
                    e,
                ));
            }
        }

        let args = archive_args(&self.archiver, &self.lib_path, &set.objects);
        if self.config.verbose {
            println!(
                "   {} {}",
                "⚙".blue(),
                command_line(&self.archiver.program, &args)
            );
        }
        println!("   {} Archiving {}...", "📦".cyan(), self.lib_path.display());

        let output = run_tool(&self.archiver.program, &args, &self.config.cancel)?;
        if !output.success {
            return Err(BuildError::Archive {
                path: self.lib_path.clone(),
                code: output.code,
                stderr: output.stderr,
            });
        }

        println!("{} Built {}", "✓".green(), self.lib_path.display());
        Ok(BuildResult {
            built: true,
            output: self.lib_path.clone(),
        })
    }
}

pub fn archive_args(archiver: &Archiver, lib_path: &Path, objects: &[PathBuf]) -> Vec<String> {
    let mut args = archiver.flags.clone();
    args.push(path_arg(lib_path));
    args.extend(objects.iter().map(|o| path_arg(o)));
    args
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_archive_args_default_archiver() {
        let objects = vec![PathBuf::from("obj/a.o"), PathBuf::from("obj/b.o")];
        let args = archive_args(&Archiver::default(), Path::new("lib/libm.a"), &objects);
        assert_eq!(args, vec!["rcs", "lib/libm.a", "obj/a.o", "obj/b.o"]);
    }

    #[test]
    fn test_archive_args_custom_flags() {
        let archiver = Archiver {
            program: "llvm-ar".into(),
            flags: vec!["crsD".into()],
        };
        let args = archive_args(&archiver, Path::new("x.a"), &[PathBuf::from("x.o")]);
        assert_eq!(args, vec!["crsD", "x.a", "x.o"]);
    }
}
