mod cancel;
mod executable;
mod feedback;
mod object;
mod objects;
mod process;
mod staleness;
mod static_lib;

pub use cancel::CancelToken;
pub use executable::{ExecutableBuilder, link_args};
pub use feedback::FeedbackAnalyzer;
pub use object::{OBJECT_EXTENSION, ObjectBuilder, compile_args, object_path};
pub use objects::{ObjectSet, ObjectSetBuilder, parse_file_list};
pub use process::command_line;
pub use staleness::is_stale;
pub use static_lib::{StaticLibraryBuilder, archive_args};

use crate::error::{BuildError, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// What one `run` produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildResult {
    /// False when the artifact was already up to date and nothing was spawned.
    pub built: bool,
    pub output: PathBuf,
}

/// One build command. Every variant is a self-contained pipeline that owns
/// its configuration.
#[derive(Debug, Clone)]
pub enum Target {
    Object(ObjectBuilder),
    Objects(ObjectSetBuilder),
    StaticLib(StaticLibraryBuilder),
    Executable(ExecutableBuilder),
}

impl Target {
    pub fn name(&self) -> &'static str {
        match self {
            Target::Object(_) => "obj",
            Target::Objects(_) => "objs",
            Target::StaticLib(_) => "static-lib",
            Target::Executable(_) => "exe",
        }
    }

    pub fn run(&self) -> Result<BuildResult> {
        match self {
            Target::Object(b) => b.run(),
            Target::Objects(b) => {
                let set = b.run()?;
                Ok(BuildResult {
                    built: set.built > 0,
                    output: b.config.objdir.clone(),
                })
            }
            Target::StaticLib(b) => b.run(),
            Target::Executable(b) => b.run(),
        }
    }
}

pub(crate) fn ensure_parent_dir(path: &Path) -> Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => fs::create_dir_all(parent)
            .map_err(|e| BuildError::io(format!("failed to create {}", parent.display()), e)),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BuildConfig;

    #[test]
    fn test_target_names() {
        let cfg = BuildConfig::new("cc", "obj");
        let targets = [
            Target::Object(ObjectBuilder::new(cfg.clone(), "a.c")),
            Target::Objects(ObjectSetBuilder::new(cfg.clone(), "a.c")),
            Target::StaticLib(StaticLibraryBuilder::new(cfg.clone(), "a.c", "liba.a")),
            Target::Executable(ExecutableBuilder::new(cfg, "a.c", "a")),
        ];
        let names: Vec<_> = targets.iter().map(Target::name).collect();
        assert_eq!(names, vec!["obj", "objs", "static-lib", "exe"]);
    }

    #[test]
    fn test_ensure_parent_dir_is_idempotent() {
        let dir = tempfile::TempDir::new().unwrap();
        let out = dir.path().join("a").join("b").join("app");
        ensure_parent_dir(&out).unwrap();
        ensure_parent_dir(&out).unwrap();
        assert!(dir.path().join("a").join("b").is_dir());
        ensure_parent_dir(Path::new("app")).unwrap();
    }
}
