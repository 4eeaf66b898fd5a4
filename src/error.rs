//! Error types for the build core.
//!
//! Every failure a builder can report is a [`BuildError`]. Subprocess failures
//! carry the exit code and the captured standard error of the tool so the
//! caller can print them verbatim.

use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, BuildError>;

#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    /// Malformed or empty file lists, duplicate object names.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A source file or library that an artifact depends on does not exist.
    #[error("missing input: {}", .0.display())]
    MissingInput(PathBuf),

    #[error("failed to compile {} ({}):\n{stderr}", source_file.display(), describe_exit(*code))]
    Compile {
        source_file: PathBuf,
        code: Option<i32>,
        stderr: String,
    },

    #[error("failed to archive {} ({}):\n{stderr}", path.display(), describe_exit(*code))]
    Archive {
        path: PathBuf,
        code: Option<i32>,
        stderr: String,
    },

    #[error("failed to link {} ({}):\n{stderr}", path.display(), describe_exit(*code))]
    Link {
        path: PathBuf,
        code: Option<i32>,
        stderr: String,
    },

    #[error("build cancelled")]
    Cancelled,

    /// The tool binary could not be started at all.
    #[error("failed to execute `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },
}

impl BuildError {
    pub(crate) fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        BuildError::Io {
            context: context.into(),
            source,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, BuildError::Cancelled)
    }
}

fn describe_exit(code: Option<i32>) -> String {
    match code {
        Some(c) => format!("exit code {}", c),
        None => "terminated by signal".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compile_error_message_carries_code_and_stderr() {
        let err = BuildError::Compile {
            source_file: PathBuf::from("src/a.c"),
            code: Some(1),
            stderr: "a.c:1: error: expected ';'".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("src/a.c"));
        assert!(msg.contains("exit code 1"));
        assert!(msg.contains("expected ';'"));
    }

    #[test]
    fn test_signal_termination_is_described() {
        let err = BuildError::Link {
            path: PathBuf::from("app"),
            code: None,
            stderr: String::new(),
        };
        assert!(err.to_string().contains("terminated by signal"));
    }

    #[test]
    fn test_missing_input_names_path() {
        let err = BuildError::MissingInput(PathBuf::from("lib/libfoo.a"));
        assert_eq!(err.to_string(), "missing input: lib/libfoo.a");
    }
}
